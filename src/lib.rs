//! Pairwise distances between annotated gene sets
//!
//! `gsd` compares [`GeneSet`]s, named collections of genes with annotations such as
//! GO terms, literature summaries or trait associations, and returns a condensed
//! distance matrix that can be fed into clustering or visualisation tools.
//!
//! Every metric implements the [`DistanceMetric`] trait. Metrics differ a lot in
//! what they look at:
//!
//! - [`distance::set`]: gene (or trait) membership, e.g. Jaccard or Kappa
//! - [`distance::ppi`]: shortest paths in a protein-protein interaction [`Graph`]
//! - [`distance::tree`]: path lengths in a [`Hierarchy`] of gene sets
//! - [`distance::external`]: ontology similarity engines or word embeddings
//!
//! but all of them return the same [`Condensed`] array, with pairs ordered
//! `(0,1), (0,2), …, (0,n−1), (1,2), …, (n−2,n−1)`.
//!
//! # Examples
//!
//! ```
//! use gsd::{DistanceMetric, GeneSet};
//! use gsd::distance::set::SetDistanceMetric;
//!
//! let sets = vec![
//!     GeneSet::new("SetA", [8908u32, 2998, 2997]),
//!     GeneSet::new("SetB", [5507u32, 8908, 2998]),
//!     GeneSet::new("SetC", [2998u32, 2997, 2992]),
//! ];
//!
//! let jaccard = SetDistanceMetric::jaccard();
//! let distances = jaccard.calc(&sets).unwrap();
//!
//! assert_eq!(distances.len(), 3);
//! assert!((distances.get(0, 1) - 0.5).abs() < 1e-9);
//! assert!((distances.get(1, 2) - 0.8).abs() < 1e-9);
//! ```
#![warn(missing_docs)]
use core::fmt::Debug;
use std::num::ParseIntError;
use thiserror::Error;

pub mod distance;
pub mod evaluation;
pub mod gene_set;
pub mod graph;
pub mod hierarchy;
pub mod matrix;
pub mod ordered_set;
pub mod utils;

pub use distance::{Condensed, DistanceMetric};
pub use evaluation::Evaluation;
pub use gene_set::{GeneId, GeneSet, Genes};
pub use graph::{Graph, InteractionRow, InteractionTable};
pub use hierarchy::Hierarchy;

/// The distance of a pair that cannot be compared, e.g. because
/// one of the two gene sets has no genes in the interaction network
///
/// Check for it with [`f64::is_nan`]. It is never returned for the whole
/// matrix, only for single pairs.
pub const UNDEFINED_DISTANCE: f64 = f64::NAN;

const DEFAULT_NUM_NEIGHBOURS: usize = 8;
const DEFAULT_NUM_GENES: usize = 50;

/// Main Error type for this crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GsdError {
    /// A distance matrix needs at least two gene sets
    #[error("at least 2 gene sets are required, got {0}")]
    TooFewGeneSets(usize),
    /// Gene set names are used as keys and must be unique
    #[error("gene set name is not unique: {0}")]
    DuplicateName(String),
    /// The relationship table of a graph based metric did not contain any edge
    #[error("unable to build a graph from an empty relationship table")]
    EmptyGraph,
    /// A metric parameter is outside its valid range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// The gene set is not a node of the hierarchy
    #[error("gene set {0} is not present in the hierarchy")]
    MissingReference(String),
    /// A hierarchy node can only have one parent
    #[error("node {0} already has a parent")]
    MultipleParents(String),
    /// A hierarchy node was added twice
    #[error("node {0} is already present in the hierarchy")]
    DuplicateNode(String),
    /// A hierarchy node was referenced before it was added
    #[error("node {0} does not exist")]
    UnknownNode(String),
    /// A metric returned a different number of distances than expected
    #[error("expected {expected} distances, got {found}")]
    InvalidLength {
        /// The number of pairwise comparisons
        expected: usize,
        /// The number of distances actually returned
        found: usize,
    },
    /// A batch of distances contained a position twice or out of range
    #[error("invalid position {0} in batch of distances")]
    InvalidPosition(usize),
    /// The external similarity engine or embedding model failed
    #[error("external similarity engine failed")]
    External(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Failed to parse an integer
    #[error("unable to parse Integer")]
    ParseIntError,
    /// Binary data is malformed or truncated
    #[error("invalid bytes: {0}")]
    InvalidBinary(String),
}

impl From<ParseIntError> for GsdError {
    fn from(_: ParseIntError) -> Self {
        GsdError::ParseIntError
    }
}

impl GsdError {
    /// Wraps any error of an external collaborator
    pub fn external<E: Into<Box<dyn std::error::Error + Send + Sync>>>(err: E) -> Self {
        GsdError::External(err.into())
    }
}

/// Shortcut for `Result<T, GsdError>`
pub type GsdResult<T> = Result<T, GsdError>;

/// Returns the first 8 bytes as a big-endian `u64`
///
/// # Panics
///
/// If `bytes` has less than 8 elements
fn u64_from_bytes(bytes: &[u8]) -> u64 {
    u64::from_be_bytes(
        bytes[0..8]
            .try_into()
            .expect("slice with incorrect length"),
    )
}

/// Returns the first 4 bytes as a big-endian `u32`
///
/// # Panics
///
/// If `bytes` has less than 4 elements
fn u32_from_bytes(bytes: &[u8]) -> u32 {
    u32::from_be_bytes(
        bytes[0..4]
            .try_into()
            .expect("slice with incorrect length"),
    )
}

/// Converts a count into `f64`
///
/// Counts in this crate are gene or node numbers and stay far below
/// the range where `f64` loses integer precision.
#[allow(clippy::cast_precision_loss)]
fn f64_from_usize(n: usize) -> f64 {
    n as f64
}
