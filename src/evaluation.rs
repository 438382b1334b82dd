//! Timed results of distance metrics
//!
//! [`evaluate_all`] runs several metrics on the same gene sets and keeps
//! every result together with the metric name and the calculation time.
//! An [`Evaluation`] can be converted into a compact binary form to store
//! it, e.g. to compare many metrics later on.
//!
//! # Examples
//!
//! ```
//! use gsd::{DistanceMetric, Evaluation, GeneSet};
//! use gsd::distance::set::SetDistanceMetric;
//! use gsd::evaluation::evaluate_all;
//!
//! let sets = vec![
//!     GeneSet::new("SetA", [8908u32, 2998, 2997]),
//!     GeneSet::new("SetB", [5507u32, 8908, 2998]),
//!     GeneSet::new("SetC", [2998u32, 2997, 2992]),
//! ];
//!
//! let metrics: Vec<Box<dyn DistanceMetric>> = vec![
//!     Box::new(SetDistanceMetric::jaccard()),
//!     Box::new(SetDistanceMetric::kappa()),
//! ];
//!
//! let results = evaluate_all(&metrics, &sets).unwrap();
//! assert_eq!(results[0].metric_name(), "Jaccard distance");
//! assert_eq!(results[1].results().len(), 3);
//!
//! let bytes = results[0].as_bytes();
//! let restored = Evaluation::from_bytes(&bytes).unwrap();
//! assert_eq!(restored, results[0]);
//! ```
use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::distance::{n_comparisons, validate_gene_sets, Condensed, DistanceMetric};
use crate::gene_set::GeneSet;
use crate::{u32_from_bytes, u64_from_bytes, GsdError, GsdResult};

/// The result of a single metric
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    metric_name: String,
    duration: Duration,
    results: Condensed,
}

impl Evaluation {
    /// Constructs a new `Evaluation`
    pub fn new(metric_name: &str, duration: Duration, results: Condensed) -> Self {
        Self {
            metric_name: metric_name.to_string(),
            duration,
            results,
        }
    }

    /// The display name of the metric
    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    /// The time it took to calculate the distances
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The pairwise distances
    pub fn results(&self) -> &Condensed {
        &self.results
    }

    /// Returns a binary representation of the `Evaluation`
    ///
    /// The binary layout is defined as:
    ///
    /// | Byte offset | Number of bytes | Description |
    /// | --- | --- | --- |
    /// | 0 | 4 | The total length of the binary data blob as big-endian `u32` |
    /// | 4 | 4 | The length of the metric name as big-endian `u32` |
    /// | 8 | n | The metric name as UTF-8 bytes |
    /// | 8 + n | 8 | The whole seconds of the duration as big-endian `u64` |
    /// | 16 + n | 4 | The fractional nanoseconds of the duration as big-endian `u32` |
    /// | 20 + n | 4 | The number of compared gene sets as big-endian `u32` |
    /// | 24 + n | x * 8 | The distances in condensed order, each as big-endian `u64` bit pattern of the `f64` |
    ///
    /// Undefined (NaN) distances keep their bit pattern.
    ///
    /// # Panics
    ///
    /// If the name, the number of gene sets or the total size do not fit into a `u32`
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use gsd::{Condensed, Evaluation};
    ///
    /// let results = Condensed::new(2, vec![0.5]).unwrap();
    /// let eval = Evaluation::new("Foo", Duration::from_millis(2), results);
    /// let bytes = eval.as_bytes();
    ///
    /// assert_eq!(bytes.len(), 4 + 4 + 3 + 8 + 4 + 4 + 8);
    /// assert_eq!(bytes[4..8], [0u8, 0u8, 0u8, 3u8]);
    /// assert_eq!(&bytes[8..11], b"Foo");
    /// ```
    pub fn as_bytes(&self) -> Vec<u8> {
        fn usize_to_u32(n: usize) -> u32 {
            n.try_into()
                .unwrap_or_else(|_| panic!("unable to convert {n} to u32"))
        }
        let name = self.metric_name.as_bytes();
        let size = 4 + 4 + name.len() + 8 + 4 + 4 + self.results.len() * 8;

        let mut res = Vec::with_capacity(size);

        // 4 bytes for total length
        res.extend_from_slice(&usize_to_u32(size).to_be_bytes());

        // metric name, prefixed by its length
        res.extend_from_slice(&usize_to_u32(name.len()).to_be_bytes());
        res.extend_from_slice(name);

        // duration
        res.extend_from_slice(&self.duration.as_secs().to_be_bytes());
        res.extend_from_slice(&self.duration.subsec_nanos().to_be_bytes());

        // number of gene sets, followed by all distances
        res.extend_from_slice(&usize_to_u32(self.results.n_items()).to_be_bytes());
        for value in self.results.iter() {
            res.extend_from_slice(&value.to_bits().to_be_bytes());
        }

        res
    }

    /// Returns an `Evaluation` from its binary representation
    ///
    /// The byte layout is defined in [`Evaluation::as_bytes`]
    ///
    /// # Errors
    ///
    /// [`GsdError::InvalidBinary`] if the data is truncated or malformed
    pub fn from_bytes(bytes: &[u8]) -> GsdResult<Self> {
        Self::try_from(bytes)
    }
}

impl TryFrom<&[u8]> for Evaluation {
    type Error = GsdError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        // minimum length for an unnamed evaluation without distances
        if bytes.len() < 4 + 4 + 8 + 4 + 4 {
            error!("Too few bytes for an Evaluation");
            return Err(GsdError::InvalidBinary("too few bytes".to_string()));
        }
        let total_len = u32_from_bytes(&bytes[0..]) as usize;
        if bytes.len() != total_len {
            error!(
                "Wrong number of bytes for an Evaluation. Expected {}, received {}",
                total_len,
                bytes.len()
            );
            return Err(GsdError::InvalidBinary(format!(
                "expected {total_len} bytes, received {}",
                bytes.len()
            )));
        }

        let name_len = u32_from_bytes(&bytes[4..]) as usize;
        if bytes.len() < 24 + name_len {
            error!("Too few bytes for an Evaluation (including the name)");
            return Err(GsdError::InvalidBinary("truncated metric name".to_string()));
        }
        let Ok(name) = String::from_utf8(bytes[8..8 + name_len].to_vec()) else {
            error!("Unable to parse the name of the metric");
            return Err(GsdError::InvalidBinary("invalid metric name".to_string()));
        };

        let mut idx = 8 + name_len;
        let secs = u64_from_bytes(&bytes[idx..]);
        let nanos = u32_from_bytes(&bytes[idx + 8..]);
        idx += 12;
        if nanos >= 1_000_000_000 {
            return Err(GsdError::InvalidBinary(format!("invalid nanoseconds {nanos}")));
        }

        let n_items = u32_from_bytes(&bytes[idx..]) as usize;
        idx += 4;
        if n_items > bytes.len() {
            return Err(GsdError::InvalidBinary(format!("invalid number of gene sets {n_items}")));
        }

        let n_values = n_comparisons(n_items);
        if bytes.len() - idx != n_values * 8 {
            error!(
                "Wrong number of distances for {} gene sets: {} bytes",
                n_items,
                bytes.len() - idx
            );
            return Err(GsdError::InvalidBinary(format!(
                "expected {n_values} distances for {n_items} gene sets"
            )));
        }
        let values: Vec<f64> = bytes[idx..]
            .chunks_exact(8)
            .map(|chunk| f64::from_bits(u64_from_bytes(chunk)))
            .collect();

        Ok(Evaluation::new(
            &name,
            Duration::new(secs, nanos),
            Condensed::new(n_items, values)?,
        ))
    }
}

/// Calculates the distances of one metric and measures the time
///
/// # Errors
///
/// Every error of [`DistanceMetric::calc`]
pub fn evaluate<M: DistanceMetric + ?Sized>(
    metric: &M,
    gene_sets: &[GeneSet],
) -> GsdResult<Evaluation> {
    let name = metric.display_name();
    debug!("Calculating {name}");
    let start = Instant::now();
    let results = metric.calc(gene_sets)?;
    let duration = start.elapsed();
    info!(
        "{} for {} gene sets took {:?} ({} undefined distances)",
        name,
        gene_sets.len(),
        duration,
        results.count_undefined()
    );
    Ok(Evaluation::new(&name, duration, results))
}

/// Calculates the distances of several metrics on the same gene sets
///
/// The gene sets and the metric names are validated before any
/// distance is calculated. The first failing metric aborts the run.
///
/// # Errors
///
/// - [`GsdError::DuplicateName`] if two metrics share the same display name
/// - every error of [`DistanceMetric::calc`]
pub fn evaluate_all(
    metrics: &[Box<dyn DistanceMetric>],
    gene_sets: &[GeneSet],
) -> GsdResult<Vec<Evaluation>> {
    validate_gene_sets(gene_sets)?;
    let mut names = HashSet::with_capacity(metrics.len());
    for metric in metrics {
        let name = metric.display_name();
        if !names.insert(name.clone()) {
            return Err(GsdError::DuplicateName(name));
        }
    }

    metrics
        .iter()
        .map(|metric| evaluate(metric.as_ref(), gene_sets))
        .collect()
}
