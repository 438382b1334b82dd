//! Distance of gene sets by their position in a [`Hierarchy`]
use tracing::debug;

use crate::distance::{calc_pairwise_distances, DistanceMetric};
use crate::gene_set::GeneSet;
use crate::graph::Graph;
use crate::hierarchy::Hierarchy;
use crate::{f64_from_usize, GsdError, GsdResult, UNDEFINED_DISTANCE};

/// Number of edges on the tree path between two gene sets
///
/// Every gene set must be a node of the hierarchy, identified by its name.
///
/// # Examples
///
/// ```
/// use gsd::{DistanceMetric, GeneSet, Hierarchy};
/// use gsd::distance::tree::TreePathDistanceMetric;
///
/// let mut tree = Hierarchy::new("SetA");
/// tree.add_child("SetA", "SetB").unwrap();
/// tree.add_child("SetA", "SetC").unwrap();
///
/// let sets = vec![
///     GeneSet::new("SetA", [8908u32, 2998, 2997]),
///     GeneSet::new("SetB", [5507u32, 8908, 2998]),
///     GeneSet::new("SetC", [2998u32, 2997, 2992]),
/// ];
///
/// let metric = TreePathDistanceMetric::new(&tree).unwrap();
/// assert_eq!(metric.calc(&sets).unwrap().as_slice(), &[1.0, 1.0, 2.0]);
/// ```
#[derive(Debug, Clone)]
pub struct TreePathDistanceMetric {
    graph: Graph<String>,
}

impl TreePathDistanceMetric {
    /// Builds the tree graph of the hierarchy
    ///
    /// # Errors
    ///
    /// [`GsdError::EmptyGraph`] if the hierarchy only contains the root
    pub fn new(hierarchy: &Hierarchy) -> GsdResult<Self> {
        Ok(Self {
            graph: hierarchy.to_graph()?,
        })
    }
}

impl DistanceMetric for TreePathDistanceMetric {
    fn display_name(&self) -> String {
        "Pairwise tree path distance".to_string()
    }

    fn compute(&self, gene_sets: &[GeneSet]) -> GsdResult<Vec<f64>> {
        let indices = gene_sets
            .iter()
            .map(|set| {
                self.graph
                    .index_of(&set.name().to_string())
                    .ok_or_else(|| GsdError::MissingReference(set.name().to_string()))
            })
            .collect::<GsdResult<Vec<usize>>>()?;
        debug!("Found all {} gene sets in the hierarchy", indices.len());

        Ok(calc_pairwise_distances(&indices, |a, b| {
            self.graph
                .shortest_path(*a, *b)
                .map_or(UNDEFINED_DISTANCE, f64_from_usize)
        }))
    }
}
