//! Distance metrics based on a protein-protein interaction network
//!
//! Both metrics build an undirected [`Graph`] from an [`InteractionTable`]
//! once and reuse it for every call to [`DistanceMetric::calc`].
//!
//! - [`PpiPathDistanceMetric`] uses shortest paths between the genes of two sets
//! - [`DirectPpiDistanceMetric`] extends every set with the direct interaction
//!   partners of its genes and calculates the Jaccard distance
use std::fmt::Display;

use statrs::statistics::{Data, Median, Statistics};
use tracing::{debug, trace};

use crate::distance::set::{jaccard, EmptySetPolicy};
use crate::distance::vectorize::{extract_genes, to_attribute_map, to_binary_matrix};
use crate::distance::{calc_pairwise_distances, DistanceMetric};
use crate::gene_set::{GeneId, GeneSet};
use crate::graph::{Graph, InteractionTable};
use crate::ordered_set::OrderedSet;
use crate::{f64_from_usize, GsdResult, UNDEFINED_DISTANCE};

/// Defines how the per-source path lengths of a gene set pair are combined
///
/// For every gene of the source set, the number of edges to the closest
/// gene of the target set is calculated. The aggregation combines these
/// minima into one distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PathAggregation {
    /// Arithmetic mean of the per-source minima
    #[default]
    MeanOfMinimum,
    /// Median of the per-source minima
    MedianOfMinimum,
    /// Largest per-source minimum
    MaxOfMinimum,
    /// Shortest path between any source and any target
    BestPair,
}

impl PathAggregation {
    /// Combines the per-source minima, `minima` must not be empty
    fn aggregate(self, minima: Vec<f64>) -> f64 {
        match self {
            PathAggregation::MeanOfMinimum => minima.iter().mean(),
            PathAggregation::MedianOfMinimum => Data::new(minima).median(),
            PathAggregation::MaxOfMinimum => Statistics::max(&minima),
            PathAggregation::BestPair => Statistics::min(&minima),
        }
    }
}

impl Display for PathAggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PathAggregation::MeanOfMinimum => "mean of minimum",
            PathAggregation::MedianOfMinimum => "median of minimum",
            PathAggregation::MaxOfMinimum => "max of minimum",
            PathAggregation::BestPair => "best pair",
        };
        write!(f, "{name}")
    }
}

/// Shortest-path distance between the genes of two sets
///
/// Genes that are not part of the network are ignored. If one set has no
/// gene in the network, or no path connects the two sets, the distance is
/// [`UNDEFINED_DISTANCE`].
///
/// The distance is not symmetric, the first set of a pair is the source
/// side. [`DistanceMetric::calc`] always uses the set with the lower index
/// as source.
///
/// # Examples
///
/// ```
/// use gsd::{DistanceMetric, GeneSet, InteractionRow, InteractionTable};
/// use gsd::distance::ppi::{PathAggregation, PpiPathDistanceMetric};
///
/// // 1 - 2 - 3 - 4 - 5
/// let table: InteractionTable = [(1u32, 2u32), (2, 3), (3, 4), (4, 5)]
///     .into_iter()
///     .map(|(a, b)| InteractionRow::new(a, b))
///     .collect();
///
/// let sets = vec![
///     GeneSet::new("A", [1u32]),
///     GeneSet::new("B", [3u32, 4]),
///     GeneSet::new("C", [5u32, 99]),
/// ];
///
/// let metric = PpiPathDistanceMetric::new(&table).unwrap();
/// assert_eq!(metric.calc(&sets).unwrap().as_slice(), &[2.0, 4.0, 1.5]);
///
/// let metric = metric.with_aggregation(PathAggregation::BestPair);
/// assert_eq!(metric.calc(&sets).unwrap().as_slice(), &[2.0, 4.0, 1.0]);
/// ```
#[derive(Debug, Clone)]
pub struct PpiPathDistanceMetric {
    graph: Graph<GeneId>,
    aggregation: PathAggregation,
}

impl PpiPathDistanceMetric {
    /// Builds the interaction network of the table
    ///
    /// # Errors
    ///
    /// [`crate::GsdError::EmptyGraph`] if the table has no interactions
    pub fn new(table: &InteractionTable) -> GsdResult<Self> {
        Ok(Self {
            graph: Graph::from_interactions(table)?,
            aggregation: PathAggregation::default(),
        })
    }

    /// Uses a different aggregation of the per-source path lengths
    #[must_use]
    pub fn with_aggregation(mut self, aggregation: PathAggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Returns the aggregation of the per-source path lengths
    pub fn aggregation(&self) -> PathAggregation {
        self.aggregation
    }

    /// Returns the interaction network
    pub fn graph(&self) -> &Graph<GeneId> {
        &self.graph
    }

    /// Returns the node indices of all genes of the set that are part of the network
    pub fn gene_indices(&self, set: &GeneSet) -> Vec<usize> {
        let indices = self.graph.indices_of(set.genes());
        if indices.len() < set.genes().len() {
            trace!(
                "{}: {} of {} genes are not in the network",
                set.name(),
                set.genes().len() - indices.len(),
                set.genes().len()
            );
        }
        indices
    }

    /// Calculates the distance from `sources` to `targets`
    ///
    /// Both arguments are node indices, as returned by [`PpiPathDistanceMetric::gene_indices`].
    ///
    /// # Panics
    ///
    /// If any index is not a valid node index
    pub fn path_distance(&self, sources: &[usize], targets: &[usize]) -> f64 {
        if sources.is_empty() || targets.is_empty() {
            return UNDEFINED_DISTANCE;
        }
        let mut is_target = vec![false; self.graph.len()];
        for idx in targets {
            is_target[*idx] = true;
        }

        let minima: Vec<f64> = sources
            .iter()
            .filter_map(|source| {
                self.graph
                    .distance_to_nearest(*source, |idx| is_target[idx])
            })
            .map(f64_from_usize)
            .collect();

        if minima.is_empty() {
            return UNDEFINED_DISTANCE;
        }
        self.aggregation.aggregate(minima)
    }
}

impl DistanceMetric for PpiPathDistanceMetric {
    fn display_name(&self) -> String {
        format!("PPI path distance ({})", self.aggregation)
    }

    fn compute(&self, gene_sets: &[GeneSet]) -> GsdResult<Vec<f64>> {
        let indices: Vec<Vec<usize>> = gene_sets
            .iter()
            .map(|set| self.gene_indices(set))
            .collect();

        let res = calc_pairwise_distances(&indices, |a, b| self.path_distance(a, b));
        let undefined = res.iter().filter(|d| d.is_nan()).count();
        if undefined > 0 {
            debug!("{undefined} gene set pairs are not connected in the network");
        }
        Ok(res)
    }
}

/// Jaccard distance of gene sets extended by their direct interaction partners
///
/// # Examples
///
/// ```
/// use gsd::{DistanceMetric, GeneSet, InteractionRow, InteractionTable};
/// use gsd::distance::ppi::DirectPpiDistanceMetric;
///
/// let table: InteractionTable = [(1u32, 2u32), (2, 3), (3, 4)]
///     .into_iter()
///     .map(|(a, b)| InteractionRow::new(a, b))
///     .collect();
///
/// let sets = vec![GeneSet::new("A", [1u32]), GeneSet::new("B", [3u32])];
///
/// // {1, 2} vs {3, 2, 4}
/// let d = DirectPpiDistanceMetric::new(&table).unwrap().calc(&sets).unwrap();
/// assert_eq!(d.as_slice(), &[0.75]);
/// ```
#[derive(Debug, Clone)]
pub struct DirectPpiDistanceMetric {
    graph: Graph<GeneId>,
}

impl DirectPpiDistanceMetric {
    /// Builds the interaction network of the table
    ///
    /// # Errors
    ///
    /// [`crate::GsdError::EmptyGraph`] if the table has no interactions
    pub fn new(table: &InteractionTable) -> GsdResult<Self> {
        Ok(Self {
            graph: Graph::from_interactions(table)?,
        })
    }

    /// Returns the genes and all their direct interaction partners
    pub fn extend(&self, genes: &OrderedSet<GeneId>) -> OrderedSet<GeneId> {
        let mut extended = genes.clone();
        for gene in genes {
            if let Some(idx) = self.graph.index_of(gene) {
                extended.extend(
                    self.graph
                        .neighbours(idx)
                        .iter()
                        .filter_map(|n| self.graph.node(*n))
                        .copied(),
                );
            }
        }
        extended
    }
}

impl DistanceMetric for DirectPpiDistanceMetric {
    fn display_name(&self) -> String {
        "Direct PPI distance".to_string()
    }

    fn compute(&self, gene_sets: &[GeneSet]) -> GsdResult<Vec<f64>> {
        let extended = to_attribute_map(gene_sets, extract_genes)?.map_values(|genes| self.extend(genes));
        let matrix = to_binary_matrix(&extended);
        debug!("Direct PPI: {:?} feature matrix", matrix.dim());

        let rows = matrix.row_slices();
        Ok(calc_pairwise_distances(&rows, |a, b| {
            jaccard(a, b, EmptySetPolicy::Zero)
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::InteractionRow;
    use crate::GsdError;

    fn table() -> InteractionTable {
        // 1 - 2 - 3 - 4 - 5    6 - 7
        [(1u32, 2u32), (2, 3), (3, 4), (4, 5), (6, 7)]
            .into_iter()
            .map(|(a, b)| InteractionRow::new(a, b))
            .collect()
    }

    fn gene_sets() -> Vec<GeneSet> {
        vec![
            GeneSet::new("A", [1u32]),
            GeneSet::new("B", [3u32, 4]),
            GeneSet::new("C", [5u32, 99]),
            GeneSet::new("D", [99u32]),
            GeneSet::new("E", [6u32]),
        ]
    }

    #[test]
    fn mean_of_minimum() {
        let metric = PpiPathDistanceMetric::new(&table()).unwrap();
        let d = metric.calc(&gene_sets()).unwrap();
        assert_eq!(d.len(), 10);
        assert!((d.get(0, 1) - 2.0).abs() < f64::EPSILON);
        assert!((d.get(0, 2) - 4.0).abs() < f64::EPSILON);
        assert!((d.get(1, 2) - 1.5).abs() < f64::EPSILON);
        // D has no gene in the network
        assert!(d.get(0, 3).is_nan());
        assert!(d.get(3, 4).is_nan());
        // A and E are in disconnected components
        assert!(d.get(0, 4).is_nan());
        assert_eq!(d.count_undefined(), 7);
    }

    #[test]
    fn aggregations() {
        let metric = PpiPathDistanceMetric::new(&table()).unwrap();
        // 3 -> 5: 2 edges, 4 -> 5: 1 edge
        let sources = metric.gene_indices(&gene_sets()[1]);
        let targets = metric.gene_indices(&gene_sets()[2]);

        let expected = [
            (PathAggregation::MeanOfMinimum, 1.5),
            (PathAggregation::MedianOfMinimum, 1.5),
            (PathAggregation::MaxOfMinimum, 2.0),
            (PathAggregation::BestPair, 1.0),
        ];
        for (aggregation, dist) in expected {
            let metric = metric.clone().with_aggregation(aggregation);
            assert!((metric.path_distance(&sources, &targets) - dist).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn unreachable_sources_are_skipped() {
        let metric = PpiPathDistanceMetric::new(&table()).unwrap();
        let sets = [GeneSet::new("X", [1u32, 6]), GeneSet::new("Y", [3u32])];
        let sources = metric.gene_indices(&sets[0]);
        let targets = metric.gene_indices(&sets[1]);
        assert!((metric.path_distance(&sources, &targets) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn not_symmetric() {
        let metric = PpiPathDistanceMetric::new(&table()).unwrap();
        let sets = gene_sets();
        let b = metric.gene_indices(&sets[1]);
        let c = metric.gene_indices(&sets[2]);
        assert!((metric.path_distance(&b, &c) - 1.5).abs() < f64::EPSILON);
        assert!((metric.path_distance(&c, &b) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn overlapping_sets() {
        let metric = PpiPathDistanceMetric::new(&table()).unwrap();
        let sets = [GeneSet::new("X", [2u32, 3]), GeneSet::new("Y", [3u32, 2])];
        let d = metric.calc(&sets).unwrap();
        assert_eq!(d.as_slice(), &[0.0]);
    }

    #[test]
    fn display_name() {
        let metric = PpiPathDistanceMetric::new(&table()).unwrap();
        assert_eq!(metric.display_name(), "PPI path distance (mean of minimum)");
        let metric = metric.with_aggregation(PathAggregation::MedianOfMinimum);
        assert_eq!(metric.display_name(), "PPI path distance (median of minimum)");
    }

    #[test]
    fn empty_table() {
        assert!(matches!(
            PpiPathDistanceMetric::new(&InteractionTable::new()),
            Err(GsdError::EmptyGraph)
        ));
        assert!(matches!(
            DirectPpiDistanceMetric::new(&InteractionTable::new()),
            Err(GsdError::EmptyGraph)
        ));
    }

    #[test]
    fn direct_ppi() {
        let metric = DirectPpiDistanceMetric::new(&table()).unwrap();
        let sets = vec![
            GeneSet::new("A", [1u32]),
            GeneSet::new("B", [3u32]),
            GeneSet::new("C", [99u32]),
        ];
        let d = metric.calc(&sets).unwrap();
        assert_eq!(d.as_slice(), &[0.75, 1.0, 1.0]);
    }

    #[test]
    fn direct_ppi_extension() {
        let metric = DirectPpiDistanceMetric::new(&table()).unwrap();
        let genes: OrderedSet<GeneId> = [3u32, 99].into_iter().map(GeneId::from).collect();
        let extended: Vec<u32> = metric.extend(&genes).iter().map(GeneId::as_u32).collect();
        assert_eq!(extended, vec![3, 99, 2, 4]);
    }

    #[test]
    fn input_is_not_modified() {
        let metric = DirectPpiDistanceMetric::new(&table()).unwrap();
        let sets = vec![GeneSet::new("A", [1u32]), GeneSet::new("B", [3u32])];
        metric.calc(&sets).unwrap();
        assert_eq!(sets[0].genes().len(), 1);
        assert_eq!(sets[1].genes().len(), 1);
    }
}
