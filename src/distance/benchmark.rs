//! Baseline metrics to benchmark other metrics against
use rand::distr::Open01;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::distance::{calc_pairwise_distances, DistanceMetric};
use crate::gene_set::GeneSet;
use crate::GsdResult;

/// Random distances, uniformly distributed in `(0, 1)`
///
/// Without a seed every call returns different distances. With a seed,
/// the distances only depend on the number of gene sets.
///
/// ```
/// use gsd::{DistanceMetric, GeneSet};
/// use gsd::distance::benchmark::RandomDistanceMetric;
///
/// let sets = vec![
///     GeneSet::new("A", [1u32]),
///     GeneSet::new("B", [2u32]),
///     GeneSet::new("C", [3u32]),
/// ];
///
/// let metric = RandomDistanceMetric::seeded(42);
/// let d = metric.calc(&sets).unwrap();
/// assert!(d.iter().all(|v| *v > 0.0 && *v < 1.0));
/// assert_eq!(d, metric.calc(&sets).unwrap());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDistanceMetric {
    seed: Option<u64>,
}

impl RandomDistanceMetric {
    /// Constructs an unseeded metric
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a metric with reproducible distances
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl DistanceMetric for RandomDistanceMetric {
    fn display_name(&self) -> String {
        "Random (uniform, (0,1))".to_string()
    }

    fn compute(&self, gene_sets: &[GeneSet]) -> GsdResult<Vec<f64>> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Ok(calc_pairwise_distances(gene_sets, |_, _| {
            rng.sample(Open01)
        }))
    }
}
