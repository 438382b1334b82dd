//! Distance metrics between gene sets
//!
//! All metrics implement [`DistanceMetric`] and return a [`Condensed`]
//! distance array. The pairwise loop that defines the order of the array
//! lives in [`calc_pairwise_distances`] and is shared by every metric.
use std::collections::HashSet;
use std::iter::Enumerate;

use tracing::trace;

use crate::gene_set::GeneSet;
use crate::utils::Combinations;
use crate::{GsdError, GsdResult, UNDEFINED_DISTANCE};

pub mod benchmark;
mod condensed;
pub mod external;
pub mod ppi;
pub mod set;
pub mod tree;
pub mod vectorize;

pub use condensed::Condensed;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Trait for all distance metrics between [`GeneSet`]s
///
/// Metrics are configured once at construction (e.g. the Minkowski order,
/// an interaction graph or a similarity engine) and can then be used for
/// any number of gene set collections.
///
/// ```mermaid
/// graph LR
///     A[&[GeneSet]] --> V{calc}
///     V -->|validate| C[compute]
///     C --> E[extract attributes]
///     E --> P[calc_pairwise_distances]
///     P --> R[Condensed]
/// ```
///
/// Implementors only provide [`DistanceMetric::compute`]. Callers use
/// [`DistanceMetric::calc`], which rejects invalid collections before any
/// distance is computed and checks the length of the result.
///
/// # Examples
///
/// ```
/// use gsd::{DistanceMetric, GeneSet, GsdResult};
/// use gsd::distance::calc_pairwise_distances;
///
/// /// Absolute difference of the number of genes
/// struct SizeDifference;
///
/// impl DistanceMetric for SizeDifference {
///     fn display_name(&self) -> String {
///         "Size difference".to_string()
///     }
///
///     fn compute(&self, gene_sets: &[GeneSet]) -> GsdResult<Vec<f64>> {
///         Ok(calc_pairwise_distances(gene_sets, |a, b| {
///             (a.genes().len() as f64 - b.genes().len() as f64).abs()
///         }))
///     }
/// }
///
/// let sets = vec![
///     GeneSet::new("A", [1u32, 2, 3]),
///     GeneSet::new("B", [1u32]),
///     GeneSet::new("C", [4u32, 5]),
/// ];
/// let d = SizeDifference.calc(&sets).unwrap();
/// assert_eq!(d.as_slice(), &[2.0, 1.0, 1.0]);
///
/// // a single gene set cannot be compared
/// assert!(SizeDifference.calc(&sets[..1]).is_err());
/// ```
pub trait DistanceMetric {
    /// Returns a user-friendly, stable name of the metric
    ///
    /// The name is used as key when storing results and must be
    /// unique within a set of metrics.
    fn display_name(&self) -> String;

    /// Calculates the pairwise distances of all gene sets
    ///
    /// This method implements the actual metric. The returned `Vec` must
    /// contain `n·(n−1)/2` values in canonical order. It is only called
    /// by [`DistanceMetric::calc`] with validated input.
    ///
    /// # Errors
    ///
    /// Any error of the metric or an external collaborator
    fn compute(&self, gene_sets: &[GeneSet]) -> GsdResult<Vec<f64>>;

    /// Calculates the condensed distance matrix of the gene sets
    ///
    /// # Errors
    ///
    /// - [`GsdError::TooFewGeneSets`] if less than 2 gene sets are provided
    /// - [`GsdError::DuplicateName`] if two gene sets share the same name
    /// - [`GsdError::InvalidLength`] if the metric returned the wrong number of values
    /// - every error of [`DistanceMetric::compute`]
    fn calc(&self, gene_sets: &[GeneSet]) -> GsdResult<Condensed> {
        validate_gene_sets(gene_sets)?;
        let values = self.compute(gene_sets)?;
        Condensed::new(gene_sets.len(), values)
    }
}

impl<M: DistanceMetric + ?Sized> DistanceMetric for Box<M> {
    fn display_name(&self) -> String {
        (**self).display_name()
    }

    fn compute(&self, gene_sets: &[GeneSet]) -> GsdResult<Vec<f64>> {
        (**self).compute(gene_sets)
    }
}

/// Ensures that the gene sets can be used for a distance matrix
///
/// # Errors
///
/// - [`GsdError::TooFewGeneSets`] if less than 2 gene sets are provided
/// - [`GsdError::DuplicateName`] if two gene sets share the same name
pub fn validate_gene_sets(gene_sets: &[GeneSet]) -> GsdResult<()> {
    if gene_sets.len() < 2 {
        return Err(GsdError::TooFewGeneSets(gene_sets.len()));
    }
    let mut names = HashSet::with_capacity(gene_sets.len());
    for set in gene_sets {
        if !names.insert(set.name()) {
            return Err(GsdError::DuplicateName(set.name().to_string()));
        }
    }
    Ok(())
}

/// Returns the number of pairwise comparisons of `n` items: `n·(n−1)/2`
pub fn n_comparisons(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Returns the position of the pair `(i, j)` in a condensed array of `n` items
///
/// # Panics
///
/// If `i >= j` or `j >= n`
pub fn condensed_index(n: usize, i: usize, j: usize) -> usize {
    assert!(i < j && j < n, "invalid pair ({i}, {j}) for {n} items");
    n * i - i * (i + 1) / 2 + (j - i - 1)
}

/// Applies `pairwise_fn` to all pairs `(i, j)` with `i < j`
///
/// The pairs are visited, and the results appended, in the order
/// `(0,1), (0,2), …, (0,n−1), (1,2), …, (n−2,n−1)`. Every pair is visited
/// exactly once.
///
/// # Examples
///
/// ```
/// use gsd::distance::calc_pairwise_distances;
///
/// let items = [1.0f64, 4.0, 6.0];
/// let d = calc_pairwise_distances(&items, |a, b| (a - b).abs());
/// assert_eq!(d, vec![3.0, 5.0, 2.0]);
/// ```
pub fn calc_pairwise_distances<T, F>(items: &[T], mut pairwise_fn: F) -> Vec<f64>
where
    F: FnMut(&T, &T) -> f64,
{
    let n = items.len();
    let mut res = Vec::with_capacity(n_comparisons(n));
    for i in 0..n.saturating_sub(1) {
        for j in i + 1..n {
            res.push(pairwise_fn(&items[i], &items[j]));
        }
    }
    res
}

/// Fallible version of [`calc_pairwise_distances`]
///
/// The first error aborts the calculation; no partial result is returned.
///
/// # Errors
///
/// The first error returned by `pairwise_fn`
pub fn try_calc_pairwise_distances<T, F>(items: &[T], mut pairwise_fn: F) -> GsdResult<Vec<f64>>
where
    F: FnMut(&T, &T) -> GsdResult<f64>,
{
    let n = items.len();
    let mut res = Vec::with_capacity(n_comparisons(n));
    for i in 0..n.saturating_sub(1) {
        for j in i + 1..n {
            match pairwise_fn(&items[i], &items[j]) {
                Ok(dist) => res.push(dist),
                Err(err) => {
                    trace!("pairwise comparison ({}, {}) failed", i, j);
                    return Err(err);
                }
            }
        }
    }
    Ok(res)
}

/// Hands all pairwise [`Combinations`] to `batch_fn` at once
///
/// This allows callers to evaluate the pairs in parallel. Every combination
/// comes with its position in the condensed array and `batch_fn` returns
/// `(position, distance)` tuples. The distances are written to their
/// positions, so the order in which `batch_fn` returns them does not matter.
///
/// # Errors
///
/// - [`GsdError::InvalidLength`] if `batch_fn` returned the wrong number of values
/// - [`GsdError::InvalidPosition`] if a position is out of range or returned twice
///
/// # Examples
///
/// ```
/// use std::iter::Enumerate;
///
/// use gsd::distance::calc_pairwise_distances_with;
/// use gsd::utils::Combinations;
///
/// fn absolute(combs: Enumerate<Combinations<'_, f64>>) -> Vec<(usize, f64)> {
///     // This method can and should utilize parallel processing, e.g.
///     // using rayon iterators
///     combs.map(|(pos, (a, b))| (pos, (a - b).abs())).collect()
/// }
///
/// let items = [1.0, 4.0, 6.0];
/// let d = calc_pairwise_distances_with(&items, absolute).unwrap();
/// assert_eq!(d, vec![3.0, 5.0, 2.0]);
/// ```
pub fn calc_pairwise_distances_with<T, F>(items: &[T], batch_fn: F) -> GsdResult<Vec<f64>>
where
    F: FnOnce(Enumerate<Combinations<'_, T>>) -> Vec<(usize, f64)>,
{
    let expected = n_comparisons(items.len());
    let batch = batch_fn(Combinations::new(items).enumerate());
    if batch.len() != expected {
        return Err(GsdError::InvalidLength {
            expected,
            found: batch.len(),
        });
    }

    let mut res = vec![UNDEFINED_DISTANCE; expected];
    let mut written = vec![false; expected];
    for (pos, dist) in batch {
        match written.get_mut(pos) {
            Some(seen) if !*seen => {
                *seen = true;
                res[pos] = dist;
            }
            _ => {
                trace!("batch returned invalid position {}", pos);
                return Err(GsdError::InvalidPosition(pos));
            }
        }
    }
    Ok(res)
}

#[cfg(test)]
mod test {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn pairwise_order() {
        let items: Vec<usize> = (0..5).collect();
        let mut visited = Vec::new();
        let res = calc_pairwise_distances(&items, |a, b| {
            visited.push((*a, *b));
            (a * 10 + b) as f64
        });
        assert_eq!(
            visited,
            vec![
                (0, 1),
                (0, 2),
                (0, 3),
                (0, 4),
                (1, 2),
                (1, 3),
                (1, 4),
                (2, 3),
                (2, 4),
                (3, 4)
            ]
        );
        assert_eq!(res.len(), n_comparisons(5));
        for (pos, (i, j)) in visited.iter().enumerate() {
            assert_eq!(condensed_index(5, *i, *j), pos);
            assert!((res[pos] - (i * 10 + j) as f64).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn number_of_comparisons() {
        assert_eq!(n_comparisons(0), 0);
        assert_eq!(n_comparisons(1), 0);
        assert_eq!(n_comparisons(2), 1);
        assert_eq!(n_comparisons(3), 3);
        assert_eq!(n_comparisons(100), 4950);
        for n in 0..20 {
            let items: Vec<usize> = (0..n).collect();
            assert_eq!(calc_pairwise_distances(&items, |_, _| 0.0).len(), n_comparisons(n));
        }
    }

    #[test]
    fn fallible_engine_stops_at_first_error() {
        let items = [1, 2, 3];
        let mut calls = 0;
        let res = try_calc_pairwise_distances(&items, |_, b| {
            calls += 1;
            if *b == 3 {
                Err(GsdError::external("engine down"))
            } else {
                Ok(1.0)
            }
        });
        assert!(matches!(res, Err(GsdError::External(_))));
        assert_eq!(calls, 2);
    }

    #[test]
    fn parallel_batch_keeps_order() {
        let items: Vec<f64> = (0..40).map(f64::from).collect();
        let sequential = calc_pairwise_distances(&items, |a, b| b * 100.0 + a);
        let parallel = calc_pairwise_distances_with(&items, |combs| {
            let pairs: Vec<(usize, (&f64, &f64))> = combs.collect();
            pairs
                .par_iter()
                .map(|(pos, (a, b))| (*pos, *b * 100.0 + *a))
                .collect()
        })
        .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn batch_in_any_order() {
        let items = [1.0f64, 4.0, 6.0];
        let res = calc_pairwise_distances_with(&items, |combs| {
            let mut dists: Vec<(usize, f64)> =
                combs.map(|(pos, (a, b))| (pos, (a - b).abs())).collect();
            dists.reverse();
            dists
        })
        .unwrap();
        assert_eq!(res, vec![3.0, 5.0, 2.0]);
    }

    #[test]
    fn batch_with_wrong_length() {
        let items = [1, 2, 3];
        let res = calc_pairwise_distances_with(&items, |_| vec![(0, 1.0)]);
        assert!(matches!(
            res,
            Err(GsdError::InvalidLength {
                expected: 3,
                found: 1
            })
        ));
    }

    #[test]
    fn batch_with_invalid_positions() {
        let items = [1, 2, 3];
        let duplicate = calc_pairwise_distances_with(&items, |_| vec![(0, 1.0), (1, 1.0), (1, 1.0)]);
        assert!(matches!(duplicate, Err(GsdError::InvalidPosition(1))));

        let out_of_range = calc_pairwise_distances_with(&items, |_| vec![(0, 1.0), (1, 1.0), (3, 1.0)]);
        assert!(matches!(out_of_range, Err(GsdError::InvalidPosition(3))));
    }

    #[test]
    fn validation() {
        let single = vec![GeneSet::new("A", [1u32])];
        assert!(matches!(
            validate_gene_sets(&single),
            Err(GsdError::TooFewGeneSets(1))
        ));
        assert!(matches!(
            validate_gene_sets(&[]),
            Err(GsdError::TooFewGeneSets(0))
        ));

        let dup = vec![
            GeneSet::new("A", [1u32]),
            GeneSet::new("B", [1u32]),
            GeneSet::new("A", [2u32]),
        ];
        match validate_gene_sets(&dup) {
            Err(GsdError::DuplicateName(name)) => assert_eq!(name, "A"),
            _ => panic!("duplicate names must be rejected"),
        }

        let ok = vec![GeneSet::new("A", [1u32]), GeneSet::new("B", [1u32])];
        assert!(validate_gene_sets(&ok).is_ok());
    }

    #[test]
    fn calc_rejects_before_compute() {
        struct Panics;
        impl DistanceMetric for Panics {
            fn display_name(&self) -> String {
                "panics".into()
            }
            fn compute(&self, _: &[GeneSet]) -> GsdResult<Vec<f64>> {
                panic!("must not be called")
            }
        }
        let dup = vec![GeneSet::new("A", [1u32]), GeneSet::new("A", [2u32])];
        assert!(Panics.calc(&dup).is_err());
    }

    #[test]
    fn calc_checks_length() {
        struct TooShort;
        impl DistanceMetric for TooShort {
            fn display_name(&self) -> String {
                "too short".into()
            }
            fn compute(&self, _: &[GeneSet]) -> GsdResult<Vec<f64>> {
                Ok(vec![0.0])
            }
        }
        let sets = vec![
            GeneSet::new("A", [1u32]),
            GeneSet::new("B", [2u32]),
            GeneSet::new("C", [3u32]),
        ];
        assert!(matches!(
            TooShort.calc(&sets),
            Err(GsdError::InvalidLength {
                expected: 3,
                found: 1
            })
        ));
        let boxed: Box<dyn DistanceMetric> = Box::new(TooShort);
        assert_eq!(boxed.display_name(), "too short");
    }
}
