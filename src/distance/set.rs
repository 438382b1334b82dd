//! Distance metrics based on set membership
//!
//! All metrics in this module follow the same steps:
//!
//! 1. extract an attribute set (genes, traits, GO terms …) of every gene set
//! 2. build a feature matrix from the attribute sets
//! 3. compare the matrix rows pairwise with a comparator
//!
//! Only the extractor and comparator differ, so the same comparator can be
//! used for "distance over genes" and "distance over traits".
//!
//! # Examples
//!
//! ```
//! use gsd::{DistanceMetric, GeneSet};
//! use gsd::distance::set::{SetComparator, SetDistanceMetric, EmptySetPolicy};
//! use gsd::distance::vectorize::extract_gene_symbols;
//!
//! let sets = vec![
//!     GeneSet::new("SetA", [8908u32, 2998, 2997]).with_symbols(["GYG2", "GYS2", "GYS1"]),
//!     GeneSet::new("SetB", [5507u32, 8908, 2998]).with_symbols(["PPP1R3C", "GYG2", "GYS2"]),
//! ];
//!
//! let by_genes = SetDistanceMetric::jaccard();
//! let by_symbols = SetDistanceMetric::new(
//!     "Jaccard distance over gene symbols",
//!     extract_gene_symbols,
//!     SetComparator::Jaccard(EmptySetPolicy::Zero),
//! );
//!
//! assert_eq!(by_genes.calc(&sets).unwrap().as_slice(), &[0.5]);
//! assert_eq!(by_symbols.calc(&sets).unwrap().as_slice(), &[0.5]);
//! ```
use std::hash::Hash;

use tracing::debug;

use crate::distance::vectorize::{
    extract_genes, extract_trait_frequencies, to_attribute_map, to_binary_matrix,
    to_freq_matrix, Frequencies,
};
use crate::distance::{calc_pairwise_distances, DistanceMetric};
use crate::gene_set::{GeneId, GeneSet};
use crate::ordered_set::OrderedSet;
use crate::{f64_from_usize, GsdError, GsdResult, UNDEFINED_DISTANCE};

/// Defines the distance of two gene sets that both have no features
///
/// Two empty sets are identical, but it is not possible to calculate
/// most set-based measures for them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptySetPolicy {
    /// Two empty sets are identical and have a distance of `0`
    #[default]
    Zero,
    /// Two empty sets cannot be compared, the distance is [`UNDEFINED_DISTANCE`]
    Undefined,
}

impl EmptySetPolicy {
    fn distance(self) -> f64 {
        match self {
            EmptySetPolicy::Zero => 0.0,
            EmptySetPolicy::Undefined => UNDEFINED_DISTANCE,
        }
    }
}

/// Trait to compare two rows of a feature matrix
pub trait RowComparator<V> {
    /// Calculates the distance between two rows of equal length
    fn compare(&self, a: &[V], b: &[V]) -> f64;
}

/// Default comparators for binary feature rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetComparator {
    /// Minkowski distance of the given order
    Minkowski(f64),
    /// Jaccard distance
    Jaccard(EmptySetPolicy),
    /// `1 - overlap coefficient`
    Overlap,
    /// `1 - Cohen's Kappa`
    Kappa,
}

impl RowComparator<bool> for SetComparator {
    fn compare(&self, a: &[bool], b: &[bool]) -> f64 {
        match self {
            SetComparator::Minkowski(p) => minkowski(a, b, *p),
            SetComparator::Jaccard(policy) => jaccard(a, b, *policy),
            SetComparator::Overlap => overlap_distance(a, b),
            SetComparator::Kappa => kappa_distance(a, b),
        }
    }
}

/// Default comparators for feature count rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreqComparator {
    /// Cosine distance
    Cosine(EmptySetPolicy),
}

impl RowComparator<u64> for FreqComparator {
    fn compare(&self, a: &[u64], b: &[u64]) -> f64 {
        match self {
            FreqComparator::Cosine(policy) => cosine(a, b, *policy),
        }
    }
}

fn count_true(row: &[bool]) -> usize {
    row.iter().filter(|v| **v).count()
}

fn count_both(a: &[bool], b: &[bool]) -> usize {
    a.iter().zip(b).filter(|(x, y)| **x && **y).count()
}

/// Minkowski distance of order `p` between two 0/1 vectors
///
/// For boolean vectors every differing position contributes `1`, so the
/// distance of two vectors that differ in `k` positions is `k^(1/p)`.
pub fn minkowski(a: &[bool], b: &[bool], p: f64) -> f64 {
    let differences = a.iter().zip(b).filter(|(x, y)| x != y).count();
    f64_from_usize(differences).powf(1.0 / p)
}

/// Jaccard distance `1 − |A∩B| / |A∪B|`
///
/// If both sets are empty the distance is defined by `policy`.
pub fn jaccard(a: &[bool], b: &[bool], policy: EmptySetPolicy) -> f64 {
    let union = a.iter().zip(b).filter(|(x, y)| **x || **y).count();
    if union == 0 {
        return policy.distance();
    }
    1.0 - f64_from_usize(count_both(a, b)) / f64_from_usize(union)
}

/// Overlap coefficient `|A∩B| / min(|A|, |B|)`
///
/// The coefficient is undefined if one of the sets is empty
/// and [`UNDEFINED_DISTANCE`] is returned.
///
/// # Examples
///
/// ```
/// use gsd::distance::set::overlap_coefficient;
///
/// assert_eq!(overlap_coefficient(&[true, false, false], &[true, true, false]), 1.0);
/// assert_eq!(overlap_coefficient(&[false, false, true], &[true, true, false]), 0.0);
/// assert!(overlap_coefficient(&[false, false], &[true, true]).is_nan());
/// ```
pub fn overlap_coefficient(a: &[bool], b: &[bool]) -> f64 {
    let smaller = count_true(a).min(count_true(b));
    if smaller == 0 {
        return UNDEFINED_DISTANCE;
    }
    f64_from_usize(count_both(a, b)) / f64_from_usize(smaller)
}

/// Overlap distance `1 − overlap coefficient`
pub fn overlap_distance(a: &[bool], b: &[bool]) -> f64 {
    1.0 - overlap_coefficient(a, b)
}

/// Cohen's Kappa, the agreement of two boolean raters beyond chance
///
/// Kappa is undefined if the agreement by chance is `1`, i.e. both rows
/// have the same constant value or there are no features at all. In this
/// case [`UNDEFINED_DISTANCE`] is returned.
pub fn cohen_kappa(a: &[bool], b: &[bool]) -> f64 {
    let n = f64_from_usize(a.len());
    if a.is_empty() {
        return UNDEFINED_DISTANCE;
    }
    let agree = f64_from_usize(a.iter().zip(b).filter(|(x, y)| x == y).count()) / n;
    let pa = f64_from_usize(count_true(a)) / n;
    let pb = f64_from_usize(count_true(b)) / n;
    let by_chance = pa * pb + (1.0 - pa) * (1.0 - pb);

    if (1.0 - by_chance).abs() < f64::EPSILON {
        return UNDEFINED_DISTANCE;
    }
    (agree - by_chance) / (1.0 - by_chance)
}

/// Kappa distance `1 − Cohen's Kappa`, ranging from `0` to `2`
pub fn kappa_distance(a: &[bool], b: &[bool]) -> f64 {
    1.0 - cohen_kappa(a, b)
}

#[allow(clippy::cast_precision_loss)]
fn count_to_f64(count: u64) -> f64 {
    count as f64
}

/// Cosine distance `1 − a·b / (|a|·|b|)` of two count vectors
///
/// Two all-zero vectors are handled by `policy`, a single all-zero
/// vector has no direction and the distance is [`UNDEFINED_DISTANCE`].
pub fn cosine(a: &[u64], b: &[u64], policy: EmptySetPolicy) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (count_to_f64(*x), count_to_f64(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    match (norm_a == 0.0, norm_b == 0.0) {
        (true, true) => policy.distance(),
        (true, false) | (false, true) => UNDEFINED_DISTANCE,
        (false, false) => 1.0 - dot / (norm_a.sqrt() * norm_b.sqrt()),
    }
}

type SetExtractor<K> = Box<dyn Fn(&GeneSet) -> OrderedSet<K> + Send + Sync>;
type FreqExtractor<K> = Box<dyn Fn(&GeneSet) -> Frequencies<K> + Send + Sync>;

/// Distance metric over binary feature membership
///
/// The comparator defaults to [`SetComparator`], but any [`RowComparator`]
/// over boolean rows can be used.
pub struct SetDistanceMetric<K, C = SetComparator> {
    name: String,
    extractor: SetExtractor<K>,
    comparator: C,
}

impl<K, C: RowComparator<bool>> SetDistanceMetric<K, C> {
    /// Constructs a metric from a display name, an extractor and a comparator
    pub fn new<F>(name: &str, extractor: F, comparator: C) -> Self
    where
        F: Fn(&GeneSet) -> OrderedSet<K> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            extractor: Box::new(extractor),
            comparator,
        }
    }

    /// Returns the comparator of the metric
    pub fn comparator(&self) -> &C {
        &self.comparator
    }
}

impl SetDistanceMetric<GeneId> {
    /// Minkowski distance of order `p` over the genes
    ///
    /// # Errors
    ///
    /// [`GsdError::InvalidParameter`] if `p` is not a finite number `>= 1`
    pub fn minkowski(p: f64) -> GsdResult<Self> {
        if !p.is_finite() || p < 1.0 {
            return Err(GsdError::InvalidParameter(format!(
                "Minkowski order must be >= 1, got {p}"
            )));
        }
        Ok(Self::new(
            &format!("Minkowski distance (p={p})"),
            extract_genes,
            SetComparator::Minkowski(p),
        ))
    }

    /// Jaccard distance over the genes, two empty gene sets have a distance of `0`
    pub fn jaccard() -> Self {
        Self::new(
            "Jaccard distance",
            extract_genes,
            SetComparator::Jaccard(EmptySetPolicy::Zero),
        )
    }

    /// Kappa distance over the genes
    pub fn kappa() -> Self {
        Self::new("Kappa distance", extract_genes, SetComparator::Kappa)
    }

    /// Overlap distance over the genes
    pub fn overlap() -> Self {
        Self::new("Overlap distance", extract_genes, SetComparator::Overlap)
    }
}

impl<K: Eq + Hash + Clone, C: RowComparator<bool>> DistanceMetric for SetDistanceMetric<K, C> {
    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn compute(&self, gene_sets: &[GeneSet]) -> GsdResult<Vec<f64>> {
        let attributes = to_attribute_map(gene_sets, &self.extractor)?;
        let matrix = to_binary_matrix(&attributes);
        debug!("{}: {:?} feature matrix", self.name, matrix.dim());

        let rows = matrix.row_slices();
        Ok(calc_pairwise_distances(&rows, |a, b| {
            self.comparator.compare(a, b)
        }))
    }
}

/// Distance metric over feature counts
///
/// # Examples
///
/// ```
/// use gsd::{DistanceMetric, GeneSet};
/// use gsd::gene_set::GeneAnnotation;
/// use gsd::distance::set::FreqDistanceMetric;
///
/// let traits = |t: &[&str]| GeneAnnotation {
///     traits: t.iter().map(|s| s.to_string()).collect(),
///     description: None,
/// };
///
/// let sets = vec![
///     GeneSet::new("A", [1u32]).with_annotation(1u32, traits(&["height"])),
///     GeneSet::new("B", [2u32, 3]).with_annotation(2u32, traits(&["height"]))
///         .with_annotation(3u32, traits(&["height"])),
///     GeneSet::new("C", [4u32]).with_annotation(4u32, traits(&["BMI"])),
/// ];
///
/// let d = FreqDistanceMetric::cosine_over_traits().calc(&sets).unwrap();
/// assert!(d.get(0, 1).abs() < 1e-9);
/// assert!((d.get(0, 2) - 1.0).abs() < 1e-9);
/// ```
pub struct FreqDistanceMetric<K, C = FreqComparator> {
    name: String,
    extractor: FreqExtractor<K>,
    comparator: C,
}

impl<K, C: RowComparator<u64>> FreqDistanceMetric<K, C> {
    /// Constructs a metric from a display name, an extractor and a comparator
    pub fn new<F>(name: &str, extractor: F, comparator: C) -> Self
    where
        F: Fn(&GeneSet) -> Frequencies<K> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            extractor: Box::new(extractor),
            comparator,
        }
    }
}

impl FreqDistanceMetric<String> {
    /// Cosine distance over the number of genes associated with each trait
    pub fn cosine_over_traits() -> Self {
        Self::new(
            "Cosine distance over trait frequencies",
            extract_trait_frequencies,
            FreqComparator::Cosine(EmptySetPolicy::Zero),
        )
    }
}

impl<K: Eq + Hash + Clone, C: RowComparator<u64>> DistanceMetric for FreqDistanceMetric<K, C> {
    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn compute(&self, gene_sets: &[GeneSet]) -> GsdResult<Vec<f64>> {
        let attributes = to_attribute_map(gene_sets, &self.extractor)?;
        let matrix = to_freq_matrix(&attributes);
        debug!("{}: {:?} frequency matrix", self.name, matrix.dim());

        let rows = matrix.row_slices();
        Ok(calc_pairwise_distances(&rows, |a, b| {
            self.comparator.compare(a, b)
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::distance::vectorize::extract_traits;
    use crate::gene_set::GeneAnnotation;

    fn gene_sets() -> Vec<GeneSet> {
        vec![
            GeneSet::new("SetA", [8908u32, 2998, 2997]),
            GeneSet::new("SetB", [5507u32, 8908, 2998]),
            GeneSet::new("SetC", [2998u32, 2997, 2992]),
        ]
    }

    fn has_equal_elements(actual: &[f64], expected: &[f64], epsilon: f64) -> bool {
        actual.len() == expected.len()
            && actual
                .iter()
                .zip(expected)
                .all(|(a, b)| (a - b).abs() < epsilon)
    }

    #[test]
    fn euclidean() {
        let d = SetDistanceMetric::minkowski(2.0).unwrap().calc(&gene_sets()).unwrap();
        assert!(has_equal_elements(d.as_slice(), &[1.414, 1.414, 2.0], 0.001));
    }

    #[test]
    fn jaccard_distances() {
        let d = SetDistanceMetric::jaccard().calc(&gene_sets()).unwrap();
        assert!(has_equal_elements(d.as_slice(), &[0.5, 0.5, 0.8], 0.001));
    }

    #[test]
    fn kappa_distances() {
        let d = SetDistanceMetric::kappa().calc(&gene_sets()).unwrap();
        assert!(has_equal_elements(d.as_slice(), &[0.833, 0.833, 1.666], 0.001));
    }

    #[test]
    fn overlap_distances() {
        let d = SetDistanceMetric::overlap().calc(&gene_sets()).unwrap();
        // 2 shared genes of 3 for every pair except B-C with only 1
        assert!(has_equal_elements(
            d.as_slice(),
            &[1.0 / 3.0, 1.0 / 3.0, 2.0 / 3.0],
            1e-9
        ));
    }

    #[test]
    fn display_names() {
        assert_eq!(
            SetDistanceMetric::minkowski(2.0).unwrap().display_name(),
            "Minkowski distance (p=2)"
        );
        assert_eq!(
            SetDistanceMetric::minkowski(1.5).unwrap().display_name(),
            "Minkowski distance (p=1.5)"
        );
        assert_eq!(SetDistanceMetric::jaccard().display_name(), "Jaccard distance");
        assert_eq!(SetDistanceMetric::kappa().display_name(), "Kappa distance");
    }

    #[test]
    fn invalid_minkowski_order() {
        assert!(SetDistanceMetric::minkowski(0.5).is_err());
        assert!(SetDistanceMetric::minkowski(f64::NAN).is_err());
        assert!(SetDistanceMetric::minkowski(f64::INFINITY).is_err());
    }

    #[test]
    fn minkowski_counts_differences() {
        let a = [true, false, true, false, true, true];
        let b = [false, true, true, false, false, true];
        // differ at 3 positions
        assert!((minkowski(&a, &b, 2.0) - 3f64.sqrt()).abs() < 1e-12);
        assert!((minkowski(&a, &b, 1.0) - 3.0).abs() < 1e-12);
        assert!(minkowski(&a, &a, 2.0).abs() < 1e-12);
        assert!(minkowski(&[], &[], 2.0).abs() < 1e-12);
    }

    #[test]
    fn jaccard_boundaries() {
        let a = [true, true, false, false];
        let b = [false, false, true, true];
        assert!((jaccard(&a, &a, EmptySetPolicy::Zero)).abs() < f64::EPSILON);
        assert!((jaccard(&a, &b, EmptySetPolicy::Zero) - 1.0).abs() < f64::EPSILON);
        assert!((jaccard(&a, &b, EmptySetPolicy::Zero) - jaccard(&b, &a, EmptySetPolicy::Zero)).abs() < f64::EPSILON);

        let empty = [false, false, false, false];
        assert!(jaccard(&empty, &empty, EmptySetPolicy::Zero).abs() < f64::EPSILON);
        assert!(jaccard(&empty, &empty, EmptySetPolicy::Undefined).is_nan());
        assert!((jaccard(&empty, &a, EmptySetPolicy::Undefined) - 1.0).abs() < f64::EPSILON);
        assert!(jaccard(&[], &[], EmptySetPolicy::Zero).abs() < f64::EPSILON);
    }

    #[test]
    fn overlap_boundaries() {
        assert!((overlap_coefficient(&[true, false, false], &[true, true, false]) - 1.0).abs() < f64::EPSILON);
        assert!(overlap_coefficient(&[false, false, true], &[true, true, false]).abs() < f64::EPSILON);
        assert!(overlap_coefficient(&[false, false, false], &[true, true, false]).is_nan());
        assert!(overlap_distance(&[], &[]).is_nan());
    }

    #[test]
    fn kappa_boundaries() {
        let a = [true, false, true, false];
        assert!((kappa_distance(&a, &a)).abs() < 1e-12);
        let inverse = [false, true, false, true];
        assert!((kappa_distance(&a, &inverse) - 2.0).abs() < 1e-12);
        // constant and identical rows have no agreement beyond chance
        assert!(cohen_kappa(&[true, true], &[true, true]).is_nan());
        assert!(cohen_kappa(&[], &[]).is_nan());
    }

    #[test]
    fn cosine_boundaries() {
        assert!(cosine(&[1, 2, 0], &[2, 4, 0], EmptySetPolicy::Zero).abs() < 1e-12);
        assert!((cosine(&[1, 0], &[0, 3], EmptySetPolicy::Zero) - 1.0).abs() < 1e-12);
        assert!(cosine(&[0, 0], &[0, 0], EmptySetPolicy::Zero).abs() < f64::EPSILON);
        assert!(cosine(&[0, 0], &[0, 0], EmptySetPolicy::Undefined).is_nan());
        assert!(cosine(&[0, 0], &[1, 0], EmptySetPolicy::Zero).is_nan());
    }

    #[test]
    fn empty_sets_continue_computation() {
        let sets = vec![
            GeneSet::new("A", [1u32, 2]),
            GeneSet::new("B", Vec::<u32>::new()),
            GeneSet::new("C", [2u32]),
        ];
        let d = SetDistanceMetric::overlap().calc(&sets).unwrap();
        assert!(d.get(0, 1).is_nan());
        assert!(d.get(0, 2).abs() < f64::EPSILON);
        assert!(d.get(1, 2).is_nan());
        assert_eq!(d.count_undefined(), 2);

        let all_empty = vec![
            GeneSet::new("A", Vec::<u32>::new()),
            GeneSet::new("B", Vec::<u32>::new()),
        ];
        let d = SetDistanceMetric::jaccard().calc(&all_empty).unwrap();
        assert_eq!(d.as_slice(), &[0.0]);
        let d = SetDistanceMetric::minkowski(2.0).unwrap().calc(&all_empty).unwrap();
        assert_eq!(d.as_slice(), &[0.0]);
    }

    #[test]
    fn trait_based_jaccard() {
        let anno = |t: &[&str]| GeneAnnotation {
            traits: t.iter().map(|s| (*s).to_string()).collect(),
            description: None,
        };
        let sets = vec![
            GeneSet::new("A", [1u32, 2])
                .with_annotation(1u32, anno(&["height"]))
                .with_annotation(2u32, anno(&["BMI"])),
            GeneSet::new("B", [3u32]).with_annotation(3u32, anno(&["height", "BMI"])),
            GeneSet::new("C", [4u32]).with_annotation(4u32, anno(&["asthma"])),
        ];
        let metric = SetDistanceMetric::new(
            "Jaccard distance over traits",
            extract_traits,
            SetComparator::Jaccard(EmptySetPolicy::Zero),
        );
        let d = metric.calc(&sets).unwrap();
        assert_eq!(d.as_slice(), &[0.0, 1.0, 1.0]);
        // the gene based metric sees three disjoint sets
        let d = SetDistanceMetric::jaccard().calc(&sets).unwrap();
        assert_eq!(d.as_slice(), &[1.0, 1.0, 1.0]);
    }

    /// Number of positions in which the rows differ
    struct Hamming;

    impl RowComparator<bool> for Hamming {
        fn compare(&self, a: &[bool], b: &[bool]) -> f64 {
            f64_from_usize(a.iter().zip(b).filter(|(x, y)| x != y).count())
        }
    }

    /// Euclidean distance of the counts
    struct Euclid;

    impl RowComparator<u64> for Euclid {
        fn compare(&self, a: &[u64], b: &[u64]) -> f64 {
            a.iter()
                .zip(b)
                .map(|(x, y)| (x.abs_diff(*y) as f64).powi(2))
                .sum::<f64>()
                .sqrt()
        }
    }

    #[test]
    fn custom_comparators() {
        let metric = SetDistanceMetric::new("Hamming distance", extract_genes, Hamming);
        let d = metric.calc(&gene_sets()).unwrap();
        assert_eq!(metric.display_name(), "Hamming distance");
        assert_eq!(d.as_slice(), &[2.0, 2.0, 4.0]);

        let anno = |t: &[&str]| GeneAnnotation {
            traits: t.iter().map(|s| (*s).to_string()).collect(),
            description: None,
        };
        let sets = vec![
            GeneSet::new("A", [1u32, 2])
                .with_annotation(1u32, anno(&["height"]))
                .with_annotation(2u32, anno(&["height"])),
            GeneSet::new("B", [3u32]).with_annotation(3u32, anno(&["BMI"])),
        ];
        let metric = FreqDistanceMetric::new("Euclidean trait distance", extract_trait_frequencies, Euclid);
        let d = metric.calc(&sets).unwrap();
        assert!((d.get(0, 1) - 5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn idempotent() {
        let sets = gene_sets();
        let metric = SetDistanceMetric::kappa();
        let first = metric.calc(&sets).unwrap();
        let second = metric.calc(&sets).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn symmetric_order() {
        let mut sets = gene_sets();
        let forward = SetDistanceMetric::jaccard().calc(&sets).unwrap();
        sets.reverse();
        let backward = SetDistanceMetric::jaccard().calc(&sets).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert!((forward.get(i, j) - backward.get(2 - i, 2 - j)).abs() < 1e-12);
            }
        }
    }
}
