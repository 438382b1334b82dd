//! Conversion of gene set attributes into feature matrices
//!
//! Set based metrics do not look at [`GeneSet`]s directly. An extractor
//! pulls the relevant attribute out of each gene set (its genes, the traits
//! associated with its genes, …) into an [`AttributeMap`]. The attribute
//! map is then turned into a [`BinaryMatrix`] or [`FreqMatrix`] with one
//! row per gene set and one column per distinct feature.
//!
//! The columns are the union of all features in the order in which they
//! are first seen, so the same input always produces the same matrix.
//!
//! # Examples
//!
//! ```
//! use gsd::GeneSet;
//! use gsd::distance::vectorize::{extract_genes, to_attribute_map, to_binary_matrix};
//!
//! let sets = vec![
//!     GeneSet::new("SetA", [8908u32, 2998, 2997]),
//!     GeneSet::new("SetB", [5507u32, 8908, 2998]),
//!     GeneSet::new("SetC", [2998u32, 2997, 2992]),
//! ];
//!
//! let attributes = to_attribute_map(&sets, extract_genes).unwrap();
//! let matrix = to_binary_matrix(&attributes);
//!
//! let columns: Vec<u32> = matrix.features().iter().map(|g| g.as_u32()).collect();
//! assert_eq!(columns, vec![8908, 2998, 2997, 5507, 2992]);
//! assert_eq!(matrix.values().row(1), &[true, true, false, true, false]);
//! ```
use std::collections::HashMap;
use std::hash::Hash;

use tracing::trace;

use crate::gene_set::{GeneId, GeneSet, GoType};
use crate::matrix::Matrix;
use crate::ordered_set::OrderedSet;
use crate::{GsdError, GsdResult};

/// Extracted attributes of each gene set, keyed by gene set name
///
/// Iteration follows the order of the gene sets.
#[derive(Debug, Clone)]
pub struct AttributeMap<A> {
    entries: Vec<(String, A)>,
    index: HashMap<String, usize>,
}

impl<A> Default for AttributeMap<A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<A> AttributeMap<A> {
    /// Constructs a new, empty [`AttributeMap`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the attributes of a gene set
    ///
    /// # Errors
    ///
    /// [`GsdError::DuplicateName`] if the name is already present
    pub fn insert(&mut self, name: &str, attributes: A) -> GsdResult<()> {
        if self.index.contains_key(name) {
            return Err(GsdError::DuplicateName(name.to_string()));
        }
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push((name.to_string(), attributes));
        Ok(())
    }

    /// Returns the attributes of the gene set with the given name
    pub fn get(&self, name: &str) -> Option<&A> {
        self.index.get(name).map(|idx| &self.entries[*idx].1)
    }

    /// Returns the number of gene sets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, attributes)` in gene set order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &A)> {
        self.entries.iter().map(|(name, attr)| (name.as_str(), attr))
    }

    /// Iterates the gene set names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates the attributes in gene set order
    pub fn values(&self) -> impl Iterator<Item = &A> {
        self.entries.iter().map(|(_, attr)| attr)
    }

    /// Returns a new map with transformed attributes and the same names and order
    pub fn map_values<B, F: FnMut(&A) -> B>(&self, mut f: F) -> AttributeMap<B> {
        AttributeMap {
            entries: self
                .entries
                .iter()
                .map(|(name, attr)| (name.clone(), f(attr)))
                .collect(),
            index: self.index.clone(),
        }
    }
}

/// Counts of features, iterated in first-seen order
///
/// # Examples
///
/// ```
/// use gsd::distance::vectorize::Frequencies;
///
/// let mut freq = Frequencies::new();
/// freq.add("height");
/// freq.add("BMI");
/// freq.add("height");
///
/// assert_eq!(freq.get(&"height"), 2);
/// assert_eq!(freq.get(&"asthma"), 0);
/// let keys: Vec<_> = freq.iter().map(|(k, _)| *k).collect();
/// assert_eq!(keys, vec!["height", "BMI"]);
/// ```
#[derive(Debug, Clone)]
pub struct Frequencies<K> {
    keys: OrderedSet<K>,
    counts: Vec<u64>,
}

impl<K> Default for Frequencies<K> {
    fn default() -> Self {
        Self {
            keys: OrderedSet::default(),
            counts: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> Frequencies<K> {
    /// Constructs new, empty [`Frequencies`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the count of `key` by one
    pub fn add(&mut self, key: K) {
        self.add_count(key, 1);
    }

    /// Increments the count of `key` by `count`
    pub fn add_count(&mut self, key: K, count: u64) {
        match self.keys.index_of(&key) {
            Some(idx) => self.counts[idx] += count,
            None => {
                self.keys.insert(key);
                self.counts.push(count);
            }
        }
    }

    /// Returns the count of `key`, `0` if it is not present
    pub fn get(&self, key: &K) -> u64 {
        self.keys.index_of(key).map_or(0, |idx| self.counts[idx])
    }

    /// Returns the number of distinct keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no key was added
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates `(key, count)` in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.keys.iter().zip(self.counts.iter().copied())
    }
}

/// A matrix of gene sets (rows) and features (columns)
#[derive(Debug)]
pub struct FeatureMatrix<K, V> {
    names: Vec<String>,
    features: OrderedSet<K>,
    values: Matrix<V>,
}

/// Gene set × feature membership
pub type BinaryMatrix<K> = FeatureMatrix<K, bool>;

/// Gene set × feature counts
pub type FreqMatrix<K> = FeatureMatrix<K, u64>;

impl<K, V> FeatureMatrix<K, V> {
    /// The gene set names, one per row
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The features, one per column
    pub fn features(&self) -> &OrderedSet<K> {
        &self.features
    }

    /// The cell values
    pub fn values(&self) -> &Matrix<V> {
        &self.values
    }

    /// Returns `(rows, columns)`
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Returns all rows as slices, in gene set order
    pub fn row_slices(&self) -> Vec<&[V]> {
        self.values.row_slices()
    }
}

/// Applies `extractor` to every gene set
///
/// # Errors
///
/// [`GsdError::DuplicateName`] if two gene sets share the same name
pub fn to_attribute_map<A, F>(gene_sets: &[GeneSet], extractor: F) -> GsdResult<AttributeMap<A>>
where
    F: Fn(&GeneSet) -> A,
{
    let mut map = AttributeMap::new();
    for set in gene_sets {
        map.insert(set.name(), extractor(set))?;
    }
    Ok(map)
}

/// Builds the binary membership matrix of all features
///
/// A gene set without any feature results in an all-`false` row. If no
/// gene set has a feature, the matrix has zero columns.
pub fn to_binary_matrix<K: Eq + Hash + Clone>(attributes: &AttributeMap<OrderedSet<K>>) -> BinaryMatrix<K> {
    let mut features = OrderedSet::new();
    for attr in attributes.values() {
        features.extend(attr.iter().cloned());
    }
    trace!("binary matrix with {} features", features.len());

    let mut data = Vec::with_capacity(attributes.len() * features.len());
    for attr in attributes.values() {
        data.extend(features.iter().map(|feature| attr.contains(feature)));
    }
    FeatureMatrix {
        names: attributes.names().map(str::to_string).collect(),
        values: Matrix::new(attributes.len(), features.len(), data),
        features,
    }
}

/// Builds the frequency matrix of all features
///
/// Missing features have a count of `0`.
pub fn to_freq_matrix<K: Eq + Hash + Clone>(attributes: &AttributeMap<Frequencies<K>>) -> FreqMatrix<K> {
    let mut features = OrderedSet::new();
    for attr in attributes.values() {
        features.extend(attr.iter().map(|(key, _)| key.clone()));
    }
    trace!("frequency matrix with {} features", features.len());

    let mut data = Vec::with_capacity(attributes.len() * features.len());
    for attr in attributes.values() {
        data.extend(features.iter().map(|feature| attr.get(feature)));
    }
    FeatureMatrix {
        names: attributes.names().map(str::to_string).collect(),
        values: Matrix::new(attributes.len(), features.len(), data),
        features,
    }
}

/// Extracts the gene ids of a gene set
pub fn extract_genes(set: &GeneSet) -> OrderedSet<GeneId> {
    set.genes().clone()
}

/// Extracts the gene symbols of a gene set
pub fn extract_gene_symbols(set: &GeneSet) -> OrderedSet<String> {
    set.gene_symbols().clone()
}

/// Extracts all traits associated with any gene of the set
pub fn extract_traits(set: &GeneSet) -> OrderedSet<String> {
    set.annotations()
        .flat_map(|(_, anno)| anno.traits.iter().cloned())
        .collect()
}

/// Counts for each trait how many genes of the set are associated with it
///
/// A trait listed twice for the same gene is counted once.
pub fn extract_trait_frequencies(set: &GeneSet) -> Frequencies<String> {
    let mut freq = Frequencies::new();
    for (_, anno) in set.annotations() {
        let unique: OrderedSet<&String> = anno.traits.iter().collect();
        for t in unique {
            freq.add(t.clone());
        }
    }
    freq
}

/// Returns an extractor of the GO term ids of one namespace
pub fn extract_go_terms(kind: GoType) -> impl Fn(&GeneSet) -> OrderedSet<String> + Send + Sync {
    move |set: &GeneSet| set.go_info().category(kind).ids().clone()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gene_set::GeneAnnotation;

    fn gene_sets() -> Vec<GeneSet> {
        vec![
            GeneSet::new("SetA", [8908u32, 2998, 2997]),
            GeneSet::new("SetB", [5507u32, 8908, 2998]),
            GeneSet::new("SetC", [2998u32, 2997, 2992]),
        ]
    }

    fn trait_anno(traits: &[&str]) -> GeneAnnotation {
        GeneAnnotation {
            traits: traits.iter().map(|t| (*t).to_string()).collect(),
            description: None,
        }
    }

    #[test]
    fn binary_matrix() {
        let map = to_attribute_map(&gene_sets(), extract_genes).unwrap();
        let m = to_binary_matrix(&map);
        assert_eq!(m.dim(), (3, 5));
        assert_eq!(m.names(), &["SetA", "SetB", "SetC"]);
        let rows = m.row_slices();
        assert_eq!(rows[0], &[true, true, true, false, false]);
        assert_eq!(rows[1], &[true, true, false, true, false]);
        assert_eq!(rows[2], &[false, true, true, false, true]);
    }

    #[test]
    fn binary_matrix_is_reproducible() {
        let map = to_attribute_map(&gene_sets(), extract_genes).unwrap();
        let first = to_binary_matrix(&map);
        for _ in 0..10 {
            let next = to_binary_matrix(&map);
            assert_eq!(first.features().as_slice(), next.features().as_slice());
            assert_eq!(first.values(), next.values());
        }
    }

    #[test]
    fn empty_attribute_sets() {
        let sets = vec![
            GeneSet::new("A", [1u32, 2]),
            GeneSet::new("B", Vec::<u32>::new()),
        ];
        let map = to_attribute_map(&sets, extract_genes).unwrap();
        let m = to_binary_matrix(&map);
        assert_eq!(m.row_slices()[1], &[false, false]);

        let sets = vec![
            GeneSet::new("A", Vec::<u32>::new()),
            GeneSet::new("B", Vec::<u32>::new()),
        ];
        let map = to_attribute_map(&sets, extract_genes).unwrap();
        let m = to_binary_matrix(&map);
        assert_eq!(m.dim(), (2, 0));
    }

    #[test]
    fn duplicate_names() {
        let sets = vec![GeneSet::new("A", [1u32]), GeneSet::new("A", [2u32])];
        assert!(matches!(
            to_attribute_map(&sets, extract_genes),
            Err(GsdError::DuplicateName(_))
        ));
    }

    #[test]
    fn trait_extraction() {
        let set = GeneSet::new("A", [1u32, 2, 3])
            .with_annotation(1u32, trait_anno(&["height", "BMI"]))
            .with_annotation(2u32, trait_anno(&["BMI", "BMI"]))
            .with_annotation(3u32, trait_anno(&["asthma"]));
        let traits = extract_traits(&set);
        assert_eq!(
            traits.as_slice(),
            &["height".to_string(), "BMI".to_string(), "asthma".to_string()]
        );

        let freq = extract_trait_frequencies(&set);
        assert_eq!(freq.get(&"BMI".to_string()), 2);
        assert_eq!(freq.get(&"height".to_string()), 1);
        assert_eq!(freq.len(), 3);
    }

    #[test]
    fn frequency_matrix() {
        let sets = vec![
            GeneSet::new("A", [1u32, 2])
                .with_annotation(1u32, trait_anno(&["height"]))
                .with_annotation(2u32, trait_anno(&["height", "BMI"])),
            GeneSet::new("B", [3u32]).with_annotation(3u32, trait_anno(&["asthma"])),
            GeneSet::new("C", [4u32]),
        ];
        let map = to_attribute_map(&sets, extract_trait_frequencies).unwrap();
        let m = to_freq_matrix(&map);
        assert_eq!(
            m.features().as_slice(),
            &["height".to_string(), "BMI".to_string(), "asthma".to_string()]
        );
        let rows = m.row_slices();
        assert_eq!(rows[0], &[2, 1, 0]);
        assert_eq!(rows[1], &[0, 0, 1]);
        assert_eq!(rows[2], &[0, 0, 0]);
    }

    #[test]
    fn attribute_map_transform() {
        let map = to_attribute_map(&gene_sets(), extract_genes).unwrap();
        let sizes = map.map_values(OrderedSet::len);
        let collected: Vec<(&str, &usize)> = sizes.iter().collect();
        assert_eq!(collected, vec![("SetA", &3), ("SetB", &3), ("SetC", &3)]);
        assert_eq!(sizes.get("SetB"), Some(&3));
        assert!(sizes.get("SetD").is_none());
    }
}
