//! Distance metrics backed by external engines
//!
//! The actual scoring is done by collaborators outside of this crate:
//!
//! - [`TermSimilarity`]: a semantic similarity engine for GO terms
//! - [`EmbeddingModel`]: a word embedding model, e.g. word2vec trained on PubMed
//!
//! Errors of the engines are wrapped in [`GsdError::External`] and abort
//! the calculation. They are never retried.
use std::error::Error;
use std::fmt::Display;

use tracing::{debug, trace};

use crate::distance::vectorize::{extract_go_terms, to_attribute_map};
use crate::distance::{try_calc_pairwise_distances, DistanceMetric};
use crate::gene_set::{GeneSet, GoType};
use crate::matrix::Matrix;
use crate::ordered_set::OrderedSet;
use crate::{f64_from_usize, GsdError, GsdResult, UNDEFINED_DISTANCE};

/// Semantic similarity of two GO terms
///
/// # Examples
///
/// ```
/// use gsd::distance::external::{GoMeasure, TermSimilarity};
/// use gsd::gene_set::GoType;
///
/// /// Terms are only similar to themselves
/// struct Identity;
///
/// impl TermSimilarity for Identity {
///     type Error = std::convert::Infallible;
///
///     fn similarity(
///         &self,
///         a: &str,
///         b: &str,
///         _go_type: GoType,
///         _measure: GoMeasure,
///     ) -> Result<f64, Self::Error> {
///         Ok(if a == b { 1.0 } else { 0.0 })
///     }
/// }
/// ```
pub trait TermSimilarity {
    /// Error type of the engine
    type Error: Error + Send + Sync + 'static;

    /// Returns the similarity of two terms of the same namespace, between `0` and `1`
    ///
    /// # Errors
    ///
    /// Any failure of the engine, e.g. a missing term or a network error
    fn similarity(
        &self,
        a: &str,
        b: &str,
        go_type: GoType,
        measure: GoMeasure,
    ) -> Result<f64, Self::Error>;
}

/// Measure of the semantic similarity of two GO terms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GoMeasure {
    /// Graph based measure from [Wang JZ, et. al., Bioinformatics (2007)](https://pubmed.ncbi.nlm.nih.gov/17344234/)
    #[default]
    Wang,
    /// Information content of the most informative common ancestor
    Resnik,
    /// Lin's normalized information content measure
    Lin,
    /// Relevance similarity
    Rel,
    /// Jiang and Conrath
    Jiang,
}

impl Display for GoMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GoMeasure::Wang => "Wang",
            GoMeasure::Resnik => "Resnik",
            GoMeasure::Lin => "Lin",
            GoMeasure::Rel => "Rel",
            GoMeasure::Jiang => "Jiang",
        };
        write!(f, "{name}")
    }
}

impl TryFrom<&str> for GoMeasure {
    type Error = GsdError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "wang" => Ok(GoMeasure::Wang),
            "resnik" => Ok(GoMeasure::Resnik),
            "lin" => Ok(GoMeasure::Lin),
            "rel" => Ok(GoMeasure::Rel),
            "jiang" => Ok(GoMeasure::Jiang),
            _ => Err(GsdError::InvalidParameter(format!("unknown GO measure {value}"))),
        }
    }
}

/// Combines the pairwise term similarities of two term sets into one score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Combine {
    /// Maximum of all term similarities
    Max,
    /// Average of all term similarities
    Avg,
    /// Larger of the average row and the average column maximum
    RcMax,
    /// Best-match average
    #[default]
    Bma,
}

impl Combine {
    fn row_maxes(m: &Matrix<f64>) -> Vec<f64> {
        m.rows()
            .map(|row| row.iter().fold(f64::MIN, |max, v| max.max(*v)))
            .collect()
    }

    fn col_maxes(m: &Matrix<f64>) -> Vec<f64> {
        let (_, cols) = m.dim();
        let mut maxes = vec![f64::MIN; cols];
        for row in m.rows() {
            for (max, v) in maxes.iter_mut().zip(row) {
                *max = max.max(*v);
            }
        }
        maxes
    }

    /// Combines the similarity matrix of two term sets
    ///
    /// Returns [`UNDEFINED_DISTANCE`] if one of the sets is empty.
    ///
    /// ```
    /// use gsd::distance::external::Combine;
    /// use gsd::matrix::Matrix;
    ///
    /// let m = Matrix::new(2, 3, vec![
    ///     1.0, 0.2, 0.0,
    ///     0.4, 0.6, 0.2,
    /// ]);
    /// assert_eq!(Combine::Max.combine(&m), 1.0);
    /// assert!((Combine::Avg.combine(&m) - 0.4).abs() < 1e-9);
    /// // row maxes 1.0, 0.6 and column maxes 1.0, 0.6, 0.2
    /// assert!((Combine::Bma.combine(&m) - 0.68).abs() < 1e-9);
    /// ```
    pub fn combine(&self, m: &Matrix<f64>) -> f64 {
        let (rows, cols) = m.dim();
        if rows == 0 || cols == 0 {
            return UNDEFINED_DISTANCE;
        }
        let rows_f = f64_from_usize(rows);
        let cols_f = f64_from_usize(cols);
        match self {
            Combine::Max => Self::row_maxes(m).into_iter().fold(f64::MIN, f64::max),
            Combine::Avg => m.rows().flatten().sum::<f64>() / (rows_f * cols_f),
            Combine::RcMax => {
                let rows_avg = Self::row_maxes(m).iter().sum::<f64>() / rows_f;
                let cols_avg = Self::col_maxes(m).iter().sum::<f64>() / cols_f;
                rows_avg.max(cols_avg)
            }
            Combine::Bma => {
                let total = Self::row_maxes(m).iter().sum::<f64>()
                    + Self::col_maxes(m).iter().sum::<f64>();
                total / (rows_f + cols_f)
            }
        }
    }
}

impl Display for Combine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Combine::Max => "max",
            Combine::Avg => "avg",
            Combine::RcMax => "rcmax",
            Combine::Bma => "BMA",
        };
        write!(f, "{name}")
    }
}

impl TryFrom<&str> for Combine {
    type Error = GsdError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "max" => Ok(Combine::Max),
            "avg" => Ok(Combine::Avg),
            "rcmax" => Ok(Combine::RcMax),
            "bma" => Ok(Combine::Bma),
            _ => Err(GsdError::InvalidParameter(format!("unknown combine method {value}"))),
        }
    }
}

/// `1 − similarity` of the GO terms of two gene sets
///
/// Only the terms of one namespace are compared. Gene sets without any
/// term in the namespace cannot be compared and get [`UNDEFINED_DISTANCE`].
///
/// # Examples
///
/// ```
/// use gsd::{DistanceMetric, GeneSet};
/// use gsd::gene_set::{GoInfo, GoType};
/// use gsd::distance::external::{Combine, GoMeasure, GoSimDistanceMetric, TermSimilarity};
///
/// struct Identity;
///
/// impl TermSimilarity for Identity {
///     type Error = std::convert::Infallible;
///     fn similarity(&self, a: &str, b: &str, _: GoType, _: GoMeasure) -> Result<f64, Self::Error> {
///         Ok(if a == b { 1.0 } else { 0.0 })
///     }
/// }
///
/// let go = |ids: &[&str]| {
///     let mut info = GoInfo::default();
///     for id in ids {
///         info.category_mut(GoType::CellularComponent).insert(id, "", "");
///     }
///     info
/// };
///
/// let sets = vec![
///     GeneSet::new("A", [1u32]).with_go_info(go(&["GO:1", "GO:2"])),
///     GeneSet::new("B", [2u32]).with_go_info(go(&["GO:2"])),
/// ];
///
/// let metric = GoSimDistanceMetric::new(Identity, GoType::CellularComponent);
/// assert_eq!(metric.display_name(), "GO-distance (go_type=CC, measure=Wang, combine=BMA)");
/// // best-match average: (1 + 0 + 1) / 3
/// assert!((metric.calc(&sets).unwrap()[0] - 1.0 / 3.0).abs() < 1e-9);
///
/// let metric = metric.combine(Combine::Max);
/// assert_eq!(metric.calc(&sets).unwrap().as_slice(), &[0.0]);
/// ```
pub struct GoSimDistanceMetric<T> {
    engine: T,
    go_type: GoType,
    measure: GoMeasure,
    combine: Combine,
}

impl<T: TermSimilarity> GoSimDistanceMetric<T> {
    /// Constructs a metric for the terms of `go_type`, using the default measure and combine method
    pub fn new(engine: T, go_type: GoType) -> Self {
        Self {
            engine,
            go_type,
            measure: GoMeasure::default(),
            combine: Combine::default(),
        }
    }

    /// Uses a different term similarity measure
    #[must_use]
    pub fn measure(mut self, measure: GoMeasure) -> Self {
        self.measure = measure;
        self
    }

    /// Uses a different method to combine term similarities
    #[must_use]
    pub fn combine(mut self, combine: Combine) -> Self {
        self.combine = combine;
        self
    }

    /// Returns the similarity of two sets of terms
    ///
    /// # Errors
    ///
    /// [`GsdError::External`] if the engine fails for any pair of terms
    pub fn similarity(&self, a: &OrderedSet<String>, b: &OrderedSet<String>) -> GsdResult<f64> {
        let mut v = Vec::with_capacity(a.len() * b.len());
        for t1 in a {
            for t2 in b {
                v.push(
                    self.engine
                        .similarity(t1, t2, self.go_type, self.measure)
                        .map_err(GsdError::external)?,
                );
            }
        }
        let m = Matrix::new(a.len(), b.len(), v);
        Ok(self.combine.combine(&m))
    }
}

impl<T: TermSimilarity> DistanceMetric for GoSimDistanceMetric<T> {
    fn display_name(&self) -> String {
        format!(
            "GO-distance (go_type={}, measure={}, combine={})",
            self.go_type, self.measure, self.combine
        )
    }

    fn compute(&self, gene_sets: &[GeneSet]) -> GsdResult<Vec<f64>> {
        let terms = to_attribute_map(gene_sets, extract_go_terms(self.go_type))?;
        let terms: Vec<&OrderedSet<String>> = terms.values().collect();
        debug!(
            "Comparing {} terms of {} gene sets",
            terms.iter().map(|t| t.len()).sum::<usize>(),
            terms.len()
        );
        try_calc_pairwise_distances(&terms, |a, b| Ok(1.0 - self.similarity(a, b)?))
    }
}

/// A word embedding model
pub trait EmbeddingModel {
    /// Error type of the model
    type Error: Error + Send + Sync + 'static;

    /// Returns `true` if the model has a vector for `word`
    fn contains(&self, word: &str) -> bool;

    /// Returns the vector of `word`
    ///
    /// # Errors
    ///
    /// Any failure of the model, e.g. if `word` is not part of the vocabulary
    fn vector(&self, word: &str) -> Result<Vec<f64>, Self::Error>;
}

/// English stop words that are removed from free text
pub const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
    "just", "don", "should", "now",
];

/// Splits free text into lower-cased words without stop words
///
/// ```
/// use gsd::distance::external::tokenize;
///
/// assert_eq!(
///     tokenize("The lysyl hydroxylase (LH) is an enzyme."),
///     vec!["lysyl", "hydroxylase", "lh", "enzyme"]
/// );
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .map(|word| word.trim_matches('-').to_lowercase())
        .filter(|word| !word.is_empty() && !STOP_WORDS.contains(&word.as_str()))
        .collect()
}

fn in_vocabulary<M: EmbeddingModel + ?Sized>(words: Vec<String>, model: &M) -> Vec<String> {
    let before = words.len();
    let words: Vec<String> = words.into_iter().filter(|w| model.contains(w)).collect();
    if words.len() < before {
        trace!("{} words are not part of the vocabulary", before - words.len());
    }
    words
}

/// Returns the lower-cased gene symbols that are part of the vocabulary
pub fn gene_symbol_words<M: EmbeddingModel + ?Sized>(set: &GeneSet, model: &M) -> Vec<String> {
    in_vocabulary(
        set.gene_symbols().iter().map(|s| s.to_lowercase()).collect(),
        model,
    )
}

/// Returns the words of the summary that are part of the vocabulary
pub fn summary_words<M: EmbeddingModel + ?Sized>(set: &GeneSet, model: &M) -> Vec<String> {
    in_vocabulary(tokenize(set.summary()), model)
}

/// Returns the words of all GO term names of the namespaces
pub fn go_name_words<M: EmbeddingModel + ?Sized>(
    set: &GeneSet,
    model: &M,
    go_types: &[GoType],
) -> Vec<String> {
    let words = go_types
        .iter()
        .flat_map(|kind| set.go_info().category(*kind).names().iter())
        .flat_map(|name| tokenize(name))
        .collect();
    in_vocabulary(words, model)
}

/// Returns the words of all GO term definitions of the namespaces
pub fn go_definition_words<M: EmbeddingModel + ?Sized>(
    set: &GeneSet,
    model: &M,
    go_types: &[GoType],
) -> Vec<String> {
    let words = go_types
        .iter()
        .flat_map(|kind| set.go_info().category(*kind).definitions().iter())
        .flat_map(|definition| tokenize(definition))
        .collect();
    in_vocabulary(words, model)
}

/// Returns the gene symbol, summary, GO name and GO definition words of all namespaces
pub fn all_words<M: EmbeddingModel + ?Sized>(set: &GeneSet, model: &M) -> Vec<String> {
    let mut words = gene_symbol_words(set, model);
    words.extend(summary_words(set, model));
    words.extend(go_name_words(set, model, &GoType::ALL));
    words.extend(go_definition_words(set, model, &GoType::ALL));
    words
}

fn sum_vectors<M: EmbeddingModel + ?Sized>(words: &[String], model: &M) -> GsdResult<Vec<f64>> {
    let mut sum: Vec<f64> = Vec::new();
    for word in words {
        let v = model.vector(word).map_err(GsdError::external)?;
        if sum.is_empty() {
            sum = v;
        } else if sum.len() == v.len() {
            sum.iter_mut().zip(v).for_each(|(s, x)| *s += x);
        } else {
            return Err(GsdError::external(format!(
                "vector of {word} has {} dimensions, expected {}",
                v.len(),
                sum.len()
            )));
        }
    }
    Ok(sum)
}

/// Cosine distance of the summed word vectors of both word lists
///
/// If one of the lists is empty, or one sum is a zero vector,
/// the distance is [`UNDEFINED_DISTANCE`].
///
/// # Errors
///
/// [`GsdError::External`] if the model fails or returns vectors of different length
pub fn cosine_distance_of<M: EmbeddingModel + ?Sized>(
    words_a: &[String],
    words_b: &[String],
    model: &M,
) -> GsdResult<f64> {
    if words_a.is_empty() || words_b.is_empty() {
        return Ok(UNDEFINED_DISTANCE);
    }
    let a = sum_vectors(words_a, model)?;
    let b = sum_vectors(words_b, model)?;
    if a.len() != b.len() {
        return Err(GsdError::external(format!(
            "word vectors have different dimensions: {} and {}",
            a.len(),
            b.len()
        )));
    }

    let dot: f64 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(UNDEFINED_DISTANCE);
    }
    Ok(1.0 - dot / (norm_a * norm_b))
}

type WordExtractor<M> = Box<dyn Fn(&GeneSet, &M) -> Vec<String> + Send + Sync>;
type WordDistance<M> = Box<dyn Fn(&[String], &[String], &M) -> GsdResult<f64> + Send + Sync>;

/// Distance of gene sets based on word embeddings
///
/// Words are extracted from every gene set with a word extractor, e.g.
/// [`gene_symbol_words`], and the word lists are compared pairwise with
/// a word distance, e.g. [`cosine_distance_of`].
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use gsd::{DistanceMetric, GeneSet};
/// use gsd::distance::external::{cosine_distance_of, gene_symbol_words, EmbeddingModel, NlpDistanceMetric};
///
/// struct Model(HashMap<&'static str, Vec<f64>>);
///
/// impl EmbeddingModel for Model {
///     type Error = std::fmt::Error;
///     fn contains(&self, word: &str) -> bool {
///         self.0.contains_key(word)
///     }
///     fn vector(&self, word: &str) -> Result<Vec<f64>, Self::Error> {
///         self.0.get(word).cloned().ok_or(std::fmt::Error)
///     }
/// }
///
/// let model = Model(HashMap::from([
///     ("gys1", vec![1.0, 0.0]),
///     ("gys2", vec![1.0, 0.0]),
///     ("cd8a", vec![0.0, 1.0]),
/// ]));
///
/// let metric = NlpDistanceMetric::new(
///     "Cosine distance over gene symbols",
///     model,
///     gene_symbol_words,
///     cosine_distance_of,
/// );
///
/// let sets = vec![
///     GeneSet::new("A", [2997u32]).with_symbols(["GYS1"]),
///     GeneSet::new("B", [2998u32]).with_symbols(["GYS2"]),
///     GeneSet::new("C", [925u32]).with_symbols(["CD8A"]),
/// ];
/// let d = metric.calc(&sets).unwrap();
/// assert!(d.get(0, 1).abs() < 1e-9);
/// assert!((d.get(0, 2) - 1.0).abs() < 1e-9);
/// ```
pub struct NlpDistanceMetric<M> {
    name: String,
    model: M,
    extractor: WordExtractor<M>,
    distance: WordDistance<M>,
}

impl<M: EmbeddingModel> NlpDistanceMetric<M> {
    /// Constructs a metric from a display name, a model, a word extractor and a word distance
    pub fn new<E, D>(name: &str, model: M, extractor: E, distance: D) -> Self
    where
        E: Fn(&GeneSet, &M) -> Vec<String> + Send + Sync + 'static,
        D: Fn(&[String], &[String], &M) -> GsdResult<f64> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            model,
            extractor: Box::new(extractor),
            distance: Box::new(distance),
        }
    }

    /// Returns the embedding model
    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: EmbeddingModel> DistanceMetric for NlpDistanceMetric<M> {
    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn compute(&self, gene_sets: &[GeneSet]) -> GsdResult<Vec<f64>> {
        let words = to_attribute_map(gene_sets, |set| (self.extractor)(set, &self.model))?;
        for (name, w) in words.iter() {
            if w.is_empty() {
                debug!("{name} has no words in the vocabulary");
            }
        }
        let words: Vec<&Vec<String>> = words.values().collect();
        try_calc_pairwise_distances(&words, |a, b| {
            (self.distance)(a.as_slice(), b.as_slice(), &self.model)
        })
    }
}
