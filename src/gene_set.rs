//! Gene sets and their annotations
//!
//! A [`GeneSet`] is the entity that all distance metrics compare. It is built
//! once by the caller (e.g. from Reactome pathways or literature-derived
//! immune cell signatures) and is never modified by a metric.
use core::fmt::Debug;
use std::collections::HashMap;
use std::fmt::Display;

use crate::ordered_set::OrderedSet;
use crate::{GsdError, DEFAULT_NUM_GENES};

/// A unique identifier for a gene, most likely the NCBI (Entrez) Gene ID
#[derive(Clone, Copy, Default, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub struct GeneId {
    inner: u32,
}

impl GeneId {
    /// Returns the integer representation of the gene id
    pub fn as_u32(&self) -> u32 {
        self.inner
    }
}

impl TryFrom<&str> for GeneId {
    type Error = GsdError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ok(GeneId {
            inner: value.trim().parse::<u32>()?,
        })
    }
}

impl From<u32> for GeneId {
    fn from(inner: u32) -> Self {
        GeneId { inner }
    }
}

impl Display for GeneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NCBI-GeneID:{}", self.inner)
    }
}

/// A set of [`GeneId`]s that keeps the order in which genes were added
pub type Genes = OrderedSet<GeneId>;

/// The three namespaces of the Gene Ontology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoType {
    /// `biological_process`
    BiologicalProcess,
    /// `molecular_function`
    MolecularFunction,
    /// `cellular_component`
    CellularComponent,
}

impl GoType {
    /// All namespaces, in the order used by [`GoInfo`]
    pub const ALL: [GoType; 3] = [
        GoType::BiologicalProcess,
        GoType::MolecularFunction,
        GoType::CellularComponent,
    ];

    /// The short ontology code, as used by ontology similarity engines
    pub fn code(&self) -> &'static str {
        match self {
            GoType::BiologicalProcess => "BP",
            GoType::MolecularFunction => "MF",
            GoType::CellularComponent => "CC",
        }
    }

    /// The namespace as written in GO annotation tables
    pub fn namespace(&self) -> &'static str {
        match self {
            GoType::BiologicalProcess => "biological_process",
            GoType::MolecularFunction => "molecular_function",
            GoType::CellularComponent => "cellular_component",
        }
    }
}

impl TryFrom<&str> for GoType {
    type Error = GsdError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        GoType::ALL
            .into_iter()
            .find(|kind| kind.namespace() == value || kind.code() == value)
            .ok_or_else(|| GsdError::InvalidParameter(format!("unknown GO namespace {value}")))
    }
}

impl Display for GoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single row of a gene to GO-term annotation table
#[derive(Debug, Clone)]
pub struct GoAnnotation {
    /// The annotated gene
    pub gene: GeneId,
    /// GO term id, e.g. `GO:0005978`
    pub go_id: String,
    /// GO term name
    pub name: String,
    /// GO term definition
    pub definition: String,
    /// Namespace of the term
    pub namespace: GoType,
}

/// GO terms of a single namespace
#[derive(Debug, Clone, Default)]
pub struct GoCategory {
    ids: OrderedSet<String>,
    names: OrderedSet<String>,
    definitions: OrderedSet<String>,
}

impl GoCategory {
    /// The GO term ids
    pub fn ids(&self) -> &OrderedSet<String> {
        &self.ids
    }

    /// The GO term names
    pub fn names(&self) -> &OrderedSet<String> {
        &self.names
    }

    /// The GO term definitions
    pub fn definitions(&self) -> &OrderedSet<String> {
        &self.definitions
    }

    /// Returns `true` if the category does not contain any term
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Adds a single term
    pub fn insert(&mut self, go_id: &str, name: &str, definition: &str) {
        self.ids.insert(go_id.to_string());
        self.names.insert(name.to_string());
        self.definitions.insert(definition.to_string());
    }
}

/// GO terms of a gene set, split by namespace
#[derive(Debug, Clone, Default)]
pub struct GoInfo {
    biological_process: GoCategory,
    molecular_function: GoCategory,
    cellular_component: GoCategory,
}

impl GoInfo {
    /// Collects the GO terms of all `genes` from an annotation table
    ///
    /// # Examples
    ///
    /// ```
    /// use gsd::gene_set::{GoAnnotation, GoInfo, GoType};
    /// use gsd::Genes;
    ///
    /// let rows = vec![GoAnnotation {
    ///     gene: 2997u32.into(),
    ///     go_id: "GO:0005978".to_string(),
    ///     name: "glycogen biosynthetic process".to_string(),
    ///     definition: "The chemical reactions resulting in the formation of glycogen".to_string(),
    ///     namespace: GoType::BiologicalProcess,
    /// }];
    /// let genes: Genes = [2997u32.into(), 2998u32.into()].into_iter().collect();
    ///
    /// let info = GoInfo::from_annotations(&genes, &rows);
    /// assert_eq!(info.category(GoType::BiologicalProcess).ids().len(), 1);
    /// assert!(info.category(GoType::CellularComponent).is_empty());
    /// ```
    pub fn from_annotations(genes: &Genes, annotations: &[GoAnnotation]) -> Self {
        let mut info = GoInfo::default();
        for row in annotations.iter().filter(|row| genes.contains(&row.gene)) {
            info.category_mut(row.namespace)
                .insert(&row.go_id, &row.name, &row.definition);
        }
        info
    }

    /// Returns the terms of a single namespace
    pub fn category(&self, kind: GoType) -> &GoCategory {
        match kind {
            GoType::BiologicalProcess => &self.biological_process,
            GoType::MolecularFunction => &self.molecular_function,
            GoType::CellularComponent => &self.cellular_component,
        }
    }

    /// Returns a mutable reference to the terms of a single namespace
    pub fn category_mut(&mut self, kind: GoType) -> &mut GoCategory {
        match kind {
            GoType::BiologicalProcess => &mut self.biological_process,
            GoType::MolecularFunction => &mut self.molecular_function,
            GoType::CellularComponent => &mut self.cellular_component,
        }
    }
}

/// Additional information about a single gene
#[derive(Debug, Clone, Default)]
pub struct GeneAnnotation {
    /// Associated traits, e.g. from GWAS studies
    pub traits: Vec<String>,
    /// Free text description, e.g. the NCBI gene summary
    pub description: Option<String>,
}

/// A named collection of genes and their annotations
///
/// # Examples
///
/// ```
/// use gsd::GeneSet;
///
/// let set = GeneSet::new("Glycogen synthesis", [2997u32, 2998, 8908])
///     .with_symbols(["GYS1", "GYS2", "GYG2"])
///     .with_external("R-HSA-3322077", "Reactome")
///     .with_summary("Glycogen is a branched glucose polymer");
///
/// assert_eq!(set.name(), "Glycogen synthesis");
/// assert_eq!(set.genes().len(), 3);
/// assert!(!set.calculated());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GeneSet {
    name: String,
    external_id: String,
    external_source: String,
    summary: String,
    calculated: bool,
    genes: Genes,
    gene_symbols: OrderedSet<String>,
    go_info: GoInfo,
    annotations: HashMap<GeneId, GeneAnnotation>,
}

impl GeneSet {
    /// Constructs a new gene set from its name and gene ids
    pub fn new<I, G>(name: &str, genes: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<GeneId>,
    {
        let mut set = Genes::with_capacity(DEFAULT_NUM_GENES);
        set.extend(genes.into_iter().map(Into::into));
        Self {
            name: name.to_string(),
            external_id: name.to_string(),
            genes: set,
            ..Default::default()
        }
    }

    /// Sets the gene symbols
    #[must_use]
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gene_symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the free text summary
    #[must_use]
    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }

    /// Sets the external id and source database
    #[must_use]
    pub fn with_external(mut self, external_id: &str, external_source: &str) -> Self {
        self.external_id = external_id.to_string();
        self.external_source = external_source.to_string();
        self
    }

    /// Sets the GO annotation
    #[must_use]
    pub fn with_go_info(mut self, go_info: GoInfo) -> Self {
        self.go_info = go_info;
        self
    }

    /// Adds annotations (traits, description) for a single gene
    #[must_use]
    pub fn with_annotation<G: Into<GeneId>>(mut self, gene: G, annotation: GeneAnnotation) -> Self {
        self.annotations.insert(gene.into(), annotation);
        self
    }

    /// Flags the set as derived from other sets instead of loaded from a source
    #[must_use]
    pub fn with_calculated(mut self, calculated: bool) -> Self {
        self.calculated = calculated;
        self
    }

    /// The unique name of the set
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The id of the set in its source database
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    /// The source database
    pub fn external_source(&self) -> &str {
        &self.external_source
    }

    /// Free text summary
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// `true` if the set was derived, e.g. as union of child sets in a hierarchy
    pub fn calculated(&self) -> bool {
        self.calculated
    }

    /// The gene ids of the set
    pub fn genes(&self) -> &Genes {
        &self.genes
    }

    /// The gene symbols of the set
    pub fn gene_symbols(&self) -> &OrderedSet<String> {
        &self.gene_symbols
    }

    /// The GO annotation of the set
    pub fn go_info(&self) -> &GoInfo {
        &self.go_info
    }

    /// The annotation of a single gene, if present
    pub fn annotation(&self, gene: &GeneId) -> Option<&GeneAnnotation> {
        self.annotations.get(gene)
    }

    /// Iterates the annotations of all genes of the set, in gene order
    ///
    /// Genes without annotation are skipped.
    pub fn annotations(&self) -> impl Iterator<Item = (&GeneId, &GeneAnnotation)> {
        self.genes
            .iter()
            .filter_map(|gene| self.annotations.get(gene).map(|anno| (gene, anno)))
    }
}

impl Display for GeneSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<GeneSet(name='{}', n_genes={})>", self.name, self.genes.len())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gene_id_parsing() {
        assert_eq!(GeneId::try_from("8908").unwrap(), GeneId::from(8908));
        assert_eq!(GeneId::try_from(" 42 ").unwrap().as_u32(), 42);
        assert!(GeneId::try_from("GYS1").is_err());
        assert_eq!(GeneId::from(2997).to_string(), "NCBI-GeneID:2997");
    }

    #[test]
    fn gene_order_is_kept() {
        let set = GeneSet::new("SetB", [5507u32, 8908, 2998, 5507]);
        let ids: Vec<u32> = set.genes().iter().map(GeneId::as_u32).collect();
        assert_eq!(ids, vec![5507, 8908, 2998]);
    }

    #[test]
    fn go_type_from_str() {
        assert_eq!(
            GoType::try_from("cellular_component").unwrap(),
            GoType::CellularComponent
        );
        assert_eq!(GoType::try_from("MF").unwrap(), GoType::MolecularFunction);
        assert!(GoType::try_from("anatomy").is_err());
    }

    #[test]
    fn go_info_skips_other_genes() {
        let rows = vec![
            GoAnnotation {
                gene: 1u32.into(),
                go_id: "GO:1".into(),
                name: "one".into(),
                definition: "first".into(),
                namespace: GoType::MolecularFunction,
            },
            GoAnnotation {
                gene: 2u32.into(),
                go_id: "GO:2".into(),
                name: "two".into(),
                definition: "second".into(),
                namespace: GoType::MolecularFunction,
            },
        ];
        let genes: Genes = [GeneId::from(2)].into_iter().collect();
        let info = GoInfo::from_annotations(&genes, &rows);
        let mf = info.category(GoType::MolecularFunction);
        assert_eq!(mf.ids().as_slice(), &["GO:2".to_string()]);
        assert_eq!(mf.definitions().as_slice(), &["second".to_string()]);
    }

    #[test]
    fn annotations_follow_gene_order() {
        let set = GeneSet::new("S", [3u32, 1, 2])
            .with_annotation(
                2u32,
                GeneAnnotation {
                    traits: vec!["height".into()],
                    description: None,
                },
            )
            .with_annotation(
                3u32,
                GeneAnnotation {
                    traits: vec!["BMI".into()],
                    description: None,
                },
            );
        let genes: Vec<u32> = set.annotations().map(|(g, _)| g.as_u32()).collect();
        assert_eq!(genes, vec![3, 2]);
    }
}
