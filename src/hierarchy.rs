//! A rooted tree of named nodes, e.g. Reactome pathways or immune cell types
//!
//! Every node except the root has exactly one parent. Node names are
//! usually the names of [`GeneSet`]s, so that gene sets can be compared
//! by their position in the tree with [`crate::distance::tree::TreePathDistanceMetric`].
//!
//! # Examples
//!
//! ```
//! use gsd::Hierarchy;
//!
//! let mut cells = Hierarchy::new("cell");
//! cells.add_child("cell", "lymphocyte").unwrap();
//! cells.add_child("lymphocyte", "T cell").unwrap();
//! cells.add_child("lymphocyte", "B cell").unwrap();
//! cells.add_child("cell", "myeloid cell").unwrap();
//!
//! assert_eq!(cells.len(), 5);
//! assert_eq!(cells.parent("T cell"), Some("lymphocyte"));
//! assert_eq!(cells.children("lymphocyte"), vec!["T cell", "B cell"]);
//!
//! // a node can only have a single parent
//! assert!(cells.add_child("myeloid cell", "T cell").is_err());
//! ```
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::gene_set::{GeneSet, Genes};
use crate::graph::Graph;
use crate::ordered_set::OrderedSet;
use crate::{GsdError, GsdResult, DEFAULT_NUM_NEIGHBOURS};

type Children = SmallVec<[usize; DEFAULT_NUM_NEIGHBOURS]>;

/// Rooted tree with single-parent nodes
#[derive(Debug, Clone)]
pub struct Hierarchy {
    nodes: OrderedSet<String>,
    parents: Vec<Option<usize>>,
    children: Vec<Children>,
}

impl Hierarchy {
    /// Constructs a new hierarchy with only the root node
    pub fn new(root: &str) -> Self {
        let mut nodes = OrderedSet::new();
        nodes.insert(root.to_string());
        Self {
            nodes,
            parents: vec![None],
            children: vec![Children::new()],
        }
    }

    /// Adds `child` as a new node below `parent`
    ///
    /// # Errors
    ///
    /// - [`GsdError::UnknownNode`] if `parent` is not part of the hierarchy
    /// - [`GsdError::MultipleParents`] if `child` is already attached to a parent
    /// - [`GsdError::DuplicateNode`] if `child` is the root
    pub fn add_child(&mut self, parent: &str, child: &str) -> GsdResult<()> {
        let parent_idx = self
            .index_of(parent)
            .ok_or_else(|| GsdError::UnknownNode(parent.to_string()))?;

        if let Some(idx) = self.index_of(child) {
            return match self.parents[idx] {
                Some(_) => Err(GsdError::MultipleParents(child.to_string())),
                None => Err(GsdError::DuplicateNode(child.to_string())),
            };
        }

        self.nodes.insert(child.to_string());
        self.parents.push(Some(parent_idx));
        self.children.push(Children::new());
        let child_idx = self.parents.len() - 1;
        self.children[parent_idx].push(child_idx);
        Ok(())
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.nodes.index_of(&name.to_string())
    }

    fn name(&self, idx: usize) -> &str {
        &self.nodes.as_slice()[idx]
    }

    /// Returns the name of the root node
    pub fn root(&self) -> &str {
        self.name(0)
    }

    /// Returns the number of nodes, including the root
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Returns `false`, a hierarchy always contains the root
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Returns `true` if `name` is a node of the hierarchy
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Returns all node names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// Returns the parent of a node
    ///
    /// `None` for the root and for unknown nodes
    pub fn parent(&self, name: &str) -> Option<&str> {
        let idx = self.index_of(name)?;
        self.parents[idx].map(|parent| self.name(parent))
    }

    /// Returns the direct children of a node in insertion order
    pub fn children(&self, name: &str) -> Vec<&str> {
        match self.index_of(name) {
            Some(idx) => self.children[idx].iter().map(|c| self.name(*c)).collect(),
            None => Vec::new(),
        }
    }

    /// Returns all parent-child edges
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parents
            .iter()
            .enumerate()
            .filter_map(move |(idx, parent)| parent.map(|p| (self.name(p), self.name(idx))))
    }

    /// Returns all node names, every node before its children
    pub fn pre_order(&self) -> Vec<&str> {
        let mut res = Vec::with_capacity(self.len());
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            res.push(self.name(idx));
            stack.extend(self.children[idx].iter().rev());
        }
        res
    }

    /// Returns a copy that only keeps the named nodes and their ancestors
    ///
    /// All subtrees without any of the named nodes are removed. `None` is
    /// returned if none of the names is part of the hierarchy.
    ///
    /// ```
    /// use gsd::Hierarchy;
    ///
    /// let mut cells = Hierarchy::new("cell");
    /// cells.add_child("cell", "lymphocyte").unwrap();
    /// cells.add_child("lymphocyte", "T cell").unwrap();
    /// cells.add_child("lymphocyte", "B cell").unwrap();
    /// cells.add_child("cell", "myeloid cell").unwrap();
    ///
    /// let pruned = cells.prune(&["B cell"]).unwrap();
    /// assert_eq!(pruned.pre_order(), vec!["cell", "lymphocyte", "B cell"]);
    ///
    /// assert!(cells.prune(&["neuron"]).is_none());
    /// ```
    pub fn prune(&self, names: &[&str]) -> Option<Hierarchy> {
        let mut keep = vec![false; self.len()];
        for name in names {
            let Some(mut idx) = self.index_of(name) else {
                continue;
            };
            keep[idx] = true;
            while let Some(parent) = self.parents[idx] {
                if keep[parent] {
                    break;
                }
                keep[parent] = true;
                idx = parent;
            }
        }
        if !keep[0] {
            return None;
        }

        let mut pruned = Hierarchy::new(self.root());
        for (parent, child) in self.pre_order_edges() {
            if keep[child] {
                // pre-order guarantees the parent was added already
                if pruned.add_child(self.name(parent), self.name(child)).is_err() {
                    warn!("Unable to keep {} in pruned hierarchy", self.name(child));
                }
            }
        }
        debug!("Pruned hierarchy from {} to {} nodes", self.len(), pruned.len());
        Some(pruned)
    }

    fn pre_order_edges(&self) -> Vec<(usize, usize)> {
        let mut res = Vec::with_capacity(self.len());
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            for child in self.children[idx].iter().rev() {
                stack.push(*child);
            }
            if let Some(parent) = self.parents[idx] {
                res.push((parent, idx));
            }
        }
        res
    }

    /// Returns one gene set for every node, in pre-order
    ///
    /// Nodes with a gene set of the same name use it. All other nodes get a
    /// derived gene set, flagged as `calculated`, that contains the genes and
    /// gene symbols of all gene sets below it. Gene sets that are not part of
    /// the hierarchy are ignored.
    ///
    /// # Errors
    ///
    /// [`GsdError::DuplicateName`] if two gene sets share the same name
    ///
    /// # Examples
    ///
    /// ```
    /// use gsd::{GeneSet, Hierarchy};
    ///
    /// let mut cells = Hierarchy::new("cell");
    /// cells.add_child("cell", "T cell").unwrap();
    /// cells.add_child("cell", "B cell").unwrap();
    ///
    /// let sets = vec![
    ///     GeneSet::new("T cell", [3u32, 1]),
    ///     GeneSet::new("B cell", [1u32, 2]),
    /// ];
    ///
    /// let all = cells.propagate_gene_sets(&sets).unwrap();
    /// assert_eq!(all.len(), 3);
    /// assert_eq!(all[0].name(), "cell");
    /// assert!(all[0].calculated());
    /// assert_eq!(all[0].genes().len(), 3);
    /// assert!(!all[1].calculated());
    /// ```
    pub fn propagate_gene_sets(&self, gene_sets: &[GeneSet]) -> GsdResult<Vec<GeneSet>> {
        let mut lookup: HashMap<&str, &GeneSet> = HashMap::with_capacity(gene_sets.len());
        for set in gene_sets {
            if lookup.insert(set.name(), set).is_some() {
                return Err(GsdError::DuplicateName(set.name().to_string()));
            }
            if !self.contains(set.name()) {
                warn!("Gene set {} is not part of the hierarchy", set.name());
            }
        }

        let mut res = Vec::with_capacity(self.len());
        self.collect_gene_sets(0, &lookup, &mut res);
        Ok(res.into_iter().flatten().collect())
    }

    /// Adds the gene set of `idx` and all its descendants to `res`
    ///
    /// Returns the union of all genes and gene symbols of the subtree.
    fn collect_gene_sets(
        &self,
        idx: usize,
        lookup: &HashMap<&str, &GeneSet>,
        res: &mut Vec<Option<GeneSet>>,
    ) -> (Genes, OrderedSet<String>) {
        let position = res.len();
        res.push(None);

        let mut genes = Genes::new();
        let mut symbols = OrderedSet::new();
        for child in &self.children[idx] {
            let (child_genes, child_symbols) = self.collect_gene_sets(*child, lookup, res);
            genes.extend(child_genes);
            symbols.extend(child_symbols);
        }

        let name = self.name(idx);
        let set = match lookup.get(name) {
            Some(set) => {
                genes.extend(set.genes().iter().copied());
                symbols.extend(set.gene_symbols().iter().cloned());
                (*set).clone()
            }
            None => GeneSet::new(name, genes.iter().copied())
                .with_symbols(symbols.iter().cloned())
                .with_calculated(true),
        };
        res[position] = Some(set);
        (genes, symbols)
    }

    /// Builds an undirected graph with one edge between every node and its parent
    ///
    /// # Errors
    ///
    /// [`GsdError::EmptyGraph`] if the hierarchy only contains the root
    pub fn to_graph(&self) -> GsdResult<Graph<String>> {
        Graph::from_edges(
            self.edges()
                .map(|(parent, child)| (parent.to_string(), child.to_string())),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn cells() -> Hierarchy {
        // cell
        // ├── lymphocyte
        // │   ├── T cell
        // │   │   └── CD8 T cell
        // │   └── B cell
        // └── myeloid cell
        //     └── monocyte
        let mut h = Hierarchy::new("cell");
        h.add_child("cell", "lymphocyte").unwrap();
        h.add_child("lymphocyte", "T cell").unwrap();
        h.add_child("cell", "myeloid cell").unwrap();
        h.add_child("lymphocyte", "B cell").unwrap();
        h.add_child("T cell", "CD8 T cell").unwrap();
        h.add_child("myeloid cell", "monocyte").unwrap();
        h
    }

    #[test]
    fn structure() {
        let h = cells();
        assert_eq!(h.root(), "cell");
        assert_eq!(h.len(), 7);
        assert!(h.contains("monocyte"));
        assert!(!h.contains("neuron"));
        assert_eq!(h.parent("cell"), None);
        assert_eq!(h.parent("monocyte"), Some("myeloid cell"));
        assert_eq!(h.children("cell"), vec!["lymphocyte", "myeloid cell"]);
        assert!(h.children("neuron").is_empty());
        assert_eq!(h.edges().count(), 6);
    }

    #[test]
    fn pre_order() {
        assert_eq!(
            cells().pre_order(),
            vec![
                "cell",
                "lymphocyte",
                "T cell",
                "CD8 T cell",
                "B cell",
                "myeloid cell",
                "monocyte"
            ]
        );
    }

    #[test]
    fn invalid_children() {
        let mut h = cells();
        assert!(matches!(
            h.add_child("neuron", "cortical neuron"),
            Err(GsdError::UnknownNode(_))
        ));
        assert!(matches!(
            h.add_child("myeloid cell", "B cell"),
            Err(GsdError::MultipleParents(_))
        ));
        assert!(matches!(
            h.add_child("monocyte", "cell"),
            Err(GsdError::DuplicateNode(_))
        ));
        assert_eq!(h.len(), 7);
    }

    #[test]
    fn prune() {
        let h = cells();
        let pruned = h.prune(&["CD8 T cell", "monocyte", "unknown"]).unwrap();
        assert_eq!(
            pruned.pre_order(),
            vec![
                "cell",
                "lymphocyte",
                "T cell",
                "CD8 T cell",
                "myeloid cell",
                "monocyte"
            ]
        );
        let pruned = h.prune(&["cell"]).unwrap();
        assert_eq!(pruned.len(), 1);
        assert!(h.prune(&[]).is_none());
    }

    #[test]
    fn propagate() {
        let h = cells();
        let sets = vec![
            GeneSet::new("CD8 T cell", [1u32, 2]).with_symbols(["CD8A", "CD8B"]),
            GeneSet::new("B cell", [3u32]).with_symbols(["CD19"]),
            GeneSet::new("lymphocyte", [4u32]).with_symbols(["PTPRC"]),
            GeneSet::new("neuron", [5u32]),
        ];
        let all = h.propagate_gene_sets(&sets).unwrap();
        let names: Vec<&str> = all.iter().map(GeneSet::name).collect();
        assert_eq!(names, h.pre_order());

        let by_name = |name: &str| all.iter().find(|s| s.name() == name).unwrap();

        assert!(!by_name("lymphocyte").calculated());
        assert_eq!(by_name("lymphocyte").genes().len(), 1);

        let t_cell = by_name("T cell");
        assert!(t_cell.calculated());
        assert_eq!(t_cell.genes().len(), 2);
        assert_eq!(t_cell.gene_symbols().len(), 2);

        let cell = by_name("cell");
        assert!(cell.calculated());
        assert_eq!(cell.genes().len(), 4);
        assert_eq!(cell.gene_symbols().len(), 4);

        // nothing below the myeloid cells has genes
        assert!(by_name("myeloid cell").genes().is_empty());
    }

    #[test]
    fn propagate_duplicates() {
        let sets = vec![GeneSet::new("B cell", [3u32]), GeneSet::new("B cell", [4u32])];
        assert!(matches!(
            cells().propagate_gene_sets(&sets),
            Err(GsdError::DuplicateName(_))
        ));
    }

    #[test]
    fn graph() {
        let graph = cells().to_graph().unwrap();
        assert_eq!(graph.len(), 7);
        assert_eq!(graph.n_edges(), 6);
        let a = graph.index_of(&"CD8 T cell".to_string()).unwrap();
        let b = graph.index_of(&"monocyte".to_string()).unwrap();
        assert_eq!(graph.shortest_path(a, b), Some(5));

        assert!(Hierarchy::new("root").to_graph().is_err());
    }
}
