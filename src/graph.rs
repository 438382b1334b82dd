//! Unweighted relationship graphs for shortest-path metrics
//!
//! A [`Graph`] is built once from a list of edges, e.g. an
//! [`InteractionTable`] of protein-protein interactions or the parent-child
//! edges of a [`crate::Hierarchy`]. Every node gets a stable index in the
//! order it first appears in the edge list. The graph is read-only after
//! construction, so it can be shared between threads without locking.
//!
//! # Examples
//!
//! ```
//! use gsd::{Graph, InteractionRow, InteractionTable};
//!
//! let mut table = InteractionTable::new();
//! table.push(InteractionRow::new(1u32, 2u32));
//! table.push(InteractionRow::new(2u32, 3u32));
//! table.push(InteractionRow::new(3u32, 4u32));
//!
//! let graph = Graph::from_interactions(&table).unwrap();
//! assert_eq!(graph.len(), 4);
//!
//! let first = graph.index_of(&1u32.into()).unwrap();
//! let last = graph.index_of(&4u32.into()).unwrap();
//! assert_eq!(graph.shortest_path(first, last), Some(3));
//! ```
use std::collections::VecDeque;
use std::hash::Hash;

use smallvec::SmallVec;
use tracing::debug;

use crate::gene_set::GeneId;
use crate::ordered_set::OrderedSet;
use crate::{GsdError, GsdResult, DEFAULT_NUM_NEIGHBOURS};

type Neighbours = SmallVec<[usize; DEFAULT_NUM_NEIGHBOURS]>;

/// A single interaction between two genes
///
/// The taxon ids are optional, they are only needed to restrict
/// a table to a single organism with [`InteractionTable::retain_taxon`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionRow {
    /// First interaction partner
    pub from_id: GeneId,
    /// Second interaction partner
    pub to_id: GeneId,
    /// Taxon of the first partner
    pub from_tax: Option<u32>,
    /// Taxon of the second partner
    pub to_tax: Option<u32>,
}

impl InteractionRow {
    /// Constructs an interaction without taxon information
    pub fn new<A: Into<GeneId>, B: Into<GeneId>>(from_id: A, to_id: B) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            from_tax: None,
            to_tax: None,
        }
    }

    /// Adds the taxon ids of both partners
    #[must_use]
    pub fn with_taxa(mut self, from_tax: u32, to_tax: u32) -> Self {
        self.from_tax = Some(from_tax);
        self.to_tax = Some(to_tax);
        self
    }

    /// Parses an interaction from PSI-MITAB style fields
    ///
    /// Identifier fields have the form `database:value`, e.g.
    /// `entrez gene/locuslink:8908` or `taxid:9606(human)`. Missing
    /// taxon fields are written as `-`.
    ///
    /// # Errors
    ///
    /// [`GsdError::ParseIntError`] if one of the values is not a number
    ///
    /// # Examples
    ///
    /// ```
    /// use gsd::InteractionRow;
    ///
    /// let row = InteractionRow::from_mitab_fields(
    ///     "entrez gene/locuslink:8908",
    ///     "entrez gene/locuslink:2998",
    ///     "taxid:9606",
    ///     "taxid:9606(Homo sapiens)",
    /// ).unwrap();
    /// assert_eq!(row.from_id.as_u32(), 8908);
    /// assert_eq!(row.to_id.as_u32(), 2998);
    /// assert_eq!(row.to_tax, Some(9606));
    ///
    /// let row = InteractionRow::from_mitab_fields("entrez gene/locuslink:1", "entrez gene/locuslink:2", "-", "-").unwrap();
    /// assert_eq!(row.from_tax, None);
    ///
    /// assert!(InteractionRow::from_mitab_fields("uniprotkb:P46976", "entrez gene/locuslink:2", "-", "-").is_err());
    /// ```
    pub fn from_mitab_fields(
        from_id: &str,
        to_id: &str,
        from_tax: &str,
        to_tax: &str,
    ) -> GsdResult<Self> {
        Ok(Self {
            from_id: mitab_value(from_id)?.into(),
            to_id: mitab_value(to_id)?.into(),
            from_tax: mitab_taxon(from_tax)?,
            to_tax: mitab_taxon(to_tax)?,
        })
    }
}

/// Returns the numeric value after the first `:`, ignoring trailing annotations
fn mitab_value(field: &str) -> GsdResult<u32> {
    let value = field.split_once(':').map_or(field, |(_, value)| value);
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    Ok(value[..end].parse::<u32>()?)
}

fn mitab_taxon(field: &str) -> GsdResult<Option<u32>> {
    match field.trim() {
        "" | "-" => Ok(None),
        value => mitab_value(value).map(Some),
    }
}

/// A table of pairwise interactions
#[derive(Debug, Clone, Default)]
pub struct InteractionTable {
    rows: Vec<InteractionRow>,
}

impl InteractionTable {
    /// Constructs a new, empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interaction
    pub fn push(&mut self, row: InteractionRow) {
        self.rows.push(row);
    }

    /// Returns the number of interactions
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no interactions
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns all interactions
    pub fn rows(&self) -> &[InteractionRow] {
        &self.rows
    }

    /// Keeps only interactions where both partners belong to `tax_id`
    ///
    /// Rows without taxon information are removed as well.
    ///
    /// ```
    /// use gsd::{InteractionRow, InteractionTable};
    ///
    /// let mut table: InteractionTable = [
    ///     InteractionRow::new(1u32, 2u32).with_taxa(9606, 9606),
    ///     InteractionRow::new(1u32, 3u32).with_taxa(9606, 10090),
    ///     InteractionRow::new(3u32, 4u32),
    /// ].into_iter().collect();
    ///
    /// table.retain_taxon(9606);
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn retain_taxon(&mut self, tax_id: u32) {
        let before = self.rows.len();
        self.rows
            .retain(|row| row.from_tax == Some(tax_id) && row.to_tax == Some(tax_id));
        debug!(
            "Removed {} interactions outside of taxon {}",
            before - self.rows.len(),
            tax_id
        );
    }
}

impl FromIterator<InteractionRow> for InteractionTable {
    fn from_iter<T: IntoIterator<Item = InteractionRow>>(iter: T) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a InteractionTable {
    type Item = &'a InteractionRow;
    type IntoIter = std::slice::Iter<'a, InteractionRow>;
    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Undirected graph with unit edge weights
///
/// Nodes are stored in a name → index map, adjacency lists hold node indices.
#[derive(Debug, Clone)]
pub struct Graph<N> {
    nodes: OrderedSet<N>,
    adjacency: Vec<Neighbours>,
}

impl<N: Eq + Hash + Clone> Graph<N> {
    /// Builds a graph from a list of edges
    ///
    /// Node indices follow the order of first appearance. Self loops and
    /// duplicate edges are ignored, the nodes of a self loop are still added.
    ///
    /// # Errors
    ///
    /// [`GsdError::EmptyGraph`] if `edges` is empty
    pub fn from_edges<I: IntoIterator<Item = (N, N)>>(edges: I) -> GsdResult<Self> {
        let mut graph = Self {
            nodes: OrderedSet::new(),
            adjacency: Vec::new(),
        };
        let mut n_edges = 0usize;
        for (from, to) in edges {
            n_edges += 1;
            let a = graph.add_node(from);
            let b = graph.add_node(to);
            graph.add_edge(a, b);
        }
        if n_edges == 0 {
            return Err(GsdError::EmptyGraph);
        }
        debug!(
            "Built graph with {} nodes from {} edges",
            graph.len(),
            n_edges
        );
        Ok(graph)
    }

    fn add_node(&mut self, node: N) -> usize {
        if let Some(idx) = self.nodes.index_of(&node) {
            return idx;
        }
        self.nodes.insert(node);
        self.adjacency.push(Neighbours::new());
        self.adjacency.len() - 1
    }

    fn add_edge(&mut self, a: usize, b: usize) {
        if a == b || self.adjacency[a].contains(&b) {
            return;
        }
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
    }

    /// Returns the index of a node, if it is part of the graph
    pub fn index_of(&self, node: &N) -> Option<usize> {
        self.nodes.index_of(node)
    }

    /// Returns the node at the given index
    pub fn node(&self, idx: usize) -> Option<&N> {
        self.nodes.get(idx)
    }

    /// Returns all nodes in index order
    pub fn nodes(&self) -> &[N] {
        self.nodes.as_slice()
    }

    /// Returns the indices of all nodes that are present in the graph
    ///
    /// Unknown nodes are skipped, duplicates are returned once.
    pub fn indices_of<'a, I>(&self, nodes: I) -> Vec<usize>
    where
        I: IntoIterator<Item = &'a N>,
        N: 'a,
    {
        let mut indices: OrderedSet<usize> = OrderedSet::new();
        for node in nodes {
            if let Some(idx) = self.index_of(node) {
                indices.insert(idx);
            }
        }
        indices.into_iter().collect()
    }
}

impl<N> Graph<N> {
    /// Returns the number of nodes
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns `true` if the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Returns the number of undirected edges
    pub fn n_edges(&self) -> usize {
        self.adjacency.iter().map(|n| n.len()).sum::<usize>() / 2
    }

    /// Returns the direct neighbours of a node
    ///
    /// # Panics
    ///
    /// If `idx` is not a valid node index
    pub fn neighbours(&self, idx: usize) -> &[usize] {
        &self.adjacency[idx]
    }

    /// Returns the number of edges from `source` to the closest target
    ///
    /// `is_target` is checked for every visited node, the search stops at the
    /// first match. The distance is `0` if `source` is a target itself and
    /// `None` if no target is reachable.
    ///
    /// # Panics
    ///
    /// If `source` is not a valid node index
    pub fn distance_to_nearest<F>(&self, source: usize, is_target: F) -> Option<usize>
    where
        F: Fn(usize) -> bool,
    {
        if is_target(source) {
            return Some(0);
        }
        let mut visited = vec![false; self.len()];
        let mut queue = VecDeque::new();
        visited[source] = true;
        queue.push_back((source, 0usize));

        while let Some((node, dist)) = queue.pop_front() {
            for &next in self.neighbours(node) {
                if visited[next] {
                    continue;
                }
                if is_target(next) {
                    return Some(dist + 1);
                }
                visited[next] = true;
                queue.push_back((next, dist + 1));
            }
        }
        None
    }

    /// Returns the number of edges on the shortest path between two nodes
    ///
    /// `None` if the nodes are in disconnected components.
    ///
    /// # Panics
    ///
    /// If `from` is not a valid node index
    pub fn shortest_path(&self, from: usize, to: usize) -> Option<usize> {
        self.distance_to_nearest(from, |idx| idx == to)
    }
}

impl Graph<GeneId> {
    /// Builds the undirected interaction network of a table
    ///
    /// # Errors
    ///
    /// [`GsdError::EmptyGraph`] if the table has no interactions
    pub fn from_interactions(table: &InteractionTable) -> GsdResult<Self> {
        Self::from_edges(table.rows().iter().map(|row| (row.from_id, row.to_id)))
    }
}
