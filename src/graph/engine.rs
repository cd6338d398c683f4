//! The graph store.
//!
//! Wraps a petgraph `DiGraph` with an id index so that every node id maps to
//! exactly one node, and an edge index so that a `(source, target, type)`
//! triple is stored at most once.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::debug;

use super::types::*;

/// A directed, typed code graph keyed by node id.
pub struct CodeGraph {
    graph: DiGraph<NodeData, EdgeData>,
    /// Node id -> node index.
    id_index: HashMap<String, NodeIndex>,
    /// (source, target, type) -> edge index.
    edge_index: HashMap<(NodeIndex, NodeIndex, EdgeKind), EdgeIndex>,
    snapshot: Option<Snapshot>,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_index: HashMap::new(),
            edge_index: HashMap::new(),
            snapshot: None,
        }
    }

    /// Access the underlying petgraph.
    pub fn inner_graph(&self) -> &DiGraph<NodeData, EdgeData> {
        &self.graph
    }

    // ─── Node Operations ────────────────────────────────────────

    /// Insert a node unless one with the same id already exists.
    ///
    /// The first insertion wins: attributes of a later duplicate are ignored.
    pub fn ensure_node(&mut self, data: NodeData) -> NodeIndex {
        if let Some(&idx) = self.id_index.get(&data.id) {
            return idx;
        }
        let id = data.id.clone();
        let idx = self.graph.add_node(data);
        self.id_index.insert(id, idx);
        idx
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.id_index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&NodeData> {
        self.node_index(id).map(|idx| &self.graph[idx])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeData> {
        self.graph.node_weights()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    // ─── Edge Operations ────────────────────────────────────────

    /// Add an edge. A repeated `(source, target, kind)` returns the existing edge.
    pub fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, kind: EdgeKind) -> EdgeIndex {
        *self
            .edge_index
            .entry((source, target, kind))
            .or_insert_with(|| self.graph.add_edge(source, target, EdgeData::new(kind)))
    }

    pub fn has_edge(&self, source_id: &str, target_id: &str, kind: EdgeKind) -> bool {
        match (self.node_index(source_id), self.node_index(target_id)) {
            (Some(source), Some(target)) => self.edge_index.contains_key(&(source, target, kind)),
            _ => false,
        }
    }

    /// All edges as `(source, target, data)`, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&NodeData, &NodeData, &EdgeData)> {
        self.graph
            .edge_references()
            .map(|edge| (&self.graph[edge.source()], &self.graph[edge.target()], edge.weight()))
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    // ─── Snapshot ───────────────────────────────────────────────

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn set_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = Some(snapshot);
    }

    /// Record build metadata for `source_root` unless a snapshot exists.
    pub fn ensure_snapshot(&mut self, source_root: &str) -> &Snapshot {
        let node_count = self.graph.node_count();
        let edge_count = self.graph.edge_count();
        self.snapshot.get_or_insert_with(|| {
            debug!(node_count, edge_count, "snapshot recorded");
            Snapshot {
                generated_at: Some(chrono::Utc::now().to_rfc3339()),
                source_root: Some(source_root.to_string()),
                node_count,
                edge_count,
            }
        })
    }
}

impl Default for CodeGraph {
    fn default() -> Self {
        Self::new()
    }
}
