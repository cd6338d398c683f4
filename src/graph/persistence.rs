//! Node-link JSON persistence.
//!
//! The artifact is a single JSON document:
//!
//! ```text
//! {"directed": true, "multigraph": false,
//!  "graph": {"snapshot": {...}},
//!  "nodes": [{"id", "type", "name", "qualified_name", "path", "external"}, ...],
//!  "links": [{"source", "target", "type"}, ...]}
//! ```
//!
//! Nodes and links are written in insertion order, so loading a saved graph
//! reproduces the same iteration order.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::engine::CodeGraph;
use super::types::{EdgeKind, NodeData, Snapshot};
use crate::error::{GraphError, Result};

#[derive(Debug, Serialize, Deserialize)]
struct GraphDocument {
    #[serde(default = "default_directed")]
    directed: bool,
    #[serde(default)]
    multigraph: bool,
    #[serde(default)]
    graph: GraphAttributes,
    nodes: Vec<NodeData>,
    #[serde(alias = "edges")]
    links: Vec<LinkRecord>,
}

fn default_directed() -> bool {
    true
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GraphAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    snapshot: Option<Snapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LinkRecord {
    source: String,
    target: String,
    #[serde(rename = "type")]
    kind: EdgeKind,
}

impl GraphDocument {
    fn from_graph(graph: &CodeGraph) -> Self {
        Self {
            directed: true,
            multigraph: false,
            graph: GraphAttributes {
                snapshot: graph.snapshot().cloned(),
            },
            nodes: graph.nodes().cloned().collect(),
            links: graph
                .edges()
                .map(|(source, target, edge)| LinkRecord {
                    source: source.id.clone(),
                    target: target.id.clone(),
                    kind: edge.kind,
                })
                .collect(),
        }
    }

    fn into_graph(self) -> Result<CodeGraph> {
        let mut graph = CodeGraph::new();
        for node in self.nodes {
            graph.ensure_node(node);
        }
        for link in self.links {
            let endpoint = |id: &str| {
                graph.node_index(id).ok_or_else(|| {
                    GraphError::InvalidDocument(format!("edge endpoint {id} has no node"))
                })
            };
            let source = endpoint(&link.source)?;
            let target = endpoint(&link.target)?;
            graph.add_edge(source, target, link.kind);
        }
        if let Some(snapshot) = self.graph.snapshot {
            graph.set_snapshot(snapshot);
        }
        Ok(graph)
    }
}

/// Serialize the graph to a node-link JSON string.
pub fn graph_to_json(graph: &CodeGraph) -> Result<String> {
    Ok(serde_json::to_string_pretty(&GraphDocument::from_graph(graph))?)
}

/// Rebuild a graph from a node-link JSON string.
pub fn graph_from_json(json: &str) -> Result<CodeGraph> {
    let document: GraphDocument = serde_json::from_str(json)?;
    document.into_graph()
}

/// Write the graph to `path`, creating parent directories as needed.
pub fn save_graph(graph: &CodeGraph, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| GraphError::io(parent, e))?;
    }
    let json = graph_to_json(graph)?;
    fs::write(path, json).map_err(|e| GraphError::io(path, e))?;
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph saved"
    );
    Ok(())
}

/// Load a graph previously written by [`save_graph`].
pub fn load_graph(path: &Path) -> Result<CodeGraph> {
    if !path.exists() {
        return Err(GraphError::GraphNotFound(path.to_path_buf()));
    }
    let json = fs::read_to_string(path).map_err(|e| GraphError::io(path, e))?;
    let document: GraphDocument =
        serde_json::from_str(&json).map_err(|source| GraphError::CorruptDocument {
            path: path.to_path_buf(),
            source,
        })?;
    let graph = document.into_graph()?;
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph loaded"
    );
    Ok(graph)
}
