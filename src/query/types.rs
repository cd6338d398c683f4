//! Result shapes returned by [`GraphQueryService`](super::GraphQueryService).
//!
//! Nodes are reported with the same fields the artifact stores, so a node
//! view is simply a [`NodeData`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::graph::types::{EdgeKind, NodeData};

/// Which edges a traversal follows from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Follow edges from source to target.
    Outgoing,
    /// Follow edges from target back to source.
    Incoming,
    #[default]
    Both,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outgoing => "outgoing",
            Direction::Incoming => "incoming",
            Direction::Both => "both",
        }
    }

    pub fn follows_outgoing(&self) -> bool {
        matches!(self, Direction::Outgoing | Direction::Both)
    }

    pub fn follows_incoming(&self) -> bool {
        matches!(self, Direction::Incoming | Direction::Both)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "outgoing" | "out" => Ok(Direction::Outgoing),
            "incoming" | "in" => Ok(Direction::Incoming),
            "both" => Ok(Direction::Both),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// An edge as reported in query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeView {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: String,
    pub matches: Vec<NodeData>,
}

/// Result of a dependency or subgraph expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionResult {
    pub query: String,
    /// The seed nodes the query resolved to.
    pub matched: Vec<NodeData>,
    pub direction: Direction,
    pub hops: usize,
    pub nodes: Vec<NodeData>,
    pub edges: Vec<EdgeView>,
}

/// Result of an impact analysis: everything that reaches the seeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactResult {
    pub query: String,
    pub matched: Vec<NodeData>,
    pub hops: usize,
    pub nodes: Vec<NodeData>,
    pub edges: Vec<EdgeView>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathMatches {
    pub source: Vec<NodeData>,
    pub target: Vec<NodeData>,
}

/// Result of a shortest-path query.
///
/// When no path exists, `path` and `edges` are empty and `error` says why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathResult {
    pub source: String,
    pub target: String,
    pub matches: PathMatches,
    pub path: Vec<NodeData>,
    pub edges: Vec<EdgeView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A node ranked by degree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hub {
    #[serde(flatten)]
    pub node: NodeData,
    pub degree: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCount {
    pub module: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSize {
    /// 1-based rank of the component by size.
    pub cluster: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResult {
    pub node_counts: BTreeMap<String, usize>,
    pub edge_counts: BTreeMap<String, usize>,
    pub top_hubs: Vec<Hub>,
    pub module_breakdown: Vec<ModuleCount>,
    pub clusters: Vec<ClusterSize>,
}

/// Provenance of the loaded graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub source_root: Option<String>,
    pub generated_at: Option<String>,
    pub node_count: usize,
    pub edge_count: usize,
    pub graph_path: Option<String>,
}
