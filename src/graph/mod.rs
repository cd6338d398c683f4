//! Code graph module: the structural backbone of pyatlas.
//!
//! Provides the graph data model, the definition index used during
//! resolution, the two-pass builder and node-link persistence.

pub mod builder;
pub mod engine;
pub mod index;
pub mod persistence;
pub mod types;

pub use builder::{build_facts, build_graph, build_graph_from_root, GraphBuilder};
pub use engine::CodeGraph;
pub use index::DefinitionIndex;
pub use persistence::{graph_from_json, graph_to_json, load_graph, save_graph};
pub use types::{
    CallFact, EdgeData, EdgeKind, FileFacts, ImportFact, ImportKind, InheritanceFact, Location,
    NodeData, NodeKind, Snapshot, Symbol, SymbolKind,
};
