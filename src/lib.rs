//! # pyatlas
//!
//! Static structure of a Python code base as a queryable graph.
//!
//! pyatlas parses every Python file under a root with tree-sitter, extracts
//! definitions, imports, inheritance and call sites, resolves names across
//! files and stores the result as a directed graph of `File`, `Function`,
//! `Class` and `Module` nodes joined by `CALLS`, `IMPORTS` and `INHERITS`
//! edges. The graph is persisted as node-link JSON and served by
//! [`GraphQueryService`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pyatlas::{build_graph, GraphQueryService, PyAtlasConfig};
//! use std::path::Path;
//!
//! let config = PyAtlasConfig::default();
//! let graph = build_graph(Path::new("."), &config);
//!
//! let service = GraphQueryService::new(graph, None, config.query.clone());
//! let impact = service.impact("UserService.save", None, &[], None);
//! println!("{} nodes reach UserService.save", impact.nodes.len());
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod parser;
pub mod query;
pub mod walker;

// Re-exports for convenience
pub use config::{PyAtlasConfig, QueryConfig};
pub use error::{GraphError, Result};

// Graph re-exports
pub use graph::{
    build_graph, build_graph_from_root, load_graph, save_graph, CodeGraph, DefinitionIndex,
    EdgeKind, FileFacts, GraphBuilder, NodeData, NodeKind, Snapshot,
};
pub use parser::{extract_file, extract_source, SymbolExtractor};
pub use query::{Direction, ExpandOptions, GraphQueryService};
pub use walker::python_files;
