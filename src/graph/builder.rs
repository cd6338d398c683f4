//! Graph builder: scans a directory and builds the code graph.
//!
//! Walks Python files respecting .gitignore, extracts facts from each in
//! parallel, then assembles the graph in two passes. Pass 1 creates every
//! file, function and class node and registers the definitions; pass 2
//! resolves imports, inheritance and calls against the complete index, so
//! a call can resolve to a definition in a file processed later. When
//! several files define the same name, the first file registered wins.

use std::fs;
use std::path::Path;

use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::engine::CodeGraph;
use super::index::DefinitionIndex;
use super::persistence::save_graph;
use super::types::*;
use crate::config::PyAtlasConfig;
use crate::error::Result;
use crate::parser::extract_file;
use crate::walker::python_files;

/// Turns per-file facts into a [`CodeGraph`].
pub struct GraphBuilder {
    graph: CodeGraph,
    index: DefinitionIndex,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: CodeGraph::new(),
            index: DefinitionIndex::new(),
        }
    }

    /// Build the graph for `facts`, processed in the given order.
    pub fn build(mut self, facts: &[FileFacts]) -> CodeGraph {
        debug!(file_count = facts.len(), "ingesting facts into graph");
        for file in facts {
            self.register_definitions(file);
        }
        for file in facts {
            self.link_imports(file);
            self.link_inheritance(file);
            self.link_calls(file);
        }
        self.graph
    }

    // ─── Pass 1 ─────────────────────────────────────────────────

    fn register_definitions(&mut self, file: &FileFacts) {
        self.graph.ensure_node(NodeData::file(&file.path));

        for symbol in &file.functions {
            let node = NodeData::function(&file.path, symbol);
            self.index.add_function(&file.path, symbol, &node.id);
            self.graph.ensure_node(node);
        }
        for symbol in &file.classes {
            let node = NodeData::class(&file.path, symbol);
            self.index.add_class(&file.path, symbol, &node.id);
            self.graph.ensure_node(node);
        }
    }

    // ─── Pass 2 ─────────────────────────────────────────────────

    fn link_imports(&mut self, file: &FileFacts) {
        let Some(file_idx) = self.graph.node_index(&file_node_id(&file.path)) else {
            return;
        };

        for import in &file.imports {
            let modules: &[String] = match (import.kind, &import.module) {
                (ImportKind::Import, _) => &import.names,
                (ImportKind::From, Some(module)) => std::slice::from_ref(module),
                (ImportKind::From, None) => &[],
            };
            for module in modules {
                let module_idx = self.graph.ensure_node(NodeData::module(module));
                self.graph.add_edge(file_idx, module_idx, EdgeKind::Imports);
            }
        }
    }

    fn link_inheritance(&mut self, file: &FileFacts) {
        for fact in &file.inherits {
            let Some(class_idx) = self
                .index
                .class_at(&file.path, &fact.class_name)
                .and_then(|id| self.graph.node_index(id))
            else {
                debug!(path = %file.path, class = %fact.class_name, "subclass not indexed, skipping");
                continue;
            };

            for base in &fact.bases {
                let base_idx = match self.index.resolve_class(&file.path, base) {
                    Some(id) => self.graph.node_index(id),
                    None => Some(self.graph.ensure_node(NodeData::external_class(base))),
                };
                if let Some(base_idx) = base_idx {
                    self.graph.add_edge(class_idx, base_idx, EdgeKind::Inherits);
                }
            }
        }
    }

    fn link_calls(&mut self, file: &FileFacts) {
        for call in &file.calls {
            let Some(caller_idx) = call.caller.as_deref().and_then(|caller| self.caller_node(&file.path, caller))
            else {
                continue;
            };

            let callee_idx = match self.index.resolve_function(&file.path, &call.callee) {
                Some(id) => self.graph.node_index(id),
                None => Some(self.graph.ensure_node(NodeData::external_function(&call.callee))),
            };
            if let Some(callee_idx) = callee_idx {
                self.graph.add_edge(caller_idx, callee_idx, EdgeKind::Calls);
            }
        }
    }

    fn caller_node(&self, path: &str, caller: &str) -> Option<NodeIndex> {
        self.index
            .function_at(path, caller)
            .and_then(|id| self.graph.node_index(id))
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Discover and extract every Python file under `root`.
///
/// Files that cannot be read or parsed are logged and skipped. The result is
/// in walk order regardless of how the parallel extraction is scheduled.
pub fn build_facts(root: &Path, config: &PyAtlasConfig) -> Vec<FileFacts> {
    let mut files = python_files(root, &config.exclude);
    if let Some(max_files) = config.max_files {
        files.truncate(max_files);
    }
    debug!(file_count = files.len(), root = %root.display(), "discovered python files");

    files
        .par_iter()
        .filter_map(|file_path| {
            let source = match fs::read_to_string(file_path) {
                Ok(source) => source,
                Err(err) => {
                    warn!(path = %file_path.display(), error = %err, "failed to read file");
                    return None;
                }
            };
            match extract_file(file_path, &source) {
                Ok(facts) => Some(facts),
                Err(err) => {
                    warn!(path = %file_path.display(), error = %err, "failed to parse file");
                    None
                }
            }
        })
        .collect()
}

/// Build a code graph from all Python files in a directory.
pub fn build_graph(root: &Path, config: &PyAtlasConfig) -> CodeGraph {
    info!(root = %root.display(), "building graph");
    let facts = build_facts(root, config);
    let mut graph = GraphBuilder::new().build(&facts);

    let source_root = root
        .canonicalize()
        .unwrap_or_else(|_| root.to_path_buf());
    graph.ensure_snapshot(&source_root.to_string_lossy());

    info!(
        files = facts.len(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph built"
    );
    graph
}

/// Build the graph for `root` and, when `output` is given, save it there.
pub fn build_graph_from_root(
    root: &Path,
    output: Option<&Path>,
    config: &PyAtlasConfig,
) -> Result<CodeGraph> {
    let graph = build_graph(root, config);
    if let Some(output) = output {
        save_graph(&graph, output)?;
    }
    Ok(graph)
}
