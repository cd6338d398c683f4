//! Core types for the pyatlas code graph.
//!
//! Defines node kinds, edge kinds, the node/edge payloads stored in the
//! graph, and the per-file facts produced by the symbol extractor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of a node in the code graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    /// A source file.
    File,
    /// A function or method definition.
    Function,
    /// A class definition.
    Class,
    /// An imported module (always external).
    Module,
}

impl NodeKind {
    /// Prefix used when building node ids.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Function => "func",
            NodeKind::Class => "class",
            NodeKind::Module => "module",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "File",
            NodeKind::Function => "Function",
            NodeKind::Class => "Class",
            NodeKind::Module => "Module",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(NodeKind::File),
            "function" | "func" => Ok(NodeKind::Function),
            "class" => Ok(NodeKind::Class),
            "module" => Ok(NodeKind::Module),
            other => Err(format!("unknown node type: {other}")),
        }
    }
}

/// The kind of an edge (relationship) in the code graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EdgeKind {
    /// Function -> Function: the caller invokes the callee.
    Calls,
    /// File -> Module: the file imports the module.
    Imports,
    /// Class -> Class: the subclass lists the base.
    Inherits,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 3] = [EdgeKind::Calls, EdgeKind::Imports, EdgeKind::Inherits];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Calls => "CALLS",
            EdgeKind::Imports => "IMPORTS",
            EdgeKind::Inherits => "INHERITS",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CALLS" => Ok(EdgeKind::Calls),
            "IMPORTS" => Ok(EdgeKind::Imports),
            "INHERITS" => Ok(EdgeKind::Inherits),
            other => Err(format!("unknown edge type: {other}")),
        }
    }
}

// ─── Node Ids ─────────────────────────────────────────────────────────────────

/// Id of the node for a source file: `file:<path>`.
pub fn file_node_id(path: &str) -> String {
    format!("file:{path}")
}

/// Id of an external module node: `module:external:<name>`.
pub fn module_node_id(name: &str) -> String {
    node_id(NodeKind::Module, None, name)
}

/// Id of a function node; `path = None` yields the external form.
pub fn function_node_id(path: Option<&str>, qualified_name: &str) -> String {
    node_id(NodeKind::Function, path, qualified_name)
}

/// Id of a class node; `path = None` yields the external form.
pub fn class_node_id(path: Option<&str>, qualified_name: &str) -> String {
    node_id(NodeKind::Class, path, qualified_name)
}

fn node_id(kind: NodeKind, path: Option<&str>, qualified_name: &str) -> String {
    format!(
        "{}:{}:{}",
        kind.id_prefix(),
        path.unwrap_or("external"),
        qualified_name
    )
}

// ─── Graph Payloads ───────────────────────────────────────────────────────────

/// Data stored in a graph node. Field names are the persisted attribute names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    /// Deterministic node id (see the `*_node_id` helpers).
    pub id: String,
    /// What kind of code element this is.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Display name: the bare symbol name, the module name, or the file path.
    pub name: String,
    /// Dotted name including enclosing scopes; null for files and modules.
    #[serde(default, alias = "qualname")]
    pub qualified_name: Option<String>,
    /// Defining file; null for external nodes.
    #[serde(default)]
    pub path: Option<String>,
    /// True when the node stands in for an unresolved reference.
    #[serde(default)]
    pub external: bool,
}

impl NodeData {
    pub fn file(path: &str) -> Self {
        Self {
            id: file_node_id(path),
            kind: NodeKind::File,
            name: path.to_string(),
            qualified_name: None,
            path: Some(path.to_string()),
            external: false,
        }
    }

    pub fn function(path: &str, symbol: &Symbol) -> Self {
        Self {
            id: function_node_id(Some(path), &symbol.qualified_name),
            kind: NodeKind::Function,
            name: symbol.name.clone(),
            qualified_name: Some(symbol.qualified_name.clone()),
            path: Some(path.to_string()),
            external: false,
        }
    }

    pub fn class(path: &str, symbol: &Symbol) -> Self {
        Self {
            id: class_node_id(Some(path), &symbol.qualified_name),
            kind: NodeKind::Class,
            name: symbol.name.clone(),
            qualified_name: Some(symbol.qualified_name.clone()),
            path: Some(path.to_string()),
            external: false,
        }
    }

    /// Placeholder for a call target that did not resolve.
    pub fn external_function(dotted: &str) -> Self {
        Self {
            id: function_node_id(None, dotted),
            kind: NodeKind::Function,
            name: last_segment(dotted).to_string(),
            qualified_name: Some(dotted.to_string()),
            path: None,
            external: true,
        }
    }

    /// Placeholder for a base class that did not resolve.
    pub fn external_class(base: &str) -> Self {
        Self {
            id: class_node_id(None, base),
            kind: NodeKind::Class,
            name: last_segment(base).to_string(),
            qualified_name: Some(base.to_string()),
            path: None,
            external: true,
        }
    }

    pub fn module(name: &str) -> Self {
        Self {
            id: module_node_id(name),
            kind: NodeKind::Module,
            name: name.to_string(),
            qualified_name: None,
            path: None,
            external: true,
        }
    }
}

fn last_segment(dotted: &str) -> &str {
    dotted.rsplit('.').next().unwrap_or(dotted)
}

/// Data stored on a graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    /// The kind of relationship.
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

impl EdgeData {
    pub fn new(kind: EdgeKind) -> Self {
        Self { kind }
    }
}

/// Build metadata stored alongside the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// RFC 3339 timestamp of the build.
    #[serde(default)]
    pub generated_at: Option<String>,
    /// The directory that was indexed.
    #[serde(default)]
    pub source_root: Option<String>,
    #[serde(default)]
    pub node_count: usize,
    #[serde(default)]
    pub edge_count: usize,
}

// ─── Extracted Facts ──────────────────────────────────────────────────────────

/// A source position, both components 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// What an extracted [`Symbol`] defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Class,
    Variable,
}

/// A definition found while walking a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// The name as written.
    pub name: String,
    /// Enclosing scope names and `name`, dot-joined.
    pub qualified_name: String,
    pub location: Location,
}

/// A call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFact {
    /// Dotted callee, after the `self.` rewrite when it applied.
    pub callee: String,
    /// Qualified name of the nearest enclosing function; `None` at module scope.
    pub caller: Option<String>,
    pub location: Location,
}

/// Which import form produced an [`ImportFact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `import a, b.c`
    Import,
    /// `from m import a, b`
    From,
}

/// One import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFact {
    pub kind: ImportKind,
    /// The `from` module; `None` for plain imports and bare relative imports.
    pub module: Option<String>,
    /// Imported names as written (aliases dropped), in order, without duplicates.
    pub names: Vec<String>,
    pub location: Location,
}

/// A class statement with a non-empty base list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InheritanceFact {
    /// Qualified name of the class being defined.
    pub class_name: String,
    pub bases: Vec<String>,
    pub location: Location,
}

/// All extracted information from a single source file.
#[derive(Debug, Clone, Default)]
pub struct FileFacts {
    /// Path of the source file, as used in node ids.
    pub path: String,
    pub functions: Vec<Symbol>,
    pub classes: Vec<Symbol>,
    pub variables: Vec<Symbol>,
    pub imports: Vec<ImportFact>,
    pub calls: Vec<CallFact>,
    pub inherits: Vec<InheritanceFact>,
}

impl FileFacts {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}
