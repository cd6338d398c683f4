//! Python parsing and structural fact extraction.
//!
//! tree-sitter produces the syntax tree; [`extract::SymbolExtractor`] turns
//! it into the [`FileFacts`] consumed by the graph builder.

pub mod extract;
pub mod imports;
pub mod language;

use std::path::Path;

use tree_sitter::{Parser, Tree};

pub use extract::SymbolExtractor;
pub use language::{is_python_path, python_language};

use crate::error::{GraphError, Result};
use crate::graph::types::FileFacts;

/// A tree-sitter parser configured for Python.
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(&python_language())?;
        Ok(Self { parser })
    }

    /// Parse source text. `label` only names the input in errors.
    pub fn parse(&mut self, label: &str, source: &str) -> Result<Tree> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| GraphError::Parse(label.to_string()))
    }
}

/// Parse `source` and extract its facts, recording `path` as the file path.
///
/// No extension check; see [`extract_file`] for that.
pub fn extract_source(path: &str, source: &str) -> Result<FileFacts> {
    let mut parser = PythonParser::new()?;
    let tree = parser.parse(path, source)?;
    Ok(SymbolExtractor::new(path, source.as_bytes()).extract(tree.root_node()))
}

/// Extract facts from one file's contents.
pub fn extract_file(path: &Path, source: &str) -> Result<FileFacts> {
    if !is_python_path(path) {
        return Err(GraphError::UnsupportedLanguage(path.to_path_buf()));
    }
    extract_source(&path.to_string_lossy(), source)
}
