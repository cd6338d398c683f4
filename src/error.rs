//! Error types for pyatlas.
//!
//! Extraction and resolution never fail on odd input (they skip or fall back
//! to external nodes), so most variants here describe I/O and persistence
//! problems at the edges of the pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// The crate-wide error type.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted graph artifact does not exist.
    #[error("graph artifact not found: {0}")]
    GraphNotFound(PathBuf),

    /// The graph artifact is not valid JSON or does not match the node-link shape.
    #[error("corrupt graph document {path}: {source}")]
    CorruptDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document parsed but is structurally inconsistent.
    #[error("invalid graph document: {0}")]
    InvalidDocument(String),

    /// The Python grammar could not be loaded into the parser.
    #[error("failed to load Python grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    /// tree-sitter returned no tree for the given source.
    #[error("parser produced no syntax tree for {0}")]
    Parse(String),

    /// The file extension is not a Python source extension.
    #[error("unsupported file type: {0}")]
    UnsupportedLanguage(PathBuf),

    /// Serializing the graph failed.
    #[error("failed to serialize graph: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl GraphError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GraphError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_path() {
        let err = GraphError::GraphNotFound(PathBuf::from("out/graph.json"));
        assert_eq!(err.to_string(), "graph artifact not found: out/graph.json");

        let err = GraphError::io(
            "a.py",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().starts_with("I/O error on a.py"));
    }
}
