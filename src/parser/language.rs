//! Source file detection and tree-sitter grammar loading.

use std::path::Path;
use tree_sitter::Language;

/// File extensions treated as Python source.
pub const PYTHON_EXTENSIONS: &[&str] = &["py", "pyw"];

/// Check whether a path has a Python source extension.
pub fn is_python_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PYTHON_EXTENSIONS.contains(&ext))
}

/// Get the tree-sitter Language for Python.
pub fn python_language() -> Language {
    tree_sitter_python::LANGUAGE.into()
}
