//! Import statements, read from the grammar's own import productions.
//!
//! `import a, b` and `from m import a, b` are normalized into one shape.
//! Names come from the `name` fields of the statement (`dotted_name` or
//! `aliased_import`); aliases are dropped. Relative dots are not part of the
//! module name, so `from . import x` has no module.

use tree_sitter::Node;

use crate::graph::types::ImportKind;

/// The normalized form of one import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedImport {
    pub kind: ImportKind,
    pub module: Option<String>,
    pub names: Vec<String>,
}

/// Read an `import_statement` or `import_from_statement` node.
///
/// Returns `None` for any other node and for statements the parser had to
/// recover from.
pub fn parse_import_node(node: Node, source: &[u8]) -> Option<ParsedImport> {
    if node.has_error() {
        return None;
    }
    match node.kind() {
        "import_statement" => Some(ParsedImport {
            kind: ImportKind::Import,
            module: None,
            names: imported_names(node, source)?,
        }),
        "import_from_statement" => {
            let module = node
                .child_by_field_name("module_name")
                .and_then(|module| module_name(module, source));

            let mut cursor = node.walk();
            let wildcard = node
                .children(&mut cursor)
                .any(|child| child.kind() == "wildcard_import");
            let names = if wildcard {
                vec!["*".to_string()]
            } else {
                imported_names(node, source)?
            };

            Some(ParsedImport {
                kind: ImportKind::From,
                module,
                names,
            })
        }
        _ => None,
    }
}

/// The `name` fields of a statement, aliases dropped, duplicates collapsed.
fn imported_names(node: Node, source: &[u8]) -> Option<Vec<String>> {
    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.children_by_field_name("name", &mut cursor) {
        let dotted = match child.kind() {
            "aliased_import" => child.child_by_field_name("name")?,
            _ => child,
        };
        let name = dotted_text(dotted, source);
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    (!names.is_empty()).then_some(names)
}

/// `dotted_name` text, or the dotted part of a `relative_import`.
fn module_name(node: Node, source: &[u8]) -> Option<String> {
    let dotted = match node.kind() {
        "relative_import" => {
            let mut cursor = node.walk();
            let found = node
                .named_children(&mut cursor)
                .find(|child| child.kind() == "dotted_name");
            found?
        }
        _ => node,
    };
    Some(dotted_text(dotted, source)).filter(|name| !name.is_empty())
}

/// Identifiers of a `dotted_name` joined with `.`, ignoring any whitespace
/// or line continuations between them.
fn dotted_text(node: Node, source: &[u8]) -> String {
    if node.kind() == "identifier" {
        return node.utf8_text(source).unwrap_or_default().to_string();
    }
    let mut cursor = node.walk();
    let parts: Vec<&str> = node
        .named_children(&mut cursor)
        .filter(|part| part.kind() == "identifier")
        .filter_map(|part| part.utf8_text(source).ok())
        .collect();
    parts.join(".")
}
