//! Structural symbol extraction from a Python syntax tree.
//!
//! One depth-first walk per file collects definitions, imports, call sites
//! and base-class lists. Every name is qualified by its lexical nesting of
//! classes and functions; no other block scoping is tracked.
//!
//! Calls written as `self.<rest>(...)` inside a class body are rewritten to
//! `<EnclosingClass>.<rest>`. This is a naming rule, not type inference: it
//! ignores aliasing (`s = self; s.m()`), inherited methods, mixins and any
//! dispatch that happens at runtime. `Foo().method()` is left untouched.

use tree_sitter::Node;

use super::imports::parse_import_node;
use crate::graph::types::{
    CallFact, FileFacts, ImportFact, InheritanceFact, Location, Symbol, SymbolKind,
};

const SELF_PREFIX: &str = "self.";

/// Fields that hold assignment targets, in preference order.
const TARGET_FIELDS: &[&str] = &["left", "target", "targets", "name"];

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "**=", "//=", "@=", "&=", "|=", "^=", ">>=", "<<=",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Function,
    Class,
}

/// Lexical nesting at one point of the walk.
///
/// Scopes are values: entering a definition produces a new scope and the
/// caller's copy is left untouched.
#[derive(Debug, Clone, Default)]
struct Scope {
    frames: Vec<(ScopeKind, String)>,
}

impl Scope {
    fn enter(&self, kind: ScopeKind, name: &str) -> Scope {
        let mut frames = self.frames.clone();
        frames.push((kind, name.to_string()));
        Scope { frames }
    }

    fn qualify(&self, name: &str) -> String {
        self.frames
            .iter()
            .map(|(_, frame)| frame.as_str())
            .chain(std::iter::once(name))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Qualified name of the innermost frame of `kind`.
    fn innermost(&self, kind: ScopeKind) -> Option<String> {
        let idx = self.frames.iter().rposition(|(k, _)| *k == kind)?;
        Some(
            self.frames[..=idx]
                .iter()
                .map(|(_, frame)| frame.as_str())
                .collect::<Vec<_>>()
                .join("."),
        )
    }
}

/// Walks one file's syntax tree and accumulates its [`FileFacts`].
pub struct SymbolExtractor<'a> {
    source: &'a [u8],
    facts: FileFacts,
}

impl<'a> SymbolExtractor<'a> {
    pub fn new(path: &str, source: &'a [u8]) -> Self {
        Self {
            source,
            facts: FileFacts::new(path),
        }
    }

    /// Walk the tree rooted at `root` and return everything found.
    ///
    /// The walk is driven by an explicit work stack, so nesting depth in the
    /// source is bounded by memory rather than by the thread's stack.
    pub fn extract(mut self, root: Node) -> FileFacts {
        // Scopes live in an arena; stack entries refer to them by index.
        let mut scopes = vec![Scope::default()];
        let mut stack = vec![(root, 0usize)];

        while let Some((node, scope_id)) = stack.pop() {
            let scope = &scopes[scope_id];
            let entered = match node.kind() {
                "function_definition" => self.visit_function(node, scope),
                "class_definition" => self.visit_class(node, scope),
                "assignment" | "augmented_assignment" => {
                    self.record_assignment(node, scope);
                    None
                }
                "import_statement" | "import_from_statement" => {
                    self.record_import(node);
                    None
                }
                "call" => {
                    self.record_call(node, scope);
                    None
                }
                _ => None,
            };

            match entered {
                Some(inner) => {
                    scopes.push(inner);
                    push_definition(&mut stack, node, scope_id, scopes.len() - 1);
                }
                None => push_children(&mut stack, node, scope_id),
            }
        }
        self.facts
    }

    /// Record a function and return the scope its body is walked in.
    fn visit_function(&mut self, node: Node, scope: &Scope) -> Option<Scope> {
        let name_node = node.child_by_field_name("name")?;
        let name = self.text(name_node).to_string();

        self.facts.functions.push(Symbol {
            kind: SymbolKind::Function,
            qualified_name: scope.qualify(&name),
            name: name.clone(),
            location: location(name_node),
        });

        Some(scope.enter(ScopeKind::Function, &name))
    }

    /// Record a class and its bases and return the scope of its body.
    fn visit_class(&mut self, node: Node, scope: &Scope) -> Option<Scope> {
        let name_node = node.child_by_field_name("name")?;
        let name = self.text(name_node).to_string();
        let qualified_name = scope.qualify(&name);

        self.facts.classes.push(Symbol {
            kind: SymbolKind::Class,
            name: name.clone(),
            qualified_name: qualified_name.clone(),
            location: location(name_node),
        });

        let bases = self.class_bases(node);
        if !bases.is_empty() {
            self.facts.inherits.push(InheritanceFact {
                class_name: qualified_name,
                bases,
                location: location(node),
            });
        }

        Some(scope.enter(ScopeKind::Class, &name))
    }

    fn record_assignment(&mut self, node: Node, scope: &Scope) {
        for target in self.assignment_targets(node) {
            self.facts.variables.push(Symbol {
                kind: SymbolKind::Variable,
                qualified_name: scope.qualify(&target),
                name: target,
                location: location(node),
            });
        }
    }

    fn record_import(&mut self, node: Node) {
        match parse_import_node(node, self.source) {
            Some(parsed) => self.facts.imports.push(ImportFact {
                kind: parsed.kind,
                module: parsed.module,
                names: parsed.names,
                location: location(node),
            }),
            None => {
                tracing::debug!(
                    path = %self.facts.path,
                    line = node.start_position().row + 1,
                    "skipping unparseable import statement"
                );
            }
        }
    }

    fn record_call(&mut self, node: Node, scope: &Scope) {
        let Some(function) = node.child_by_field_name("function").or_else(|| node.child(0)) else {
            return;
        };
        let callee = self.dotted_name(function);
        if callee.is_empty() {
            return;
        }

        self.facts.calls.push(CallFact {
            callee: rewrite_self_call(callee, scope),
            caller: scope.innermost(ScopeKind::Function),
            location: location(node),
        });
    }

    // ─── Name Helpers ───────────────────────────────────────────

    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source).unwrap_or_default()
    }

    /// Render a callee expression as a dotted path (`a.b.c`).
    /// Anything that is not a name or attribute chain is kept verbatim.
    fn dotted_name(&self, node: Node) -> String {
        let mut attributes = Vec::new();
        let mut base = node;
        while base.kind() == "attribute" {
            let (Some(object), Some(attribute)) = (
                base.child_by_field_name("object"),
                base.child_by_field_name("attribute"),
            ) else {
                break;
            };
            attributes.push(self.text(attribute));
            base = object;
        }

        let head = self.text(base);
        if head.is_empty() {
            return self.text(node).to_string();
        }
        std::iter::once(head)
            .chain(attributes.into_iter().rev())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Names under `node` in source order: identifiers, and attribute
    /// chains as one dotted name.
    fn collect_identifiers(&self, node: Node, names: &mut Vec<String>) {
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "identifier" => names.push(self.text(node).to_string()),
                "attribute" => names.push(self.dotted_name(node)),
                _ => {
                    let mut cursor = node.walk();
                    let children: Vec<Node> = node.children(&mut cursor).collect();
                    stack.extend(children.into_iter().rev());
                }
            }
        }
    }

    fn assignment_targets(&self, node: Node) -> Vec<String> {
        let mut names = Vec::new();
        for field in TARGET_FIELDS {
            if let Some(child) = node.child_by_field_name(field) {
                self.collect_identifiers(child, &mut names);
                return names;
            }
        }

        let count = node.child_count();
        for i in 0..count {
            let Some(child) = node.child(i) else { continue };
            if ASSIGNMENT_OPERATORS.contains(&child.kind()) {
                break;
            }
            self.collect_identifiers(child, &mut names);
        }
        names
    }

    /// Base names from the class's argument list. Keyword arguments
    /// (`metaclass=...`) are not bases; for `Generic[T]` only `Generic` counts.
    fn class_bases(&self, node: Node) -> Vec<String> {
        let Some(list) = node
            .child_by_field_name("superclasses")
            .or_else(|| node.child_by_field_name("superclass"))
        else {
            return Vec::new();
        };

        let mut bases = Vec::new();
        let count = list.child_count();
        for i in 0..count {
            let Some(child) = list.child(i) else { continue };
            match child.kind() {
                "keyword_argument" | "dictionary_splat" | "list_splat" => {}
                "subscript" => {
                    if let Some(value) = child.child_by_field_name("value") {
                        self.collect_identifiers(value, &mut bases);
                    }
                }
                _ => self.collect_identifiers(child, &mut bases),
            }
        }
        bases
    }
}

type WorkStack<'t> = Vec<(Node<'t>, usize)>;

/// Queue `node`'s children so they pop in source order.
fn push_children<'t>(stack: &mut WorkStack<'t>, node: Node<'t>, scope: usize) {
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    stack.extend(children.into_iter().rev().map(|child| (child, scope)));
}

/// Queue a definition's children: the body under `inner`, everything else
/// (parameters, defaults, annotations, base lists) under `outer`. The name
/// is skipped.
fn push_definition<'t>(stack: &mut WorkStack<'t>, node: Node<'t>, outer: usize, inner: usize) {
    let body = node.child_by_field_name("body");
    let name = node.child_by_field_name("name");
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node
        .children(&mut cursor)
        .filter(|child| Some(*child) != name)
        .collect();
    stack.extend(children.into_iter().rev().map(|child| {
        let scope = if Some(child) == body { inner } else { outer };
        (child, scope)
    }));
}

/// Rewrite `self.<rest>` to `<EnclosingClass>.<rest>` when a class scope is active.
fn rewrite_self_call(callee: String, scope: &Scope) -> String {
    match (
        callee.strip_prefix(SELF_PREFIX),
        scope.innermost(ScopeKind::Class),
    ) {
        (Some(rest), Some(class)) => format!("{class}.{rest}"),
        _ => callee,
    }
}

fn location(node: Node) -> Location {
    let point = node.start_position();
    Location {
        line: point.row + 1,
        column: point.column + 1,
    }
}
