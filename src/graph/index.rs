//! Definition lookup tables used while the graph is being built.
//!
//! Every table is an ordered multimap: a key keeps all node ids registered
//! under it, in registration order, and a lookup returns the first one. With
//! files processed in a fixed order this makes resolution deterministic, but
//! it is not authoritative: when two files define the same name, whichever
//! was indexed first wins every ambiguous lookup.

use std::collections::HashMap;
use std::hash::Hash;

use super::types::Symbol;

/// Separator between scope names in a qualified name.
const QUALIFIER: char = '.';

/// Insertion-ordered buckets of node ids, first registration wins.
#[derive(Debug)]
struct OrderedMultimap<K> {
    buckets: HashMap<K, Vec<String>>,
}

impl<K: Eq + Hash> OrderedMultimap<K> {
    fn new() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }

    fn insert(&mut self, key: K, node_id: &str) {
        let bucket = self.buckets.entry(key).or_default();
        if !bucket.iter().any(|id| id == node_id) {
            bucket.push(node_id.to_string());
        }
    }

    fn first(&self, key: &K) -> Option<&str> {
        self.buckets
            .get(key)
            .and_then(|bucket| bucket.first())
            .map(String::as_str)
    }
}

type PathKey = (String, String);

fn path_key(path: &str, name: &str) -> PathKey {
    (path.to_string(), name.to_string())
}

/// Lookup tables from names to the nodes defining them.
#[derive(Debug)]
pub struct DefinitionIndex {
    func_by_path_qualified: OrderedMultimap<PathKey>,
    func_by_path_name: OrderedMultimap<PathKey>,
    func_by_qualified: OrderedMultimap<String>,
    func_by_name: OrderedMultimap<String>,
    class_by_path_qualified: OrderedMultimap<PathKey>,
    class_by_qualified: OrderedMultimap<String>,
    class_by_name: OrderedMultimap<String>,
}

impl DefinitionIndex {
    pub fn new() -> Self {
        Self {
            func_by_path_qualified: OrderedMultimap::new(),
            func_by_path_name: OrderedMultimap::new(),
            func_by_qualified: OrderedMultimap::new(),
            func_by_name: OrderedMultimap::new(),
            class_by_path_qualified: OrderedMultimap::new(),
            class_by_qualified: OrderedMultimap::new(),
            class_by_name: OrderedMultimap::new(),
        }
    }

    pub fn add_function(&mut self, path: &str, symbol: &Symbol, node_id: &str) {
        self.func_by_path_qualified
            .insert(path_key(path, &symbol.qualified_name), node_id);
        self.func_by_path_name
            .insert(path_key(path, &symbol.name), node_id);
        self.func_by_qualified
            .insert(symbol.qualified_name.clone(), node_id);
        self.func_by_name.insert(symbol.name.clone(), node_id);
    }

    pub fn add_class(&mut self, path: &str, symbol: &Symbol, node_id: &str) {
        self.class_by_path_qualified
            .insert(path_key(path, &symbol.qualified_name), node_id);
        self.class_by_qualified
            .insert(symbol.qualified_name.clone(), node_id);
        self.class_by_name.insert(symbol.name.clone(), node_id);
    }

    /// Exact lookup of a function defined in `path` under `qualified_name`.
    pub fn function_at(&self, path: &str, qualified_name: &str) -> Option<&str> {
        self.func_by_path_qualified
            .first(&path_key(path, qualified_name))
    }

    /// Exact lookup of a class defined in `path` under `qualified_name`.
    pub fn class_at(&self, path: &str, qualified_name: &str) -> Option<&str> {
        self.class_by_path_qualified
            .first(&path_key(path, qualified_name))
    }

    /// Resolve a callee name as seen from `path`.
    ///
    /// Dotted names match qualified names, exactly in `path` first, then
    /// globally. Bare names match a same-file definition first, then the
    /// first definition of that name anywhere.
    pub fn resolve_function(&self, path: &str, name: &str) -> Option<&str> {
        if name.is_empty() {
            return None;
        }
        if name.contains(QUALIFIER) {
            return self
                .function_at(path, name)
                .or_else(|| self.func_by_qualified.first(&name.to_string()));
        }
        self.func_by_path_name
            .first(&path_key(path, name))
            .or_else(|| self.func_by_name.first(&name.to_string()))
    }

    /// Resolve a base-class name as seen from `path`.
    ///
    /// Same scheme as [`resolve_function`](Self::resolve_function), except the
    /// same-file step always goes through the qualified table: a bare name
    /// only matches a top-level class of `path`.
    pub fn resolve_class(&self, path: &str, name: &str) -> Option<&str> {
        if name.is_empty() {
            return None;
        }
        let local = self.class_at(path, name);
        if name.contains(QUALIFIER) {
            return local.or_else(|| self.class_by_qualified.first(&name.to_string()));
        }
        local.or_else(|| self.class_by_name.first(&name.to_string()))
    }
}

impl Default for DefinitionIndex {
    fn default() -> Self {
        Self::new()
    }
}
