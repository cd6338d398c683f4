//! Read-only queries over a loaded graph.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use petgraph::graph::{EdgeIndex, NodeIndex};
use tracing::debug;

use super::traverse::{self, EdgeFilter};
use super::types::*;
use crate::config::QueryConfig;
use crate::error::Result;
use crate::graph::engine::CodeGraph;
use crate::graph::persistence::load_graph;
use crate::graph::types::{EdgeKind, NodeData, NodeKind};

/// Reported by [`GraphQueryService::path`] when an endpoint does not resolve.
pub const SOURCE_OR_TARGET_NOT_FOUND: &str = "Source or target not found";
/// Reported by [`GraphQueryService::path`] when the endpoints are not connected.
pub const NO_PATH_FOUND: &str = "No path found";

/// Options shared by dependency and subgraph expansion.
#[derive(Debug, Clone, Default)]
pub struct ExpandOptions {
    pub direction: Direction,
    /// Hops to expand; the configured default when unset.
    pub hops: Option<usize>,
    /// Edge types to follow; empty follows all.
    pub edge_types: Vec<EdgeKind>,
    /// Maximum number of nodes returned; the configured default when unset.
    pub limit: Option<usize>,
}

type ExactIndex = HashMap<String, Vec<NodeIndex>>;

/// Query service over an immutable [`CodeGraph`].
///
/// Lookups by id, name, qualified name and path are case-insensitive exact
/// matches; anything else falls back to a substring scan in node order.
pub struct GraphQueryService {
    graph: CodeGraph,
    graph_path: Option<PathBuf>,
    config: QueryConfig,
    root_markers: Vec<String>,
    by_id: ExactIndex,
    by_name: ExactIndex,
    by_qualified_name: ExactIndex,
    by_path: ExactIndex,
}

impl GraphQueryService {
    pub fn new(graph: CodeGraph, graph_path: Option<PathBuf>, config: QueryConfig) -> Self {
        let mut by_id = ExactIndex::new();
        let mut by_name = ExactIndex::new();
        let mut by_qualified_name = ExactIndex::new();
        let mut by_path = ExactIndex::new();

        let inner = graph.inner_graph();
        for idx in inner.node_indices() {
            let node = &inner[idx];
            index_exact(&mut by_id, &node.id, idx);
            index_exact(&mut by_name, &node.name, idx);
            if let Some(qualified_name) = &node.qualified_name {
                index_exact(&mut by_qualified_name, qualified_name, idx);
            }
            if let Some(path) = &node.path {
                index_exact(&mut by_path, path, idx);
            }
        }

        let mut root_markers = config.root_markers.clone();
        if let Some(name) = graph
            .snapshot()
            .and_then(|s| s.source_root.as_deref())
            .and_then(|root| Path::new(root).file_name())
            .and_then(|name| name.to_str())
        {
            root_markers.push(name.to_string());
        }
        root_markers.retain(|marker| !marker.is_empty());

        Self {
            graph,
            graph_path,
            config,
            root_markers,
            by_id,
            by_name,
            by_qualified_name,
            by_path,
        }
    }

    /// Load the artifact at `path` and index it.
    pub fn from_path(path: &Path, config: QueryConfig) -> Result<Self> {
        let graph = load_graph(path)?;
        Ok(Self::new(graph, Some(path.to_path_buf()), config))
    }

    pub fn graph(&self) -> &CodeGraph {
        &self.graph
    }

    // ─── Queries ────────────────────────────────────────────────

    /// Nodes whose id, name, qualified name or path contains `query`,
    /// ignoring case, optionally restricted to `node_types`.
    pub fn search(&self, query: &str, node_types: &[NodeKind], limit: Option<usize>) -> SearchResult {
        let limit = limit.unwrap_or(self.config.search_limit);
        let matches = self.search_nodes(query, node_types, limit);
        SearchResult {
            query: query.to_string(),
            matches: self.node_views(&matches),
        }
    }

    /// What the matched nodes depend on and what depends on them.
    pub fn dependencies(&self, query: &str, options: &ExpandOptions) -> ExpansionResult {
        let hops = options.hops.unwrap_or(self.config.default_hops);
        let seeds = self.resolve_seeds(query, self.config.seed_limit);
        let expansion = traverse::expand(
            self.graph.inner_graph(),
            &seeds,
            options.direction,
            hops,
            &EdgeFilter::new(&options.edge_types),
            options.limit.unwrap_or(self.config.expand_limit),
        );
        debug!(query, seeds = seeds.len(), nodes = expansion.nodes.len(), "expanded");

        ExpansionResult {
            query: query.to_string(),
            matched: self.node_views(&seeds),
            direction: options.direction,
            hops,
            nodes: self.node_views(&expansion.nodes),
            edges: self.edge_views(&expansion.edges),
        }
    }

    /// The neighborhood of the matched nodes. Same traversal as
    /// [`dependencies`](Self::dependencies).
    pub fn subgraph(&self, query: &str, options: &ExpandOptions) -> ExpansionResult {
        self.dependencies(query, options)
    }

    /// Everything that reaches the matched nodes within `hops` incoming edges.
    pub fn impact(
        &self,
        query: &str,
        hops: Option<usize>,
        edge_types: &[EdgeKind],
        limit: Option<usize>,
    ) -> ImpactResult {
        let options = ExpandOptions {
            direction: Direction::Incoming,
            hops: Some(hops.unwrap_or(self.config.impact_hops)),
            edge_types: edge_types.to_vec(),
            limit,
        };
        let expansion = self.dependencies(query, &options);
        ImpactResult {
            query: expansion.query,
            matched: expansion.matched,
            hops: expansion.hops,
            nodes: expansion.nodes,
            edges: expansion.edges,
        }
    }

    /// Shortest path between the best match for `source` and for `target`.
    ///
    /// Undirected unless `directed` is set.
    pub fn path(&self, source: &str, target: &str, edge_types: &[EdgeKind], directed: bool) -> PathResult {
        let source_seeds = self.resolve_seeds(source, 1);
        let target_seeds = self.resolve_seeds(target, 1);
        let mut result = PathResult {
            source: source.to_string(),
            target: target.to_string(),
            matches: PathMatches {
                source: self.node_views(&source_seeds),
                target: self.node_views(&target_seeds),
            },
            path: Vec::new(),
            edges: Vec::new(),
            error: None,
        };

        let (Some(&from), Some(&to)) = (source_seeds.first(), target_seeds.first()) else {
            result.error = Some(SOURCE_OR_TARGET_NOT_FOUND.to_string());
            return result;
        };

        let graph = self.graph.inner_graph();
        let filter = EdgeFilter::new(edge_types);
        match traverse::shortest_path(graph, from, to, &filter, directed) {
            Some(path) => {
                let edges: Vec<EdgeIndex> = path
                    .windows(2)
                    .filter_map(|step| traverse::edge_between(graph, step[0], step[1], &filter, directed))
                    .collect();
                result.path = self.node_views(&path);
                result.edges = self.edge_views(&edges);
            }
            None => result.error = Some(NO_PATH_FOUND.to_string()),
        }
        result
    }

    /// Counts, hubs, module breakdown and cluster sizes.
    ///
    /// Node and edge counts cover the whole graph; hubs and clusters use the
    /// view restricted to `edge_types`.
    pub fn stats(&self, edge_types: &[EdgeKind], limit: Option<usize>) -> StatsResult {
        let limit = limit.unwrap_or(self.config.stats_limit);
        let graph = self.graph.inner_graph();
        let filter = EdgeFilter::new(edge_types);

        let mut node_counts = std::collections::BTreeMap::new();
        for node in self.graph.nodes() {
            *node_counts.entry(node.kind.to_string()).or_insert(0) += 1;
        }
        let mut edge_counts = std::collections::BTreeMap::new();
        for edge in graph.edge_weights() {
            *edge_counts.entry(edge.kind.to_string()).or_insert(0) += 1;
        }

        let mut hubs: Vec<(NodeIndex, usize)> = traverse::degrees(graph, &filter)
            .into_iter()
            .enumerate()
            .map(|(i, degree)| (NodeIndex::new(i), degree))
            .collect();
        hubs.sort_by(|a, b| b.1.cmp(&a.1));
        let top_hubs = hubs
            .into_iter()
            .take(limit)
            .map(|(idx, degree)| Hub {
                node: graph[idx].clone(),
                degree,
            })
            .collect();

        let clusters = traverse::component_sizes(graph, &filter)
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, size)| ClusterSize { cluster: i + 1, size })
            .collect();

        StatsResult {
            node_counts,
            edge_counts,
            top_hubs,
            module_breakdown: self.module_breakdown(limit),
            clusters,
        }
    }

    pub fn metadata(&self) -> GraphMetadata {
        let snapshot = self.graph.snapshot();
        GraphMetadata {
            source_root: snapshot.and_then(|s| s.source_root.clone()),
            generated_at: snapshot.and_then(|s| s.generated_at.clone()),
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            graph_path: self
                .graph_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
        }
    }

    // ─── Internal Helpers ───────────────────────────────────────

    fn search_nodes(&self, query: &str, node_types: &[NodeKind], limit: usize) -> Vec<NodeIndex> {
        let needle = query.to_lowercase();
        let graph = self.graph.inner_graph();
        graph
            .node_indices()
            .filter(|&idx| {
                let node = &graph[idx];
                (node_types.is_empty() || node_types.contains(&node.kind))
                    && haystacks(node).any(|hay| hay.to_lowercase().contains(&needle))
            })
            .take(limit)
            .collect()
    }

    /// Resolve a query to seed nodes.
    ///
    /// An exact id match returns every node with that id. Otherwise the first
    /// non-empty exact bucket among qualified name, name and path wins,
    /// truncated to `limit`; failing those, a substring search.
    fn resolve_seeds(&self, query: &str, limit: usize) -> Vec<NodeIndex> {
        let key = query.to_lowercase();
        if let Some(ids) = self.by_id.get(&key) {
            return ids.clone();
        }
        for index in [&self.by_qualified_name, &self.by_name, &self.by_path] {
            if let Some(bucket) = index.get(&key).filter(|bucket| !bucket.is_empty()) {
                return bucket.iter().take(limit).copied().collect();
            }
        }
        self.search_nodes(query, &[], limit)
    }

    fn module_breakdown(&self, limit: usize) -> Vec<ModuleCount> {
        let mut breakdown: Vec<ModuleCount> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for node in self.graph.nodes() {
            let Some(path) = node.path.as_deref().filter(|p| !p.is_empty()) else {
                continue;
            };
            let module = module_group(path, &self.root_markers);
            match positions.get(&module) {
                Some(&pos) => breakdown[pos].count += 1,
                None => {
                    positions.insert(module.clone(), breakdown.len());
                    breakdown.push(ModuleCount { module, count: 1 });
                }
            }
        }
        breakdown.sort_by(|a, b| b.count.cmp(&a.count));
        breakdown.truncate(limit);
        breakdown
    }

    fn node_views(&self, nodes: &[NodeIndex]) -> Vec<NodeData> {
        let graph = self.graph.inner_graph();
        nodes.iter().map(|&idx| graph[idx].clone()).collect()
    }

    fn edge_views(&self, edges: &[EdgeIndex]) -> Vec<EdgeView> {
        let graph = self.graph.inner_graph();
        edges
            .iter()
            .filter_map(|&edge| {
                let (source, target) = graph.edge_endpoints(edge)?;
                Some(EdgeView {
                    source: graph[source].id.clone(),
                    target: graph[target].id.clone(),
                    kind: graph[edge].kind,
                })
            })
            .collect()
    }
}

fn index_exact(index: &mut ExactIndex, value: &str, idx: NodeIndex) {
    if !value.is_empty() {
        index.entry(value.to_lowercase()).or_default().push(idx);
    }
}

fn haystacks(node: &NodeData) -> impl Iterator<Item = &str> {
    [
        Some(node.id.as_str()),
        Some(node.name.as_str()),
        node.qualified_name.as_deref(),
        node.path.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|hay| !hay.is_empty())
}

/// Coarse module label for a file path.
///
/// The first segment after a `/<marker>/` component when a root marker
/// occurs in the path (`"root"` if nothing follows it), otherwise the
/// parent directory name, otherwise the single segment itself.
pub fn module_group(path: &str, root_markers: &[String]) -> String {
    let normalized = path.replace('\\', "/");
    let lowered = normalized.to_ascii_lowercase();

    for marker in root_markers {
        let needle = format!("/{}/", marker.to_ascii_lowercase());
        if let Some(pos) = lowered.find(&needle) {
            return normalized[pos + needle.len()..]
                .split('/')
                .find(|part| !part.is_empty())
                .unwrap_or("root")
                .to_string();
        }
    }

    let parts: Vec<&str> = normalized.split('/').filter(|part| !part.is_empty()).collect();
    match parts.len() {
        0 => "root".to_string(),
        1 => parts[0].to_string(),
        n => parts[n - 2].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::GraphBuilder;
    use crate::graph::types::Snapshot;
    use crate::parser::extract_source;

    const APP: &str = "\
import os

class Base:
    def save(self):
        pass

class User(Base):
    def save(self):
        self.validate()
        os.path.join('a', 'b')

    def validate(self):
        pass

def create_user():
    User().save()
";

    const JOBS: &str = "\
from app import create_user

def nightly():
    create_user()
";

    fn service() -> GraphQueryService {
        let facts = vec![
            extract_source("src/app.py", APP).unwrap(),
            extract_source("src/jobs.py", JOBS).unwrap(),
        ];
        let graph = GraphBuilder::new().build(&facts);
        GraphQueryService::new(graph, None, QueryConfig::default())
    }

    fn ids(nodes: &[NodeData]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let service = service();
        let result = service.search("VALID", &[], None);
        assert_eq!(ids(&result.matches), vec!["func:src/app.py:User.validate"]);

        let classes = service.search("app.py", &[NodeKind::Class], None);
        assert_eq!(
            ids(&classes.matches),
            vec!["class:src/app.py:Base", "class:src/app.py:User"]
        );

        let limited = service.search("src/", &[], Some(2));
        assert_eq!(limited.matches.len(), 2);

        assert!(service.search("nothing-like-this", &[], None).matches.is_empty());
    }

    #[test]
    fn test_seed_resolution_order() {
        let service = service();
        // exact id
        let seeds = service.resolve_seeds("FUNC:src/app.py:User.save", 5);
        assert_eq!(seeds.len(), 1);
        // qualified name beats bare name
        let seeds = service.resolve_seeds("user.save", 5);
        assert_eq!(service.node_views(&seeds)[0].id, "func:src/app.py:User.save");
        // bare name bucket keeps node order and respects the limit; the
        // unresolved `User().save()` call contributes an external `save`
        let seeds = service.resolve_seeds("save", 5);
        assert_eq!(
            ids(&service.node_views(&seeds)),
            vec![
                "func:src/app.py:Base.save",
                "func:src/app.py:User.save",
                "func:external:User().save",
            ]
        );
        assert_eq!(service.resolve_seeds("save", 1).len(), 1);
        // substring fallback
        assert_eq!(service.resolve_seeds("nightl", 5).len(), 1);
        assert!(service.resolve_seeds("zzz", 5).is_empty());
    }

    #[test]
    fn test_dependencies_outgoing() {
        let service = service();
        let options = ExpandOptions {
            direction: Direction::Outgoing,
            ..ExpandOptions::default()
        };
        let result = service.dependencies("User.save", &options);
        assert_eq!(result.hops, 1);
        assert_eq!(result.direction, Direction::Outgoing);
        let nodes = ids(&result.nodes);
        assert!(nodes.contains(&"func:src/app.py:User.validate"));
        assert!(nodes.contains(&"func:external:os.path.join"));
        assert_eq!(result.edges.len(), 2);
        assert!(result.edges.iter().all(|e| e.source == "func:src/app.py:User.save"));
    }

    #[test]
    fn test_dependencies_edge_filter_and_unknown_query() {
        let service = service();
        let options = ExpandOptions {
            edge_types: vec![EdgeKind::Inherits],
            ..ExpandOptions::default()
        };
        let result = service.dependencies("class:src/app.py:User", &options);
        assert_eq!(
            ids(&result.nodes),
            vec!["class:src/app.py:User", "class:src/app.py:Base"]
        );

        let empty = service.dependencies("zzz", &ExpandOptions::default());
        assert!(empty.matched.is_empty());
        assert!(empty.nodes.is_empty());
        assert!(empty.edges.is_empty());
    }

    #[test]
    fn test_impact_follows_incoming_edges() {
        let service = service();
        let result = service.impact("create_user", None, &[], None);
        assert_eq!(result.hops, 2);
        let nodes = ids(&result.nodes);
        assert!(nodes.contains(&"func:src/jobs.py:nightly"));
        assert!(!nodes.contains(&"func:src/app.py:User.save"), "impact never follows outgoing edges");
    }

    #[test]
    fn test_path_and_not_found() {
        let service = service();
        let result = service.path("nightly", "Base", &[], false);
        assert_eq!(result.error.as_deref(), Some(NO_PATH_FOUND));
        assert!(result.path.is_empty());
        assert!(result.edges.is_empty());

        let result = service.path("nightly", "User.validate", &[], false);
        assert_eq!(result.error.as_deref(), Some(NO_PATH_FOUND));

        let result = service.path("User", "Base", &[], true);
        assert_eq!(ids(&result.path), vec!["class:src/app.py:User", "class:src/app.py:Base"]);
        assert_eq!(result.edges[0].kind, EdgeKind::Inherits);

        let result = service.path("zzz", "Base", &[], false);
        assert_eq!(result.error.as_deref(), Some(SOURCE_OR_TARGET_NOT_FOUND));
        assert!(result.matches.source.is_empty());
        assert_eq!(result.matches.target.len(), 1);
    }

    #[test]
    fn test_undirected_path_is_symmetric() {
        let service = service();
        let forward = service.path("nightly", "create_user", &[], false);
        let backward = service.path("create_user", "nightly", &[], false);
        let mut reversed = ids(&backward.path);
        reversed.reverse();
        assert_eq!(ids(&forward.path), reversed);
        assert_eq!(forward.edges, backward.edges);

        let directed_back = service.path("create_user", "nightly", &[], true);
        assert_eq!(directed_back.error.as_deref(), Some(NO_PATH_FOUND));
    }

    #[test]
    fn test_stats() {
        let service = service();
        let stats = service.stats(&[], None);
        assert_eq!(stats.node_counts["File"], 2);
        assert_eq!(stats.node_counts["Class"], 2);
        assert_eq!(stats.edge_counts["INHERITS"], 1);
        assert_eq!(stats.edge_counts["IMPORTS"], 2);
        assert!(stats.top_hubs.windows(2).all(|w| w[0].degree >= w[1].degree));
        assert_eq!(
            stats.module_breakdown,
            vec![ModuleCount { module: "src".to_string(), count: 9 }]
        );
        assert!(stats.clusters.windows(2).all(|w| w[0].size >= w[1].size));
        assert_eq!(stats.clusters[0].cluster, 1);
        let total: usize = stats.clusters.iter().map(|c| c.size).sum();
        assert_eq!(total, service.graph().node_count());

        let limited = service.stats(&[EdgeKind::Calls], Some(1));
        assert_eq!(limited.top_hubs.len(), 1);
        assert_eq!(limited.clusters.len(), 1);
    }

    #[test]
    fn test_module_group() {
        let markers = vec!["myrepo".to_string()];
        assert_eq!(module_group("/home/u/MyRepo/pkg/sub/a.py", &markers), "pkg");
        assert_eq!(module_group("/home/u/myrepo/a.py", &markers), "a.py");
        assert_eq!(module_group("C:\\work\\pkg\\a.py", &[]), "pkg");
        assert_eq!(module_group("a.py", &[]), "a.py");
        assert_eq!(module_group("", &[]), "root");
    }

    #[test]
    fn test_metadata_uses_snapshot_and_live_counts() {
        let mut graph = CodeGraph::new();
        graph.ensure_node(NodeData::file("/work/proj/pkg/a.py"));
        graph.set_snapshot(Snapshot {
            generated_at: Some("2026-01-01T00:00:00+00:00".to_string()),
            source_root: Some("/work/proj".to_string()),
            node_count: 0,
            edge_count: 0,
        });
        let service = GraphQueryService::new(
            graph,
            Some(PathBuf::from("out/graph.json")),
            QueryConfig::default(),
        );

        let metadata = service.metadata();
        assert_eq!(metadata.node_count, 1);
        assert_eq!(metadata.source_root.as_deref(), Some("/work/proj"));
        assert_eq!(metadata.graph_path.as_deref(), Some("out/graph.json"));

        // the snapshot root becomes a module marker
        let stats = service.stats(&[], None);
        assert_eq!(stats.module_breakdown[0].module, "pkg");
    }
}
