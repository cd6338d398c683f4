//! Traversals over an edge-type-filtered view of the graph.
//!
//! Filtering never removes nodes: a node whose edges are all filtered out is
//! still part of the view, just isolated.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

use super::types::Direction;
use crate::graph::types::{EdgeData, EdgeKind, NodeData};

type Graph = DiGraph<NodeData, EdgeData>;

/// The set of edge types a query may follow.
#[derive(Debug, Clone, Default)]
pub struct EdgeFilter {
    allowed: Option<HashSet<EdgeKind>>,
}

impl EdgeFilter {
    /// Follow every edge type.
    pub fn all() -> Self {
        Self { allowed: None }
    }

    /// Follow only `kinds`; an empty slice means every type.
    pub fn new(kinds: &[EdgeKind]) -> Self {
        if kinds.is_empty() {
            return Self::all();
        }
        Self {
            allowed: Some(kinds.iter().copied().collect()),
        }
    }

    pub fn allows(&self, kind: EdgeKind) -> bool {
        self.allowed
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&kind))
    }
}

/// Nodes and edges reached by [`expand`], in discovery order.
#[derive(Debug, Default)]
pub struct Expansion {
    pub nodes: Vec<NodeIndex>,
    pub edges: Vec<EdgeIndex>,
}

/// Bounded breadth-first expansion from `seeds`.
///
/// Runs at most `hops` rounds. A neighbor is admitted only while fewer than
/// `limit` nodes have been collected, so the cap can cut a round short. An
/// edge is reported when both of its endpoints end up in the result.
pub fn expand(
    graph: &Graph,
    seeds: &[NodeIndex],
    direction: Direction,
    hops: usize,
    filter: &EdgeFilter,
    limit: usize,
) -> Expansion {
    let mut expansion = Expansion::default();
    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut seen_edges: HashSet<EdgeIndex> = HashSet::new();

    for &seed in seeds {
        if visited.insert(seed) {
            expansion.nodes.push(seed);
        }
    }

    let mut frontier = expansion.nodes.clone();
    for _ in 0..hops {
        if frontier.is_empty() {
            break;
        }
        let mut next = Vec::new();
        for &node in &frontier {
            for (edge, neighbor) in adjacent(graph, node, direction, filter) {
                if !visited.contains(&neighbor) && expansion.nodes.len() < limit {
                    visited.insert(neighbor);
                    expansion.nodes.push(neighbor);
                    next.push(neighbor);
                }
                if visited.contains(&neighbor) && seen_edges.insert(edge) {
                    expansion.edges.push(edge);
                }
            }
        }
        frontier = next;
    }

    expansion
}

fn adjacent(
    graph: &Graph,
    node: NodeIndex,
    direction: Direction,
    filter: &EdgeFilter,
) -> Vec<(EdgeIndex, NodeIndex)> {
    let mut adjacent = Vec::new();
    if direction.follows_outgoing() {
        adjacent.extend(
            graph
                .edges_directed(node, petgraph::Direction::Outgoing)
                .filter(|edge| filter.allows(edge.weight().kind))
                .map(|edge| (edge.id(), edge.target())),
        );
    }
    if direction.follows_incoming() {
        adjacent.extend(
            graph
                .edges_directed(node, petgraph::Direction::Incoming)
                .filter(|edge| filter.allows(edge.weight().kind))
                .map(|edge| (edge.id(), edge.source())),
        );
    }
    adjacent
}

/// Unweighted shortest path from `source` to `target`.
///
/// Neighbors are explored in node-id order, so ties break the same way on
/// every run. Undirected queries always search from the smaller id and
/// reverse when needed, which makes `path(a, b)` the reverse of `path(b, a)`.
pub fn shortest_path(
    graph: &Graph,
    source: NodeIndex,
    target: NodeIndex,
    filter: &EdgeFilter,
    directed: bool,
) -> Option<Vec<NodeIndex>> {
    if !directed && graph[source].id > graph[target].id {
        let mut path = shortest_path(graph, target, source, filter, directed)?;
        path.reverse();
        return Some(path);
    }
    if source == target {
        return Some(vec![source]);
    }

    let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::from([source]);
    previous.insert(source, source);

    while let Some(node) = queue.pop_front() {
        for neighbor in sorted_neighbors(graph, node, filter, directed) {
            if previous.contains_key(&neighbor) {
                continue;
            }
            previous.insert(neighbor, node);
            if neighbor == target {
                return Some(walk_back(&previous, source, target));
            }
            queue.push_back(neighbor);
        }
    }
    None
}

fn sorted_neighbors(
    graph: &Graph,
    node: NodeIndex,
    filter: &EdgeFilter,
    directed: bool,
) -> Vec<NodeIndex> {
    let direction = if directed {
        Direction::Outgoing
    } else {
        Direction::Both
    };
    let mut neighbors: Vec<NodeIndex> = adjacent(graph, node, direction, filter)
        .into_iter()
        .map(|(_, neighbor)| neighbor)
        .collect();
    neighbors.sort_by(|a, b| graph[*a].id.cmp(&graph[*b].id));
    neighbors.dedup();
    neighbors
}

fn walk_back(
    previous: &HashMap<NodeIndex, NodeIndex>,
    source: NodeIndex,
    target: NodeIndex,
) -> Vec<NodeIndex> {
    let mut path = vec![target];
    let mut node = target;
    while node != source {
        match previous.get(&node) {
            Some(&prev) => {
                path.push(prev);
                node = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// The stored edge joining two consecutive path nodes.
///
/// For undirected queries the edge may run from `b` to `a`; it is reported
/// with its stored orientation.
pub fn edge_between(
    graph: &Graph,
    a: NodeIndex,
    b: NodeIndex,
    filter: &EdgeFilter,
    directed: bool,
) -> Option<EdgeIndex> {
    let allowed = |from: NodeIndex, to: NodeIndex| {
        graph
            .edges_connecting(from, to)
            .find(|edge| filter.allows(edge.weight().kind))
            .map(|edge| edge.id())
    };
    allowed(a, b).or_else(|| if directed { None } else { allowed(b, a) })
}

/// Degree (in plus out) of every node in the filtered view, by node index.
pub fn degrees(graph: &Graph, filter: &EdgeFilter) -> Vec<usize> {
    let mut degrees = vec![0; graph.node_count()];
    for edge in graph.edge_references() {
        if filter.allows(edge.weight().kind) {
            degrees[edge.source().index()] += 1;
            degrees[edge.target().index()] += 1;
        }
    }
    degrees
}

/// Sizes of the weakly connected components of the filtered view, largest first.
pub fn component_sizes(graph: &Graph, filter: &EdgeFilter) -> Vec<usize> {
    let mut components = UnionFind::<usize>::new(graph.node_count());
    for edge in graph.edge_references() {
        if filter.allows(edge.weight().kind) {
            components.union(edge.source().index(), edge.target().index());
        }
    }

    let mut sizes: HashMap<usize, usize> = HashMap::new();
    for root in components.into_labeling() {
        *sizes.entry(root).or_default() += 1;
    }
    let mut sizes: Vec<usize> = sizes.into_values().collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::engine::CodeGraph;
    use crate::graph::types::NodeData;

    /// a -> b -> c -> d (CALLS), e -INHERITS-> a, f isolated.
    fn chain() -> (CodeGraph, Vec<NodeIndex>) {
        let mut graph = CodeGraph::new();
        let ids: Vec<NodeIndex> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|name| graph.ensure_node(NodeData::external_function(name)))
            .collect();
        graph.add_edge(ids[0], ids[1], EdgeKind::Calls);
        graph.add_edge(ids[1], ids[2], EdgeKind::Calls);
        graph.add_edge(ids[2], ids[3], EdgeKind::Calls);
        graph.add_edge(ids[4], ids[0], EdgeKind::Inherits);
        (graph, ids)
    }

    #[test]
    fn test_expand_respects_hops_and_direction() {
        let (graph, ids) = chain();
        let g = graph.inner_graph();

        let out = expand(g, &[ids[0]], Direction::Outgoing, 2, &EdgeFilter::all(), 100);
        assert_eq!(out.nodes, vec![ids[0], ids[1], ids[2]]);
        assert_eq!(out.edges.len(), 2);

        let incoming = expand(g, &[ids[0]], Direction::Incoming, 3, &EdgeFilter::all(), 100);
        assert_eq!(incoming.nodes, vec![ids[0], ids[4]]);

        let both = expand(g, &[ids[0]], Direction::Both, 1, &EdgeFilter::all(), 100);
        assert_eq!(both.nodes.len(), 3);
    }

    #[test]
    fn test_expand_zero_hops_returns_seeds() {
        let (graph, ids) = chain();
        let out = expand(graph.inner_graph(), &[ids[1]], Direction::Both, 0, &EdgeFilter::all(), 100);
        assert_eq!(out.nodes, vec![ids[1]]);
        assert!(out.edges.is_empty());
    }

    #[test]
    fn test_expand_limit_cuts_mid_hop() {
        let (graph, ids) = chain();
        let out = expand(graph.inner_graph(), &[ids[1]], Direction::Both, 1, &EdgeFilter::all(), 2);
        assert_eq!(out.nodes.len(), 2);
        assert_eq!(out.edges.len(), 1, "edges to dropped neighbors are not reported");
    }

    #[test]
    fn test_expand_filters_edge_types() {
        let (graph, ids) = chain();
        let filter = EdgeFilter::new(&[EdgeKind::Inherits]);
        let out = expand(graph.inner_graph(), &[ids[0]], Direction::Both, 5, &filter, 100);
        assert_eq!(out.nodes, vec![ids[0], ids[4]]);
    }

    #[test]
    fn test_shortest_path_directed_and_undirected() {
        let (graph, ids) = chain();
        let g = graph.inner_graph();
        let all = EdgeFilter::all();

        assert_eq!(
            shortest_path(g, ids[0], ids[3], &all, true),
            Some(vec![ids[0], ids[1], ids[2], ids[3]])
        );
        assert_eq!(shortest_path(g, ids[3], ids[0], &all, true), None);

        let forward = shortest_path(g, ids[3], ids[4], &all, false).unwrap();
        let mut backward = shortest_path(g, ids[4], ids[3], &all, false).unwrap();
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 5);

        assert_eq!(shortest_path(g, ids[0], ids[5], &all, false), None);
        assert_eq!(shortest_path(g, ids[2], ids[2], &all, true), Some(vec![ids[2]]));
    }

    #[test]
    fn test_edge_between_reports_stored_orientation() {
        let (graph, ids) = chain();
        let g = graph.inner_graph();
        let all = EdgeFilter::all();
        let edge = edge_between(g, ids[1], ids[0], &all, false).unwrap();
        let (source, target) = g.edge_endpoints(edge).unwrap();
        assert_eq!((source, target), (ids[0], ids[1]));
        assert!(edge_between(g, ids[1], ids[0], &all, true).is_none());
    }

    #[test]
    fn test_degrees_and_components() {
        let (graph, _) = chain();
        let g = graph.inner_graph();

        assert_eq!(degrees(g, &EdgeFilter::all()), vec![2, 2, 2, 1, 1, 0]);
        assert_eq!(component_sizes(g, &EdgeFilter::all()), vec![5, 1]);
        assert_eq!(
            component_sizes(g, &EdgeFilter::new(&[EdgeKind::Inherits])),
            vec![2, 1, 1, 1, 1]
        );
    }
}
