//! Undirected graph primitive used by the compilation pipeline.
//!
//! Nodes are dense `usize` slots (variable indices). Removed nodes keep their
//! slot so indices stay stable; neighbor sets are ordered, which keeps every
//! downstream traversal deterministic.

use std::collections::BTreeSet;

/// An undirected simple graph over dense node slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndirectedGraph {
    adjacency: Vec<Option<BTreeSet<usize>>>,
    edge_count: usize,
}

impl UndirectedGraph {
    /// Graph with nodes `0..nodes` and no edges.
    pub fn with_nodes(nodes: usize) -> Self {
        Self {
            adjacency: vec![Some(BTreeSet::new()); nodes],
            edge_count: 0,
        }
    }

    /// Adds (or revives) node `node`, growing the slot table as needed.
    pub fn add_node(&mut self, node: usize) {
        if node >= self.adjacency.len() {
            self.adjacency.resize(node + 1, None);
        }
        if self.adjacency[node].is_none() {
            self.adjacency[node] = Some(BTreeSet::new());
        }
    }

    /// Removes `node` and its incident edges.
    pub fn remove_node(&mut self, node: usize) {
        let Some(neighbors) = self.adjacency.get_mut(node).and_then(Option::take) else {
            return;
        };
        for other in &neighbors {
            if let Some(Some(set)) = self.adjacency.get_mut(*other) {
                set.remove(&node);
            }
        }
        self.edge_count -= neighbors.len();
    }

    /// Whether `node` is present.
    #[inline]
    pub fn contains(&self, node: usize) -> bool {
        matches!(self.adjacency.get(node), Some(Some(_)))
    }

    /// Adds the edge `a - b`. Self-loops and edges to absent nodes are ignored.
    /// Returns whether the edge is new.
    pub fn add_edge(&mut self, a: usize, b: usize) -> bool {
        if a == b || !self.contains(a) || !self.contains(b) {
            return false;
        }
        let inserted = self.adjacency[a].as_mut().is_some_and(|set| set.insert(b));
        if inserted {
            if let Some(set) = self.adjacency[b].as_mut() {
                set.insert(a);
            }
            self.edge_count += 1;
        }
        inserted
    }

    /// Removes the edge `a - b`. Returns whether it existed.
    pub fn remove_edge(&mut self, a: usize, b: usize) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        let removed = self.adjacency[a].as_mut().is_some_and(|set| set.remove(&b));
        if removed {
            if let Some(set) = self.adjacency[b].as_mut() {
                set.remove(&a);
            }
            self.edge_count -= 1;
        }
        removed
    }

    /// Whether `a` and `b` are adjacent.
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.neighbors(a).is_some_and(|set| set.contains(&b))
    }

    /// Ordered neighbors of `node`, `None` if absent.
    pub fn neighbors(&self, node: usize) -> Option<&BTreeSet<usize>> {
        self.adjacency.get(node).and_then(Option::as_ref)
    }

    /// Number of neighbors of `node` (0 if absent).
    pub fn degree(&self, node: usize) -> usize {
        self.neighbors(node).map_or(0, BTreeSet::len)
    }

    /// Present nodes in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(node, _)| node)
    }

    /// Number of present nodes.
    pub fn node_count(&self) -> usize {
        self.adjacency.iter().filter(|slot| slot.is_some()).count()
    }

    /// Number of edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Every edge once, as `(low, high)` pairs in ascending order.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::with_capacity(self.edge_count);
        for node in self.nodes() {
            if let Some(set) = self.neighbors(node) {
                edges.extend(set.range(node + 1..).map(|other| (node, *other)));
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_symmetric_and_deduplicated() {
        let mut graph = UndirectedGraph::with_nodes(3);
        assert!(graph.add_edge(0, 1));
        assert!(!graph.add_edge(1, 0));
        assert!(!graph.add_edge(2, 2));
        assert!(graph.has_edge(1, 0));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges(), vec![(0, 1)]);
    }

    #[test]
    fn remove_node_drops_incident_edges() {
        let mut graph = UndirectedGraph::with_nodes(3);
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(0, 2);
        graph.remove_node(1);
        assert!(!graph.contains(1));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.nodes().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(graph.degree(0), 1);
    }

    #[test]
    fn clone_is_independent() {
        let mut graph = UndirectedGraph::with_nodes(2);
        let snapshot = graph.clone();
        graph.add_edge(0, 1);
        assert_eq!(snapshot.edge_count(), 0);
        assert!(graph.remove_edge(0, 1));
        assert_eq!(graph, snapshot);
    }

    #[test]
    fn add_node_grows_slots() {
        let mut graph = UndirectedGraph::default();
        graph.add_node(3);
        assert_eq!(graph.node_count(), 1);
        assert!(graph.contains(3));
        assert!(!graph.contains(0));
    }
}
