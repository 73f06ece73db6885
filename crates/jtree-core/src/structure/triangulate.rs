//! Triangulation by greedy min-neighbor elimination.
//!
//! The remaining node with the fewest remaining neighbors is eliminated first
//! (ties broken by lowest index, i.e. input order); its remaining neighbors are
//! pairwise connected by fill edges. The result is chordal, not necessarily of
//! minimum width.

use crate::structure::graph::UndirectedGraph;

/// Output of [`triangulate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triangulation {
    /// The input graph plus every fill edge.
    pub graph: UndirectedGraph,
    /// Nodes in the order they were eliminated.
    pub elimination_order: Vec<usize>,
    /// Fill edges added, as `(low, high)` pairs.
    pub fill_edges: Vec<(usize, usize)>,
}

/// Triangulates `graph`.
pub fn triangulate(graph: &UndirectedGraph) -> Triangulation {
    let mut chordal = graph.clone();
    let mut working = graph.clone();
    let mut elimination_order = Vec::with_capacity(graph.node_count());
    let mut fill_edges = Vec::new();

    loop {
        let next = working
            .nodes()
            .min_by_key(|node| (working.degree(*node), *node));
        let Some(next) = next else {
            break;
        };
        let neighbors: Vec<usize> = working
            .neighbors(next)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        for (offset, a) in neighbors.iter().enumerate() {
            for b in &neighbors[offset + 1..] {
                if working.add_edge(*a, *b) {
                    chordal.add_edge(*a, *b);
                    fill_edges.push((*a.min(b), *a.max(b)));
                }
            }
        }
        working.remove_node(next);
        elimination_order.push(next);
    }

    Triangulation {
        graph: chordal,
        elimination_order,
        fill_edges,
    }
}

/// Whether `order` is a perfect elimination ordering of `graph`: every node's
/// later neighbors form a clique. A graph is chordal iff it has one.
pub fn is_perfect_elimination_order(graph: &UndirectedGraph, order: &[usize]) -> bool {
    let mut position = vec![usize::MAX; order.iter().max().map_or(0, |m| m + 1)];
    for (rank, node) in order.iter().enumerate() {
        position[*node] = rank;
    }
    order.iter().enumerate().all(|(rank, node)| {
        let later: Vec<usize> = graph
            .neighbors(*node)
            .into_iter()
            .flatten()
            .copied()
            .filter(|n| position.get(*n).is_some_and(|p| *p > rank))
            .collect();
        later
            .iter()
            .enumerate()
            .all(|(i, a)| later[i + 1..].iter().all(|b| graph.has_edge(*a, *b)))
    })
}
