//! Moralization: marry every pair of co-parents and drop edge direction.

use crate::model::network::Network;
use crate::structure::graph::UndirectedGraph;

/// Builds the moral graph of `network`. Node `i` is the variable with id `i`.
pub fn moralize(network: &Network) -> UndirectedGraph {
    let mut graph = UndirectedGraph::with_nodes(network.len());
    for variable in network.variables() {
        let child = variable.id.index();
        for (offset, parent) in variable.parents.iter().enumerate() {
            graph.add_edge(child, parent.index());
            for other in &variable.parents[offset + 1..] {
                graph.add_edge(parent.index(), other.index());
            }
        }
    }
    graph
}
