//! Maximal-clique enumeration (Bron–Kerbosch with pivoting).

use std::collections::BTreeSet;

use crate::structure::graph::UndirectedGraph;

/// Enumerates every maximal clique of `graph`. Each clique is sorted
/// ascending; isolated nodes yield singleton cliques. Output order is
/// deterministic for a given graph.
pub fn maximal_cliques(graph: &UndirectedGraph) -> Vec<Vec<usize>> {
    let mut cliques = Vec::new();
    let candidates: BTreeSet<usize> = graph.nodes().collect();
    if candidates.is_empty() {
        return cliques;
    }
    let mut current = Vec::new();
    bron_kerbosch(graph, &mut current, candidates, BTreeSet::new(), &mut cliques);
    cliques
}

fn bron_kerbosch(
    graph: &UndirectedGraph,
    current: &mut Vec<usize>,
    mut candidates: BTreeSet<usize>,
    mut excluded: BTreeSet<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if candidates.is_empty() {
        if excluded.is_empty() {
            let mut clique = current.clone();
            clique.sort_unstable();
            out.push(clique);
        }
        return;
    }

    let empty = BTreeSet::new();
    let neighbors_of = |node: usize| graph.neighbors(node).unwrap_or(&empty);

    // Pivot on the node covering the most candidates; only its non-neighbors
    // need to start a branch.
    let pivot = candidates
        .iter()
        .chain(excluded.iter())
        .copied()
        .max_by_key(|u| {
            (
                neighbors_of(*u).intersection(&candidates).count(),
                std::cmp::Reverse(*u),
            )
        });
    let branches: Vec<usize> = match pivot {
        Some(pivot) => candidates.difference(neighbors_of(pivot)).copied().collect(),
        None => candidates.iter().copied().collect(),
    };

    for node in branches {
        let neighbors = neighbors_of(node);
        current.push(node);
        bron_kerbosch(
            graph,
            current,
            candidates.intersection(neighbors).copied().collect(),
            excluded.intersection(neighbors).copied().collect(),
            out,
        );
        current.pop();
        candidates.remove(&node);
        excluded.insert(node);
    }
}
