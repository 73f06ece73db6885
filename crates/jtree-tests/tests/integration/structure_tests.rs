//! Compilation pipeline invariants on whole networks.

use jtree_core::structure::junction::compile;
use jtree_core::structure::moral::moralize;
use jtree_core::structure::triangulate::{is_perfect_elimination_order, triangulate};
use jtree_core::{InferenceEngine, InferenceError, NetworkBuilder, NodeDefinition};
use jtree_tests::{alarm, assert_all_close, network_from_parts};

#[test]
fn alarm_forest_satisfies_running_intersection() {
    let network = alarm();
    let forest = compile(&network).expect("forest");
    assert!(forest.has_running_intersection());
    assert_eq!(forest.components().len(), 1);
    assert_eq!(forest.edges().len(), forest.cliques().len() - 1);

    let triangulation = triangulate(&moralize(&network));
    assert!(is_perfect_elimination_order(
        &triangulation.graph,
        &triangulation.elimination_order
    ));
}

#[test]
fn clique_posteriors_agree_on_shared_variables() {
    let parents = vec![vec![], vec![0], vec![0], vec![1, 2], vec![3], vec![3, 4]];
    let network = network_from_parts(&[2, 2, 3, 2, 2, 3], &parents, &[0.4, 1.3, 0.9, 0.2, 2.5]);
    let mut engine = InferenceEngine::new(network).expect("engine");
    let edges = engine.junction_forest().edges();
    assert!(!edges.is_empty());
    for (a, b, separator) in edges {
        let shared = engine.junction_forest().separator(separator).domain.clone();
        let pa = engine.clique_posterior(a).expect("a").marginalize(&shared);
        let pb = engine.clique_posterior(b).expect("b").marginalize(&shared);
        assert_all_close(pa.values(), pb.values(), 1e-12, "separator marginal");
    }
}

#[test]
fn cyclic_parent_graph_is_rejected() {
    let binary = |parent: &str| NodeDefinition::potential(["t", "f"], [parent], vec![0.5; 4]);
    let result = NetworkBuilder::new()
        .node("A", binary("C"))
        .node("B", binary("A"))
        .node("C", binary("B"))
        .build();
    assert!(matches!(result, Err(InferenceError::Construction(_))));
}

#[test]
fn propagate_caches_every_posterior() {
    let mut engine = InferenceEngine::new(alarm()).expect("engine");
    engine.propagate().expect("propagate");
    let plan = engine.plan().clone();
    for id in plan.posteriors.iter().chain(&plan.variable_posteriors) {
        assert!(engine.formulas().cached(*id).is_some());
    }
    engine.remove_all_evidence();
    assert_eq!(engine.formulas().cached_count(), 0);
}
