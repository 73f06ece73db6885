//! Disconnected networks compile to independent trees.

use jtree_core::{event, Evidence, InferenceEngine};
use jtree_tests::{assert_all_close, assert_close, forest};

#[test]
fn forest_has_one_tree_per_component() {
    let engine = InferenceEngine::new(forest()).expect("engine");
    let stats = engine.stats();
    assert_eq!(stats.components, 3);
    assert_eq!(stats.cliques, 3);
    assert_eq!(stats.separators, 0);
    assert!(engine.junction_forest().has_running_intersection());
}

#[test]
fn evidence_on_one_tree_leaves_the_others_unchanged() {
    let mut engine = InferenceEngine::new(forest()).expect("engine");
    let before_d = engine.infer(&event([("D", "T")])).expect("D");
    let before_f = engine.infer(&event([("F", "T")])).expect("F");

    engine
        .set_evidence(&Evidence::new().hard("B", "F"))
        .expect("evidence");
    assert_close(engine.infer(&event([("D", "T")])).expect("D"), before_d, 1e-15, "P(D=T)");
    assert_close(engine.infer(&event([("F", "T")])).expect("F"), before_f, 1e-15, "P(F=T)");

    // P(A=T | B=F) = 0.1*0.4 / (0.1*0.4 + 0.9*0.75)
    assert_close(
        engine.infer(&event([("A", "T")])).expect("A"),
        0.04 / 0.715,
        1e-12,
        "P(A=T | B=F)",
    );
}

#[test]
fn cross_tree_joint_factors_into_marginals() {
    let mut engine = InferenceEngine::new(forest()).expect("engine");
    engine
        .set_evidence(&Evidence::new().hard("F", "T"))
        .expect("evidence");
    let b = engine.joint_distribution(&["B"], &[]).expect("B");
    let e = engine.joint_distribution(&["E"], &[]).expect("E");
    let joint = engine.joint_distribution(&["B", "E"], &[]).expect("B, E");

    let mut expected = Vec::new();
    for pe in e.potential() {
        for pb in b.potential() {
            expected.push(pb * pe);
        }
    }
    assert_all_close(joint.potential(), &expected, 1e-12, "P(B, E)");

    // Conditioning across trees changes nothing.
    let conditional = engine.joint_distribution(&["B"], &["E"]).expect("B | E");
    assert_all_close(&conditional.potential()[..2], b.potential(), 1e-12, "P(B | E=T)");
    assert_all_close(&conditional.potential()[2..], b.potential(), 1e-12, "P(B | E=F)");
}
