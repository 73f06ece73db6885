//! Cross-checks the junction-tree engine against full-joint enumeration.

use jtree_core::{Evidence, InferenceEngine, Network};
use jtree_tests::{alarm, assert_all_close, brute_force, network_from_parts, sprinkler};

fn check(network: &Network, evidence: &Evidence, head: &[&str], parents: &[&str]) {
    let mut engine = InferenceEngine::new(network.clone()).expect("engine");
    engine.set_evidence(evidence).expect("evidence");
    let actual = engine.joint_distribution(head, parents).expect("joint");
    let expected = brute_force(network, evidence, head, parents);
    assert_all_close(
        actual.potential(),
        &expected,
        1e-9,
        &format!("P({:?} | {:?})", head, parents),
    );
}

#[test]
fn alarm_queries_match_enumeration() {
    let network = alarm();
    let none = Evidence::new();
    check(&network, &none, &["JOHN_CALLS", "MARY_CALLS"], &[]);
    check(&network, &none, &["BURGLARY"], &["JOHN_CALLS", "MARY_CALLS"]);
    check(&network, &none, &["EARTHQUAKE", "BURGLARY"], &["ALARM"]);

    let calls = Evidence::new().hard("JOHN_CALLS", "T").hard("MARY_CALLS", "T");
    check(&network, &calls, &["BURGLARY"], &[]);
    check(&network, &calls, &["BURGLARY", "EARTHQUAKE"], &[]);
}

#[test]
fn soft_and_multi_state_evidence_match_enumeration() {
    let network = sprinkler();
    let soft = Evidence::new().soft("GRASS_WET", [("T", 0.7), ("F", 0.2)]);
    check(&network, &soft, &["RAIN", "SPRINKLER"], &[]);

    let any = Evidence::new().any_of("SPRINKLER", ["T", "F"]).hard("GRASS_WET", "T");
    check(&network, &any, &["RAIN"], &[]);
}

#[test]
fn triangulated_network_matches_enumeration() {
    // X0 -> X1 -> X3 -> X5 <- X4 <- X2 <- X0: the moral graph is a 6-cycle
    // with a chord only at X5's parents, so triangulation must add fill edges.
    let parents = vec![vec![], vec![0], vec![0], vec![1], vec![2], vec![3, 4]];
    let network = network_from_parts(&[2, 3, 2, 2, 3, 2], &parents, &[0.3, 1.1, 0.7, 2.0, 0.5]);
    let evidence = Evidence::new().hard("X5", "s1");
    check(&network, &evidence, &["X0", "X4"], &[]);
    check(&network, &evidence, &["X1"], &["X2"]);
    check(&network, &Evidence::new(), &["X3", "X2"], &["X0"]);
}
