//! Evidence assertion, replacement and removal through the engine facade.

use jtree_core::{event, Evidence, InferenceEngine, InferenceError, Observation};
use jtree_tests::{alarm, assert_close, sprinkler};

#[test]
fn update_keeps_other_assertions_and_set_replaces_them() {
    let mut engine = InferenceEngine::new(alarm()).expect("engine");
    engine
        .set_evidence(&Evidence::new().hard("JOHN_CALLS", "T"))
        .expect("set");
    engine
        .update_evidence(&Evidence::new().hard("MARY_CALLS", "T"))
        .expect("update");
    assert!(engine.has_evidence_for("JOHN_CALLS").expect("john"));
    assert!(engine.has_evidence_for("MARY_CALLS").expect("mary"));

    engine
        .set_evidence(&Evidence::new().hard("EARTHQUAKE", "F"))
        .expect("replace");
    assert!(!engine.has_evidence_for("JOHN_CALLS").expect("john"));
    assert_eq!(
        engine.evidence().get("EARTHQUAKE"),
        Some(&Observation::State("F".into()))
    );
}

#[test]
fn rejected_evidence_leaves_state_untouched() {
    let mut engine = InferenceEngine::new(sprinkler()).expect("engine");
    engine
        .set_evidence(&Evidence::new().hard("RAIN", "T"))
        .expect("set");
    let before = engine.infer(&event([("GRASS_WET", "T")])).expect("before");

    let bad = Evidence::new().hard("SPRINKLER", "T").hard("SNOW", "T");
    assert!(matches!(
        engine.update_evidence(&bad),
        Err(InferenceError::UnknownVariable(_))
    ));
    let negative = Evidence::new().soft("SPRINKLER", [("T", -1.0)]);
    assert!(matches!(
        engine.update_evidence(&negative),
        Err(InferenceError::Numerical(_))
    ));

    assert!(!engine.has_evidence_for("SPRINKLER").expect("sprinkler"));
    let after = engine.infer(&event([("GRASS_WET", "T")])).expect("after");
    assert_eq!(before, after);
}

#[test]
fn soft_evidence_shifts_posterior_proportionally() {
    let mut engine = InferenceEngine::new(sprinkler()).expect("engine");
    engine
        .set_evidence(&Evidence::new().soft("RAIN", [("T", 3.0), ("F", 1.0)]))
        .expect("soft");
    // 0.2*3 / (0.2*3 + 0.8*1)
    assert_close(
        engine.infer(&event([("RAIN", "T")])).expect("rain"),
        0.6 / 1.4,
        1e-12,
        "P(RAIN=T) under soft evidence",
    );
}

#[test]
fn removing_evidence_restores_priors() {
    let mut engine = InferenceEngine::new(alarm()).expect("engine");
    let prior = engine.infer(&event([("BURGLARY", "T")])).expect("prior");
    engine
        .set_evidence(&Evidence::new().hard("JOHN_CALLS", "T"))
        .expect("evidence");
    let posterior = engine.infer(&event([("BURGLARY", "T")])).expect("posterior");
    assert!(posterior > prior);

    assert!(engine.remove_evidence("JOHN_CALLS").expect("remove"));
    assert_close(
        engine.infer(&event([("BURGLARY", "T")])).expect("restored"),
        prior,
        1e-15,
        "P(BURGLARY=T) after removal",
    );
    assert!(matches!(
        engine.remove_evidence("NOBODY"),
        Err(InferenceError::UnknownVariable(_))
    ));
}

#[test]
fn conflicting_hard_evidence_gives_zero_probability() {
    let mut engine = InferenceEngine::new(sprinkler()).expect("engine");
    engine
        .set_evidence(&Evidence::new().hard("SPRINKLER", "F").hard("RAIN", "F").hard("GRASS_WET", "T"))
        .expect("evidence");
    assert_eq!(engine.infer(&event([("GRASS_WET", "T")])).expect("wet"), 0.0);
    assert!(matches!(
        engine.joint_distribution(&["RAIN"], &["SPRINKLER"]),
        Err(InferenceError::ZeroProbabilityCondition(_))
    ));
}
