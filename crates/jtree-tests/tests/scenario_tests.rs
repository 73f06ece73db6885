//! Textbook scenarios with closed-form answers.

use jtree_core::{event, Evidence, InferenceEngine};
use jtree_tests::{alarm, assert_all_close, assert_close, forest, sprinkler};

#[test]
fn sprinkler_priors_and_posteriors() {
    let mut engine = InferenceEngine::new(sprinkler()).expect("engine");

    // P(GRASS_WET=T) = sum over RAIN, SPRINKLER = 0.44838
    assert_close(engine.infer(&event([("RAIN", "T")])).expect("rain"), 0.2, 1e-9, "P(RAIN=T)");
    assert_close(
        engine.infer(&event([("GRASS_WET", "T")])).expect("wet"),
        0.44838,
        1e-9,
        "P(GRASS_WET=T)",
    );
    assert_close(
        engine
            .infer(&event([("RAIN", "T"), ("SPRINKLER", "T"), ("GRASS_WET", "T")]))
            .expect("joint"),
        0.00198,
        1e-9,
        "P(RAIN=T, SPRINKLER=T, GRASS_WET=T)",
    );

    engine
        .set_evidence(&Evidence::new().hard("GRASS_WET", "T"))
        .expect("evidence");
    let p = engine.infer(&event([("RAIN", "T")])).expect("posterior");
    assert_close(p, 0.3577, 5e-5, "P(RAIN=T | GRASS_WET=T)");
}

#[test]
fn alarm_given_burglary() {
    let mut engine = InferenceEngine::new(alarm()).expect("engine");
    engine
        .set_evidence(&Evidence::new().hard("BURGLARY", "T"))
        .expect("evidence");

    // P(A=T | B=T) = 0.002*0.95 + 0.998*0.94
    assert_close(
        engine.infer(&event([("ALARM", "T")])).expect("alarm"),
        0.94002,
        1e-9,
        "P(ALARM=T | BURGLARY=T)",
    );
    assert_close(
        engine.infer(&event([("JOHN_CALLS", "T")])).expect("john"),
        0.849017,
        1e-9,
        "P(JOHN_CALLS=T | BURGLARY=T)",
    );
}

#[test]
fn forest_joint_is_outer_product_of_marginals() {
    let mut engine = InferenceEngine::new(forest()).expect("engine");
    let joint = engine.joint_distribution(&["A", "D"], &[]).expect("joint");
    assert_all_close(joint.potential(), &[0.038, 0.342, 0.062, 0.558], 1e-12, "P(A, D)");
}

#[test]
fn infer_all_lists_every_variable() {
    let mut engine = InferenceEngine::new(alarm()).expect("engine");
    let all = engine.infer_all(None).expect("infer all");
    let names: Vec<&str> = all.iter().map(|m| m.variable.as_str()).collect();
    assert_eq!(names, engine.variables());
    for marginal in &all {
        let total: f64 = marginal.states.iter().map(|(_, p)| p).sum();
        assert_close(total, 1.0, 1e-12, &marginal.variable);
    }
    assert_close(all[0].states[0].1, 0.001, 1e-12, "P(BURGLARY=T)");
}
