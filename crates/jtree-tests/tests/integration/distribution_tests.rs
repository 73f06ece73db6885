//! Distribution objects returned by and handed back to the engine.

use jtree_core::{event, Distribution, DistributionVariable, InferenceEngine, InferenceError};
use jtree_tests::{assert_close, sprinkler};

#[test]
fn cpt_round_trips_through_dump() {
    let engine = InferenceEngine::new(sprinkler()).expect("engine");
    for name in engine.variables() {
        let original = engine.distribution(name).expect("distribution");
        let rebuilt = Distribution::from_dump(&original.dump()).expect("rebuild");
        assert_eq!(rebuilt.head(), original.head());
        assert_eq!(rebuilt.parents(), original.parents());
        assert_eq!(rebuilt.describe(), original.describe());
    }
}

#[test]
fn cpt_distribution_answers_conditional_queries() {
    let engine = InferenceEngine::new(sprinkler()).expect("engine");
    let wet = engine.distribution("GRASS_WET").expect("distribution");
    assert_eq!(wet.head()[0].name, "GRASS_WET");
    let p = wet
        .infer(
            &event([("GRASS_WET", "T")]),
            &event([("SPRINKLER", "T"), ("RAIN", "F")]),
        )
        .expect("infer");
    assert_close(p, 0.9, 1e-12, "P(GRASS_WET=T | SPRINKLER=T, RAIN=F)");
}

#[test]
fn edited_cpt_can_be_installed() {
    let mut engine = InferenceEngine::new(sprinkler()).expect("engine");
    let mut sprinkler_cpt = engine.distribution("SPRINKLER").expect("distribution");
    sprinkler_cpt.add_level("SPRINKLER", "BROKEN").expect("add level");

    // The network's SPRINKLER has two levels, so the edited table no longer fits.
    assert!(matches!(
        engine.set_distribution("SPRINKLER", &sprinkler_cpt),
        Err(InferenceError::Query(_))
    ));

    sprinkler_cpt.remove_level("SPRINKLER", "BROKEN").expect("remove level");
    engine
        .set_distribution("SPRINKLER", &sprinkler_cpt)
        .expect("reinstall");
    assert_close(
        engine.infer(&event([("GRASS_WET", "T")])).expect("wet"),
        0.44838,
        1e-9,
        "P(GRASS_WET=T)",
    );
}

#[test]
fn parent_order_of_installed_distribution_is_free() {
    let mut engine = InferenceEngine::new(sprinkler()).expect("engine");
    let reordered = Distribution::new(
        vec![DistributionVariable::new("GRASS_WET", ["T", "F"])],
        vec![
            DistributionVariable::new("RAIN", ["T", "F"]),
            DistributionVariable::new("SPRINKLER", ["T", "F"]),
        ],
        // Blocks (RAIN, SPRINKLER): (T,T) (F,T) (T,F) (F,F)
        vec![0.99, 0.01, 0.9, 0.1, 0.8, 0.2, 0.0, 1.0],
    )
    .expect("distribution");
    engine.set_distribution("GRASS_WET", &reordered).expect("install");
    assert_close(
        engine.infer(&event([("GRASS_WET", "T")])).expect("wet"),
        0.44838,
        1e-9,
        "P(GRASS_WET=T)",
    );
}

#[test]
fn joint_distribution_blocks_are_normalized() {
    let mut engine = InferenceEngine::new(sprinkler()).expect("engine");
    let d = engine
        .joint_distribution(&["RAIN", "SPRINKLER"], &["GRASS_WET"])
        .expect("joint");
    let block = d.head_size();
    for row in d.potential().chunks(block) {
        assert_close(row.iter().sum::<f64>(), 1.0, 1e-5, "block total");
    }
}
