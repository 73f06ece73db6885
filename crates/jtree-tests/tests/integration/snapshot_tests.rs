//! Integration tests for engine dumps.

use jtree_core::{event, Evidence, InferenceEngine};
use jtree_tests::{alarm, assert_close};

#[test]
fn restored_engine_answers_identically() {
    let mut engine = InferenceEngine::new(alarm()).expect("engine");
    engine
        .set_evidence(&Evidence::new().hard("MARY_CALLS", "T"))
        .expect("evidence");
    let dump = engine.dump();
    let mut restored = InferenceEngine::restore(&dump).expect("restore");

    for name in ["BURGLARY", "EARTHQUAKE", "ALARM", "JOHN_CALLS"] {
        let expected = engine.infer(&event([(name, "T")])).expect("original");
        let actual = restored.infer(&event([(name, "T")])).expect("restored");
        assert_close(actual, expected, 1e-15, name);
    }
    assert_eq!(restored.stats(), engine.stats());
}

#[cfg(feature = "serde")]
mod serde_tests {
    use jtree_core::{EngineDump, Evidence, InferenceEngine, InferenceError};
    use jtree_tests::sprinkler;

    #[test]
    fn dump_json_roundtrip() {
        let mut engine = InferenceEngine::new(sprinkler()).expect("engine");
        engine
            .set_evidence(&Evidence::new().soft("RAIN", [("T", 0.25), ("F", 0.75)]))
            .expect("evidence");
        let json = engine.dump().to_json().expect("json");
        assert!(json.contains("metadata"));
        assert!(json.contains("GRASS_WET"));

        let loaded = EngineDump::from_json(&json).expect("load");
        let restored = InferenceEngine::restore(&loaded).expect("restore");
        assert_eq!(restored.evidence(), engine.evidence());
        assert_eq!(restored.variables(), engine.variables());
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            EngineDump::from_json("{\"metadata\": 3}"),
            Err(InferenceError::Construction(_))
        ));
    }
}
