//! Tests for Kripke encoding and totalization.

use ctl_connect::*;
use serde_json::json;
use std::collections::HashMap;

#[derive(Default)]
struct Counter {
    value: u32,
}

fn increment_only(max: u32) -> ImplAdapter<Counter, u32> {
    ImplAdapter::<Counter, u32>::builder()
        .factory(Counter::default)
        .snapshot(|c: &Counter| Ok(c.value))
        .restore(|c: &mut Counter, v: &u32| {
            c.value = *v;
            Ok(())
        })
        .action(
            ActionSpec::new("increment", |c: &mut Counter, _| {
                c.value += 1;
                Ok(())
            })
            .label("inc")
            .guard(move |c: &Counter, _| c.value < max),
        )
        .build()
        .unwrap()
}

fn labels(names: &[&str]) -> LabelSet {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_dead_end_gets_single_synthetic_loop() {
    let model = StateGraphBuilder::new().build(&increment_only(2)).unwrap();
    assert_eq!(model.state_count(), 3);

    let kripke = StructureEncoder::new().encode(&model).unwrap();

    let s2 = kripke.id_of(&StateSnapshot::new(2)).unwrap();
    assert_eq!(kripke.synthetic().iter().copied().collect::<Vec<_>>(), vec![s2]);
    assert!(kripke.edges().contains(&(s2, s2)));
    assert_eq!(kripke.edges().len(), 3);
    assert!(kripke.is_total());

    // Only the observed path carries labels.
    let s0 = kripke.id_of(&StateSnapshot::new(0)).unwrap();
    assert!(kripke.labels(s0).is_empty());
    assert!(kripke.holds(s2, "inc"));
}

#[test]
fn test_encoding_is_deterministic_and_totalize_idempotent() {
    let model = StateGraphBuilder::new().build(&increment_only(3)).unwrap();

    let first = StructureEncoder::new().encode(&model).unwrap();
    let mut second = StructureEncoder::new().encode(&model).unwrap();
    assert_eq!(first, second);

    assert_eq!(second.totalize(), 0);
    assert_eq!(first, second);
}

#[test]
fn test_labels_move_to_arrival_state() {
    let mut transitions = HashMap::new();
    transitions.insert("idle", vec![("busy", labels(&["start"]))]);
    transitions.insert(
        "busy",
        vec![("idle", labels(&["stop"])), ("busy", labels(&["tick"]))],
    );
    let model = Model::from_parts(["idle", "busy"], ["idle"], transitions);

    let kripke = StructureEncoder::new().encode(&model).unwrap();
    assert_eq!(kripke.initial().iter().copied().collect::<Vec<_>>(), vec![0]);
    assert_eq!(kripke.labels(0), &labels(&["stop"]));
    assert_eq!(kripke.labels(1), &labels(&["start", "tick"]));
    assert!(kripke.synthetic().is_empty());
    assert_eq!(kripke.select(|_, s| *s == "busy").len(), 1);
}

#[test]
fn test_unclosed_model_is_rejected() {
    let mut from_outside = HashMap::new();
    from_outside.insert(9, vec![(1, labels(&["b"]))]);
    let model = Model::from_parts([1, 2], [1], from_outside);
    assert!(matches!(
        StructureEncoder::new().encode(&model),
        Err(EncodingError::UnknownSource(s)) if s == "9"
    ));

    let mut escaping = HashMap::new();
    escaping.insert(1, vec![(2, labels(&["a"]))]);
    let model = Model::from_parts([1], [1], escaping);
    let err = StructureEncoder::new().encode(&model).unwrap_err();
    assert!(matches!(err, EncodingError::UnknownDestination { .. }));

    let err: Error = err.into();
    assert!(matches!(err, Error::Encoding(_)));
}

#[test]
fn test_empty_model_encodes_to_empty_structure() {
    let model: Model<u8> = Model::from_parts([], [], HashMap::new());
    let kripke = StructureEncoder::new().encode(&model).unwrap();
    assert!(kripke.is_empty());
    assert!(kripke.edges().is_empty());
    assert!(kripke.is_total());
}

#[test]
fn test_json_export() {
    let model = StateGraphBuilder::new().build(&increment_only(1)).unwrap();
    let kripke = StructureEncoder::new().encode(&model).unwrap();

    let value = kripke.to_json().unwrap();
    assert_eq!(
        value,
        json!({
            "states": [0, 1],
            "initial": [0],
            "edges": [[0, 1], [1, 1]],
            "labels": [[], ["inc"]],
            "synthetic": [1],
        })
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kripke.json");
    kripke.write_json(&path).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written, value);
}

#[test]
fn test_write_json_to_missing_directory_fails() {
    let model: Model<u8> = Model::from_parts([0], [0], HashMap::new());
    let kripke = StructureEncoder::new().encode(&model).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("kripke.json");
    assert!(matches!(kripke.write_json(&path), Err(Error::Io(_))));
}

#[cfg(target_os = "linux")]
#[test]
fn test_write_json_reports_failed_flush() {
    let model: Model<u8> = Model::from_parts([0], [0], HashMap::new());
    let kripke = StructureEncoder::new().encode(&model).unwrap();

    // The whole document fits in the buffer, so the error only surfaces on flush.
    let result = kripke.write_json(std::path::Path::new("/dev/full"));
    assert!(matches!(result, Err(Error::Io(_))), "{result:?}");
}
