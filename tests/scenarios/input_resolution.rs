//! Test: inputs resolve to the latest successful run of the producing step

use crate::helpers::*;
use pretty_assertions::assert_eq;
use std::fs;
use substep::{InputQuery, SubstepError};

const DATA_INPUT: &str = r#"
inputs:
  - step_name: A
    entity_name: data
"#;

#[test]
fn test_input_points_at_producer_run() {
    let env = TestEnv::new();
    env.mark_success("zone", "A", "run-24-01-01-000000", "data");

    let mut substep = env.substep("zone", "B", "run-24-02-01-000000");
    substep.interface(&declaration(DATA_INPUT)).unwrap();
    let inputs = substep.inputs(&InputQuery::step("A")).unwrap();

    let expected = format!(
        "{}/p/zone/A/run-24-01-01-000000/data",
        env.env_path("user")
    );
    assert_eq!(inputs.get("data"), Some(expected.as_str()));
    assert_eq!(inputs.full_name("data"), Some("user.p.zone.A.data"));
    assert_eq!(
        substep.registered().inputs().get("user.p.zone.A.data"),
        Some(&expected)
    );
}

#[test]
fn test_latest_completed_run_wins() {
    let env = TestEnv::new();
    env.mark_success("zone", "A", "run-24-01-01-000000", "data");
    env.mark_success("zone", "A", "run-24-01-02-000000", "data");
    // Started later but never finished
    fs::create_dir_all(format!(
        "{}/p/zone/A/run-24-01-03-000000/data",
        env.env_path("user")
    ))
    .unwrap();

    let mut substep = env.substep("zone", "B", "run-24-02-01-000000");
    substep.interface(&declaration(DATA_INPUT)).unwrap();
    let inputs = substep.inputs(&InputQuery::step("A")).unwrap();

    assert!(inputs
        .url("data")
        .unwrap()
        .ends_with("/A/run-24-01-02-000000/data"));
}

#[test]
fn test_missing_run_fails_at_declaration() {
    let env = TestEnv::new();
    let mut substep = env.substep("zone", "B", "run-24-02-01-000000");

    let err = substep.interface(&declaration(DATA_INPUT)).unwrap_err();
    let expected_pattern = format!("{}/p/zone/A/*/data/_SUCCESS", env.env_path("user"));
    match err {
        SubstepError::NotFound { pattern } => assert_eq!(pattern, expected_pattern),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_run_id_override_skips_discovery() {
    let env = TestEnv::new();
    let mut substep = env.substep("zone", "B", "run-24-02-01-000000");
    substep
        .interface(&declaration(
            r#"
inputs:
  - step_name: A
    entity_name: data
    run_id: run-pinned
"#,
        ))
        .unwrap();

    let inputs = substep
        .inputs(&InputQuery::step("A").run_id("run-pinned"))
        .unwrap();
    assert!(inputs.url("data").unwrap().ends_with("/A/run-pinned/data"));
}

#[test]
fn test_declared_run_id_is_used_by_accessor() {
    let env = TestEnv::new();
    env.mark_success("zone", "A", "run-24-01-01-000000", "data");
    env.mark_success("zone", "A", "run-24-01-05-000000", "data");

    let mut substep = env.substep("zone", "B", "run-24-02-01-000000");
    let report = substep
        .interface(&declaration(
            r#"
inputs:
  - step_name: A
    entity_name: data
    run_id: run-24-01-01-000000
"#,
        ))
        .unwrap();
    let declared_url = report.inputs[0].url.clone();

    let inputs = substep.inputs(&InputQuery::step("A")).unwrap();
    assert!(declared_url.ends_with("/A/run-24-01-01-000000/data"));
    assert_eq!(inputs.get("data"), Some(declared_url.as_str()));
}

#[test]
fn test_declared_run_id_needs_no_success_marker() {
    let env = TestEnv::new();
    let mut substep = env.substep("zone", "B", "run-24-02-01-000000");
    substep
        .interface(&declaration(
            r#"
inputs:
  - step_name: A
    entity_name: data
    run_id: run-pinned
"#,
        ))
        .unwrap();

    let inputs = substep.inputs(&InputQuery::step("A")).unwrap();
    assert!(inputs.url("data").unwrap().ends_with("/A/run-pinned/data"));
}

#[test]
fn test_dotted_entity_names_are_flattened() {
    let env = TestEnv::new();
    env.mark_success("zone", "A", "run-1", "model_v1");

    let mut substep = env.substep("zone", "B", "run-2");
    substep
        .interface(&declaration(
            r#"
inputs:
  - step_name: A
    entity_name: model.v1
"#,
        ))
        .unwrap();
    let inputs = substep.inputs(&InputQuery::step("A")).unwrap();

    assert_eq!(inputs.full_name("model.v1"), Some("user.p.zone.A.model_v1"));
    assert!(inputs.url("model.v1").unwrap().ends_with("/A/run-1/model_v1"));
}

#[test]
fn test_repeated_calls_register_once() {
    let env = TestEnv::new();
    env.mark_success("zone", "A", "run-1", "data");

    let mut substep = env.substep("zone", "B", "run-2");
    substep.interface(&declaration(DATA_INPUT)).unwrap();

    let first = substep.inputs(&InputQuery::step("A")).unwrap();
    let second = substep.inputs(&InputQuery::step("A")).unwrap();

    assert_eq!(first, second);
    assert_eq!(substep.registered().inputs().len(), 1);
}

#[test]
fn test_inputs_of_undeclared_step_are_empty() {
    let env = TestEnv::new();
    env.mark_success("zone", "A", "run-1", "data");

    let mut substep = env.substep("zone", "B", "run-2");
    substep.interface(&declaration(DATA_INPUT)).unwrap();

    let inputs = substep.inputs(&InputQuery::step("C")).unwrap();
    assert!(inputs.is_empty());
    assert!(inputs.url("data").is_err());
}
