//! Test: substep construction and scope

use crate::helpers::*;
use pretty_assertions::assert_eq;
use substep::{StepParams, Substep, SubstepError, VersionInfo};

#[test]
fn test_second_substep_in_process_fails() {
    let env = TestEnv::new();

    let first = Substep::new(step_params("zone", "B"), env.settings("run-1"), VersionInfo::default());
    assert!(first.is_ok());

    let second = Substep::new(step_params("zone", "B"), env.settings("run-1"), VersionInfo::default());
    assert!(matches!(second, Err(SubstepError::AlreadyConstructed)));
}

#[test]
fn test_scope_defaults() {
    let env = TestEnv::new();
    let params = StepParams::from_json(
        r#"{"pipeline_params": {"pipeline_name": "p"}, "step_params": {"step_name": "B"}}"#,
    )
    .unwrap();

    let substep = Substep::builder(params, env.settings("run-1"))
        .with_slot(fresh_slot())
        .build()
        .unwrap();

    assert_eq!(substep.env_name(), "user");
    assert_eq!(substep.zone_name(), "zone");
    assert_eq!(substep.step_name(), "B");
    assert_eq!(substep.run_id(), "run-1");
    assert_eq!(substep.metrics()["run_id"], "run-1");
}

#[test]
fn test_env_override_from_settings() {
    let env = TestEnv::new();
    let mut settings = env.settings("run-1");
    settings.env_name = Some("prod".to_string());

    let substep = env.try_substep("zone", "B", settings).unwrap();
    assert_eq!(substep.env_name(), "prod");
    assert!(substep.outputs_url().ends_with("/prod/p/zone/B/run-1"));
}

#[test]
fn test_explicit_run_id_wins_over_pipeline_run_id() {
    let env = TestEnv::new();
    let mut settings = env.settings("run-local");
    settings.pipeline_run_id = Some("run-from-pipeline".to_string());

    let substep = env.try_substep("zone", "B", settings).unwrap();
    assert_eq!(substep.run_id(), "run-local");
}

#[test]
fn test_pipeline_run_id_seeds_missing_run_id() {
    let env = TestEnv::new();
    let mut settings = env.settings("unused");
    settings.run_id = None;
    settings.pipeline_run_id = Some("run-from-pipeline".to_string());

    let substep = env.try_substep("zone", "B", settings).unwrap();
    assert_eq!(substep.run_id(), "run-from-pipeline");
}

#[test]
fn test_step_name_falls_back_to_default() {
    let env = TestEnv::new();
    let params =
        StepParams::from_json(r#"{"pipeline_params": {"pipeline_name": "p"}}"#).unwrap();

    let mut settings = env.settings("run-1");
    let missing = Substep::builder(params.clone(), settings.clone())
        .with_slot(fresh_slot())
        .build();
    assert!(matches!(missing, Err(SubstepError::Configuration(_))));

    settings.default_step_name = Some("train".to_string());
    let substep = Substep::builder(params, settings)
        .with_slot(fresh_slot())
        .build()
        .unwrap();
    assert_eq!(substep.step_name(), "train");
}
