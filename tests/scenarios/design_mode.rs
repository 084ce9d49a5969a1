//! Test: design mode wires interfaces without touching stored runs

use crate::helpers::*;
use pretty_assertions::assert_eq;
use substep::{InputQuery, SubstepError};

const INTERFACE: &str = r#"
inputs:
  - {step_name: A, entity_name: data}
outputs:
  - {entity_name: model}
"#;

#[test]
fn test_entity_names_stand_in_for_run_ids() {
    let env = TestEnv::new();
    let mut settings = env.settings("run-2");
    settings.design_mode = true;

    let mut substep = env.try_substep("zone", "B", settings).unwrap();
    substep.interface(&declaration(INTERFACE)).unwrap();
    let inputs = substep.inputs(&InputQuery::step("A")).unwrap();

    assert_eq!(
        inputs.get("data"),
        Some(format!("{}/p/zone/A/data/data", env.env_path("user")).as_str())
    );
}

#[test]
fn test_visualizer_report() {
    let env = TestEnv::new();
    let session_dir = env.dir.path().join("session");
    let mut settings = env.settings("run-2");
    settings.design_mode = true;
    settings.visualizer_session_dir = Some(session_dir.display().to_string());

    let mut substep = env.try_substep("zone", "B", settings).unwrap();
    substep.interface(&declaration(INTERFACE)).unwrap();

    let path = substep.visualize().unwrap().expect("design mode should stop");
    let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with("B.do_step."));
    assert!(file_name.ends_with(".json"));

    let report = read_json(&path);
    assert_eq!(report["step_name"], "B");
    assert_eq!(report["substep_name"], "do_step");
    assert_eq!(
        report["inputs"]["user.p.zone.A.data"],
        format!("{}/p/zone/A/data/data", env.env_path("user"))
    );
    assert_eq!(
        report["outputs"]["user.p.zone.B.model"],
        format!("{}/p/zone/B/run-2/model", env.env_path("user"))
    );
}

#[test]
fn test_visualizer_needs_session_dir() {
    let env = TestEnv::new();
    let mut settings = env.settings("run-2");
    settings.design_mode = true;

    let substep = env.try_substep("zone", "B", settings).unwrap();
    assert!(matches!(
        substep.visualize(),
        Err(SubstepError::Configuration(_))
    ));
}
