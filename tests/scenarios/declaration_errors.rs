//! Test: malformed declarations fail before anything is resolved

use crate::helpers::*;
use substep::SubstepError;

fn declare(yaml: &str) -> SubstepError {
    let env = TestEnv::new();
    let mut substep = env.substep("zone", "B", "run-2");
    substep.interface(&declaration(yaml)).unwrap_err()
}

#[test]
fn test_unknown_key_is_rejected() {
    let err = declare("outputs:\n  - {entity_name: model, step_name: A}\n");
    assert!(matches!(err, SubstepError::Configuration(_)));
    assert!(err.to_string().contains("isn't permitted"));
}

#[test]
fn test_missing_required_key_is_rejected() {
    let err = declare("inputs:\n  - {entity_name: data}\n");
    assert!(err.to_string().contains("Mandatory key 'step_name'"));
}

#[test]
fn test_custom_entity_needs_path() {
    let err = declare("custom_outputs:\n  - {entity_name: report}\n");
    assert!(err.to_string().contains("entity_path"));
}

#[test]
fn test_slash_in_entity_name_is_rejected() {
    let err = declare("outputs:\n  - {entity_name: a/b}\n");
    assert!(matches!(err, SubstepError::InvalidEntityName(_)));
}

#[test]
fn test_failed_declaration_keeps_previous_interface() {
    let env = TestEnv::new();
    let mut substep = env.substep("zone", "B", "run-2");
    substep
        .interface(&declaration("outputs:\n  - {entity_name: model}\n"))
        .unwrap();

    assert!(substep
        .interface(&declaration("outputs:\n  - {entity_name: a/b}\n"))
        .is_err());

    let outputs = substep.outputs().unwrap();
    assert!(outputs.get("model").is_some());
    assert_eq!(substep.report().outputs.len(), 1);
}
