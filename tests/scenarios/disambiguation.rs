//! Test: a step name declared in several zones resolves to one zone or fails

use crate::helpers::*;
use pretty_assertions::assert_eq;
use substep::{InputQuery, SubstepError};

const SPLIT_ZONES: &str = r#"
inputs:
  - step_name: S
    entity_name: a
    zone_name: z1
  - step_name: S
    entity_name: b
    zone_name: z1
  - step_name: S
    entity_name: a
    zone_name: z2
"#;

fn mark_split_zones(env: &TestEnv) {
    env.mark_success("z1", "S", "run-1", "a");
    env.mark_success("z1", "S", "run-1", "b");
    env.mark_success("z2", "S", "run-1", "a");
}

#[test]
fn test_own_zone_resolves_ambiguity() {
    let env = TestEnv::new();
    mark_split_zones(&env);

    let mut substep = env.substep("z1", "B", "run-2");
    substep.interface(&declaration(SPLIT_ZONES)).unwrap();
    let inputs = substep.inputs(&InputQuery::step("S")).unwrap();

    assert_eq!(inputs.names().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(inputs.full_name("a"), Some("user.p.z1.S.a"));
    assert_eq!(inputs.full_name("b"), Some("user.p.z1.S.b"));
}

#[test]
fn test_zone_override_selects_other_zone() {
    let env = TestEnv::new();
    mark_split_zones(&env);

    let mut substep = env.substep("z1", "B", "run-2");
    substep.interface(&declaration(SPLIT_ZONES)).unwrap();
    let inputs = substep.inputs(&InputQuery::step("S").zone("z2")).unwrap();

    assert_eq!(inputs.names().collect::<Vec<_>>(), vec!["a"]);
    assert_eq!(inputs.full_name("a"), Some("user.p.z2.S.a"));
}

#[test]
fn test_foreign_zones_are_ambiguous() {
    let env = TestEnv::new();
    for zone in ["z1", "z2", "z3"] {
        env.mark_success(zone, "S", "run-1", "a");
    }

    let mut substep = env.substep("z0", "B", "run-2");
    substep
        .interface(&declaration(
            r#"
inputs:
  - {step_name: S, entity_name: a, zone_name: z1}
  - {step_name: S, entity_name: a, zone_name: z2}
  - {step_name: S, entity_name: a, zone_name: z3}
"#,
        ))
        .unwrap();

    let err = substep.inputs(&InputQuery::step("S")).unwrap_err();
    assert!(matches!(err, SubstepError::Ambiguity { ref step_name } if step_name == "S"));
    assert!(err.to_string().contains("zone_name"));
    assert!(substep.registered().inputs().is_empty());
}

#[test]
fn test_missing_zones_are_backfilled() {
    let env = TestEnv::new();
    env.mark_success("z1", "A", "run-1", "data");

    let mut substep = env.substep("z1", "B", "run-2");
    substep
        .interface(&declaration("inputs:\n  - {step_name: A, entity_name: data}\n"))
        .unwrap();
    substep.inputs(&InputQuery::step("A")).unwrap();

    let declared = &substep.spec().inputs[0];
    assert_eq!(declared.env_name.as_deref(), Some("user"));
    assert_eq!(declared.pipeline_name.as_deref(), Some("p"));
    assert_eq!(declared.zone_name.as_deref(), Some("z1"));
}
