//! Test: scratch entities written by one run are found by the next

use crate::helpers::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use substep::SubstepError;

const TMP_OUTPUT: &str = "tmp_outputs:\n  - entity_name: cache\n";
const TMP_INPUT: &str = "tmp_inputs:\n  - entity_name: cache\n";

fn produce(env: &TestEnv, run_id: &str) -> String {
    let mut substep = env.substep("zone", "B", run_id);
    substep.interface(&declaration(TMP_OUTPUT)).unwrap();
    let outputs = substep.tmp_outputs().unwrap();
    let url = outputs.url("cache").unwrap().to_string();
    fs::write(Path::new(&url).join("part-0"), run_id).unwrap();
    url
}

#[test]
fn test_latest_scratch_run_is_read_back() {
    let env = TestEnv::new();
    produce(&env, "run-A");
    let latest = produce(&env, "run-B");

    let mut reader = env.substep("zone", "B", "run-C");
    let report = reader.interface(&declaration(TMP_INPUT)).unwrap();
    assert_eq!(report.tmp_inputs[0].url, latest);

    let inputs = reader.tmp_inputs().unwrap();
    assert_eq!(inputs.get("cache"), Some(latest.as_str()));
    assert_eq!(inputs.full_name("cache"), Some("tmp:user.p.zone.B.cache"));
    assert_eq!(
        fs::read_to_string(Path::new(&latest).join("part-0")).unwrap(),
        "run-B"
    );
    assert_eq!(
        reader.registered().tmp_inputs().get("tmp:user.p.zone.B.cache"),
        Some(&latest)
    );
}

#[test]
fn test_scratch_url_layout() {
    let env = TestEnv::new();
    let url = produce(&env, "run-A");
    assert_eq!(url, format!("{}/p/zone/B/run-A/cache", env.tmp_path("user")));
}

#[test]
fn test_missing_scratch_run_fails() {
    let env = TestEnv::new();
    let mut reader = env.substep("zone", "B", "run-C");

    let err = reader.interface(&declaration(TMP_INPUT)).unwrap_err();
    match err {
        SubstepError::NotFound { pattern } => {
            assert_eq!(pattern, format!("{}/p/zone/B/*/cache", env.tmp_path("user")))
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}
