//! Test: TensorBoard logs of earlier runs are gathered locally

use crate::helpers::*;
use pretty_assertions::assert_eq;
use std::fs;

fn store_events(env: &TestEnv, run_id: &str, log_name: &str) {
    let dir = format!(
        "{}/p/zone/B/{}/tensorboard/{}",
        env.env_path("user"),
        run_id,
        log_name
    );
    fs::create_dir_all(&dir).unwrap();
    fs::write(format!("{}/events.out.tfevents.{}", dir, run_id), run_id).unwrap();
}

#[test]
fn test_copy_previous_logs() {
    let env = TestEnv::new();
    store_events(&env, "run-1", "exp");
    store_events(&env, "run-2", "exp");
    store_events(&env, "run-2", "other");

    let substep = env.substep("zone", "B", "run-3");
    let copied = substep.copy_tensorboard_logs("exp", None).unwrap();
    assert_eq!(copied, 2);

    let base = substep.tensorboard_log_base_dir("exp");
    assert_eq!(base, env.dir.path().join("step_tmp/tensorboard/zone/exp"));
    assert_eq!(
        fs::read_to_string(base.join("run-1/events.out.tfevents.run-1")).unwrap(),
        "run-1"
    );
    assert!(base.join("run-2/events.out.tfevents.run-2").is_file());
}

#[test]
fn test_prepare_returns_base_and_writer_dirs() {
    let env = TestEnv::new();
    let substep = env.substep("zone", "B", "run-3");

    let (base, writer) = substep.prepare_tensorboard_logs("exp", true, None).unwrap();
    assert_eq!(writer, base.join("run-3"));
    assert_eq!(writer, substep.tensorboard_log_dir("exp"));
}
