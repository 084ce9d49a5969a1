//! Test utility functions for substep scenarios
#![allow(dead_code)]

use substep::core::config::EnvironmentResolver;
use substep::{
    InterfaceDeclaration, Settings, StepParams, Substep, SubstepError, SubstepSlot, VersionInfo,
};

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const PIPELINE: &str = "p";

/// A construction guard nobody else uses
pub fn fresh_slot() -> &'static SubstepSlot {
    Box::leak(Box::new(SubstepSlot::new()))
}

/// Step params for `pipeline`/`zone`/`step` in the default env
pub fn step_params(zone: &str, step: &str) -> StepParams {
    StepParams::from_json(&format!(
        r#"{{"pipeline_params": {{"pipeline_name": "{}", "zone_name": "{}"}},
            "step_params": {{"step_name": "{}"}},
            "substeps_params": [{{"substep_name": "do_step.ipynb"}}]}}"#,
        PIPELINE, zone, step
    ))
    .unwrap()
}

/// Parse an interface declaration from YAML
pub fn declaration(yaml: &str) -> InterfaceDeclaration {
    InterfaceDeclaration::from_yaml(yaml).unwrap()
}

/// Temporary durable and scratch roots shared by the substeps of a test
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Settings rooted in the temporary directory
    pub fn settings(&self, run_id: &str) -> Settings {
        let root = self.dir.path();
        let mut settings = Settings::default();
        settings.run_id = Some(run_id.to_string());
        settings.storage.root = root.join("envs").display().to_string();
        settings.storage.tmp_root = root.join("scratch").display().to_string();
        settings.record_dir = root.join("records");
        settings.step_tmp_dir = root.join("step_tmp");
        settings.notebook_name = Some("do_step.ipynb".to_string());
        settings.notebook_output_name = Some("do_step_output.ipynb".to_string());
        settings
    }

    pub fn env_path(&self, env_name: &str) -> String {
        self.settings("unused").env_path(env_name)
    }

    pub fn tmp_path(&self, env_name: &str) -> String {
        self.settings("unused").tmp_path(env_name)
    }

    pub fn records_dir(&self) -> PathBuf {
        self.dir.path().join("records")
    }

    /// Leave a completed entity behind as a finished run would
    pub fn mark_success(&self, zone: &str, step: &str, run_id: &str, entity: &str) -> String {
        let entity_dir = format!(
            "{}/{}/{}/{}/{}/{}",
            self.env_path("user"),
            PIPELINE,
            zone,
            step,
            run_id,
            entity
        );
        fs::create_dir_all(&entity_dir).unwrap();
        fs::write(format!("{}/_SUCCESS", entity_dir), "").unwrap();
        entity_dir
    }

    /// Build a substep of `step` in `zone` with its own construction guard
    pub fn try_substep(&self, zone: &str, step: &str, settings: Settings) -> Result<Substep, SubstepError> {
        Substep::builder(step_params(zone, step), settings)
            .with_slot(fresh_slot())
            .with_version(VersionInfo::new("0123abcd", "git@example.com:team/pipeline.git"))
            .build()
    }

    pub fn substep(&self, zone: &str, step: &str, run_id: &str) -> Substep {
        self.try_substep(zone, step, self.settings(run_id)).unwrap()
    }
}

/// Read a JSON file written by a substep
pub fn read_json(path: impl Into<PathBuf>) -> serde_json::Value {
    let path = path.into();
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e));
    serde_json::from_str(&content).unwrap()
}
