//! Substep settings loaded from YAML
//!
//! All process-level state the resolver needs (run id, notebook names,
//! design mode, storage roots) lives in [`Settings`]. Environment variables
//! are consulted in one place only, [`Settings::apply_env`], which the
//! entry point calls once before constructing a substep.

use crate::core::error::SubstepError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default notebook name outside of a notebook runner
pub const STANDALONE_NOTEBOOK: &str = "standalone";

/// Paths and identities supplied by the surrounding environment
pub trait EnvironmentResolver: Send + Sync {
    /// Base path of durable storage for an environment
    fn env_path(&self, env_name: &str) -> String;

    /// Base path of scratch storage for an environment
    fn tmp_path(&self, env_name: &str) -> String;

    /// Step name used when step params don't define one
    fn default_step_name(&self) -> Option<String>;
}

/// Storage roots for a single environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvStorage {
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub tmp_path: Option<String>,
}

/// Storage layout: shared roots plus per-environment overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Durable root; an environment lives under `{root}/{env}`
    #[serde(default = "default_storage_root")]
    pub root: String,

    /// Scratch root; an environment lives under `{tmp_root}/{env}`
    #[serde(default = "default_tmp_root")]
    pub tmp_root: String,

    /// Per-environment overrides
    #[serde(default)]
    pub envs: HashMap<String, EnvStorage>,
}

fn default_storage_root() -> String {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("substep")
        .join("envs")
        .to_string_lossy()
        .into_owned()
}

fn default_tmp_root() -> String {
    "/tmp/substep".to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            tmp_root: default_tmp_root(),
            envs: HashMap::new(),
        }
    }
}

impl StorageSettings {
    pub fn env_path(&self, env_name: &str) -> String {
        self.envs
            .get(env_name)
            .and_then(|env| env.path.clone())
            .unwrap_or_else(|| format!("{}/{}", self.root.trim_end_matches('/'), env_name))
    }

    pub fn tmp_path(&self, env_name: &str) -> String {
        self.envs
            .get(env_name)
            .and_then(|env| env.tmp_path.clone())
            .unwrap_or_else(|| format!("{}/{}", self.tmp_root.trim_end_matches('/'), env_name))
    }
}

/// Settings of the current substep process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Run id of the current execution
    #[serde(default)]
    pub run_id: Option<String>,

    /// Run id injected by a pipeline runner; takes precedence over `run_id`
    #[serde(default)]
    pub pipeline_run_id: Option<String>,

    /// Preview mode: interfaces are wired without touching storage
    #[serde(default)]
    pub design_mode: bool,

    /// Where design-mode reports are written
    #[serde(default)]
    pub visualizer_session_dir: Option<String>,

    /// Name of the notebook being executed, if any
    #[serde(default)]
    pub notebook_name: Option<String>,

    /// Name of the executed notebook output, if any
    #[serde(default)]
    pub notebook_output_name: Option<String>,

    /// Image the substep runs in
    #[serde(default = "default_server_image")]
    pub server_image: String,

    /// Overrides `env_name` from pipeline params
    #[serde(default)]
    pub env_name: Option<String>,

    /// Fallback step name
    #[serde(default)]
    pub default_step_name: Option<String>,

    /// Directory receiving run records and metrics
    #[serde(default = "default_step_tmp_dir")]
    pub record_dir: PathBuf,

    /// Step-local scratch directory (tensorboard logs live under it)
    #[serde(default = "default_step_tmp_dir")]
    pub step_tmp_dir: PathBuf,

    #[serde(default)]
    pub storage: StorageSettings,
}

fn default_server_image() -> String {
    "UNKNOWN".to_string()
}

fn default_step_tmp_dir() -> PathBuf {
    PathBuf::from("tmp")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            run_id: None,
            pipeline_run_id: None,
            design_mode: false,
            visualizer_session_dir: None,
            notebook_name: None,
            notebook_output_name: None,
            server_image: default_server_image(),
            env_name: None,
            default_step_name: None,
            record_dir: default_step_tmp_dir(),
            step_tmp_dir: default_step_tmp_dir(),
            storage: StorageSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), SubstepError> {
        for (field, value) in [
            ("run_id", &self.run_id),
            ("pipeline_run_id", &self.pipeline_run_id),
        ] {
            if let Some(run_id) = value {
                if run_id.is_empty() || run_id.contains('/') {
                    return Err(SubstepError::Configuration(format!(
                        "'{}' value '{}' is not a valid run id",
                        field, run_id
                    )));
                }
            }
        }

        if let Some(env_name) = &self.env_name {
            crate::core::naming::validate_scope_name("env_name", env_name)?;
        }

        if self.storage.root.is_empty() || self.storage.tmp_root.is_empty() {
            return Err(SubstepError::Configuration(
                "storage roots must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Apply overrides from process environment variables
    ///
    /// `lookup` is normally `|key| std::env::var(key).ok()`; taking it as a
    /// closure keeps the rest of the crate free of environment reads.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), SubstepError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(run_id) = non_empty("DSML_CURR_RUN_ID") {
            self.run_id = Some(run_id);
        }
        if let Some(run_id) = non_empty("DSML_CURR_RUN_ID_FROM_PLINE") {
            self.pipeline_run_id = Some(run_id);
        }
        if lookup("DESIGN_MODE").is_some() {
            self.design_mode = true;
        }
        if let Some(dir) = non_empty("VISUALIZER_SESSION_RUN_ID") {
            self.visualizer_session_dir = Some(dir);
        }
        if let Some(name) = non_empty("DSML_CURR_NOTEBOOK_NAME") {
            self.notebook_name = Some(name);
        }
        if let Some(name) = non_empty("DSML_CURR_NOTEBOOK_OUTPUT_NAME") {
            self.notebook_output_name = Some(name);
        }
        if let Some(image) = non_empty("JUPYTER_IMAGE_SPEC") {
            self.server_image = image;
        }
        if let Some(env_name) = non_empty("SINARA_STEP_ENV_NAME") {
            self.env_name = Some(env_name);
        }

        self.validate()
    }

    /// Run id of this execution
    ///
    /// An explicit id wins, then a pipeline-injected one; otherwise a
    /// time-sortable id is generated from the local clock.
    pub fn resolve_run_id(&self) -> String {
        self.run_id
            .clone()
            .or_else(|| self.pipeline_run_id.clone())
            .unwrap_or_else(generate_run_id)
    }

    /// Notebook name, or `standalone` outside of a notebook runner
    pub fn notebook_name_or_default(&self) -> &str {
        self.notebook_name.as_deref().unwrap_or(STANDALONE_NOTEBOOK)
    }

    /// Output notebook name, or `standalone` outside of a notebook runner
    pub fn notebook_output_name_or_default(&self) -> &str {
        self.notebook_output_name
            .as_deref()
            .unwrap_or(STANDALONE_NOTEBOOK)
    }
}

/// `run-YY-MM-DD-HHMMSS` from the local clock
pub fn generate_run_id() -> String {
    format!("run-{}", chrono::Local::now().format("%y-%m-%d-%H%M%S"))
}

impl EnvironmentResolver for Settings {
    fn env_path(&self, env_name: &str) -> String {
        self.storage.env_path(env_name)
    }

    fn tmp_path(&self, env_name: &str) -> String {
        self.storage.tmp_path(env_name)
    }

    fn default_step_name(&self) -> Option<String> {
        self.default_step_name.clone()
    }
}
