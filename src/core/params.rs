//! Pipeline and step parameters read from the step params file

use crate::core::error::{Result, SubstepError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Default location of the step params file, relative to the step directory
pub const DEFAULT_PARAMS_FILE: &str = "params/step_params.json";

/// Contents of a step params file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepParams {
    #[serde(default)]
    pub pipeline_params: Map<String, Value>,

    #[serde(default)]
    pub step_params: Map<String, Value>,

    #[serde(default)]
    pub substeps_params: Value,
}

impl StepParams {
    /// Load params from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubstepError::storage(path.display().to_string(), e))?;
        Self::from_json(&content)
    }

    /// Parse params from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let params: StepParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// `pipeline_name` is mandatory
    pub fn validate(&self) -> Result<()> {
        match self.pipeline_name() {
            Some(name) if !name.is_empty() => Ok(()),
            _ => Err(SubstepError::Configuration(
                "'pipeline_name' must be specified within pipeline_params".to_string(),
            )),
        }
    }

    /// Override the environment, as a step runner does for test/prod runs
    pub fn with_env_name(mut self, env_name: Option<&str>) -> Self {
        if let Some(env_name) = env_name {
            self.pipeline_params
                .insert("env_name".to_string(), Value::String(env_name.to_string()));
        }
        self
    }

    pub fn env_name(&self) -> Option<&str> {
        string_param(&self.pipeline_params, "env_name")
    }

    pub fn pipeline_name(&self) -> Option<&str> {
        string_param(&self.pipeline_params, "pipeline_name")
    }

    pub fn zone_name(&self) -> Option<&str> {
        string_param(&self.pipeline_params, "zone_name")
    }

    pub fn step_name(&self) -> Option<&str> {
        string_param(&self.step_params, "step_name")
    }
}

/// A string parameter; empty strings count as unset
fn string_param<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}
