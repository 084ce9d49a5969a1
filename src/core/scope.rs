//! The substep's own scope

use crate::core::{
    config::{EnvironmentResolver, Settings},
    error::{Result, SubstepError},
    naming::{self, validate_scope_name},
    params::StepParams,
};
use serde::{Deserialize, Serialize};

/// Environment used when pipeline params don't name one (interactive runs)
pub const DEFAULT_ENV_NAME: &str = "user";

/// Zone used when pipeline params don't name one
pub const DEFAULT_ZONE_NAME: &str = "zone";

/// Where the current substep lives: computed once, never changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeContext {
    pub env_name: String,
    pub pipeline_name: String,
    pub zone_name: String,
    pub step_name: String,
    pub run_id: String,
}

impl ScopeContext {
    /// Derive the scope from params, falling back to environment defaults
    pub fn resolve(params: &StepParams, settings: &Settings) -> Result<Self> {
        let env_name = settings
            .env_name
            .as_deref()
            .or(params.env_name())
            .unwrap_or(DEFAULT_ENV_NAME)
            .to_string();

        let pipeline_name = params
            .pipeline_name()
            .ok_or_else(|| {
                SubstepError::Configuration(
                    "'pipeline_name' must be specified within pipeline_params".to_string(),
                )
            })?
            .to_string();

        let zone_name = params.zone_name().unwrap_or(DEFAULT_ZONE_NAME).to_string();

        let step_name = params
            .step_name()
            .map(str::to_string)
            .or_else(|| settings.default_step_name())
            .ok_or_else(|| {
                SubstepError::Configuration(
                    "'step_name' param is not defined. It's mandatory.".to_string(),
                )
            })?;

        let scope = Self {
            env_name,
            pipeline_name,
            zone_name,
            step_name,
            run_id: settings.resolve_run_id(),
        };
        scope.validate()?;
        Ok(scope)
    }

    fn validate(&self) -> Result<()> {
        validate_scope_name("env_name", &self.env_name)?;
        validate_scope_name("pipeline_name", &self.pipeline_name)?;
        validate_scope_name("zone_name", &self.zone_name)?;
        validate_scope_name("step_name", &self.step_name)?;
        if self.run_id.contains('/') {
            return Err(SubstepError::Configuration(format!(
                "run id '{}' can't contain '/' character",
                self.run_id
            )));
        }
        Ok(())
    }

    /// Full name of one of this step's own entities
    pub fn full_name(&self, entity_name: &str) -> String {
        naming::full_name(
            &self.env_name,
            &self.pipeline_name,
            &self.zone_name,
            &self.step_name,
            entity_name,
        )
    }

    /// Scratch full name of one of this step's own entities
    pub fn tmp_full_name(&self, entity_name: &str) -> String {
        naming::tmp_full_name(
            &self.env_name,
            &self.pipeline_name,
            &self.zone_name,
            &self.step_name,
            entity_name,
        )
    }

    /// Durable directory holding every run of this step
    pub fn step_url(&self, env: &dyn EnvironmentResolver) -> String {
        naming::step_path(
            &env.env_path(&self.env_name),
            &self.pipeline_name,
            &self.zone_name,
            &self.step_name,
        )
    }

    /// Durable directory holding every output of the current run
    pub fn outputs_url(&self, env: &dyn EnvironmentResolver) -> String {
        format!("{}/{}", self.step_url(env), self.run_id)
    }

    /// Scratch directory holding every run of this step
    pub fn step_cache_url(&self, env: &dyn EnvironmentResolver) -> String {
        naming::step_path(
            &env.tmp_path(&self.env_name),
            &self.pipeline_name,
            &self.zone_name,
            &self.step_name,
        )
    }

    /// Scratch directory of the current run
    pub fn cache_url(&self, env: &dyn EnvironmentResolver) -> String {
        format!("{}/{}", self.step_cache_url(env), self.run_id)
    }
}
