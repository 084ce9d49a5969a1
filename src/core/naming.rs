//! Entity naming - fully qualified names and storage URLs
//!
//! Everything here is a pure function of its arguments. The only input
//! that comes from outside is the environment base path, which callers
//! look up through [`EnvironmentResolver`](crate::core::config::EnvironmentResolver)
//! before building a URL.

use crate::core::error::{Result, SubstepError};

/// Separator between the fields of a fully qualified name
pub const NAME_SEPARATOR: char = '.';

/// Prefix of fully qualified names for temporary (scratch) entities
pub const TMP_PREFIX: &str = "tmp:";

/// Completion marker written next to a durable entity once it is complete
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Reject entity names that would escape their run directory
pub fn validate_entity_name(entity_name: &str) -> Result<()> {
    if entity_name.contains('/') {
        return Err(SubstepError::InvalidEntityName(entity_name.to_string()));
    }
    Ok(())
}

/// Replace literal dots, which would otherwise read as field separators
pub fn sanitize_entity_name(entity_name: &str) -> String {
    entity_name.replace(NAME_SEPARATOR, "_")
}

/// Reject scope components (env, pipeline, zone, step) that would make a
/// joined name ambiguous or a URL leave its directory
pub fn validate_scope_name(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(SubstepError::Configuration(format!(
            "'{}' must not be empty",
            field
        )));
    }
    if value.contains(NAME_SEPARATOR) || value.contains('/') {
        return Err(SubstepError::Configuration(format!(
            "'{}' value '{}' can't contain '.' or '/' characters",
            field, value
        )));
    }
    Ok(())
}

/// `env.pipeline.zone.step.entity`, with dots in the entity name replaced
pub fn full_name(env: &str, pipeline: &str, zone: &str, step: &str, entity: &str) -> String {
    format!(
        "{}.{}.{}.{}.{}",
        env,
        pipeline,
        zone,
        step,
        sanitize_entity_name(entity)
    )
}

/// Full name of a scratch entity (`tmp:env.pipeline.zone.step.entity`)
pub fn tmp_full_name(env: &str, pipeline: &str, zone: &str, step: &str, entity: &str) -> String {
    format!("{}{}", TMP_PREFIX, full_name(env, pipeline, zone, step, entity))
}

/// Directory holding every run of a step: `{base}/{pipeline}/{zone}/{step}`
pub fn step_path(base: &str, pipeline: &str, zone: &str, step: &str) -> String {
    format!("{}/{}/{}/{}", base, pipeline, zone, step)
}

/// `{base}/{pipeline}/{zone}/{step}/{run_id}/{entity}`
pub fn url(
    base: &str,
    pipeline: &str,
    zone: &str,
    step: &str,
    run_id: &str,
    entity: &str,
) -> String {
    format!(
        "{}/{}/{}",
        step_path(base, pipeline, zone, step),
        run_id,
        sanitize_entity_name(entity)
    )
}

/// Glob matching the completion markers of every run of an entity
pub fn success_marker_pattern(step_path: &str, entity: &str) -> String {
    format!(
        "{}/*/{}/{}",
        step_path,
        sanitize_entity_name(entity),
        SUCCESS_MARKER
    )
}

/// Glob matching every scratch run directory holding an entity
pub fn scratch_entity_pattern(step_path: &str, entity: &str) -> String {
    format!("{}/*/{}", step_path, sanitize_entity_name(entity))
}

/// The scope fields of one addressed entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityAddress {
    pub env_name: String,
    pub pipeline_name: String,
    pub zone_name: String,
    pub step_name: String,
    pub entity_name: String,
}

impl EntityAddress {
    pub fn new(
        env_name: impl Into<String>,
        pipeline_name: impl Into<String>,
        zone_name: impl Into<String>,
        step_name: impl Into<String>,
        entity_name: impl Into<String>,
    ) -> Self {
        Self {
            env_name: env_name.into(),
            pipeline_name: pipeline_name.into(),
            zone_name: zone_name.into(),
            step_name: step_name.into(),
            entity_name: entity_name.into(),
        }
    }

    /// Reject scope components and entity names that can't address storage
    pub fn validate(&self) -> Result<()> {
        validate_scope_name("env_name", &self.env_name)?;
        validate_scope_name("pipeline_name", &self.pipeline_name)?;
        validate_scope_name("zone_name", &self.zone_name)?;
        validate_scope_name("step_name", &self.step_name)?;
        validate_entity_name(&self.entity_name)
    }

    pub fn full_name(&self) -> String {
        full_name(
            &self.env_name,
            &self.pipeline_name,
            &self.zone_name,
            &self.step_name,
            &self.entity_name,
        )
    }

    pub fn tmp_full_name(&self) -> String {
        tmp_full_name(
            &self.env_name,
            &self.pipeline_name,
            &self.zone_name,
            &self.step_name,
            &self.entity_name,
        )
    }

    /// Step directory under the given environment base path
    pub fn step_path(&self, base: &str) -> String {
        step_path(base, &self.pipeline_name, &self.zone_name, &self.step_name)
    }

    /// Entity URL for a run under the given environment base path
    pub fn url(&self, base: &str, run_id: &str) -> String {
        url(
            base,
            &self.pipeline_name,
            &self.zone_name,
            &self.step_name,
            run_id,
            &self.entity_name,
        )
    }
}
