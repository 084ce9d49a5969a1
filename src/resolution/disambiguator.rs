//! Zone disambiguation for inputs whose step name exists in several zones

use crate::core::{
    descriptor::EntityDescriptor,
    error::{Result, SubstepError},
    scope::ScopeContext,
};
use tracing::info;

/// Which inputs a caller asks for: a step name plus optional scoping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputQuery {
    pub step_name: String,
    pub env_name: Option<String>,
    pub pipeline_name: Option<String>,
    pub zone_name: Option<String>,
    pub run_id: Option<String>,
}

impl InputQuery {
    /// Inputs produced by a step, scoped to the caller's own env/pipeline/zone
    pub fn step(step_name: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            ..Self::default()
        }
    }

    pub fn env(mut self, env_name: impl Into<String>) -> Self {
        self.env_name = Some(env_name.into());
        self
    }

    pub fn pipeline(mut self, pipeline_name: impl Into<String>) -> Self {
        self.pipeline_name = Some(pipeline_name.into());
        self
    }

    pub fn zone(mut self, zone_name: impl Into<String>) -> Self {
        self.zone_name = Some(zone_name.into());
        self
    }

    pub fn run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    fn has_scope_filter(&self) -> bool {
        self.env_name.is_some() || self.pipeline_name.is_some() || self.zone_name.is_some()
    }
}

/// Number of zone changes along a sequence, the first zone counting as one
///
/// This depends on order: `z1, z2, z1` counts three although only two zones
/// are involved. Pipelines rely on this exact pass/fail boundary.
fn zone_transitions<'a>(zones: impl Iterator<Item = &'a str>) -> usize {
    let mut previous = "";
    let mut transitions = 0;
    for zone in zones {
        if zone != previous {
            transitions += 1;
        }
        previous = zone;
    }
    transitions
}

/// Select the declared inputs a query refers to
///
/// Declared inputs missing `env_name`, `pipeline_name` or `zone_name` are
/// backfilled in place with the effective value (the query override, else
/// the caller's own scope). The returned descriptors are fully scoped.
pub fn select_inputs(
    declared: &mut [EntityDescriptor],
    query: &InputQuery,
    own: &ScopeContext,
) -> Result<Vec<EntityDescriptor>> {
    let current_env = query.env_name.as_deref().unwrap_or(&own.env_name);
    let current_pipeline = query.pipeline_name.as_deref().unwrap_or(&own.pipeline_name);
    let current_zone = query.zone_name.as_deref().unwrap_or(&own.zone_name);

    let mut selected: Vec<EntityDescriptor> = Vec::new();
    let mut previous_zone = String::new();
    let mut transitions = 0;

    for input in declared.iter_mut() {
        let env = input
            .env_name
            .get_or_insert_with(|| current_env.to_string())
            .clone();
        let pipeline = input
            .pipeline_name
            .get_or_insert_with(|| current_pipeline.to_string())
            .clone();
        let zone = input
            .zone_name
            .get_or_insert_with(|| current_zone.to_string())
            .clone();

        if input.step_name.as_deref() != Some(query.step_name.as_str()) {
            continue;
        }

        if previous_zone != zone {
            transitions += 1;
        }

        // Explicit overrides combine with OR
        let matched = !query.has_scope_filter()
            || query.env_name.as_deref() == Some(env.as_str())
            || query.pipeline_name.as_deref() == Some(pipeline.as_str())
            || query.zone_name.as_deref() == Some(zone.as_str());
        if matched {
            selected.push(input.clone());
        }

        previous_zone = zone;
    }

    if transitions > 1 {
        info!(
            "Trying to resolve steps ambiguity by defaulting to the zone '{}'...",
            current_zone
        );
        selected.retain(|input| input.zone_name.as_deref() == Some(current_zone));

        let remaining = zone_transitions(
            selected
                .iter()
                .map(|input| input.zone_name.as_deref().unwrap_or(current_zone)),
        );
        if remaining != 1 {
            return Err(SubstepError::Ambiguity {
                step_name: query.step_name.clone(),
            });
        }
    }

    if let Some(run_id) = &query.run_id {
        selected.retain(|input| input.run_id.as_deref() == Some(run_id.as_str()));
    }

    Ok(selected)
}
