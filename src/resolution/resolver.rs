//! Run resolver - finds the latest run that produced an entity

use crate::core::{
    error::{Result, SubstepError},
    naming::{scratch_entity_pattern, success_marker_pattern},
};
use crate::storage::Storage;
use tracing::debug;

/// Discovers the most recent run of an entity by listing storage
///
/// Run ids are time-sortable by construction (`run-YY-MM-DD-HHMMSS` or a
/// pipeline-injected id), so the latest run is the lexicographically
/// greatest one.
pub struct RunResolver<'a> {
    storage: &'a dyn Storage,
    design_mode: bool,
}

impl<'a> RunResolver<'a> {
    pub fn new(storage: &'a dyn Storage, design_mode: bool) -> Self {
        Self {
            storage,
            design_mode,
        }
    }

    /// Latest run holding a completed durable entity
    ///
    /// Only runs whose entity directory carries a `_SUCCESS` marker count.
    /// In design mode the entity name is echoed back instead.
    pub fn last_run_id(&self, step_path: &str, entity_name: &str) -> Result<String> {
        if self.design_mode {
            return Ok(entity_name.to_string());
        }

        let pattern = success_marker_pattern(step_path, entity_name);
        let paths = self.storage.glob(&pattern)?;
        // {step_path}/{run_id}/{entity}/_SUCCESS
        latest_run_id(&paths, 3).ok_or(SubstepError::NotFound { pattern })
    }

    /// Latest scratch run directory holding an entity; no marker required
    pub fn last_scratch_run_id(&self, step_path: &str, entity_name: &str) -> Result<String> {
        if self.design_mode {
            return Ok(entity_name.to_string());
        }

        let pattern = scratch_entity_pattern(step_path, entity_name);
        let paths = self.storage.glob(&pattern)?;
        // {step_path}/{run_id}/{entity}
        latest_run_id(&paths, 2).ok_or(SubstepError::NotFound { pattern })
    }
}

/// The greatest run id, taken `depth` segments from the end of each path
fn latest_run_id(paths: &[String], depth: usize) -> Option<String> {
    let mut run_ids: Vec<&str> = paths
        .iter()
        .filter_map(|path| {
            let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
            segments.len().checked_sub(depth).map(|i| segments[i])
        })
        .collect();
    run_ids.sort_unstable();
    let latest = run_ids.last().map(|run_id| run_id.to_string());
    debug!("{} candidate run(s), latest: {:?}", run_ids.len(), latest);
    latest
}
