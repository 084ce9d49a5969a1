//! TensorBoard log directories of a substep

use crate::core::{
    error::{Result, SubstepError},
    naming,
};
use crate::substep::Substep;
use std::fs;
use std::path::PathBuf;
use tracing::info;

impl Substep {
    /// Where summary writers of the current run write `log_name`
    pub fn tensorboard_log_dir(&self, log_name: &str) -> PathBuf {
        self.tensorboard_log_base_dir(log_name)
            .join(&self.scope.run_id)
    }

    /// Directory holding `log_name` logs of every run, one subdirectory per run
    pub fn tensorboard_log_base_dir(&self, log_name: &str) -> PathBuf {
        self.settings
            .step_tmp_dir
            .join("tensorboard")
            .join(&self.scope.zone_name)
            .join(log_name)
    }

    /// Prepare logs of an experiment
    ///
    /// Returns the base directory to point TensorBoard at and the directory
    /// the current run writes to. Earlier runs' logs are copied in first when
    /// `copy_previous` is set.
    pub fn prepare_tensorboard_logs(
        &self,
        log_name: &str,
        copy_previous: bool,
        previous_env: Option<&str>,
    ) -> Result<(PathBuf, PathBuf)> {
        if copy_previous {
            self.copy_tensorboard_logs(log_name, previous_env)?;
        }

        let base_dir = self.tensorboard_log_base_dir(log_name);
        let writer_dir = self.tensorboard_log_dir(log_name);
        info!(
            "Tensorboard log dir: {}, log writer dir: {}",
            base_dir.display(),
            writer_dir.display()
        );
        Ok((base_dir, writer_dir))
    }

    /// Copy stored event files of `log_name` into the local base directory
    ///
    /// Files found at `{step}/{run_id}/tensorboard/{log_name}/events.out*`
    /// land in `{base}/{run_id}/`. Returns the number of files copied.
    pub fn copy_tensorboard_logs(&self, log_name: &str, env_name: Option<&str>) -> Result<usize> {
        let env_name = env_name.unwrap_or(&self.scope.env_name);
        let step_path = naming::step_path(
            &self.env().env_path(env_name),
            &self.scope.pipeline_name,
            &self.scope.zone_name,
            &self.scope.step_name,
        );
        let pattern = format!("{}/**/tensorboard/{}/events.out*", step_path, log_name);
        let base_dir = self.tensorboard_log_base_dir(log_name);

        let mut copied = 0;
        for event_path in self.storage.glob(&pattern)? {
            let parts: Vec<&str> = event_path.split('/').collect();
            if parts.len() < 4 {
                continue;
            }
            let file_name = parts[parts.len() - 1];
            let run_id = parts[parts.len() - 4];

            let run_dir = base_dir.join(run_id);
            fs::create_dir_all(&run_dir)
                .map_err(|e| SubstepError::storage(run_dir.display().to_string(), e))?;

            let local = run_dir.join(file_name);
            info!("Copying previous logs from {} to {}", event_path, local.display());
            self.storage.get(&event_path, &local)?;
            copied += 1;
        }
        Ok(copied)
    }
}
