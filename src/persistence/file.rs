//! JSON files beside the notebook: `{stem}.runinfo.json` and `{stem}.metrics.json`

use crate::core::error::{Result, SubstepError};
use crate::persistence::{Metrics, RunRecord, RunRecordSink};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes run records as JSON files into a directory
#[derive(Debug, Clone)]
pub struct FileRecordSink {
    dir: PathBuf,
}

impl FileRecordSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn runinfo_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{}.runinfo.json", stem))
    }

    pub fn metrics_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{}.metrics.json", stem))
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json).map_err(|e| SubstepError::storage(path.display().to_string(), e))
    }
}

impl RunRecordSink for FileRecordSink {
    fn write(&self, stem: &str, record: &RunRecord, metrics: &Metrics) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| SubstepError::storage(self.dir.display().to_string(), e))?;

        let runinfo = self.runinfo_path(stem);
        Self::write_json(&runinfo, record)?;
        Self::write_json(&self.metrics_path(stem), metrics)?;

        debug!("Run record written to {}", runinfo.display());
        Ok(())
    }
}
