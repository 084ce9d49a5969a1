//! Persistence layer for run records and metrics

pub mod file;

pub use file::FileRecordSink;

use crate::core::error::Result;
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Mutex;

/// Metric name to value; always carries `run_id`
pub type Metrics = IndexMap<String, Value>;

/// Full name to URL, in registration order
pub type RegisteredUrls = IndexMap<String, String>;

/// Whether the substep is still running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Running,
    Complete,
}

/// Outcome of a run, `Unknown` until it finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunResult {
    Success,
    Fail,
    Unknown,
}

/// Everything recorded about one substep run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub start_time: String,
    pub stop_time: String,
    pub duration: String,
    pub status: RunStatus,
    pub result: RunResult,
    pub pipeline_params: Map<String, Value>,
    pub step_params: Map<String, Value>,
    pub substeps_params: Value,
    pub inputs: RegisteredUrls,
    pub outputs: RegisteredUrls,
    pub tmp: RegisteredUrls,
    pub origin: String,
    pub step_name: String,
    pub commit: String,
    pub outputs_url: String,
    pub notebook_report_url: String,
    pub sinara_version: String,
    pub sinara_server_image: String,
    pub input_nb_name: String,
    pub output_nb_name: String,
}

/// Timestamp in the `2024-01-31 09:15:00.123456` form run records use
pub fn format_timestamp(time: &DateTime<Local>) -> String {
    time.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Elapsed time as `H:MM:SS.ffffff`
pub fn format_duration(start: &DateTime<Local>, stop: &DateTime<Local>) -> String {
    let micros = (*stop - *start).num_microseconds().unwrap_or(0).max(0);
    let seconds = micros / 1_000_000;
    format!(
        "{}:{:02}:{:02}.{:06}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60,
        micros % 1_000_000
    )
}

/// File stem a notebook's records are named after
pub fn record_stem(output_nb_name: &str) -> String {
    Path::new(output_nb_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| output_nb_name.to_string())
}

/// Trait for run record backends
pub trait RunRecordSink: Send + Sync {
    /// Store a run record and the metrics beside it, replacing earlier ones
    fn write(&self, stem: &str, record: &RunRecord, metrics: &Metrics) -> Result<()>;
}

/// In-memory sink (for testing or ephemeral use)
#[derive(Default)]
pub struct InMemoryRecordSink {
    written: Mutex<Vec<(String, RunRecord, Metrics)>>,
}

impl InMemoryRecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write so far, oldest first
    pub fn written(&self) -> Vec<(String, RunRecord, Metrics)> {
        match self.written.lock() {
            Ok(written) => written.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last(&self) -> Option<RunRecord> {
        self.written().pop().map(|(_, record, _)| record)
    }
}

impl RunRecordSink for InMemoryRecordSink {
    fn write(&self, stem: &str, record: &RunRecord, metrics: &Metrics) -> Result<()> {
        let mut written = match self.written.lock() {
            Ok(written) => written,
            Err(poisoned) => poisoned.into_inner(),
        };
        written.push((stem.to_string(), record.clone(), metrics.clone()));
        Ok(())
    }
}

impl<T: RunRecordSink + ?Sized> RunRecordSink for std::sync::Arc<T> {
    fn write(&self, stem: &str, record: &RunRecord, metrics: &Metrics) -> Result<()> {
        (**self).write(stem, record, metrics)
    }
}
