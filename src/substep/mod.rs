//! The substep context object
//!
//! A [`Substep`] owns the scope of the running step, its declared
//! interface and the registered maps that end up in the run record.
//! Only one may be constructed per process.

pub mod registry;
pub mod report;
pub mod tensorboard;

pub use registry::{RegisteredEntities, Registration};
pub use report::{InterfaceReport, PrintView, VisualizerReport};

use crate::core::{
    config::{EnvironmentResolver, Settings},
    descriptor::{EntityDescriptor, EntityKind, InterfaceDeclaration, InterfaceSpec},
    error::{Result, SubstepError},
    naming::{self, validate_scope_name, EntityAddress},
    params::StepParams,
    scope::ScopeContext,
    view::EntityUrls,
};
use crate::persistence::{
    format_duration, format_timestamp, record_stem, FileRecordSink, Metrics, RunRecord,
    RunRecordSink, RunResult, RunStatus,
};
use crate::resolution::{select_inputs, InputQuery, RunResolver};
use crate::storage::{LocalStorage, Storage};
use crate::vcs::VersionInfo;
use chrono::{DateTime, Local};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Version recorded in run records
pub const SINARA_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Guard allowing a single substep construction
pub struct SubstepSlot {
    taken: AtomicBool,
}

impl SubstepSlot {
    pub const fn new() -> Self {
        Self {
            taken: AtomicBool::new(false),
        }
    }

    pub fn is_taken(&self) -> bool {
        self.taken.load(Ordering::SeqCst)
    }

    fn claim(&self) -> Result<()> {
        self.taken
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| SubstepError::AlreadyConstructed)
    }
}

impl Default for SubstepSlot {
    fn default() -> Self {
        Self::new()
    }
}

static PROCESS_SLOT: SubstepSlot = SubstepSlot::new();

/// Scope overrides for `outputs_in`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputScope {
    pub env_name: Option<String>,
    pub pipeline_name: Option<String>,
    pub zone_name: Option<String>,
}

impl OutputScope {
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
}

/// Builder for [`Substep`]
pub struct SubstepBuilder {
    params: StepParams,
    settings: Settings,
    storage: Option<Arc<dyn Storage>>,
    scratch: Option<Arc<dyn Storage>>,
    version: VersionInfo,
    sink: Option<Box<dyn RunRecordSink>>,
    slot: &'static SubstepSlot,
}

impl SubstepBuilder {
    pub fn new(params: StepParams, settings: Settings) -> Self {
        Self {
            params,
            settings,
            storage: None,
            scratch: None,
            version: VersionInfo::default(),
            sink: None,
            slot: &PROCESS_SLOT,
        }
    }

    /// Durable storage; local filesystem by default
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Scratch storage; local filesystem by default
    pub fn with_scratch_storage(mut self, scratch: Arc<dyn Storage>) -> Self {
        self.scratch = Some(scratch);
        self
    }

    pub fn with_version(mut self, version: VersionInfo) -> Self {
        self.version = version;
        self
    }

    /// Where run records go; JSON files under `record_dir` by default
    pub fn with_sink(mut self, sink: Box<dyn RunRecordSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Construction guard; the process-wide one by default
    pub fn with_slot(mut self, slot: &'static SubstepSlot) -> Self {
        self.slot = slot;
        self
    }

    /// Resolve the scope, claim the slot and write the intermediate record
    pub fn build(self) -> Result<Substep> {
        self.params.validate()?;
        self.settings.validate()?;
        let scope = ScopeContext::resolve(&self.params, &self.settings)?;

        self.slot.claim()?;

        let sink = match self.sink {
            Some(sink) => sink,
            None => Box::new(FileRecordSink::new(self.settings.record_dir.clone())),
        };
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(LocalStorage::new()) as Arc<dyn Storage>);
        let scratch = self
            .scratch
            .unwrap_or_else(|| Arc::new(LocalStorage::new()) as Arc<dyn Storage>);

        let mut metrics = Metrics::new();
        metrics.insert("run_id".to_string(), Value::String(scope.run_id.clone()));

        info!(
            "Substep of step '{}' started in {}.{}.{} with run id '{}'",
            scope.step_name, scope.env_name, scope.pipeline_name, scope.zone_name, scope.run_id
        );

        let mut substep = Substep {
            report: InterfaceReport::new(scope.step_name.clone()),
            scope,
            params: self.params,
            settings: self.settings,
            storage,
            scratch,
            version: self.version,
            sink,
            spec: InterfaceSpec::default(),
            registered: RegisteredEntities::new(),
            metrics,
            run_result: RunResult::Unknown,
            started_at: Local::now(),
        };
        substep.write_record(RunStatus::Running)?;
        Ok(substep)
    }
}

/// Execution context of one substep run
pub struct Substep {
    scope: ScopeContext,
    params: StepParams,
    settings: Settings,
    storage: Arc<dyn Storage>,
    scratch: Arc<dyn Storage>,
    version: VersionInfo,
    sink: Box<dyn RunRecordSink>,
    spec: InterfaceSpec,
    report: InterfaceReport,
    registered: RegisteredEntities,
    metrics: Metrics,
    run_result: RunResult,
    started_at: DateTime<Local>,
}

impl Substep {
    /// Construct with local storage and file run records
    pub fn new(params: StepParams, settings: Settings, version: VersionInfo) -> Result<Self> {
        SubstepBuilder::new(params, settings)
            .with_version(version)
            .build()
    }

    pub fn builder(params: StepParams, settings: Settings) -> SubstepBuilder {
        SubstepBuilder::new(params, settings)
    }

    pub fn scope(&self) -> &ScopeContext {
        &self.scope
    }

    pub fn env_name(&self) -> &str {
        &self.scope.env_name
    }

    pub fn pipeline_name(&self) -> &str {
        &self.scope.pipeline_name
    }

    pub fn zone_name(&self) -> &str {
        &self.scope.zone_name
    }

    pub fn step_name(&self) -> &str {
        &self.scope.step_name
    }

    pub fn run_id(&self) -> &str {
        &self.scope.run_id
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn params(&self) -> &StepParams {
        &self.params
    }

    pub fn version(&self) -> &VersionInfo {
        &self.version
    }

    /// The validated interface, with inputs backfilled by `inputs()` calls
    pub fn spec(&self) -> &InterfaceSpec {
        &self.spec
    }

    pub fn report(&self) -> &InterfaceReport {
        &self.report
    }

    pub fn registered(&self) -> &RegisteredEntities {
        &self.registered
    }

    fn env(&self) -> &dyn EnvironmentResolver {
        &self.settings
    }

    /// Notebook name up to its first dot
    pub fn substep_name(&self) -> Result<String> {
        let notebook = self.settings.notebook_name.as_deref().ok_or_else(|| {
            SubstepError::Internal("substep name is only known inside a notebook run".to_string())
        })?;
        Ok(notebook.split('.').next().unwrap_or(notebook).to_string())
    }

    /// Durable directory of the current run
    pub fn outputs_url(&self) -> String {
        self.scope.outputs_url(self.env())
    }

    /// Durable directory holding every run of this step
    pub fn step_url(&self) -> String {
        self.scope.step_url(self.env())
    }

    /// Scratch directory holding every run of this step
    pub fn step_cache_url(&self) -> String {
        self.scope.step_cache_url(self.env())
    }

    /// Scratch directory of the current run
    pub fn cache_url(&self) -> String {
        self.scope.cache_url(self.env())
    }

    fn run_resolver<'s>(&self, storage: &'s Arc<dyn Storage>) -> RunResolver<'s> {
        RunResolver::new(storage.as_ref(), self.settings.design_mode)
    }

    /// Latest successful run of an entity
    pub fn last_run_id(&self, address: &EntityAddress) -> Result<String> {
        address.validate()?;
        let step_path = address.step_path(&self.env().env_path(&address.env_name));
        self.run_resolver(&self.storage)
            .last_run_id(&step_path, &address.entity_name)
    }

    /// Declare the interface and resolve its print views
    ///
    /// Every declared input is resolved here, so a missing run or an
    /// invalid descriptor fails at declaration time. Nothing is
    /// registered.
    pub fn interface(&mut self, declaration: &InterfaceDeclaration) -> Result<&InterfaceReport> {
        let spec = declaration.validate()?;
        let report = self.build_report(&spec)?;

        info!(
            "Interface of step '{}' declared: {} inputs, {} outputs",
            self.scope.step_name,
            spec.inputs.len() + spec.custom_inputs.len(),
            spec.outputs.len() + spec.custom_outputs.len()
        );

        self.spec = spec;
        self.report = report;
        Ok(&self.report)
    }

    fn build_report(&self, spec: &InterfaceSpec) -> Result<InterfaceReport> {
        let mut report = InterfaceReport::new(self.scope.step_name.clone());

        for input in &spec.inputs {
            let address = self.input_address(input, input.step_name.as_deref());
            let run_id = match &input.run_id {
                Some(run_id) => run_id.clone(),
                None => self.last_run_id(&address)?,
            };
            let url = address.url(&self.env().env_path(&address.env_name), &run_id);
            report
                .views_mut(EntityKind::Input)
                .push(PrintView::new(address.full_name(), url));
        }

        for output in &spec.outputs {
            let (full_name, url) = self.output_url(&OutputScope::default(), &output.entity_name);
            report
                .views_mut(EntityKind::Output)
                .push(PrintView::new(full_name, url));
        }

        for kind in [EntityKind::CustomInput, EntityKind::CustomOutput] {
            for custom in spec.descriptors(kind) {
                report.views_mut(kind).push(PrintView::new(
                    custom.entity_name.clone(),
                    custom_path(custom),
                ));
            }
        }

        for tmp_input in &spec.tmp_inputs {
            let url = self.resolve_tmp_input(&tmp_input.entity_name)?;
            report.views_mut(EntityKind::TmpInput).push(PrintView::new(
                self.scope.tmp_full_name(&tmp_input.entity_name),
                url,
            ));
        }

        for kind in [EntityKind::TmpOutput, EntityKind::TmpEntity] {
            for tmp in spec.descriptors(kind) {
                report.views_mut(kind).push(PrintView::new(
                    self.scope.tmp_full_name(&tmp.entity_name),
                    self.tmp_url(&tmp.entity_name),
                ));
            }
        }

        Ok(report)
    }

    /// Address of an input, filling gaps from the own scope
    fn input_address(&self, input: &EntityDescriptor, step_name: Option<&str>) -> EntityAddress {
        EntityAddress::new(
            input.env_name.as_deref().unwrap_or(&self.scope.env_name),
            input.pipeline_name.as_deref().unwrap_or(&self.scope.pipeline_name),
            input.zone_name.as_deref().unwrap_or(&self.scope.zone_name),
            step_name.unwrap_or(&self.scope.step_name),
            input.entity_name.as_str(),
        )
    }

    fn output_url(&self, overrides: &OutputScope, entity_name: &str) -> (String, String) {
        let address = EntityAddress::new(
            overrides.env_name.as_deref().unwrap_or(&self.scope.env_name),
            overrides
                .pipeline_name
                .as_deref()
                .unwrap_or(&self.scope.pipeline_name),
            overrides.zone_name.as_deref().unwrap_or(&self.scope.zone_name),
            self.scope.step_name.as_str(),
            entity_name,
        );
        let url = address.url(&self.env().env_path(&address.env_name), &self.scope.run_id);
        (address.full_name(), url)
    }

    /// Scratch URL of an entity in the current run
    fn tmp_url(&self, entity_name: &str) -> String {
        naming::url(
            &self.env().tmp_path(&self.scope.env_name),
            &self.scope.pipeline_name,
            &self.scope.zone_name,
            &self.scope.step_name,
            &self.scope.run_id,
            entity_name,
        )
    }

    /// Scratch URL of an entity in the latest run that left it behind
    fn resolve_tmp_input(&self, entity_name: &str) -> Result<String> {
        let step_cache = self.step_cache_url();
        let run_id = self
            .run_resolver(&self.scratch)
            .last_scratch_run_id(&step_cache, entity_name)?;
        Ok(naming::url(
            &self.env().tmp_path(&self.scope.env_name),
            &self.scope.pipeline_name,
            &self.scope.zone_name,
            &self.scope.step_name,
            &run_id,
            entity_name,
        ))
    }

    /// Inputs produced by a step, resolved to their latest successful run
    pub fn inputs(&mut self, query: &InputQuery) -> Result<EntityUrls> {
        validate_scope_name("step_name", &query.step_name)?;
        for (field, value) in [
            ("env_name", &query.env_name),
            ("pipeline_name", &query.pipeline_name),
            ("zone_name", &query.zone_name),
        ] {
            if let Some(value) = value {
                validate_scope_name(field, value)?;
            }
        }

        let selected = select_inputs(&mut self.spec.inputs, query, &self.scope)?;

        let mut urls = EntityUrls::new(EntityKind::Input);
        for input in &selected {
            let address = self.input_address(input, Some(query.step_name.as_str()));
            let run_id = match query.run_id.as_ref().or(input.run_id.as_ref()) {
                Some(run_id) => run_id.clone(),
                None => self.last_run_id(&address)?,
            };
            let full_name = address.full_name();
            let url = address.url(&self.env().env_path(&address.env_name), &run_id);

            self.registered.record(Registration::Input, &full_name, &url);
            urls.insert(&input.entity_name, full_name, url);
        }

        debug!(
            "Resolved {} inputs of step '{}'",
            urls.len(),
            query.step_name
        );
        Ok(urls)
    }

    /// Outputs of the current run
    pub fn outputs(&mut self) -> Result<EntityUrls> {
        self.outputs_in(&OutputScope::default())
    }

    /// Outputs of the current run under another env, pipeline or zone
    pub fn outputs_in(&mut self, overrides: &OutputScope) -> Result<EntityUrls> {
        for (field, value) in [
            ("env_name", &overrides.env_name),
            ("pipeline_name", &overrides.pipeline_name),
            ("zone_name", &overrides.zone_name),
        ] {
            if let Some(value) = value {
                validate_scope_name(field, value)?;
            }
        }

        let mut urls = EntityUrls::new(EntityKind::Output);
        for output in self.spec.outputs.clone() {
            let (full_name, url) = self.output_url(overrides, &output.entity_name);
            self.registered.record(Registration::Output, &full_name, &url);
            urls.insert(&output.entity_name, full_name, url);
        }
        Ok(urls)
    }

    /// Custom inputs at their declared paths, keyed by entity name
    pub fn custom_inputs(&mut self) -> EntityUrls {
        self.custom(EntityKind::CustomInput, Registration::Input)
    }

    /// Custom outputs at their declared paths, keyed by entity name
    pub fn custom_outputs(&mut self) -> EntityUrls {
        self.custom(EntityKind::CustomOutput, Registration::Output)
    }

    fn custom(&mut self, kind: EntityKind, registration: Registration) -> EntityUrls {
        let mut urls = EntityUrls::new(kind);
        for custom in self.spec.descriptors(kind).to_vec() {
            let path = custom_path(&custom);
            self.registered.record(registration, &custom.entity_name, &path);
            urls.insert(&custom.entity_name, custom.entity_name.clone(), path);
        }
        urls
    }

    /// Scratch entities left behind by earlier runs of this step
    pub fn tmp_inputs(&mut self) -> Result<EntityUrls> {
        let mut urls = EntityUrls::new(EntityKind::TmpInput);
        for tmp_input in self.spec.tmp_inputs.clone() {
            let url = self.resolve_tmp_input(&tmp_input.entity_name)?;
            let full_name = self.scope.tmp_full_name(&tmp_input.entity_name);
            self.registered.record(Registration::TmpInput, &full_name, &url);
            urls.insert(&tmp_input.entity_name, full_name, url);
        }
        Ok(urls)
    }

    /// Scratch outputs of the current run; their directories are created
    pub fn tmp_outputs(&mut self) -> Result<EntityUrls> {
        self.provision_tmp(EntityKind::TmpOutput)
    }

    /// Scratch entities of the current run; their directories are created
    pub fn tmp_entities(&mut self) -> Result<EntityUrls> {
        self.provision_tmp(EntityKind::TmpEntity)
    }

    fn provision_tmp(&mut self, kind: EntityKind) -> Result<EntityUrls> {
        let mut urls = EntityUrls::new(kind);
        for tmp in self.spec.descriptors(kind).to_vec() {
            let url = self.tmp_url(&tmp.entity_name);
            self.scratch.create_dir_all(&url)?;

            let full_name = self.scope.tmp_full_name(&tmp.entity_name);
            self.registered.record(Registration::TmpOutput, &full_name, &url);
            urls.insert(&tmp.entity_name, full_name, url);
        }
        Ok(urls)
    }

    pub fn add_metric(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.metrics.insert(name.into(), value.into());
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Record the run as finished successfully
    pub fn complete(&mut self) -> Result<()> {
        self.run_result = RunResult::Success;
        self.write_record(RunStatus::Complete)
    }

    /// Record the run as finished with a failure
    pub fn fail(&mut self) -> Result<()> {
        self.run_result = RunResult::Fail;
        self.write_record(RunStatus::Complete)
    }

    pub fn run_result(&self) -> RunResult {
        self.run_result
    }

    /// Snapshot the run; registers the notebook report as an output
    pub fn run_record(&mut self, status: RunStatus) -> RunRecord {
        let input_nb_name = self.settings.notebook_name_or_default().to_string();
        let output_nb_name = self.settings.notebook_output_name_or_default().to_string();

        let report_entity = format!("reports.{}", input_nb_name);
        let (report_name, notebook_report_url) =
            self.output_url(&OutputScope::default(), &report_entity);
        self.registered
            .record(Registration::Output, &report_name, &notebook_report_url);

        let stop = Local::now();
        RunRecord {
            start_time: format_timestamp(&self.started_at),
            stop_time: format_timestamp(&stop),
            duration: format_duration(&self.started_at, &stop),
            status,
            result: self.run_result,
            pipeline_params: self.params.pipeline_params.clone(),
            step_params: self.params.step_params.clone(),
            substeps_params: self.params.substeps_params.clone(),
            inputs: self.registered.inputs().clone(),
            outputs: self.registered.outputs().clone(),
            tmp: self.registered.tmp(),
            origin: self.version.origin.clone(),
            step_name: self.scope.step_name.clone(),
            commit: self.version.commit.clone(),
            outputs_url: self.outputs_url(),
            notebook_report_url,
            sinara_version: SINARA_VERSION.to_string(),
            sinara_server_image: self.settings.server_image.clone(),
            input_nb_name,
            output_nb_name,
        }
    }

    fn write_record(&mut self, status: RunStatus) -> Result<()> {
        let record = self.run_record(status);
        let stem = record_stem(&record.output_nb_name);
        self.sink.write(&stem, &record, &self.metrics)?;
        info!(
            "Run record '{}' written: {:?} / {:?}",
            stem, record.status, record.result
        );
        Ok(())
    }

    /// In design mode, leave the visualizer report and tell the caller to stop
    ///
    /// Returns the report path when the substep should stop, `None` when
    /// it should keep running.
    pub fn visualize(&self) -> Result<Option<PathBuf>> {
        if !self.settings.design_mode {
            return Ok(None);
        }

        let session_dir = self
            .settings
            .visualizer_session_dir
            .as_deref()
            .filter(|dir| !dir.is_empty())
            .ok_or_else(|| {
                SubstepError::Configuration(
                    "visualizer session directory isn't set in design mode".to_string(),
                )
            })?;
        fs::create_dir_all(session_dir).map_err(|e| SubstepError::storage(session_dir, e))?;

        let substep_name = self.substep_name()?;
        let report = VisualizerReport {
            step_name: self.scope.step_name.clone(),
            substep_name: substep_name.clone(),
            inputs: self.report.merged(EntityKind::Input),
            outputs: self.report.merged(EntityKind::Output),
        };

        let path = PathBuf::from(session_dir).join(format!(
            "{}.{}.{}.json",
            self.scope.step_name,
            substep_name,
            uuid::Uuid::new_v4()
        ));
        let json = serde_json::to_string(&report)?;
        fs::write(&path, json).map_err(|e| SubstepError::storage(path.display().to_string(), e))?;

        info!("Visualizer report written to {}", path.display());
        Ok(Some(path))
    }
}

fn custom_path(custom: &EntityDescriptor) -> String {
    custom.entity_path.clone().unwrap_or_default()
}
