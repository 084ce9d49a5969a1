//! substep - entity addressing and run resolution for pipeline substeps

pub mod cli;
pub mod core;
pub mod persistence;
pub mod resolution;
pub mod storage;
pub mod substep;
pub mod vcs;

// Re-export commonly used types
pub use crate::core::{
    EntityDescriptor, EntityKind, EntityUrls, InterfaceDeclaration, InterfaceSpec, ScopeContext,
    Settings, StepParams, SubstepError,
};
pub use persistence::{FileRecordSink, InMemoryRecordSink, RunRecord, RunRecordSink, RunResult, RunStatus};
pub use resolution::{InputQuery, RunResolver};
pub use storage::{LocalStorage, Storage};
pub use substep::{InterfaceReport, OutputScope, Substep, SubstepBuilder, SubstepSlot};
pub use vcs::{GitRepository, VersionControl, VersionInfo};
