//! Version-control metadata recorded with every run

pub mod git;

pub use git::GitRepository;

use crate::core::error::Result;
use serde::{Deserialize, Serialize};

/// Source of the commit and origin a substep runs from
pub trait VersionControl {
    fn current_commit_id(&self) -> Result<String>;

    fn origin_url(&self) -> Result<String>;
}

/// Commit id and origin url, captured once at startup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub commit: String,
    pub origin: String,
}

impl VersionInfo {
    pub fn new(commit: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            commit: commit.into(),
            origin: origin.into(),
        }
    }

    /// Read both values from a version-control source
    pub fn capture(vcs: &dyn VersionControl) -> Result<Self> {
        Ok(Self {
            commit: vcs.current_commit_id()?,
            origin: vcs.origin_url()?,
        })
    }
}

impl VersionControl for VersionInfo {
    fn current_commit_id(&self) -> Result<String> {
        Ok(self.commit.clone())
    }

    fn origin_url(&self) -> Result<String> {
        Ok(self.origin.clone())
    }
}
