//! Git metadata read through the `git` executable

use crate::core::error::{Result, SubstepError};
use crate::vcs::VersionControl;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// A git working tree queried via `git` subprocesses
#[derive(Debug, Clone)]
pub struct GitRepository {
    /// Directory inside the working tree
    dir: PathBuf,

    /// Path to the git executable
    git_path: String,
}

impl GitRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            git_path: "git".to_string(),
        }
    }

    pub fn with_git_path(mut self, git_path: impl Into<String>) -> Self {
        self.git_path = git_path.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run a git command and return its trimmed stdout
    fn git(&self, args: &[&str]) -> Result<String> {
        debug!("Running {} {}", self.git_path, args.join(" "));

        let output = Command::new(&self.git_path)
            .args(args)
            .current_dir(&self.dir)
            .output()
            .map_err(|e| SubstepError::storage(self.dir.display().to_string(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SubstepError::Configuration(format!(
                "git {} failed in {}: {}",
                args.join(" "),
                self.dir.display(),
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map(|s| s.trim().to_string())
            .map_err(|e| SubstepError::Internal(format!("git output is not valid UTF-8: {}", e)))
    }
}

impl VersionControl for GitRepository {
    fn current_commit_id(&self) -> Result<String> {
        self.git(&["rev-parse", "HEAD"])
    }

    fn origin_url(&self) -> Result<String> {
        self.git(&["remote", "get-url", "origin"])
    }
}
