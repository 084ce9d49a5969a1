//! Local filesystem storage

use crate::core::error::{Result, SubstepError};
use crate::storage::Storage;
use glob::MatchOptions;
use std::path::Path;
use tracing::debug;

/// Storage backed by the local filesystem (or anything mounted into it)
#[derive(Debug, Clone, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for LocalStorage {
    fn glob(&self, pattern: &str) -> Result<Vec<String>> {
        let options = MatchOptions {
            require_literal_leading_dot: true,
            ..Default::default()
        };
        let paths = glob::glob_with(pattern, options).map_err(|e| {
            SubstepError::Configuration(format!("invalid glob pattern '{}': {}", pattern, e))
        })?;

        let mut matches = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| {
                let path = e.path().display().to_string();
                SubstepError::storage(path, e.into_error())
            })?;
            matches.push(path.to_string_lossy().into_owned());
        }
        matches.sort();
        debug!("glob {} matched {} path(s)", pattern, matches.len());
        Ok(matches)
    }

    fn get(&self, remote_path: &str, local_path: &Path) -> Result<()> {
        if let Some(parent) = local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SubstepError::storage(parent.display().to_string(), e))?;
        }
        std::fs::copy(remote_path, local_path)
            .map_err(|e| SubstepError::storage(remote_path, e))?;
        Ok(())
    }

    fn create_dir_all(&self, path: &str) -> Result<()> {
        std::fs::create_dir_all(path).map_err(|e| SubstepError::storage(path, e))
    }
}
