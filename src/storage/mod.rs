//! Storage abstraction consumed by the run resolver
//!
//! Only a narrow contract is needed: list paths matching a glob, copy a
//! remote file into local scratch space, and create directories.

pub mod local;

pub use local::LocalStorage;

use crate::core::error::Result;
use std::path::Path;

/// Trait for storage backends - allows for different implementations
pub trait Storage: Send + Sync {
    /// Every path matching `pattern`, sorted
    ///
    /// `*` and `?` match within one path segment, `**` matches any number
    /// of segments.
    fn glob(&self, pattern: &str) -> Result<Vec<String>>;

    /// Copy `remote_path` into `local_path`
    fn get(&self, remote_path: &str, local_path: &Path) -> Result<()>;

    /// Create a directory and its parents; an existing directory is fine
    fn create_dir_all(&self, path: &str) -> Result<()>;
}
