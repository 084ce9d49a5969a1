//! Error types for interface declaration and resolution

use thiserror::Error;

/// Errors raised while declaring or resolving a substep interface
///
/// None of these are recovered locally; the runner is expected to mark
/// the run as failed and stop.
#[derive(Debug, Error)]
pub enum SubstepError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Entity name '{0}' can't contain '/' character")]
    InvalidEntityName(String),

    #[error("There is no successfully created entity for path: '{pattern}'")]
    NotFound { pattern: String },

    #[error(
        "Ambiguity error: there is more than 1 step named '{step_name}' in different zones. \
         Please, define additional parameters (env_name, pipeline_name, zone_name or run_id) \
         to resolve the ambiguity"
    )]
    Ambiguity { step_name: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("A substep has already been constructed in this process")]
    AlreadyConstructed,

    #[error("Storage error at '{path}': {source}")]
    Storage {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SubstepError {
    /// Wrap an I/O failure together with the path it happened on
    pub fn storage(path: impl Into<String>, source: std::io::Error) -> Self {
        SubstepError::Storage {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = SubstepError> = std::result::Result<T, E>;
