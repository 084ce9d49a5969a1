//! CLI command definitions

use crate::core::{error::Result, naming::EntityAddress, params::DEFAULT_PARAMS_FILE, scope};
use clap::Args;
use std::path::PathBuf;

/// Declare a substep interface
#[derive(Debug, Args, Clone)]
pub struct InterfaceCommand {
    /// Path to the step params JSON file
    #[arg(short, long, default_value = DEFAULT_PARAMS_FILE)]
    pub params: PathBuf,

    /// Path to the interface declaration YAML file
    #[arg(short, long)]
    pub interface: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Mark the run as complete once the interface resolves
    #[arg(long)]
    pub complete: bool,
}

/// Scope and name of one entity
#[derive(Debug, Args, Clone)]
pub struct EntityArgs {
    /// Environment name; the settings' environment, else `user`
    #[arg(long)]
    pub env: Option<String>,

    /// Pipeline name
    #[arg(long)]
    pub pipeline: String,

    /// Zone name
    #[arg(long, default_value = scope::DEFAULT_ZONE_NAME)]
    pub zone: String,

    /// Step name
    #[arg(long)]
    pub step: String,

    /// Entity name
    #[arg(long)]
    pub entity: String,
}

impl EntityArgs {
    /// Validated address of the entity, with `default_env` filling a missing env
    pub fn address(&self, default_env: Option<&str>) -> Result<EntityAddress> {
        let env = self
            .env
            .as_deref()
            .or(default_env)
            .unwrap_or(scope::DEFAULT_ENV_NAME);
        let address = EntityAddress::new(
            env,
            self.pipeline.as_str(),
            self.zone.as_str(),
            self.step.as_str(),
            self.entity.as_str(),
        );
        address.validate()?;
        Ok(address)
    }
}

/// Print the last successful run id of an entity
#[derive(Debug, Args, Clone)]
pub struct LastRunCommand {
    #[command(flatten)]
    pub entity: EntityArgs,
}

/// Print the full name and URL of an entity
#[derive(Debug, Args, Clone)]
pub struct NameCommand {
    #[command(flatten)]
    pub entity: EntityArgs,

    /// Run id; the last successful run when omitted
    #[arg(long)]
    pub run_id: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
