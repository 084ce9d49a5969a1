//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{InterfaceCommand, LastRunCommand, NameCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Entity addressing and run resolution for pipeline substeps
#[derive(Debug, Parser, Clone)]
#[command(name = "substep")]
#[command(version)]
#[command(about = "Resolve the inputs and outputs of a pipeline substep", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a settings YAML file
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Declare a substep interface and print where every entity lives
    Interface(InterfaceCommand),

    /// Print the last successful run id of an entity
    LastRun(LastRunCommand),

    /// Print the full name and URL of an entity
    Name(NameCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
