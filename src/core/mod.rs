//! Core domain models for substep interfaces
//!
//! This module defines descriptors, naming rules, scope and settings,
//! and the addressed views handed to step authors.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod naming;
pub mod params;
pub mod scope;
pub mod view;

pub use config::{EnvironmentResolver, Settings, StorageSettings};
pub use descriptor::*;
pub use error::{Result, SubstepError};
pub use params::StepParams;
pub use scope::ScopeContext;
pub use view::{AddressedEntity, EntityUrls};
