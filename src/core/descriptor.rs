//! Interface declaration - entity descriptors and their validation

use crate::core::{
    error::{Result, SubstepError},
    naming::{sanitize_entity_name, validate_entity_name, validate_scope_name},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

pub const ENV_NAME: &str = "env_name";
pub const PIPELINE_NAME: &str = "pipeline_name";
pub const ZONE_NAME: &str = "zone_name";
pub const STEP_NAME: &str = "step_name";
pub const RUN_ID: &str = "run_id";
pub const ENTITY_NAME: &str = "entity_name";
pub const ENTITY_PATH: &str = "entity_path";

/// A descriptor exactly as the step author wrote it
pub type RawDescriptor = BTreeMap<String, String>;

/// Build a raw descriptor from key/value pairs
pub fn descriptor<const N: usize>(pairs: [(&str, &str); N]) -> RawDescriptor {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// The seven kinds of declared entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Input,
    Output,
    CustomInput,
    CustomOutput,
    TmpInput,
    TmpOutput,
    TmpEntity,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Input,
        EntityKind::Output,
        EntityKind::CustomInput,
        EntityKind::CustomOutput,
        EntityKind::TmpInput,
        EntityKind::TmpOutput,
        EntityKind::TmpEntity,
    ];

    /// Keys every descriptor of this kind must carry
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Input => &[STEP_NAME, ENTITY_NAME],
            EntityKind::CustomInput | EntityKind::CustomOutput => &[ENTITY_NAME, ENTITY_PATH],
            EntityKind::Output
            | EntityKind::TmpInput
            | EntityKind::TmpOutput
            | EntityKind::TmpEntity => &[ENTITY_NAME],
        }
    }

    /// Keys a descriptor of this kind may carry
    pub fn permitted_keys(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Input => &[STEP_NAME, ENTITY_NAME, ENV_NAME, PIPELINE_NAME, ZONE_NAME, RUN_ID],
            EntityKind::CustomInput | EntityKind::CustomOutput => &[ENTITY_NAME, ENTITY_PATH],
            EntityKind::Output
            | EntityKind::TmpInput
            | EntityKind::TmpOutput
            | EntityKind::TmpEntity => &[ENTITY_NAME],
        }
    }

    /// Plural name, as used in declarations and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Input => "inputs",
            EntityKind::Output => "outputs",
            EntityKind::CustomInput => "custom_inputs",
            EntityKind::CustomOutput => "custom_outputs",
            EntityKind::TmpInput => "tmp_inputs",
            EntityKind::TmpOutput => "tmp_outputs",
            EntityKind::TmpEntity => "tmp_entities",
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, EntityKind::CustomInput | EntityKind::CustomOutput)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated entity descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub entity_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_path: Option<String>,
}

impl EntityDescriptor {
    /// A descriptor naming only an entity
    pub fn named(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            step_name: None,
            env_name: None,
            pipeline_name: None,
            zone_name: None,
            run_id: None,
            entity_path: None,
        }
    }

    /// Validate a raw descriptor against the rules of its kind
    pub fn from_raw(raw: &RawDescriptor, kind: EntityKind) -> Result<Self> {
        let permitted = kind.permitted_keys();

        for required in kind.required_keys() {
            if !raw.contains_key(*required) {
                return Err(SubstepError::Configuration(format!(
                    "Mandatory key '{}' isn't defined in {}. Required keys are {:?}",
                    required,
                    DisplayRaw(raw),
                    permitted
                )));
            }
        }

        for key in raw.keys() {
            if !permitted.contains(&key.as_str()) {
                return Err(SubstepError::Configuration(format!(
                    "This key '{}' in '{}' isn't permitted. Available keys are {:?}",
                    key,
                    DisplayRaw(raw),
                    permitted
                )));
            }
        }

        // Empty values read as unset, like a missing key
        let optional = |key: &str| raw.get(key).filter(|value| !value.is_empty()).cloned();

        let descriptor = Self {
            entity_name: raw.get(ENTITY_NAME).cloned().unwrap_or_default(),
            step_name: optional(STEP_NAME),
            env_name: optional(ENV_NAME),
            pipeline_name: optional(PIPELINE_NAME),
            zone_name: optional(ZONE_NAME),
            run_id: optional(RUN_ID),
            entity_path: optional(ENTITY_PATH),
        };
        descriptor.validate(kind)?;
        Ok(descriptor)
    }

    fn validate(&self, kind: EntityKind) -> Result<()> {
        if self.entity_name.is_empty() {
            return Err(SubstepError::Configuration(format!(
                "'{}' must not be empty in {}",
                ENTITY_NAME, kind
            )));
        }
        validate_entity_name(&self.entity_name)?;

        if kind == EntityKind::Input && self.step_name.is_none() {
            return Err(SubstepError::Configuration(format!(
                "'{}' must not be empty for input '{}'",
                STEP_NAME, self.entity_name
            )));
        }
        if kind.is_custom() && self.entity_path.is_none() {
            return Err(SubstepError::Configuration(format!(
                "'{}' must not be empty for custom entity '{}'",
                ENTITY_PATH, self.entity_name
            )));
        }

        for (field, value) in [
            (STEP_NAME, &self.step_name),
            (ENV_NAME, &self.env_name),
            (PIPELINE_NAME, &self.pipeline_name),
            (ZONE_NAME, &self.zone_name),
        ] {
            if let Some(value) = value {
                validate_scope_name(field, value)?;
            }
        }
        if let Some(run_id) = &self.run_id {
            if run_id.contains('/') {
                return Err(SubstepError::Configuration(format!(
                    "run id '{}' can't contain '/' character",
                    run_id
                )));
            }
        }

        Ok(())
    }
}

/// Renders a raw descriptor the way authors write it: `{key: value, ...}`
struct DisplayRaw<'a>(&'a RawDescriptor);

impl fmt::Display for DisplayRaw<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}': '{}'", key, value)?;
        }
        f.write_str("}")
    }
}

/// The interface as declared by a step author, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDeclaration {
    #[serde(default)]
    pub inputs: Vec<RawDescriptor>,

    #[serde(default)]
    pub outputs: Vec<RawDescriptor>,

    #[serde(default)]
    pub custom_inputs: Vec<RawDescriptor>,

    #[serde(default)]
    pub custom_outputs: Vec<RawDescriptor>,

    #[serde(default)]
    pub tmp_inputs: Vec<RawDescriptor>,

    #[serde(default)]
    pub tmp_outputs: Vec<RawDescriptor>,

    #[serde(default)]
    pub tmp_entities: Vec<RawDescriptor>,
}

impl InterfaceDeclaration {
    /// Load a declaration from a YAML (or JSON) file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubstepError::storage(path.display().to_string(), e))?;
        Self::from_yaml(&content)
    }

    /// Parse a declaration from YAML; JSON is accepted as well
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn descriptors(&self, kind: EntityKind) -> &[RawDescriptor] {
        match kind {
            EntityKind::Input => &self.inputs,
            EntityKind::Output => &self.outputs,
            EntityKind::CustomInput => &self.custom_inputs,
            EntityKind::CustomOutput => &self.custom_outputs,
            EntityKind::TmpInput => &self.tmp_inputs,
            EntityKind::TmpOutput => &self.tmp_outputs,
            EntityKind::TmpEntity => &self.tmp_entities,
        }
    }

    /// Validate every sequence; the declaration itself is left untouched
    pub fn validate(&self) -> Result<InterfaceSpec> {
        let mut spec = InterfaceSpec::default();
        for kind in EntityKind::ALL {
            let validated = self
                .descriptors(kind)
                .iter()
                .map(|raw| EntityDescriptor::from_raw(raw, kind))
                .collect::<Result<Vec<_>>>()?;
            check_name_collisions(kind, &validated)?;
            *spec.descriptors_mut(kind) = validated;
        }
        Ok(spec)
    }
}

/// Two different entity names must not collapse to one address once dots
/// are replaced
fn check_name_collisions(kind: EntityKind, descriptors: &[EntityDescriptor]) -> Result<()> {
    if kind.is_custom() {
        return Ok(());
    }

    let mut seen: HashMap<(Option<&str>, Option<&str>, Option<&str>, Option<&str>, String), &str> =
        HashMap::new();
    for descriptor in descriptors {
        let key = (
            descriptor.step_name.as_deref(),
            descriptor.env_name.as_deref(),
            descriptor.pipeline_name.as_deref(),
            descriptor.zone_name.as_deref(),
            sanitize_entity_name(&descriptor.entity_name),
        );
        if let Some(previous) = seen.insert(key, &descriptor.entity_name) {
            if previous != descriptor.entity_name {
                return Err(SubstepError::Configuration(format!(
                    "{} '{}' and '{}' resolve to the same entity name",
                    kind, previous, descriptor.entity_name
                )));
            }
        }
    }
    Ok(())
}

/// A validated interface: seven ordered descriptor sequences
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceSpec {
    pub inputs: Vec<EntityDescriptor>,
    pub outputs: Vec<EntityDescriptor>,
    pub custom_inputs: Vec<EntityDescriptor>,
    pub custom_outputs: Vec<EntityDescriptor>,
    pub tmp_inputs: Vec<EntityDescriptor>,
    pub tmp_outputs: Vec<EntityDescriptor>,
    pub tmp_entities: Vec<EntityDescriptor>,
}

impl InterfaceSpec {
    pub fn descriptors(&self, kind: EntityKind) -> &[EntityDescriptor] {
        match kind {
            EntityKind::Input => &self.inputs,
            EntityKind::Output => &self.outputs,
            EntityKind::CustomInput => &self.custom_inputs,
            EntityKind::CustomOutput => &self.custom_outputs,
            EntityKind::TmpInput => &self.tmp_inputs,
            EntityKind::TmpOutput => &self.tmp_outputs,
            EntityKind::TmpEntity => &self.tmp_entities,
        }
    }

    pub fn descriptors_mut(&mut self, kind: EntityKind) -> &mut Vec<EntityDescriptor> {
        match kind {
            EntityKind::Input => &mut self.inputs,
            EntityKind::Output => &mut self.outputs,
            EntityKind::CustomInput => &mut self.custom_inputs,
            EntityKind::CustomOutput => &mut self.custom_outputs,
            EntityKind::TmpInput => &mut self.tmp_inputs,
            EntityKind::TmpOutput => &mut self.tmp_outputs,
            EntityKind::TmpEntity => &mut self.tmp_entities,
        }
    }
}
