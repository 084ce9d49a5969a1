//! Addressed views - read-only entity URL records handed to step authors

use crate::core::descriptor::EntityKind;
use crate::core::error::{Result, SubstepError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Where one entity lives and what it is called
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressedEntity {
    pub full_name: String,
    pub url: String,
}

/// Resolved entities of one kind, in declaration order
///
/// Built fresh by every accessor call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityUrls {
    kind: EntityKind,
    entities: IndexMap<String, AddressedEntity>,
}

impl EntityUrls {
    pub(crate) fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entities: IndexMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, entity_name: &str, full_name: String, url: String) {
        self.entities
            .insert(entity_name.to_string(), AddressedEntity { full_name, url });
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// URL of an entity
    pub fn get(&self, entity_name: &str) -> Option<&str> {
        self.entities.get(entity_name).map(|e| e.url.as_str())
    }

    /// Fully qualified name of an entity
    pub fn full_name(&self, entity_name: &str) -> Option<&str> {
        self.entities.get(entity_name).map(|e| e.full_name.as_str())
    }

    pub fn entity(&self, entity_name: &str) -> Option<&AddressedEntity> {
        self.entities.get(entity_name)
    }

    /// URL of an entity, failing when it wasn't declared
    pub fn url(&self, entity_name: &str) -> Result<&str> {
        self.get(entity_name).ok_or_else(|| {
            SubstepError::Configuration(format!(
                "'{}' is not declared in {}",
                entity_name, self.kind
            ))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AddressedEntity)> {
        self.entities.iter().map(|(name, entity)| (name.as_str(), entity))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
