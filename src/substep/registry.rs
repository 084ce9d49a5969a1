//! Registered maps: every URL a substep has handed out, by full name

use crate::persistence::RegisteredUrls;
use tracing::warn;

/// Which registered map an entity lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Input,
    Output,
    TmpInput,
    TmpOutput,
}

/// The four append-only registered maps
///
/// A key keeps the first URL recorded for it. Re-recording the same URL
/// is a no-op; a different URL is ignored with a warning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisteredEntities {
    inputs: RegisteredUrls,
    outputs: RegisteredUrls,
    tmp_inputs: RegisteredUrls,
    tmp_outputs: RegisteredUrls,
}

impl RegisteredEntities {
    pub fn new() -> Self {
        Self::default()
    }

    fn map_mut(&mut self, registration: Registration) -> &mut RegisteredUrls {
        match registration {
            Registration::Input => &mut self.inputs,
            Registration::Output => &mut self.outputs,
            Registration::TmpInput => &mut self.tmp_inputs,
            Registration::TmpOutput => &mut self.tmp_outputs,
        }
    }

    /// Record `url` under `name`, returning the URL kept for that name
    pub fn record(&mut self, registration: Registration, name: &str, url: &str) -> String {
        let map = self.map_mut(registration);
        match map.get(name) {
            Some(existing) => {
                if existing != url {
                    warn!(
                        "'{}' is already registered as '{}', ignoring '{}'",
                        name, existing, url
                    );
                }
                existing.clone()
            }
            None => {
                map.insert(name.to_string(), url.to_string());
                url.to_string()
            }
        }
    }

    pub fn inputs(&self) -> &RegisteredUrls {
        &self.inputs
    }

    pub fn outputs(&self) -> &RegisteredUrls {
        &self.outputs
    }

    pub fn tmp_inputs(&self) -> &RegisteredUrls {
        &self.tmp_inputs
    }

    pub fn tmp_outputs(&self) -> &RegisteredUrls {
        &self.tmp_outputs
    }

    /// Scratch inputs and outputs together, as stored in run records
    ///
    /// An output shadows an input of the same name.
    pub fn tmp(&self) -> RegisteredUrls {
        let mut tmp = self.tmp_inputs.clone();
        for (name, url) in &self.tmp_outputs {
            tmp.insert(name.clone(), url.clone());
        }
        tmp
    }
}
