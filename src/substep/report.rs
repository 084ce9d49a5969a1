//! Diagnostic views of a declared interface

use crate::core::descriptor::EntityKind;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One declared entity as shown in reports: display name and URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintView {
    pub name: String,
    pub url: String,
}

impl PrintView {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Step name plus the print views of every declared entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceReport {
    pub step_name: String,
    pub inputs: Vec<PrintView>,
    pub outputs: Vec<PrintView>,
    pub custom_inputs: Vec<PrintView>,
    pub custom_outputs: Vec<PrintView>,
    pub tmp_inputs: Vec<PrintView>,
    pub tmp_outputs: Vec<PrintView>,
    pub tmp_entities: Vec<PrintView>,
}

impl InterfaceReport {
    pub fn new(step_name: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            ..Self::default()
        }
    }

    pub fn views(&self, kind: EntityKind) -> &[PrintView] {
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

    pub(crate) fn views_mut(&mut self, kind: EntityKind) -> &mut Vec<PrintView> {
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

    /// Non-empty sections with their headings, in report order
    pub fn sections(&self) -> impl Iterator<Item = (String, &[PrintView])> {
        EntityKind::ALL.into_iter().filter_map(move |kind| {
            let views = self.views(kind);
            (!views.is_empty()).then(|| (section_title(kind), views))
        })
    }

    /// Print views of a kind merged into one map
    pub fn merged(&self, kind: EntityKind) -> IndexMap<String, String> {
        self.views(kind)
            .iter()
            .map(|view| (view.name.clone(), view.url.clone()))
            .collect()
    }
}

/// `TMP INPUTS` for `tmp_inputs`
pub fn section_title(kind: EntityKind) -> String {
    kind.as_str().replace('_', " ").to_uppercase()
}

impl fmt::Display for InterfaceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "STEP NAME:")?;
        writeln!(f, "{}", self.step_name)?;

        for (title, views) in self.sections() {
            writeln!(f)?;
            writeln!(f, "{}:", title)?;
            for view in views {
                writeln!(f, "  {}: {}", view.name, view.url)?;
            }
        }
        Ok(())
    }
}

/// What a design-mode run leaves behind for the pipeline visualizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizerReport {
    pub step_name: String,
    pub substep_name: String,
    pub inputs: IndexMap<String, String>,
    pub outputs: IndexMap<String, String>,
}
