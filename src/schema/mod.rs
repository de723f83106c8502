//! Workflow Dispatch Schema
//!
//! Typed representation of the `on.workflow_dispatch.inputs` block of a CI
//! workflow definition. The variant of each field is decided once, at parse
//! time, and never re-inspected by the editing or serialization layers.
//!
//! - [`parse_workflow`] - YAML document → [`WorkflowSchema`]
//! - [`WorkflowField`] - one declared input (key, default, value, kind)
//! - [`FieldKind`] - FreeText | Choice | Boolean | ObjectMap

mod parser;

pub use parser::parse_workflow;

use thiserror::Error;

/// Why a workflow document yields no dispatch form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Invalid workflow YAML: {reason}")]
    InvalidYaml { reason: String },

    #[error("Workflow '{workflow}' has no workflow_dispatch trigger")]
    NotDispatchable { workflow: String },
}

impl SchemaError {
    pub(crate) fn code_suffix(&self) -> u8 {
        match self {
            Self::InvalidYaml { .. } => 1,
            Self::NotDispatchable { .. } => 2,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fields
// ─────────────────────────────────────────────────────────────────────────────

/// JSON type of an object-map entry, restored at serialization time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Number,
    Bool,
    Null,
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "boolean",
            Self::Null => "null",
        }
    }
}

/// One editable entry of an object-map input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub subkey: String,
    pub default: String,
    pub value: String,
    pub kind: ScalarKind,
}

impl MapEntry {
    pub fn effective_value(&self) -> &str {
        if self.value.is_empty() {
            &self.default
        } else {
            &self.value
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    FreeText,
    Choice { options: Vec<String> },
    /// Edited like a choice over `true`/`false`, serialized as a JSON boolean
    Boolean,
    /// Subkeys are fixed at parse time; only entry values are editable
    ObjectMap { entries: Vec<MapEntry> },
}

/// A declared dispatch input. `value == ""` means unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowField {
    pub key: String,
    pub description: String,
    pub required: bool,
    pub default: String,
    pub value: String,
    pub kind: FieldKind,
}

impl WorkflowField {
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            FieldKind::FreeText => "text",
            FieldKind::Choice { .. } => "choice",
            FieldKind::Boolean => "boolean",
            FieldKind::ObjectMap { .. } => "object",
        }
    }

    pub fn is_unset(&self) -> bool {
        self.value.is_empty()
    }

    /// What would be submitted if the form were finalized now
    pub fn effective_value(&self) -> &str {
        if self.value.is_empty() {
            &self.default
        } else {
            &self.value
        }
    }

    /// Options for choice-like fields; booleans present as a two-option choice
    pub fn choice_options(&self) -> Option<Vec<&str>> {
        match &self.kind {
            FieldKind::Choice { options } => Some(options.iter().map(String::as_str).collect()),
            FieldKind::Boolean => Some(vec!["true", "false"]),
            _ => None,
        }
    }

    pub fn entries(&self) -> &[MapEntry] {
        match &self.kind {
            FieldKind::ObjectMap { entries } => entries,
            _ => &[],
        }
    }
}

/// Parsed dispatch form of one workflow file on one ref
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSchema {
    /// Declared `name:` (or the file stem)
    pub name: String,
    pub fields: Vec<WorkflowField>,
}

impl WorkflowSchema {
    pub fn field(&self, key: &str) -> Option<&WorkflowField> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(kind: FieldKind) -> WorkflowField {
        WorkflowField {
            key: "x".to_string(),
            description: String::new(),
            required: false,
            default: "a".to_string(),
            value: String::new(),
            kind,
        }
    }

    #[test]
    fn test_boolean_presents_as_choice() {
        let f = field(FieldKind::Boolean);
        assert_eq!(f.choice_options(), Some(vec!["true", "false"]));
        assert_eq!(f.kind_name(), "boolean");
    }

    #[test]
    fn test_free_text_has_no_options() {
        assert!(field(FieldKind::FreeText).choice_options().is_none());
    }

    #[test]
    fn test_effective_value_falls_back_to_default() {
        let mut f = field(FieldKind::FreeText);
        assert!(f.is_unset());
        assert_eq!(f.effective_value(), "a");
        f.value = "b".to_string();
        assert_eq!(f.effective_value(), "b");
    }
}
