//! Workflow definition → dispatch schema
//!
//! Classification precedence for each declared input:
//! 1. `default` parses as a JSON object of scalars → ObjectMap
//! 2. `type: choice` with an `options` list → Choice
//! 3. `type: boolean` → Boolean
//! 4. anything else → FreeText

use std::path::Path;

use serde_json::Value as Json;
use serde_yaml::{Mapping, Value};

use super::{FieldKind, MapEntry, ScalarKind, SchemaError, WorkflowField, WorkflowSchema};

const DISPATCH_TRIGGER: &str = "workflow_dispatch";

/// Parse a workflow document into its dispatch form.
///
/// `file_name` is used for the schema name when the document has no `name:`.
pub fn parse_workflow(source: &str, file_name: &str) -> Result<WorkflowSchema, SchemaError> {
    let doc: Value = serde_yaml::from_str(source).map_err(|e| SchemaError::InvalidYaml {
        reason: e.to_string(),
    })?;
    let root = doc.as_mapping().ok_or_else(|| SchemaError::InvalidYaml {
        reason: "document is not a mapping".to_string(),
    })?;

    let name = root
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| file_stem(file_name));

    let not_dispatchable = || SchemaError::NotDispatchable {
        workflow: file_name.to_string(),
    };

    // YAML 1.1 parsers read a bare `on` as boolean true
    let triggers = root
        .get("on")
        .or_else(|| root.get(Value::Bool(true)))
        .ok_or_else(not_dispatchable)?;
    let dispatch = dispatch_section(triggers).ok_or_else(not_dispatchable)?;

    let fields = match dispatch.get("inputs").and_then(Value::as_mapping) {
        Some(inputs) => inputs
            .iter()
            .map(|(key, spec)| parse_field(&scalar_text(key), spec))
            .collect(),
        None => Vec::new(),
    };

    tracing::debug!(workflow = %name, inputs = fields.len(), "Parsed dispatch schema");
    Ok(WorkflowSchema { name, fields })
}

/// The `workflow_dispatch` block, if the trigger list declares one.
/// A trigger without a body yields an empty mapping.
fn dispatch_section(triggers: &Value) -> Option<Mapping> {
    match triggers {
        Value::String(s) if s == DISPATCH_TRIGGER => Some(Mapping::new()),
        Value::Sequence(items) => items
            .iter()
            .any(|item| item.as_str() == Some(DISPATCH_TRIGGER))
            .then(Mapping::new),
        Value::Mapping(map) => map
            .get(DISPATCH_TRIGGER)
            .map(|body| body.as_mapping().cloned().unwrap_or_default()),
        _ => None,
    }
}

fn parse_field(key: &str, spec: &Value) -> WorkflowField {
    let mut default = spec.get("default").map(scalar_text).unwrap_or_default();
    let description = spec
        .get("description")
        .map(scalar_text)
        .unwrap_or_default();
    let required = spec
        .get("required")
        .map(|v| v.as_bool().unwrap_or_else(|| scalar_text(v) == "true"))
        .unwrap_or(false);
    let declared_type = spec.get("type").and_then(Value::as_str);

    let kind = if let Some(entries) = object_entries(&default) {
        FieldKind::ObjectMap { entries }
    } else if let (Some("choice"), Some(options)) = (
        declared_type,
        spec.get("options").and_then(Value::as_sequence),
    ) {
        FieldKind::Choice {
            options: options.iter().map(scalar_text).collect(),
        }
    } else if declared_type == Some("boolean") {
        FieldKind::Boolean
    } else {
        FieldKind::FreeText
    };

    // An undeclared default is what the platform preselects
    if default.is_empty() {
        match &kind {
            FieldKind::Choice { options } => {
                default = options.first().cloned().unwrap_or_default();
            }
            FieldKind::Boolean => default = "false".to_string(),
            _ => {}
        }
    }

    WorkflowField {
        key: key.to_string(),
        description,
        required,
        default,
        value: String::new(),
        kind,
    }
}

/// Entries of a default that is a JSON object of scalars, in document order
fn object_entries(default: &str) -> Option<Vec<MapEntry>> {
    let Ok(Json::Object(object)) = serde_json::from_str::<Json>(default) else {
        return None;
    };

    object
        .into_iter()
        .map(|(subkey, value)| {
            let (text, kind) = match value {
                Json::String(s) => (s, ScalarKind::String),
                Json::Number(n) => (n.to_string(), ScalarKind::Number),
                Json::Bool(b) => (b.to_string(), ScalarKind::Bool),
                Json::Null => (String::new(), ScalarKind::Null),
                Json::Array(_) | Json::Object(_) => return None,
            };
            Some(MapEntry {
                subkey,
                default: text,
                value: String::new(),
                kind,
            })
        })
        .collect()
}

/// Loose scalar rendering: the platform accepts strings, booleans and numbers
/// interchangeably for `default`.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}
