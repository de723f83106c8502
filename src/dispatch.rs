//! Dispatch payload serialization
//!
//! Turns finalized form values into the `inputs` object of a
//! workflow-dispatch request: text and choice fields become strings,
//! booleans become JSON booleans, object maps become nested objects.

use serde_json::{Map, Number, Value};

use crate::error::{FlowdeckError, Result};
use crate::input::FinalizedInputs;
use crate::schema::{FieldKind, MapEntry, ScalarKind, WorkflowField};

pub struct DispatchSerializer;

impl DispatchSerializer {
    /// Build the inputs object. One property per declared input.
    pub fn to_value(inputs: &FinalizedInputs) -> Result<Value> {
        let mut payload = Map::with_capacity(inputs.fields().len());
        for field in inputs.fields() {
            let value = Self::field_value(field).inspect_err(|e| {
                tracing::error!(
                    workflow = %inputs.workflow_name(),
                    input = %field.key,
                    error = %e,
                    "Dispatch payload invariant violated, aborting dispatch"
                );
            })?;
            payload.insert(field.key.clone(), value);
        }
        Ok(Value::Object(payload))
    }

    /// The inputs object as a JSON string
    pub fn serialize(inputs: &FinalizedInputs) -> Result<String> {
        Ok(serde_json::to_string(&Self::to_value(inputs)?)?)
    }

    /// Full request body for the dispatch endpoint
    pub fn request_body(git_ref: &str, inputs: &FinalizedInputs) -> Result<Value> {
        Ok(serde_json::json!({
            "ref": git_ref,
            "inputs": Self::to_value(inputs)?,
        }))
    }

    fn field_value(field: &WorkflowField) -> Result<Value> {
        match &field.kind {
            FieldKind::FreeText => Ok(Value::String(field.value.clone())),
            FieldKind::Choice { options } => {
                if options.iter().any(|o| *o == field.value) {
                    Ok(Value::String(field.value.clone()))
                } else {
                    Err(FlowdeckError::ChoiceOutOfRange {
                        key: field.key.clone(),
                        value: field.value.clone(),
                    })
                }
            }
            FieldKind::Boolean => match field.value.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                other => Err(FlowdeckError::InvalidBoolean {
                    key: field.key.clone(),
                    value: other.to_string(),
                }),
            },
            FieldKind::ObjectMap { entries } => {
                let mut object = Map::with_capacity(entries.len());
                for entry in entries {
                    object.insert(entry.subkey.clone(), Self::entry_value(&field.key, entry)?);
                }
                Ok(Value::Object(object))
            }
        }
    }

    fn entry_value(key: &str, entry: &MapEntry) -> Result<Value> {
        let invalid = || FlowdeckError::NonScalarEntry {
            key: key.to_string(),
            subkey: entry.subkey.clone(),
            expected: entry.kind.name(),
            value: entry.value.clone(),
        };

        match entry.kind {
            ScalarKind::String => Ok(Value::String(entry.value.clone())),
            ScalarKind::Number => match serde_json::from_str::<Value>(entry.value.trim()) {
                Ok(Value::Number(n)) => Ok(Value::Number(n)),
                _ => entry
                    .value
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(invalid),
            },
            ScalarKind::Bool => match entry.value.trim() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            ScalarKind::Null if entry.value.is_empty() => Ok(Value::Null),
            // a null default that the operator filled in is sent as text
            ScalarKind::Null => Ok(Value::String(entry.value.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{CycleDirection, FieldPath, InputFieldModel};
    use crate::schema::parse_workflow;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn model(doc: &str) -> InputFieldModel {
        InputFieldModel::new(parse_workflow(doc, "wf.yml").unwrap())
    }

    #[test]
    fn test_choice_default_without_edit() {
        let doc = r#"
on:
  workflow_dispatch:
    inputs:
      x:
        type: choice
        options: ["a", "b"]
        default: "a"
"#;
        let out = DispatchSerializer::serialize(&model(doc).finalize()).unwrap();
        assert_eq!(out, r#"{"x":"a"}"#);
    }

    #[test]
    fn test_undeclared_defaults_match_the_form() {
        let doc = r#"
on:
  workflow_dispatch:
    inputs:
      x:
        type: choice
        options: [a, b]
      flag:
        type: boolean
"#;
        let mut m = model(doc);
        m.select_field("x").unwrap();
        assert_eq!(m.choice_cursor(), Some(0));
        m.select_field("flag").unwrap();
        // options are [true, false]
        assert_eq!(m.choice_cursor(), Some(1));

        let value = DispatchSerializer::to_value(&m.finalize()).unwrap();
        assert_eq!(value, json!({"x": "a", "flag": false}));
    }

    #[test]
    fn test_object_map_edit() {
        let doc = r#"
on:
  workflow_dispatch:
    inputs:
      obj:
        default: '{"k1":"v1","k2":"v2"}'
"#;
        let mut m = model(doc);
        m.select(&FieldPath::entry("obj", "k2")).unwrap();
        m.edit_free_text("v3").unwrap();
        let out = DispatchSerializer::serialize(&m.finalize()).unwrap();
        assert_eq!(out, r#"{"obj":{"k1":"v1","k2":"v3"}}"#);
    }

    #[test]
    fn test_types_on_the_wire() {
        let doc = r#"
on:
  workflow_dispatch:
    inputs:
      name:
        default: demo
      verbose:
        type: boolean
        default: true
      quiet:
        type: boolean
      count:
        type: number
        default: 2
      opts:
        default: '{"n":1,"on":false,"label":"x","none":null}'
"#;
        let value = DispatchSerializer::to_value(&model(doc).finalize()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "demo",
                "verbose": true,
                "quiet": false,
                "count": "2",
                "opts": {"n": 1, "on": false, "label": "x", "none": null}
            })
        );
    }

    #[test]
    fn test_number_entry_must_parse() {
        let doc = r#"
on:
  workflow_dispatch:
    inputs:
      opts:
        default: '{"n":1}'
"#;
        let mut m = model(doc);
        m.select(&FieldPath::entry("opts", "n")).unwrap();
        m.edit_free_text("2.5").unwrap();
        let value = DispatchSerializer::to_value(&m.clone().finalize()).unwrap();
        assert_eq!(value, json!({"opts": {"n": 2.5}}));

        m.edit_free_text("many").unwrap();
        let err = DispatchSerializer::to_value(&m.finalize()).unwrap_err();
        assert_eq!(err.code(), "FD-020");
        assert!(err.is_serialization());
    }

    #[test]
    fn test_choice_outside_options_fails_at_submission() {
        let doc = r#"
on:
  workflow_dispatch:
    inputs:
      env:
        type: choice
        options: [dev, prod]
        default: qa
"#;
        let err = DispatchSerializer::serialize(&model(doc).finalize()).unwrap_err();
        assert!(matches!(err, FlowdeckError::ChoiceOutOfRange { .. }));
    }

    #[test]
    fn test_boolean_edited_through_cycle() {
        let doc = r#"
on:
  workflow_dispatch:
    inputs:
      flag:
        type: boolean
        default: false
"#;
        let mut m = model(doc);
        m.cycle_choice(CycleDirection::Prev).unwrap();
        let value = DispatchSerializer::to_value(&m.finalize()).unwrap();
        assert_eq!(value, json!({"flag": true}));
    }

    #[test]
    fn test_request_body_wraps_inputs() {
        let doc = "on:\n  workflow_dispatch:\n    inputs:\n      a:\n        default: b\n";
        let body = DispatchSerializer::request_body("main", &model(doc).finalize()).unwrap();
        assert_eq!(body, json!({"ref": "main", "inputs": {"a": "b"}}));
    }

    #[test]
    fn test_no_inputs_yields_empty_object() {
        let out = DispatchSerializer::serialize(&model("on: workflow_dispatch\n").finalize()).unwrap();
        assert_eq!(out, "{}");
    }
}
