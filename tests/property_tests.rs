//! Property tests for the form pipeline and the sync bookkeeping

use std::collections::BTreeMap;
use std::time::Duration;

use proptest::prelude::*;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use flowdeck::github::Branch;
use flowdeck::sync::{channel, Applied, StreamPayload, SyncUpdate};
use flowdeck::{
    parse_workflow, DispatchSerializer, FanOut, InputFieldModel, StreamId, StreamStatus,
    SyncCoordinator,
};

fn workflow_yaml(inputs: &BTreeMap<String, String>) -> String {
    let mut yaml = String::from("name: Generated\non:\n  workflow_dispatch:\n    inputs:\n");
    for (key, default) in inputs {
        yaml.push_str(&format!("      {}:\n        default: \"{}\"\n", key, default));
    }
    yaml
}

/// One declared input of every kind the parser classifies
#[derive(Debug, Clone)]
enum GenInput {
    Text(String),
    Choice { options: Vec<String>, default: Option<usize> },
    Boolean(Option<bool>),
    Map(BTreeMap<String, MapScalar>),
}

#[derive(Debug, Clone)]
enum MapScalar {
    Text(String),
    Number(u32),
    Bool(bool),
}

impl GenInput {
    fn yaml(&self, key: &str) -> String {
        let mut out = format!("      {}:\n", key);
        match self {
            GenInput::Text(default) => {
                out.push_str(&format!("        default: \"{}\"\n", default));
            }
            GenInput::Choice { options, default } => {
                let quoted: Vec<String> = options.iter().map(|o| format!("\"{}\"", o)).collect();
                out.push_str("        type: choice\n");
                out.push_str(&format!("        options: [{}]\n", quoted.join(", ")));
                if let Some(i) = default {
                    out.push_str(&format!("        default: \"{}\"\n", options[*i]));
                }
            }
            GenInput::Boolean(default) => {
                out.push_str("        type: boolean\n");
                if let Some(b) = default {
                    out.push_str(&format!("        default: {}\n", b));
                }
            }
            GenInput::Map(entries) => {
                let object: serde_json::Map<String, Value> = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.json()))
                    .collect();
                out.push_str(&format!(
                    "        default: '{}'\n",
                    Value::Object(object)
                ));
            }
        }
        out
    }

    /// What an untouched form must send for this input
    fn expected(&self) -> Value {
        match self {
            GenInput::Text(default) => Value::String(default.clone()),
            GenInput::Choice { options, default } => {
                Value::String(options[default.unwrap_or(0)].clone())
            }
            GenInput::Boolean(default) => Value::Bool(default.unwrap_or(false)),
            GenInput::Map(entries) => Value::Object(
                entries.iter().map(|(k, v)| (k.clone(), v.json())).collect(),
            ),
        }
    }
}

impl MapScalar {
    fn json(&self) -> Value {
        match self {
            MapScalar::Text(s) => Value::String(s.clone()),
            MapScalar::Number(n) => Value::from(*n),
            MapScalar::Bool(b) => Value::Bool(*b),
        }
    }
}

fn map_scalar() -> impl Strategy<Value = MapScalar> {
    prop_oneof![
        "[a-z][a-z0-9]{0,6}".prop_map(MapScalar::Text),
        any::<u32>().prop_map(MapScalar::Number),
        any::<bool>().prop_map(MapScalar::Bool),
    ]
}

fn gen_input() -> impl Strategy<Value = GenInput> {
    prop_oneof![
        "[a-z][a-z0-9._-]{0,12}".prop_map(GenInput::Text),
        (
            prop::collection::btree_set("[a-z][a-z0-9]{0,6}", 1..5),
            any::<Option<prop::sample::Index>>(),
        )
            .prop_map(|(options, pick)| {
                let options: Vec<String> = options.into_iter().collect();
                let default = pick.map(|i| i.index(options.len()));
                GenInput::Choice { options, default }
            }),
        any::<Option<bool>>().prop_map(GenInput::Boolean),
        prop::collection::btree_map("[a-z]{1,6}", map_scalar(), 1..4).prop_map(GenInput::Map),
    ]
}

fn mixed_yaml(inputs: &BTreeMap<String, GenInput>) -> String {
    let mut yaml = String::from("name: Mixed\non:\n  workflow_dispatch:\n    inputs:\n");
    for (key, input) in inputs {
        yaml.push_str(&input.yaml(key));
    }
    yaml
}

proptest! {
    /// Untouched forms dispatch every declared default, keyed by input name
    #[test]
    fn prop_untouched_form_dispatches_defaults(
        inputs in prop::collection::btree_map("in_[a-z0-9_]{1,8}", "[a-z][a-z0-9._-]{0,12}", 1..8)
    ) {
        let schema = parse_workflow(&workflow_yaml(&inputs), "generated.yml").unwrap();
        prop_assert_eq!(schema.fields.len(), inputs.len());

        let payload = DispatchSerializer::to_value(&InputFieldModel::new(schema).finalize()).unwrap();
        let object = payload.as_object().unwrap();
        prop_assert_eq!(object.len(), inputs.len());
        for (key, default) in &inputs {
            prop_assert_eq!(object.get(key), Some(&Value::String(default.clone())));
        }
    }

    /// Every input kind, with or without a declared default, survives an
    /// untouched form with a value of its own wire type
    #[test]
    fn prop_mixed_kinds_dispatch_typed_defaults(
        inputs in prop::collection::btree_map("in_[a-z0-9_]{1,8}", gen_input(), 1..8)
    ) {
        let schema = parse_workflow(&mixed_yaml(&inputs), "mixed.yml").unwrap();
        let payload = DispatchSerializer::to_value(&InputFieldModel::new(schema).finalize()).unwrap();
        let object = payload.as_object().unwrap();

        let keys: Vec<&String> = object.keys().collect();
        let expected_keys: Vec<&String> = inputs.keys().collect();
        prop_assert_eq!(keys, expected_keys);
        for (key, input) in &inputs {
            let sent = &object[key];
            match input {
                GenInput::Text(_) | GenInput::Choice { .. } => prop_assert!(sent.is_string()),
                GenInput::Boolean(_) => prop_assert!(sent.is_boolean()),
                GenInput::Map(_) => prop_assert!(sent.is_object()),
            }
            prop_assert_eq!(sent, &input.expected());
        }
    }

    /// Walking every row of the form without edits changes nothing on the wire
    #[test]
    fn prop_visiting_rows_keeps_defaults(
        inputs in prop::collection::btree_map("in_[a-z0-9_]{1,8}", gen_input(), 1..6)
    ) {
        let schema = parse_workflow(&mixed_yaml(&inputs), "mixed.yml").unwrap();
        let mut form = InputFieldModel::new(schema);
        for row in 0..form.rows().len() {
            form.select_row(row).unwrap();
        }
        form.commit_pending();

        let payload = DispatchSerializer::to_value(&form.finalize()).unwrap();
        for (key, input) in &inputs {
            prop_assert_eq!(&payload[key], &input.expected());
        }
    }

    /// Edited values win over defaults; the rest keep theirs
    #[test]
    fn prop_edits_override_defaults(
        inputs in prop::collection::btree_map("in_[a-z0-9_]{1,8}", "[a-z][a-z0-9]{0,8}", 1..6),
        pick in any::<prop::sample::Index>(),
        edit in "[A-Za-z0-9][A-Za-z0-9 ]{0,12}",
    ) {
        let schema = parse_workflow(&workflow_yaml(&inputs), "generated.yml").unwrap();
        let mut form = InputFieldModel::new(schema);
        let edited_key = inputs.keys().nth(pick.index(inputs.len())).unwrap().clone();
        form.select_field(&edited_key).unwrap();
        form.edit_free_text(&edit).unwrap();

        let payload = DispatchSerializer::to_value(&form.finalize()).unwrap();
        for (key, default) in &inputs {
            let expected = if *key == edited_key { &edit } else { default };
            prop_assert_eq!(payload[key].as_str(), Some(expected.as_str()));
        }
    }

    /// Generations only grow, and only the newest Fetching generation applies
    #[test]
    fn prop_only_current_generation_applies(ops in prop::collection::vec(0u8..4, 1..40)) {
        let (tx, _rx) = channel();
        let mut sync = SyncCoordinator::new(Duration::from_secs(1), tx);
        let stream = StreamId::Branches;
        let mut last = sync.generation(stream);

        for op in ops {
            match op {
                0 => {
                    let (generation, _token) = sync.start(stream);
                    prop_assert_eq!(generation, last + 1);
                }
                1 => sync.cancel(stream),
                2 => {
                    let current = sync.generation(stream);
                    let was_fetching = sync.is_fetching(stream);
                    let applied = sync.apply(SyncUpdate {
                        stream,
                        generation: current,
                        outcome: Ok(StreamPayload::Branches(vec![Branch {
                            name: "main".to_string(),
                            protected: false,
                        }])),
                    });
                    if was_fetching {
                        prop_assert!(matches!(applied, Applied::Data(_)));
                        prop_assert_eq!(sync.status(stream), &StreamStatus::Ready);
                    } else {
                        prop_assert_eq!(applied, Applied::Superseded);
                    }
                }
                _ => {
                    let before = sync.status(stream).clone();
                    let applied = sync.apply(SyncUpdate {
                        stream,
                        generation: sync.generation(stream).wrapping_sub(1),
                        outcome: Ok(StreamPayload::Branches(Vec::new())),
                    });
                    prop_assert_eq!(applied, Applied::Superseded);
                    prop_assert_eq!(sync.status(stream), &before);
                }
            }
            let now = sync.generation(stream);
            prop_assert!(now >= last);
            last = now;
        }
    }

    /// Every item yields exactly one outcome, whatever the limit
    #[test]
    fn prop_fan_out_is_complete(items in 0usize..40, limit in 0usize..10, failing in 0usize..5) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let report = runtime.block_on(async {
            FanOut::new(limit)
                .run((0..items).collect(), &CancellationToken::new(), move |i: usize| async move {
                    tokio::task::yield_now().await;
                    if failing > 0 && i % 5 == failing {
                        Err(flowdeck::FlowdeckError::Cancelled)
                    } else {
                        Ok(i * 2)
                    }
                })
                .await
        });

        prop_assert_eq!(report.outcomes(), items);
        let expected_failures = (0..items).filter(|i| failing > 0 && i % 5 == failing).count();
        prop_assert_eq!(report.errors.len(), expected_failures);
        let mut results = report.results;
        results.sort_unstable();
        let expected: Vec<usize> = (0..items)
            .filter(|i| !(failing > 0 && i % 5 == failing))
            .map(|i| i * 2)
            .collect();
        prop_assert_eq!(results, expected);
    }
}
