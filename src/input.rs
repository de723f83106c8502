//! Input Field Model
//!
//! Cursor-addressable editing surface over the fields of one dispatch form.
//! One row per plain field and one row per object-map entry; exactly one
//! row is active at a time.
//!
//! Unset values (`""`) stay unset until [`InputFieldModel::finalize`], which
//! is the only place defaults are filled in. The serializer accepts only the
//! [`FinalizedInputs`] it returns.

use std::fmt;

use crate::error::{FlowdeckError, Result};
use crate::schema::{FieldKind, WorkflowField, WorkflowSchema};

/// Address of one editable row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    pub key: String,
    /// Entry of an object-map field
    pub subkey: Option<String>,
}

impl FieldPath {
    pub fn field(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            subkey: None,
        }
    }

    pub fn entry(key: impl Into<String>, subkey: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            subkey: Some(subkey.into()),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subkey {
            Some(subkey) => write!(f, "{}.{}", self.key, subkey),
            None => write!(f, "{}", self.key),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Prev,
    Next,
}

/// Choice cursor of the active row, committed only once moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingChoice {
    cursor: usize,
    moved: bool,
}

#[derive(Debug, Clone)]
pub struct InputFieldModel {
    workflow_name: String,
    fields: Vec<WorkflowField>,
    rows: Vec<FieldPath>,
    active: Option<usize>,
    pending: Option<PendingChoice>,
}

impl InputFieldModel {
    pub fn new(schema: WorkflowSchema) -> Self {
        let rows = schema
            .fields
            .iter()
            .flat_map(|field| match &field.kind {
                FieldKind::ObjectMap { entries } => entries
                    .iter()
                    .map(|e| FieldPath::entry(&field.key, &e.subkey))
                    .collect::<Vec<_>>(),
                _ => vec![FieldPath::field(&field.key)],
            })
            .collect::<Vec<_>>();

        let mut model = Self {
            workflow_name: schema.name,
            fields: schema.fields,
            rows,
            active: None,
            pending: None,
        };
        if !model.rows.is_empty() {
            model.activate(0);
        }
        model
    }

    pub fn workflow_name(&self) -> &str {
        &self.workflow_name
    }

    pub fn fields(&self) -> &[WorkflowField] {
        &self.fields
    }

    pub fn rows(&self) -> &[FieldPath] {
        &self.rows
    }

    pub fn active_row(&self) -> Option<usize> {
        self.active
    }

    pub fn active_path(&self) -> Option<&FieldPath> {
        self.active.and_then(|i| self.rows.get(i))
    }

    /// In-progress choice position of the active row
    pub fn choice_cursor(&self) -> Option<usize> {
        self.pending.map(|p| p.cursor)
    }

    /// Current text of the active row, if it is text-editable
    pub fn active_text(&self) -> Option<&str> {
        let path = self.active_path()?;
        let field = self.field(&path.key)?;
        match (&field.kind, &path.subkey) {
            (FieldKind::ObjectMap { entries }, Some(subkey)) => entries
                .iter()
                .find(|e| &e.subkey == subkey)
                .map(|e| e.value.as_str()),
            (FieldKind::FreeText, None) => Some(field.value.as_str()),
            _ => None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cursor
    // ─────────────────────────────────────────────────────────────────────

    pub fn select(&mut self, path: &FieldPath) -> Result<()> {
        let row = self
            .rows
            .iter()
            .position(|r| r == path)
            .ok_or_else(|| FlowdeckError::UnknownField {
                key: path.to_string(),
            })?;
        self.activate(row);
        Ok(())
    }

    /// Select a top-level field; for an object map this is its first entry
    pub fn select_field(&mut self, key: &str) -> Result<()> {
        let row = self
            .rows
            .iter()
            .position(|r| r.key == key)
            .ok_or_else(|| FlowdeckError::UnknownField {
                key: key.to_string(),
            })?;
        self.activate(row);
        Ok(())
    }

    pub fn select_row(&mut self, row: usize) -> Result<()> {
        if row >= self.rows.len() {
            return Err(FlowdeckError::UnknownField {
                key: format!("#{}", row),
            });
        }
        self.activate(row);
        Ok(())
    }

    pub fn next_row(&mut self) {
        if let Some(row) = self.active {
            if row + 1 < self.rows.len() {
                self.activate(row + 1);
            }
        }
    }

    pub fn prev_row(&mut self) {
        if let Some(row) = self.active {
            if row > 0 {
                self.activate(row - 1);
            }
        }
    }

    /// Leaving a row commits its moved choice. The new row's choice cursor
    /// starts at its current value, or its default when unset.
    fn activate(&mut self, row: usize) {
        self.commit_pending();
        self.active = Some(row);
        self.pending = self.rows.get(row).and_then(|path| {
            let field = self.fields.iter().find(|f| f.key == path.key)?;
            if path.subkey.is_some() {
                return None;
            }
            let options = field.choice_options()?;
            let current = field.effective_value();
            let cursor = options.iter().position(|o| *o == current).unwrap_or(0);
            Some(PendingChoice {
                cursor,
                moved: false,
            })
        });
    }

    // ─────────────────────────────────────────────────────────────────────
    // Editing
    // ─────────────────────────────────────────────────────────────────────

    /// Replace the value of the active text row (free text or map entry)
    pub fn edit_free_text(&mut self, new_value: &str) -> Result<()> {
        let path = self.active_path().cloned().ok_or(FlowdeckError::NoActiveField)?;
        if new_value.starts_with(' ') {
            return Err(FlowdeckError::LeadingSpace {
                key: path.to_string(),
            });
        }

        let field = self.field_mut(&path.key)?;
        let kind_name = field.kind_name();
        match (&mut field.kind, &path.subkey) {
            (FieldKind::FreeText, None) => {
                field.value = new_value.to_string();
                Ok(())
            }
            (FieldKind::ObjectMap { entries }, Some(subkey)) => {
                let entry = entries
                    .iter_mut()
                    .find(|e| &e.subkey == subkey)
                    .ok_or_else(|| FlowdeckError::UnknownField {
                        key: path.to_string(),
                    })?;
                entry.value = new_value.to_string();
                Ok(())
            }
            _ => Err(FlowdeckError::WrongFieldKind {
                key: path.to_string(),
                kind: kind_name,
            }),
        }
    }

    /// Move the choice cursor by one, clamped to the option range.
    /// The value is committed when the row loses focus.
    pub fn cycle_choice(&mut self, direction: CycleDirection) -> Result<()> {
        let path = self.active_path().cloned().ok_or(FlowdeckError::NoActiveField)?;
        let field = self.field(&path.key).ok_or_else(|| FlowdeckError::UnknownField {
            key: path.key.clone(),
        })?;
        let option_count = field.choice_options().map(|o| o.len()).unwrap_or(0);
        let kind = field.kind_name();

        let Some(pending) = self.pending.as_mut() else {
            return Err(FlowdeckError::WrongFieldKind {
                key: path.to_string(),
                kind,
            });
        };
        if option_count == 0 {
            return Ok(());
        }
        pending.cursor = match direction {
            CycleDirection::Prev => pending.cursor.saturating_sub(1),
            CycleDirection::Next => (pending.cursor + 1).min(option_count - 1),
        };
        pending.moved = true;
        Ok(())
    }

    /// Finalize the active row: a moved choice cursor becomes the field value
    pub fn commit_pending(&mut self) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        if !pending.moved {
            return;
        }
        pending.moved = false;
        let cursor = pending.cursor;

        let Some(key) = self.active.and_then(|r| self.rows.get(r)).map(|p| p.key.clone()) else {
            return;
        };
        if let Some(field) = self.fields.iter_mut().find(|f| f.key == key) {
            let chosen = field
                .choice_options()
                .and_then(|options| options.get(cursor).map(|o| o.to_string()));
            if let Some(chosen) = chosen {
                field.value = chosen;
            }
        }
    }

    /// Drop every edit; all fields return to unset
    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
            if let FieldKind::ObjectMap { entries } = &mut field.kind {
                for entry in entries {
                    entry.value.clear();
                }
            }
        }
        let active = self.active.unwrap_or(0);
        self.pending = None;
        if !self.rows.is_empty() {
            self.activate(active);
        }
    }

    fn fill_unset_with_defaults(&mut self) {
        for field in &mut self.fields {
            if field.value.is_empty() {
                field.value = field.default.clone();
            }
            if let FieldKind::ObjectMap { entries } = &mut field.kind {
                for entry in entries {
                    if entry.value.is_empty() {
                        entry.value = entry.default.clone();
                    }
                }
            }
        }
    }

    /// Commit the active row and fill unset values with their defaults
    pub fn finalize(mut self) -> FinalizedInputs {
        self.commit_pending();
        self.fill_unset_with_defaults();
        FinalizedInputs {
            workflow_name: self.workflow_name,
            fields: self.fields,
        }
    }

    fn field(&self, key: &str) -> Option<&WorkflowField> {
        self.fields.iter().find(|f| f.key == key)
    }

    fn field_mut(&mut self, key: &str) -> Result<&mut WorkflowField> {
        self.fields
            .iter_mut()
            .find(|f| f.key == key)
            .ok_or_else(|| FlowdeckError::UnknownField {
                key: key.to_string(),
            })
    }
}

/// Form values after defaults were applied; the only serializer input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedInputs {
    workflow_name: String,
    fields: Vec<WorkflowField>,
}

impl FinalizedInputs {
    pub fn workflow_name(&self) -> &str {
        &self.workflow_name
    }

    pub fn fields(&self) -> &[WorkflowField] {
        &self.fields
    }
}
