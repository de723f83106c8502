//! Selection Context
//!
//! The repository / branch / workflow the operator is looking at. Owned by
//! the UI loop and mutated only there; background fetches receive a
//! [`SelectionSnapshot`] copied at fetch start.
//!
//! Every assignment, even of the same value, bumps the revision and reports
//! which streams must be re-fetched.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FlowdeckError, Result};
use crate::sync::StreamId;

/// owner/name, as accepted by the REST API
static REPOSITORY_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?/[A-Za-z0-9._-]+$").unwrap()
});

pub fn validate_repository_name(name: &str) -> Result<()> {
    if REPOSITORY_NAME.is_match(name) {
        Ok(())
    } else {
        Err(FlowdeckError::InvalidRepository {
            name: name.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSnapshot {
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub workflow_file: Option<String>,
    pub revision: u64,
}

impl SelectionSnapshot {
    /// Repository and branch, when both are chosen
    pub fn repository_ref(&self) -> Option<(&str, &str)> {
        Some((self.repository.as_deref()?, self.branch.as_deref()?))
    }
}

/// Result of a selection mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    /// Streams whose previously fetched data is now stale
    pub stale: Vec<StreamId>,
    /// The dispatch form must be rebuilt or dropped
    pub form_stale: bool,
}

#[derive(Debug, Default)]
pub struct SelectionContext {
    current: SelectionSnapshot,
}

impl SelectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repository(&self) -> Option<&str> {
        self.current.repository.as_deref()
    }

    pub fn branch(&self) -> Option<&str> {
        self.current.branch.as_deref()
    }

    pub fn workflow_file(&self) -> Option<&str> {
        self.current.workflow_file.as_deref()
    }

    pub fn revision(&self) -> u64 {
        self.current.revision
    }

    /// Copy for a background task
    pub fn snapshot(&self) -> SelectionSnapshot {
        self.current.clone()
    }

    /// Set by the repository list. Drops the workflow choice.
    pub fn set_repository(&mut self, name: &str, branch: &str) -> Result<SelectionChange> {
        validate_repository_name(name)?;
        self.current.repository = Some(name.to_string());
        self.current.branch = Some(branch.to_string());
        self.current.workflow_file = None;
        self.current.revision += 1;
        tracing::debug!(repo = %name, branch = %branch, revision = self.current.revision, "Repository selected");

        Ok(SelectionChange {
            stale: vec![
                StreamId::Branches,
                StreamId::TriggerableWorkflows,
                StreamId::RunHistory,
            ],
            form_stale: true,
        })
    }

    /// Set by the branch list of the current repository
    pub fn set_branch(&mut self, branch: &str) -> SelectionChange {
        self.current.branch = Some(branch.to_string());
        self.current.workflow_file = None;
        self.current.revision += 1;
        tracing::debug!(branch = %branch, revision = self.current.revision, "Branch selected");

        SelectionChange {
            stale: vec![StreamId::TriggerableWorkflows, StreamId::RunHistory],
            form_stale: true,
        }
    }

    /// Set by the workflow list
    pub fn set_workflow(&mut self, file: &str) -> SelectionChange {
        self.current.workflow_file = Some(file.to_string());
        self.current.revision += 1;

        SelectionChange {
            stale: Vec::new(),
            form_stale: true,
        }
    }

    pub fn clear(&mut self) -> SelectionChange {
        self.current = SelectionSnapshot {
            revision: self.current.revision + 1,
            ..SelectionSnapshot::default()
        };
        SelectionChange {
            stale: vec![
                StreamId::Branches,
                StreamId::TriggerableWorkflows,
                StreamId::RunHistory,
            ],
            form_stale: true,
        }
    }
}
