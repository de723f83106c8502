//! # Code-hosting API Layer
//!
//! Trait and implementations for the REST operations the dashboard consumes.
//!
//! - [`GitHubApi`] - one async method per remote operation
//! - [`GitHubClient`] - production implementation over `reqwest`
//! - [`MockGitHub`] - in-memory implementation with delays and failure injection
//!
//! Row types shown by the dashboard ([`RepositoryRow`], [`TriggerableWorkflow`],
//! [`RunHistoryEntry`]) are derived from the wire types here and replaced
//! wholesale on every successful fetch.

mod client;
mod mock;

pub use client::GitHubClient;
pub use mock::{sample_run, DispatchRecord, MockGitHub};

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::schema::WorkflowSchema;

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Repository {
    pub full_name: String,
    pub default_branch: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Repository {
    pub fn new(full_name: impl Into<String>, default_branch: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            default_branch: default_branch.into(),
            private: false,
            description: None,
            stargazers_count: 0,
            html_url: String::new(),
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    #[serde(default)]
    pub protected: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct WorkflowDefinition {
    pub id: u64,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub state: String,
}

impl WorkflowDefinition {
    /// File name used to address the workflow in dispatch calls
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn is_active(&self) -> bool {
        self.state.is_empty() || self.state == "active"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WorkflowRunWire {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub head_branch: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub run_number: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub run_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub triggering_actor: Option<Actor>,
    #[serde(default)]
    pub actor: Option<Actor>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Actor {
    pub login: String,
}

// ============================================================================
// DASHBOARD ROWS
// ============================================================================

/// One row of the run history. Never patched; a fetch replaces the whole list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHistoryEntry {
    pub id: u64,
    pub run_number: u64,
    pub name: String,
    pub title: String,
    pub triggered_by: String,
    pub event: String,
    pub branch: String,
    pub started_at: DateTime<Utc>,
    /// queued | in_progress | completed | ...
    pub status: String,
    /// success | failure | cancelled | ... (None while running)
    pub conclusion: Option<String>,
    pub duration: Duration,
    pub html_url: String,
}

impl RunHistoryEntry {
    pub(crate) fn from_wire(run: WorkflowRunWire) -> Self {
        let started_at = run.run_started_at.unwrap_or(run.created_at);
        let duration = run
            .updated_at
            .and_then(|end| (end - started_at).to_std().ok())
            .unwrap_or_default();
        let triggered_by = run
            .triggering_actor
            .or(run.actor)
            .map(|a| a.login)
            .unwrap_or_default();

        Self {
            id: run.id,
            run_number: run.run_number,
            name: run.name.unwrap_or_default(),
            title: run.display_title.unwrap_or_default(),
            triggered_by,
            event: run.event,
            branch: run.head_branch.unwrap_or_default(),
            started_at,
            status: run.status.unwrap_or_default(),
            conclusion: run.conclusion,
            duration,
            html_url: run.html_url,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status != "completed"
    }

    /// Conclusion when finished, otherwise the live status
    pub fn outcome(&self) -> &str {
        self.conclusion.as_deref().unwrap_or(&self.status)
    }
}

/// Repository list row with its workflow probe result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRow {
    pub name: String,
    pub default_branch: String,
    pub private: bool,
    pub stars: u64,
    pub workflow_count: usize,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A workflow on the selected ref that declares a dispatch trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerableWorkflow {
    pub id: u64,
    pub path: String,
    pub schema: WorkflowSchema,
}

impl TriggerableWorkflow {
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }
}

// ============================================================================
// API TRAIT
// ============================================================================

/// Remote operations. Repository names are `owner/name`.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Repositories visible to the authenticated principal
    async fn list_repositories(&self) -> Result<Vec<Repository>>;

    async fn get_repository(&self, repo: &str) -> Result<Repository>;

    async fn list_branches(&self, repo: &str) -> Result<Vec<Branch>>;

    async fn list_workflows(&self, repo: &str) -> Result<Vec<WorkflowDefinition>>;

    /// Raw (decoded) file content at a ref
    async fn get_file_content(&self, repo: &str, path: &str, git_ref: &str) -> Result<String>;

    /// Most recent runs on a branch, newest first
    async fn list_workflow_runs(&self, repo: &str, branch: &str) -> Result<Vec<RunHistoryEntry>>;

    async fn dispatch_workflow(
        &self,
        repo: &str,
        workflow_file: &str,
        git_ref: &str,
        inputs: Value,
    ) -> Result<()>;

    /// Download location of the run's log archive
    async fn run_logs_url(&self, repo: &str, run_id: u64) -> Result<String>;

    async fn rerun_failed_jobs(&self, repo: &str, run_id: u64) -> Result<()>;

    async fn rerun_workflow(&self, repo: &str, run_id: u64) -> Result<()>;

    async fn cancel_run(&self, repo: &str, run_id: u64) -> Result<()>;
}
