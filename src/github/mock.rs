//! Mock API for testing and demo mode
//!
//! Serves canned repositories, branches, workflow files and runs without
//! network access. Per-repository delays and failure injection make the
//! race and timeout paths of the sync layer reproducible.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{Branch, GitHubApi, Repository, RunHistoryEntry, WorkflowDefinition};
use crate::error::{FlowdeckError, Result};

/// Matches any ref in the file table
const ANY_REF: &str = "*";

/// A recorded dispatch call
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRecord {
    pub repo: String,
    pub workflow_file: String,
    pub git_ref: String,
    pub inputs: Value,
}

#[derive(Default)]
struct MockState {
    repositories: Vec<Repository>,
    branches: HashMap<String, Vec<Branch>>,
    workflows: HashMap<String, Vec<WorkflowDefinition>>,
    /// (repo, ref, path) -> content
    files: HashMap<(String, String, String), String>,
    /// (repo, branch) -> runs, newest first
    runs: HashMap<(String, String), Vec<RunHistoryEntry>>,
    delays: HashMap<String, Duration>,
    failing_repos: HashSet<String>,
    failing_ops: HashSet<&'static str>,
    calls: HashMap<&'static str, usize>,
    dispatched: Vec<DispatchRecord>,
    run_actions: Vec<(&'static str, u64)>,
    next_run_id: u64,
}

/// In-memory [`GitHubApi`]. Clones share state.
#[derive(Clone, Default)]
pub struct MockGitHub {
    state: Arc<Mutex<MockState>>,
}

impl MockGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // a panicking test thread must not take the other assertions down with it
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Builders
    // ─────────────────────────────────────────────────────────────────────

    /// Register a repository with a single default branch
    pub fn with_repository(self, full_name: &str, default_branch: &str) -> Self {
        {
            let mut state = self.lock();
            state
                .repositories
                .push(Repository::new(full_name, default_branch));
            state.branches.insert(
                full_name.to_string(),
                vec![Branch {
                    name: default_branch.to_string(),
                    protected: true,
                }],
            );
            state.workflows.entry(full_name.to_string()).or_default();
        }
        self
    }

    /// Add branches beside the default one
    pub fn with_branches(self, repo: &str, names: &[&str]) -> Self {
        {
            let mut state = self.lock();
            let branches = state.branches.entry(repo.to_string()).or_default();
            for name in names {
                if !branches.iter().any(|b| b.name == *name) {
                    branches.push(Branch {
                        name: name.to_string(),
                        protected: false,
                    });
                }
            }
        }
        self
    }

    /// Register a workflow definition whose file has `content` on every ref
    pub fn with_workflow(self, repo: &str, path: &str, name: &str, content: &str) -> Self {
        {
            let mut state = self.lock();
            let workflows = state.workflows.entry(repo.to_string()).or_default();
            let id = 1000 + workflows.len() as u64;
            workflows.push(WorkflowDefinition {
                id,
                name: name.to_string(),
                path: path.to_string(),
                state: "active".to_string(),
            });
            state.files.insert(
                (repo.to_string(), ANY_REF.to_string(), path.to_string()),
                content.to_string(),
            );
        }
        self
    }

    /// File content on one specific ref, overriding the any-ref content
    pub fn with_file(self, repo: &str, git_ref: &str, path: &str, content: &str) -> Self {
        self.lock().files.insert(
            (repo.to_string(), git_ref.to_string(), path.to_string()),
            content.to_string(),
        );
        self
    }

    pub fn with_runs(self, repo: &str, branch: &str, runs: Vec<RunHistoryEntry>) -> Self {
        {
            let mut state = self.lock();
            let max_id = runs.iter().map(|r| r.id).max().unwrap_or(0);
            state.next_run_id = state.next_run_id.max(max_id + 1);
            state
                .runs
                .insert((repo.to_string(), branch.to_string()), runs);
        }
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Runtime knobs
    // ─────────────────────────────────────────────────────────────────────

    /// Delay every call scoped to `repo` (use `""` for the repository list)
    pub fn set_delay(&self, repo: &str, delay: Duration) {
        self.lock().delays.insert(repo.to_string(), delay);
    }

    pub fn fail_repository(&self, repo: &str) {
        self.lock().failing_repos.insert(repo.to_string());
    }

    /// Fail every call of one operation, e.g. `"list_branches"`
    pub fn fail_operation(&self, op: &'static str) {
        self.lock().failing_ops.insert(op);
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.failing_repos.clear();
        state.failing_ops.clear();
    }

    /// Replace the runs of a branch after construction
    pub fn set_runs(&self, repo: &str, branch: &str, runs: Vec<RunHistoryEntry>) {
        self.lock()
            .runs
            .insert((repo.to_string(), branch.to_string()), runs);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Assertions
    // ─────────────────────────────────────────────────────────────────────

    pub fn calls(&self, op: &str) -> usize {
        self.lock().calls.get(op).copied().unwrap_or(0)
    }

    pub fn dispatched(&self) -> Vec<DispatchRecord> {
        self.lock().dispatched.clone()
    }

    /// `(operation, run id)` for rerun / cancel calls
    pub fn run_actions(&self) -> Vec<(&'static str, u64)> {
        self.lock().run_actions.clone()
    }

    /// Count the call, apply delay and injected failure
    async fn enter(&self, op: &'static str, repo: &str) -> Result<()> {
        let delay = {
            let mut state = self.lock();
            *state.calls.entry(op).or_insert(0) += 1;
            state.delays.get(repo).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.lock();
        if state.failing_ops.contains(op) || state.failing_repos.contains(repo) {
            return Err(FlowdeckError::Http {
                status: 500,
                endpoint: format!("mock:{}:{}", op, repo),
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn known_repository(state: &MockState, repo: &str) -> Result<()> {
        if state.repositories.iter().any(|r| r.full_name == repo) {
            Ok(())
        } else {
            Err(FlowdeckError::NotFound {
                what: format!("repository {}", repo),
            })
        }
    }

    fn find_run<'a>(state: &'a mut MockState, repo: &str, run_id: u64) -> Result<&'a mut RunHistoryEntry> {
        state
            .runs
            .iter_mut()
            .filter(|((r, _), _)| r == repo)
            .flat_map(|(_, runs)| runs.iter_mut())
            .find(|run| run.id == run_id)
            .ok_or_else(|| FlowdeckError::NotFound {
                what: format!("run {} in {}", run_id, repo),
            })
    }

    fn run_action(&self, op: &'static str, repo: &str, run_id: u64, status: &str) -> Result<()> {
        let mut state = self.lock();
        let run = Self::find_run(&mut state, repo, run_id)?;
        run.status = status.to_string();
        if status != "completed" {
            run.conclusion = None;
        } else {
            run.conclusion = Some("cancelled".to_string());
        }
        state.run_actions.push((op, run_id));
        Ok(())
    }

    /// Sample data for `--demo`
    pub fn demo() -> Self {
        let now = Utc::now();
        let ago = |mins: i64| now - chrono::Duration::minutes(mins);

        Self::new()
            .with_repository("acme/api", "main")
            .with_branches("acme/api", &["develop", "release/2.x"])
            .with_workflow("acme/api", ".github/workflows/ci.yml", "CI", DEMO_CI)
            .with_workflow("acme/api", ".github/workflows/deploy.yml", "Deploy", DEMO_DEPLOY)
            .with_runs(
                "acme/api",
                "main",
                vec![
                    sample_run(41, "Deploy", "main", "in_progress", None, ago(2)),
                    sample_run(40, "CI", "main", "completed", Some("success"), ago(30)),
                    sample_run(39, "Deploy", "main", "completed", Some("failure"), ago(90)),
                ],
            )
            .with_repository("acme/web", "main")
            .with_workflow("acme/web", ".github/workflows/ci.yml", "CI", DEMO_CI)
            .with_runs(
                "acme/web",
                "main",
                vec![sample_run(12, "CI", "main", "completed", Some("success"), ago(240))],
            )
            .with_repository("acme/docs", "gh-pages")
    }
}

/// A completed or running history row for tests and demo data
pub fn sample_run(
    id: u64,
    name: &str,
    branch: &str,
    status: &str,
    conclusion: Option<&str>,
    started_at: DateTime<Utc>,
) -> RunHistoryEntry {
    RunHistoryEntry {
        id,
        run_number: id,
        name: name.to_string(),
        title: format!("{} #{}", name, id),
        triggered_by: "octocat".to_string(),
        event: "workflow_dispatch".to_string(),
        branch: branch.to_string(),
        started_at,
        status: status.to_string(),
        conclusion: conclusion.map(str::to_string),
        duration: if status == "completed" {
            Duration::from_secs(95)
        } else {
            Duration::ZERO
        },
        html_url: String::new(),
    }
}

const DEMO_CI: &str = r#"name: CI
on:
  push:
  workflow_dispatch:
"#;

const DEMO_DEPLOY: &str = r#"name: Deploy
on:
  workflow_dispatch:
    inputs:
      environment:
        description: Target environment
        type: choice
        options: [staging, production]
        default: staging
      dry_run:
        description: Plan only
        type: boolean
        default: true
      version:
        description: Release tag
        required: true
      limits:
        description: Rollout limits
        default: '{"replicas":3,"canary":true,"region":"eu-west-1"}'
"#;

#[async_trait]
impl GitHubApi for MockGitHub {
    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        self.enter("list_repositories", "").await?;
        Ok(self.lock().repositories.clone())
    }

    async fn get_repository(&self, repo: &str) -> Result<Repository> {
        self.enter("get_repository", repo).await?;
        let state = self.lock();
        Self::known_repository(&state, repo)?;
        state
            .repositories
            .iter()
            .find(|r| r.full_name == repo)
            .cloned()
            .ok_or_else(|| FlowdeckError::NotFound {
                what: format!("repository {}", repo),
            })
    }

    async fn list_branches(&self, repo: &str) -> Result<Vec<Branch>> {
        self.enter("list_branches", repo).await?;
        let state = self.lock();
        Self::known_repository(&state, repo)?;
        Ok(state.branches.get(repo).cloned().unwrap_or_default())
    }

    async fn list_workflows(&self, repo: &str) -> Result<Vec<WorkflowDefinition>> {
        self.enter("list_workflows", repo).await?;
        let state = self.lock();
        Self::known_repository(&state, repo)?;
        Ok(state.workflows.get(repo).cloned().unwrap_or_default())
    }

    async fn get_file_content(&self, repo: &str, path: &str, git_ref: &str) -> Result<String> {
        self.enter("get_file_content", repo).await?;
        let state = self.lock();
        let key = |r: &str| (repo.to_string(), r.to_string(), path.to_string());
        state
            .files
            .get(&key(git_ref))
            .or_else(|| state.files.get(&key(ANY_REF)))
            .cloned()
            .ok_or_else(|| FlowdeckError::NotFound {
                what: format!("{}@{}:{}", repo, git_ref, path),
            })
    }

    async fn list_workflow_runs(&self, repo: &str, branch: &str) -> Result<Vec<RunHistoryEntry>> {
        self.enter("list_workflow_runs", repo).await?;
        let state = self.lock();
        Self::known_repository(&state, repo)?;
        Ok(state
            .runs
            .get(&(repo.to_string(), branch.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn dispatch_workflow(
        &self,
        repo: &str,
        workflow_file: &str,
        git_ref: &str,
        inputs: Value,
    ) -> Result<()> {
        self.enter("dispatch_workflow", repo).await?;
        let mut state = self.lock();
        Self::known_repository(&state, repo)?;

        let name = state
            .workflows
            .get(repo)
            .and_then(|wfs| wfs.iter().find(|w| w.file_name() == workflow_file))
            .map(|w| w.name.clone())
            .ok_or_else(|| FlowdeckError::NotFound {
                what: format!("workflow {} in {}", workflow_file, repo),
            })?;

        state.next_run_id = state.next_run_id.max(1);
        let id = state.next_run_id;
        state.next_run_id += 1;
        state
            .runs
            .entry((repo.to_string(), git_ref.to_string()))
            .or_default()
            .insert(0, sample_run(id, &name, git_ref, "queued", None, Utc::now()));
        state.dispatched.push(DispatchRecord {
            repo: repo.to_string(),
            workflow_file: workflow_file.to_string(),
            git_ref: git_ref.to_string(),
            inputs,
        });
        Ok(())
    }

    async fn run_logs_url(&self, repo: &str, run_id: u64) -> Result<String> {
        self.enter("run_logs_url", repo).await?;
        let mut state = self.lock();
        Self::find_run(&mut state, repo, run_id)?;
        Ok(format!(
            "https://logs.example.invalid/{}/runs/{}/logs.zip",
            repo, run_id
        ))
    }

    async fn rerun_failed_jobs(&self, repo: &str, run_id: u64) -> Result<()> {
        self.enter("rerun_failed_jobs", repo).await?;
        self.run_action("rerun_failed_jobs", repo, run_id, "queued")
    }

    async fn rerun_workflow(&self, repo: &str, run_id: u64) -> Result<()> {
        self.enter("rerun_workflow", repo).await?;
        self.run_action("rerun_workflow", repo, run_id, "queued")
    }

    async fn cancel_run(&self, repo: &str, run_id: u64) -> Result<()> {
        self.enter("cancel_run", repo).await?;
        self.run_action("cancel_run", repo, run_id, "completed")
    }
}
