//! # Dashboard State
//!
//! UI-loop-owned aggregate: selection, per-stream sync, row caches, the
//! dispatch form, tab locks and the status line. Background work only
//! reaches it through [`Notification`]s drained by [`Dashboard::drain`].
//!
//! ```text
//! select_* ──► SelectionContext ──► stale streams ──► SyncCoordinator::begin
//!                                                          │
//!      render ◄── caches / gate / status ◄── handle ◄──────┘ (channel)
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tokio_util::sync::CancellationToken;

use crate::config::SyncConfig;
use crate::dispatch::DispatchSerializer;
use crate::error::{FlowdeckError, Result};
use crate::gate::{DataAvailability, TabGate};
use crate::github::{Branch, GitHubApi, RepositoryRow, RunHistoryEntry, TriggerableWorkflow};
use crate::input::InputFieldModel;
use crate::selection::{SelectionChange, SelectionContext};
use crate::sync::{
    self, load_branches, load_repositories, load_run_history, load_triggerable_workflows,
    Applied, FailureKind, FanOut, LivePoller, Notification, NotificationReceiver,
    NotificationSender, StreamId, StreamPayload, StreamStatus, SyncCoordinator,
};

type Fetch = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, Result<StreamPayload>> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusLine {
    fn new(level: StatusLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Runtime knobs, usually taken from [`SyncConfig`]
#[derive(Debug, Clone, Copy)]
pub struct DashboardOptions {
    pub fetch_timeout: Duration,
    pub poll_interval: Duration,
    pub fan_out_limit: usize,
    pub live: bool,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for DashboardOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            fetch_timeout: config.fetch_timeout(),
            poll_interval: config.poll_interval(),
            fan_out_limit: config.fan_out_limit(),
            live: config.live_on_start,
        }
    }
}

pub struct Dashboard {
    api: Arc<dyn GitHubApi>,
    fan_out: FanOut,
    selection: SelectionContext,
    sync: SyncCoordinator,
    gate: TabGate,
    poller: LivePoller,
    tx: NotificationSender,
    rx: NotificationReceiver,

    repositories: Vec<RepositoryRow>,
    branches: Vec<Branch>,
    workflows: Vec<TriggerableWorkflow>,
    runs: Vec<RunHistoryEntry>,
    /// Row count of the last settled workflow fetch for this selection
    workflow_count: Option<usize>,
    form: Option<InputFieldModel>,

    status: Option<StatusLine>,
    pending_actions: usize,
}

impl Dashboard {
    /// Build an idle dashboard. Spawns the live poller, so a tokio runtime
    /// must be running.
    pub fn new(api: Arc<dyn GitHubApi>, options: DashboardOptions) -> Self {
        let (tx, rx) = sync::channel();
        Self {
            api,
            fan_out: FanOut::new(options.fan_out_limit),
            selection: SelectionContext::new(),
            sync: SyncCoordinator::new(options.fetch_timeout, tx.clone()),
            gate: TabGate::new(),
            poller: LivePoller::spawn(options.poll_interval, options.live, tx.clone()),
            tx,
            rx,
            repositories: Vec::new(),
            branches: Vec::new(),
            workflows: Vec::new(),
            runs: Vec::new(),
            workflow_count: None,
            form: None,
            status: None,
            pending_actions: 0,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Read side (rendering)
    // ─────────────────────────────────────────────────────────────────────

    pub fn selection(&self) -> &SelectionContext {
        &self.selection
    }

    pub fn repositories(&self) -> &[RepositoryRow] {
        &self.repositories
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn workflows(&self) -> &[TriggerableWorkflow] {
        &self.workflows
    }

    pub fn runs(&self) -> &[RunHistoryEntry] {
        &self.runs
    }

    pub fn form(&self) -> Option<&InputFieldModel> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut InputFieldModel> {
        self.form.as_mut()
    }

    pub fn gate(&self) -> &TabGate {
        &self.gate
    }

    pub fn stream_status(&self, stream: StreamId) -> &StreamStatus {
        self.sync.status(stream)
    }

    pub fn generation(&self, stream: StreamId) -> u64 {
        self.sync.generation(stream)
    }

    pub fn status_line(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    pub fn is_live(&self) -> bool {
        self.poller.is_live()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poller.interval()
    }

    /// Any fetch or action still in flight
    pub fn is_busy(&self) -> bool {
        self.pending_actions > 0 || StreamId::ALL.iter().any(|s| self.sync.is_fetching(*s))
    }

    pub fn selected_workflow(&self) -> Option<&TriggerableWorkflow> {
        let file = self.selection.workflow_file()?;
        self.workflows.iter().find(|w| w.file_name() == file)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────

    /// Load the repository list
    pub fn start(&mut self) {
        self.refresh(StreamId::Repositories);
    }

    /// Fetch one repository directly and select it. Used before the UI
    /// loop starts, so awaiting here is fine.
    pub async fn open_repository(&mut self, name: &str) -> Result<()> {
        crate::selection::validate_repository_name(name)?;
        let repo = self.api.get_repository(name).await?;
        if !self.repositories.iter().any(|r| r.name == repo.full_name) {
            self.repositories.push(RepositoryRow {
                name: repo.full_name.clone(),
                default_branch: repo.default_branch.clone(),
                private: repo.private,
                stars: repo.stargazers_count,
                workflow_count: 0,
                updated_at: repo.updated_at,
            });
        }
        self.select_repository(&repo.full_name)
    }

    /// Select a repository from the list; starts on its default branch
    pub fn select_repository(&mut self, name: &str) -> Result<()> {
        let branch = self
            .default_branch_of(name)
            .ok_or_else(|| FlowdeckError::NotFound {
                what: format!("repository {}", name),
            })?;
        let change = self.selection.set_repository(name, &branch)?;
        tracing::info!(repo = %name, branch = %branch, "Repository selected");
        self.apply_change(change);
        Ok(())
    }

    pub fn select_branch(&mut self, branch: &str) -> Result<()> {
        if self.selection.repository().is_none() {
            return Err(FlowdeckError::NoSelection { what: "repository" });
        }
        let change = self.selection.set_branch(branch);
        tracing::info!(branch = %branch, "Branch selected");
        self.apply_change(change);
        Ok(())
    }

    /// Select a triggerable workflow and build its dispatch form
    pub fn select_workflow(&mut self, file: &str) -> Result<()> {
        let schema = self
            .workflows
            .iter()
            .find(|w| w.file_name() == file)
            .map(|w| w.schema.clone())
            .ok_or_else(|| FlowdeckError::NotFound {
                what: format!("workflow {}", file),
            })?;
        let change = self.selection.set_workflow(file);
        self.apply_change(change);
        self.form = Some(InputFieldModel::new(schema));
        Ok(())
    }

    fn apply_change(&mut self, change: SelectionChange) {
        if change.form_stale {
            self.form = None;
        }
        for stream in &change.stale {
            self.clear_cache(*stream);
        }
        self.update_gate();
        for stream in change.stale {
            self.refresh(stream);
        }
    }

    fn clear_cache(&mut self, stream: StreamId) {
        match stream {
            StreamId::Repositories => self.repositories.clear(),
            StreamId::Branches => self.branches.clear(),
            StreamId::TriggerableWorkflows => {
                self.workflows.clear();
                self.workflow_count = None;
            }
            StreamId::RunHistory => self.runs.clear(),
        }
    }

    fn update_gate(&mut self) {
        self.gate.recompute(DataAvailability {
            triggerable_workflows: self.workflow_count,
        });
    }

    fn default_branch_of(&self, repo: &str) -> Option<String> {
        self.repositories
            .iter()
            .find(|r| r.name == repo)
            .map(|r| r.default_branch.clone())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Fetching
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch body for a stream under the current selection, or `None` if
    /// the selection does not cover it yet
    fn fetch_for(&self, stream: StreamId) -> Option<Fetch> {
        let api = Arc::clone(&self.api);
        let fan_out = self.fan_out;
        let snapshot = self.selection.snapshot();

        let fetch: Fetch = match stream {
            StreamId::Repositories => {
                Box::new(move |cancel| load_repositories(api, fan_out, cancel).boxed())
            }
            StreamId::Branches => {
                let repo = snapshot.repository?;
                let default_branch = self.default_branch_of(&repo).or(snapshot.branch)?;
                Box::new(move |_| load_branches(api, repo, default_branch).boxed())
            }
            StreamId::TriggerableWorkflows => {
                let repo = snapshot.repository?;
                let branch = snapshot.branch?;
                Box::new(move |cancel| {
                    load_triggerable_workflows(api, fan_out, cancel, repo, branch).boxed()
                })
            }
            StreamId::RunHistory => {
                let repo = snapshot.repository?;
                let branch = snapshot.branch?;
                Box::new(move |_| load_run_history(api, repo, branch).boxed())
            }
        };
        Some(fetch)
    }

    /// Explicit refresh. Supersedes an in-flight fetch of the same stream.
    /// Returns false when the selection does not cover the stream.
    pub fn refresh(&mut self, stream: StreamId) -> bool {
        match self.fetch_for(stream) {
            Some(fetch) => {
                self.sync.begin(stream, fetch);
                true
            }
            None => {
                self.sync.cancel(stream);
                self.clear_cache(stream);
                self.update_gate();
                false
            }
        }
    }

    pub fn refresh_all(&mut self) {
        for stream in StreamId::ALL {
            self.refresh(stream);
        }
    }

    /// Stop every in-flight fetch; streams go back to Idle silently
    pub fn cancel_fetches(&mut self) {
        for stream in StreamId::ALL {
            if self.sync.is_fetching(stream) {
                self.sync.cancel(stream);
            }
        }
    }

    pub fn toggle_live(&mut self) -> bool {
        let on = self.poller.toggle();
        self.status = Some(StatusLine::new(
            StatusLevel::Info,
            if on {
                format!("Live mode on (every {}s)", self.poller.interval().as_secs())
            } else {
                "Live mode off".to_string()
            },
        ));
        on
    }

    // ─────────────────────────────────────────────────────────────────────
    // Notifications
    // ─────────────────────────────────────────────────────────────────────

    /// Apply everything queued so far. Returns true if a redraw is needed.
    pub fn drain(&mut self) -> bool {
        let mut dirty = false;
        while let Ok(notification) = self.rx.try_recv() {
            dirty |= self.handle(notification);
        }
        dirty
    }

    /// Wait for the next notification and apply it
    pub async fn next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(notification) => self.handle(notification),
            None => false,
        }
    }

    /// Apply one notification. Returns true if a redraw is needed.
    pub fn handle(&mut self, notification: Notification) -> bool {
        match notification {
            Notification::Synced(update) => {
                let stream = update.stream;
                match self.sync.apply(update) {
                    Applied::Superseded => false,
                    Applied::Cancelled => true,
                    Applied::Data(payload) => {
                        self.store(payload);
                        true
                    }
                    Applied::Failed(failure) => {
                        self.status = Some(match failure.kind {
                            FailureKind::Timeout => StatusLine::new(
                                StatusLevel::Warning,
                                format!(
                                    "Loading {} timed out after {}s",
                                    stream,
                                    self.sync.timeout().as_secs()
                                ),
                            ),
                            FailureKind::Transport => StatusLine::new(
                                StatusLevel::Error,
                                format!("Loading {} failed: {}", stream, failure.message),
                            ),
                        });
                        true
                    }
                }
            }
            Notification::PollTick => {
                let Some(fetch) = self.fetch_for(StreamId::RunHistory) else {
                    return false;
                };
                self.sync.poll(StreamId::RunHistory, fetch).is_some()
            }
            Notification::ActionFinished {
                label,
                result,
                refresh_history,
            } => {
                self.pending_actions = self.pending_actions.saturating_sub(1);
                match result {
                    Ok(message) => {
                        tracing::info!(action = %label, "Action succeeded");
                        self.status = Some(StatusLine::new(StatusLevel::Success, message));
                        if refresh_history {
                            self.refresh(StreamId::RunHistory);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(action = %label, error = %e, "Action failed");
                        let level = if e.is_timeout() {
                            StatusLevel::Warning
                        } else {
                            StatusLevel::Error
                        };
                        self.status =
                            Some(StatusLine::new(level, format!("{} failed: {}", label, e)));
                    }
                }
                true
            }
        }
    }

    /// Replace a stream's cache with a settled payload
    fn store(&mut self, payload: StreamPayload) {
        match payload {
            StreamPayload::Repositories(rows) => self.repositories = rows,
            StreamPayload::Branches(rows) => self.branches = rows,
            StreamPayload::Runs(rows) => self.runs = rows,
            StreamPayload::Workflows(rows) => {
                self.workflow_count = Some(rows.len());
                self.workflows = rows;
                self.update_gate();

                // the selected workflow may be gone on a refresh
                if self.selection.workflow_file().is_some() {
                    match self.selected_workflow().map(|wf| wf.schema.clone()) {
                        None => self.form = None,
                        Some(schema) if self.form.is_none() => {
                            self.form = Some(InputFieldModel::new(schema));
                        }
                        Some(_) => {}
                    }
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────────────

    fn selected_repository(&self) -> Result<String> {
        self.selection
            .repository()
            .map(str::to_string)
            .ok_or(FlowdeckError::NoSelection { what: "repository" })
    }

    fn spawn_action<Fut>(&mut self, label: String, refresh_history: bool, work: Fut)
    where
        Fut: std::future::Future<Output = Result<String>> + Send + 'static,
    {
        let tx = self.tx.clone();
        let timeout = self.sync.timeout();
        self.pending_actions += 1;
        self.status = Some(StatusLine::new(StatusLevel::Info, format!("{}...", label)));

        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, work).await {
                Ok(result) => result,
                Err(_) => Err(FlowdeckError::Timeout {
                    timeout_secs: timeout.as_secs(),
                }),
            };
            let _ = tx.send(Notification::ActionFinished {
                label,
                result,
                refresh_history,
            });
        });
    }

    /// Submit the current form. Defaults are filled into a copy, so the
    /// on-screen form keeps its unset markers.
    pub fn dispatch(&mut self) -> Result<()> {
        let repo = self.selected_repository()?;
        let branch = self
            .selection
            .branch()
            .map(str::to_string)
            .ok_or(FlowdeckError::NoSelection { what: "branch" })?;
        let file = self
            .selection
            .workflow_file()
            .map(str::to_string)
            .ok_or(FlowdeckError::NoSelection { what: "workflow" })?;
        let form = self
            .form
            .as_mut()
            .ok_or(FlowdeckError::NoSelection { what: "workflow" })?;

        form.commit_pending();
        let finalized = form.clone().finalize();
        let inputs = match DispatchSerializer::to_value(&finalized) {
            Ok(inputs) => inputs,
            Err(e) => {
                self.status = Some(StatusLine::new(
                    StatusLevel::Error,
                    format!("Dispatch aborted: {}", e),
                ));
                return Err(e);
            }
        };

        let api = Arc::clone(&self.api);
        let label = format!("Dispatch {}", finalized.workflow_name());
        self.spawn_action(label, true, async move {
            api.dispatch_workflow(&repo, &file, &branch, inputs).await?;
            Ok(format!("Dispatched {} on {}", file, branch))
        });
        Ok(())
    }

    pub fn rerun_failed_jobs(&mut self, run_id: u64) -> Result<()> {
        let repo = self.selected_repository()?;
        let api = Arc::clone(&self.api);
        self.spawn_action(format!("Re-run failed jobs of #{}", run_id), true, async move {
            api.rerun_failed_jobs(&repo, run_id).await?;
            Ok(format!("Re-running failed jobs of run {}", run_id))
        });
        Ok(())
    }

    pub fn rerun_workflow(&mut self, run_id: u64) -> Result<()> {
        let repo = self.selected_repository()?;
        let api = Arc::clone(&self.api);
        self.spawn_action(format!("Re-run #{}", run_id), true, async move {
            api.rerun_workflow(&repo, run_id).await?;
            Ok(format!("Re-running run {}", run_id))
        });
        Ok(())
    }

    pub fn cancel_run(&mut self, run_id: u64) -> Result<()> {
        let repo = self.selected_repository()?;
        let api = Arc::clone(&self.api);
        self.spawn_action(format!("Cancel #{}", run_id), true, async move {
            api.cancel_run(&repo, run_id).await?;
            Ok(format!("Cancellation requested for run {}", run_id))
        });
        Ok(())
    }

    /// Resolve the log archive location; shown in the status line
    pub fn fetch_logs_url(&mut self, run_id: u64) -> Result<()> {
        let repo = self.selected_repository()?;
        let api = Arc::clone(&self.api);
        self.spawn_action(format!("Logs of #{}", run_id), false, async move {
            let url = api.run_logs_url(&repo, run_id).await?;
            Ok(format!("Logs: {}", url))
        });
        Ok(())
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.poller.stop();
        self.sync.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::MockGitHub;

    const DEPLOY: &str = "name: Deploy\non:\n  workflow_dispatch:\n    inputs:\n      env:\n        type: choice\n        options: [dev, prod]\n        default: dev\n";

    fn mock() -> MockGitHub {
        MockGitHub::new()
            .with_repository("octo/app", "main")
            .with_workflow("octo/app", ".github/workflows/deploy.yml", "Deploy", DEPLOY)
    }

    async fn settle(dash: &mut Dashboard) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while dash.is_busy() {
                dash.next().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_start_loads_repositories() {
        let mut dash = Dashboard::new(Arc::new(mock()), DashboardOptions::default());
        dash.start();
        settle(&mut dash).await;
        assert_eq!(dash.repositories().len(), 1);
        assert_eq!(dash.stream_status(StreamId::Repositories), &StreamStatus::Ready);
    }

    #[tokio::test]
    async fn test_select_unknown_repository() {
        let mut dash = Dashboard::new(Arc::new(mock()), DashboardOptions::default());
        assert!(dash.select_repository("octo/app").unwrap_err().is_not_found());
        assert!(matches!(
            dash.select_branch("main"),
            Err(FlowdeckError::NoSelection { .. })
        ));
    }

    #[tokio::test]
    async fn test_refresh_without_selection_is_rejected() {
        let mut dash = Dashboard::new(Arc::new(mock()), DashboardOptions::default());
        assert!(!dash.refresh(StreamId::RunHistory));
        assert_eq!(dash.stream_status(StreamId::RunHistory), &StreamStatus::Idle);
    }

    #[tokio::test]
    async fn test_uncovered_refresh_relocks_trigger() {
        let mut dash = Dashboard::new(Arc::new(mock()), DashboardOptions::default());
        dash.workflow_count = Some(2);
        dash.update_gate();
        assert!(!dash.gate().is_locked(crate::gate::ViewId::Trigger));

        assert!(!dash.refresh(StreamId::TriggerableWorkflows));
        assert_eq!(dash.workflow_count, None);
        assert!(dash.gate().is_locked(crate::gate::ViewId::Trigger));
    }

    #[tokio::test]
    async fn test_poll_tick_without_branch_is_ignored() {
        let mut dash = Dashboard::new(Arc::new(mock()), DashboardOptions::default());
        assert!(!dash.handle(Notification::PollTick));
        assert_eq!(dash.stream_status(StreamId::RunHistory), &StreamStatus::Idle);
        assert_eq!(dash.generation(StreamId::RunHistory), 0);
    }

    #[tokio::test]
    async fn test_workflow_selection_builds_form_and_unlocks() {
        let mut dash = Dashboard::new(Arc::new(mock()), DashboardOptions::default());
        dash.open_repository("octo/app").await.unwrap();
        settle(&mut dash).await;

        assert!(!dash.gate().is_locked(crate::gate::ViewId::Trigger));
        dash.select_workflow("deploy.yml").unwrap();
        let form = dash.form().unwrap();
        assert_eq!(form.workflow_name(), "Deploy");
        assert!(dash.select_workflow("missing.yml").is_err());
    }

    #[tokio::test]
    async fn test_dispatch_without_form() {
        let mut dash = Dashboard::new(Arc::new(mock()), DashboardOptions::default());
        assert!(matches!(
            dash.dispatch(),
            Err(FlowdeckError::NoSelection { what: "repository" })
        ));
    }
}
