//! # Background Synchronization
//!
//! Every dashboard data set is a [`StreamId`] with its own fetch lifecycle:
//!
//! ```text
//! Idle ──begin──► Fetching ──► Ready | Empty | Failed
//!                    ▲                    │
//!                    └──── refresh / selection change / poll tick
//! ```
//!
//! Fetches run as tokio tasks and report back over one unbounded
//! [`Notification`] channel that the UI loop drains before each frame.
//! Nothing outside the UI loop touches dashboard state.
//!
//! - [`SyncCoordinator`] - generations, cancellation scopes, timeouts
//! - [`FanOut`] - bounded per-item enrichment inside one fetch
//! - [`LivePoller`] - interval ticks for run history while live mode is on

mod coordinator;
mod fanout;
mod loaders;
mod poller;

pub use coordinator::{Applied, SyncCoordinator};
pub use fanout::{FanOut, FanOutReport};
pub use loaders::{load_branches, load_repositories, load_run_history, load_triggerable_workflows};
pub use poller::LivePoller;

use std::fmt;

use tokio::sync::mpsc;

use crate::error::{FlowdeckError, Result};
use crate::github::{Branch, RepositoryRow, RunHistoryEntry, TriggerableWorkflow};

/// One logical remote data set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamId {
    Repositories,
    Branches,
    TriggerableWorkflows,
    RunHistory,
}

impl StreamId {
    pub const ALL: [StreamId; 4] = [
        StreamId::Repositories,
        StreamId::Branches,
        StreamId::TriggerableWorkflows,
        StreamId::RunHistory,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Repositories => "repositories",
            Self::Branches => "branches",
            Self::TriggerableWorkflows => "workflows",
            Self::RunHistory => "run history",
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a stream ended in `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Transport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFailure {
    pub kind: FailureKind,
    pub code: &'static str,
    pub message: String,
}

impl StreamFailure {
    pub fn from_error(error: &FlowdeckError) -> Self {
        Self {
            kind: if error.is_timeout() {
                FailureKind::Timeout
            } else {
                FailureKind::Transport
            },
            code: error.code(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Idle,
    Fetching,
    Ready,
    /// Zero results; not an error
    Empty,
    Failed(StreamFailure),
}

impl StreamStatus {
    pub fn is_fetching(&self) -> bool {
        matches!(self, Self::Fetching)
    }

    /// Ready or Empty
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready | Self::Empty)
    }
}

/// Fetched rows, replacing the stream's cache wholesale
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamPayload {
    Repositories(Vec<RepositoryRow>),
    Branches(Vec<Branch>),
    Workflows(Vec<TriggerableWorkflow>),
    Runs(Vec<RunHistoryEntry>),
}

impl StreamPayload {
    pub fn len(&self) -> usize {
        match self {
            Self::Repositories(rows) => rows.len(),
            Self::Branches(rows) => rows.len(),
            Self::Workflows(rows) => rows.len(),
            Self::Runs(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of one fetch, tagged with the generation it was started under
#[derive(Debug)]
pub struct SyncUpdate {
    pub stream: StreamId,
    pub generation: u64,
    pub outcome: Result<StreamPayload>,
}

/// "State changed" signal from background work to the UI loop
#[derive(Debug)]
pub enum Notification {
    Synced(SyncUpdate),
    /// Live-mode interval elapsed
    PollTick,
    /// A dispatch or run action finished; `Ok` carries the status text
    ActionFinished {
        label: String,
        result: Result<String>,
        /// Run history changed remotely and should be re-fetched
        refresh_history: bool,
    },
}

pub type NotificationSender = mpsc::UnboundedSender<Notification>;
pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

pub fn channel() -> (NotificationSender, NotificationReceiver) {
    mpsc::unbounded_channel()
}
