//! Flowdeck - terminal dashboard for CI workflows
//!
//! Browse repositories and branches, read run history, and dispatch
//! `workflow_dispatch` workflows through a form built from their declared
//! inputs. Remote reads run in the background; results older than the
//! current selection are discarded.

pub mod config;
pub mod dashboard;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod github;
pub mod input;
pub mod schema;
pub mod selection;
pub mod sync;
pub mod tui;

pub use config::DashConfig;
pub use dashboard::{Dashboard, DashboardOptions, StatusLevel, StatusLine};
pub use dispatch::DispatchSerializer;
pub use error::{FixSuggestion, FlowdeckError, Result};
pub use gate::{TabGate, ViewId};
pub use github::{GitHubApi, GitHubClient, MockGitHub};
pub use input::{CycleDirection, FieldPath, FinalizedInputs, InputFieldModel};
pub use schema::{parse_workflow, FieldKind, WorkflowField, WorkflowSchema};
pub use selection::SelectionContext;
pub use sync::{FanOut, LivePoller, StreamId, StreamStatus, SyncCoordinator};
