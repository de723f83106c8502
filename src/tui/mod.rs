//! TUI Module - Workflow Dashboard
//!
//! Terminal interface over a [`Dashboard`].
//!
//! Architecture:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    UI LAYER (app.rs, widgets/)                      │
//! │  Rendering and key mapping. Holds only cursors and the edit buffer. │
//! └─────────────────────────────────────────────────────────────────────┘
//!                               ▲
//!                               │ drain() before every frame
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     DOMAIN LAYER (dashboard.rs)                     │
//! │  Selection, caches, form, tab gate. Applies background results.     │
//! └─────────────────────────────────────────────────────────────────────┘
//!                               ▲
//!                               │ Notification channel
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       SYNC LAYER (sync/)                            │
//! │  Generation-checked fetches, fan-out, live poller.                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

mod app;
mod events;
mod state;
mod theme;

pub mod widgets;

pub use app::TuiApp;
pub use events::Action;
pub use state::{RepoPane, UiState};
pub use theme::DeckTheme;

use crate::dashboard::Dashboard;

/// Run the TUI dashboard
pub async fn run(dashboard: Dashboard) -> anyhow::Result<()> {
    TuiApp::new(dashboard).run().await
}
