//! UiState - view-local state
//!
//! Tab, row cursors and the text editor buffer. Everything fetched or
//! edited lives in [`Dashboard`](crate::dashboard::Dashboard); this only
//! tracks where the operator is looking.

use std::collections::HashMap;

use crate::gate::ViewId;

/// Which list of the Repositories tab has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepoPane {
    Repositories,
    Branches,
}

#[derive(Debug)]
pub struct UiState {
    pub tab: ViewId,
    pub repo_pane: RepoPane,
    pub(crate) cursors: HashMap<(ViewId, RepoPane), usize>,
    /// In-progress text for the active Trigger row
    pub edit_buffer: Option<String>,
    /// Local notice (rejected key, invalid edit); cleared on the next key
    pub notice: Option<String>,
    pub should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: ViewId::Repositories,
            repo_pane: RepoPane::Repositories,
            cursors: HashMap::new(),
            edit_buffer: None,
            notice: None,
            should_quit: false,
        }
    }
}

impl UiState {
    fn cursor_key(&self) -> (ViewId, RepoPane) {
        match self.tab {
            ViewId::Repositories => (self.tab, self.repo_pane),
            // pane is irrelevant outside the Repositories tab
            other => (other, RepoPane::Repositories),
        }
    }

    /// Selected row of the focused list
    pub fn cursor(&self) -> usize {
        self.cursors.get(&self.cursor_key()).copied().unwrap_or(0)
    }

    pub fn cursor_of(&self, tab: ViewId, pane: RepoPane) -> usize {
        self.cursors.get(&(tab, pane)).copied().unwrap_or(0)
    }

    /// Move the focused cursor by `delta`, clamped to `len` rows
    pub fn move_cursor(&mut self, delta: isize, len: usize) {
        let key = self.cursor_key();
        let current = self.cursors.get(&key).copied().unwrap_or(0);
        let next = if len == 0 {
            0
        } else {
            current.saturating_add_signed(delta).min(len - 1)
        };
        self.cursors.insert(key, next);
    }

    /// Keep the focused cursor inside a list that may have shrunk
    pub fn clamp_cursor(&mut self, tab: ViewId, pane: RepoPane, len: usize) {
        if let Some(cursor) = self.cursors.get_mut(&(tab, pane)) {
            *cursor = (*cursor).min(len.saturating_sub(1));
        }
    }

    pub fn reset_cursor(&mut self, tab: ViewId, pane: RepoPane) {
        self.cursors.remove(&(tab, pane));
    }

    pub fn is_editing(&self) -> bool {
        self.edit_buffer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_clamps() {
        let mut ui = UiState::default();
        ui.move_cursor(-1, 5);
        assert_eq!(ui.cursor(), 0);
        ui.move_cursor(10, 5);
        assert_eq!(ui.cursor(), 4);
        ui.move_cursor(1, 0);
        assert_eq!(ui.cursor(), 0);
    }

    #[test]
    fn test_cursors_are_per_pane() {
        let mut ui = UiState::default();
        ui.move_cursor(2, 5);
        ui.repo_pane = RepoPane::Branches;
        assert_eq!(ui.cursor(), 0);
        ui.move_cursor(1, 5);
        assert_eq!(ui.cursor_of(ViewId::Repositories, RepoPane::Repositories), 2);
        assert_eq!(ui.cursor_of(ViewId::Repositories, RepoPane::Branches), 1);
    }

    #[test]
    fn test_clamp_after_shrink() {
        let mut ui = UiState {
            tab: ViewId::History,
            ..UiState::default()
        };
        ui.move_cursor(7, 10);
        ui.clamp_cursor(ViewId::History, RepoPane::Repositories, 3);
        assert_eq!(ui.cursor(), 2);
    }
}
