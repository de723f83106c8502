//! Tab gating
//!
//! Which dashboard views are locked, derived only from data availability.

use std::collections::BTreeSet;
use std::fmt;

/// Dashboard views, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewId {
    Repositories,
    History,
    Workflows,
    Trigger,
    Info,
}

impl ViewId {
    pub const ALL: [ViewId; 5] = [
        ViewId::Repositories,
        ViewId::History,
        ViewId::Workflows,
        ViewId::Trigger,
        ViewId::Info,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Repositories => "Repositories",
            Self::History => "History",
            Self::Workflows => "Workflows",
            Self::Trigger => "Trigger",
            Self::Info => "Info",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|v| v == self).unwrap_or(0)
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Data-availability flags the gate reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataAvailability {
    /// Item count of the last settled triggerable-workflow fetch for the
    /// current selection; `None` before one exists
    pub triggerable_workflows: Option<usize>,
}

/// Locked views for the given availability
pub fn locked_views(data: &DataAvailability) -> BTreeSet<ViewId> {
    let mut locked = BTreeSet::new();
    if data.triggerable_workflows.unwrap_or(0) == 0 {
        locked.insert(ViewId::Trigger);
    }
    locked
}

/// Cached result of [`locked_views`]
#[derive(Debug, Clone)]
pub struct TabGate {
    data: DataAvailability,
    locked: BTreeSet<ViewId>,
}

impl Default for TabGate {
    fn default() -> Self {
        Self::new()
    }
}

impl TabGate {
    pub fn new() -> Self {
        let data = DataAvailability::default();
        Self {
            locked: locked_views(&data),
            data,
        }
    }

    /// Recompute from fresh availability; returns true when the lock set changed
    pub fn recompute(&mut self, data: DataAvailability) -> bool {
        let locked = locked_views(&data);
        self.data = data;
        if locked == self.locked {
            return false;
        }
        tracing::debug!(locked = ?locked, "Tab locks changed");
        self.locked = locked;
        true
    }

    pub fn is_locked(&self, view: ViewId) -> bool {
        self.locked.contains(&view)
    }

    pub fn locked(&self) -> &BTreeSet<ViewId> {
        &self.locked
    }

    pub fn data(&self) -> DataAvailability {
        self.data
    }

    /// Next unlocked view after `from` in the given direction, wrapping
    pub fn step(&self, from: ViewId, forward: bool) -> ViewId {
        let count = ViewId::ALL.len();
        let start = from.index();
        (1..=count)
            .map(|offset| {
                let index = if forward {
                    (start + offset) % count
                } else {
                    (start + count - offset % count) % count
                };
                ViewId::ALL[index]
            })
            .find(|view| !self.is_locked(*view))
            .unwrap_or(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(count: Option<usize>) -> DataAvailability {
        DataAvailability {
            triggerable_workflows: count,
        }
    }

    #[test]
    fn test_trigger_locked_until_workflows_exist() {
        assert!(locked_views(&with(None)).contains(&ViewId::Trigger));
        assert!(locked_views(&with(Some(0))).contains(&ViewId::Trigger));
        assert!(locked_views(&with(Some(2))).is_empty());
    }

    #[test]
    fn test_recompute_reports_changes() {
        let mut gate = TabGate::new();
        assert!(gate.is_locked(ViewId::Trigger));
        assert!(!gate.recompute(with(Some(0))));
        assert!(gate.recompute(with(Some(1))));
        assert!(!gate.is_locked(ViewId::Trigger));
        assert!(gate.recompute(with(None)));
    }

    #[test]
    fn test_step_skips_locked_views() {
        let gate = TabGate::new();
        assert_eq!(gate.step(ViewId::Workflows, true), ViewId::Info);
        assert_eq!(gate.step(ViewId::Info, false), ViewId::Workflows);
        assert_eq!(gate.step(ViewId::Info, true), ViewId::Repositories);
        assert_eq!(gate.step(ViewId::Repositories, false), ViewId::Info);
    }
}
