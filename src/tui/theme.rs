//! Deck Theme - Visual Design System
//!
//! Violet/amber palette on a dark background, with status colors for runs.

use ratatui::style::{Color, Modifier, Style};

use crate::dashboard::StatusLevel;

/// Color palette
pub struct DeckTheme {
    // Primary palette
    pub violet: Color,
    pub amber: Color,
    pub teal: Color,
    pub white: Color,
    pub gray: Color,

    // Status colors
    pub success_green: Color,
    pub warning_orange: Color,
    pub error_red: Color,
}

impl Default for DeckTheme {
    fn default() -> Self {
        Self {
            violet: Color::Rgb(138, 43, 226),         // #8A2BE2
            amber: Color::Rgb(255, 191, 0),           // #FFBF00
            teal: Color::Rgb(0, 255, 255),            // #00FFFF
            white: Color::Rgb(230, 237, 243),         // #E6EDF3
            gray: Color::Rgb(128, 128, 128),          // #808080
            success_green: Color::Rgb(63, 185, 80),   // #3FB950
            warning_orange: Color::Rgb(210, 153, 34), // #D29922
            error_red: Color::Rgb(248, 81, 73),       // #F85149
        }
    }
}

impl DeckTheme {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Styles
    // ─────────────────────────────────────────────────────────────────────

    pub fn text(&self) -> Style {
        Style::default().fg(self.white)
    }

    pub fn dimmed(&self) -> Style {
        Style::default().fg(self.gray)
    }

    pub fn header(&self) -> Style {
        Style::default().fg(self.violet).add_modifier(Modifier::BOLD)
    }

    pub fn accent(&self) -> Style {
        Style::default().fg(self.amber)
    }

    /// Focused border / active tab
    pub fn highlight(&self) -> Style {
        Style::default().fg(self.teal).add_modifier(Modifier::BOLD)
    }

    /// Selected table row
    pub fn selected_row(&self) -> Style {
        Style::default()
            .fg(self.amber)
            .add_modifier(Modifier::REVERSED)
    }

    /// Tab whose data preconditions are unmet
    pub fn locked(&self) -> Style {
        Style::default()
            .fg(Color::Rgb(64, 64, 64))
            .add_modifier(Modifier::CROSSED_OUT)
    }

    pub fn success(&self) -> Style {
        Style::default().fg(self.success_green)
    }

    pub fn warning(&self) -> Style {
        Style::default().fg(self.warning_orange)
    }

    pub fn error(&self) -> Style {
        Style::default()
            .fg(self.error_red)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status(&self, level: StatusLevel) -> Style {
        match level {
            StatusLevel::Info => self.text(),
            StatusLevel::Success => self.success(),
            StatusLevel::Warning => self.warning(),
            StatusLevel::Error => self.error(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Run colors
    // ─────────────────────────────────────────────────────────────────────

    /// Color for a run outcome (conclusion, or status while running)
    pub fn outcome_color(&self, outcome: &str) -> Color {
        match outcome {
            "success" => self.success_green,
            "failure" | "timed_out" | "startup_failure" => self.error_red,
            "cancelled" | "skipped" | "neutral" | "stale" => self.gray,
            "action_required" => self.warning_orange,
            // queued, in_progress, waiting, pending
            _ => self.amber,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Icons and Symbols
// ─────────────────────────────────────────────────────────────────────────────

pub mod icons {
    pub const SUCCESS: &str = "✓";
    pub const FAILURE: &str = "✗";
    pub const RUNNING: &str = "◉";
    pub const QUEUED: &str = "○";
    pub const SKIPPED: &str = "◌";
    pub const LOCK: &str = "⊘";
    pub const LIVE: &str = "●";
    pub const FETCHING: &str = "⟳";

    /// Glyph for a run outcome
    pub fn outcome(outcome: &str) -> &'static str {
        match outcome {
            "success" => SUCCESS,
            "failure" | "timed_out" | "startup_failure" => FAILURE,
            "in_progress" => RUNNING,
            "cancelled" | "skipped" | "neutral" | "stale" => SKIPPED,
            _ => QUEUED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_defaults() {
        let theme = DeckTheme::new();
        assert_eq!(theme.violet, Color::Rgb(138, 43, 226));
        assert_eq!(theme.amber, Color::Rgb(255, 191, 0));
    }

    #[test]
    fn test_outcome_colors() {
        let theme = DeckTheme::new();
        assert_eq!(theme.outcome_color("success"), theme.success_green);
        assert_eq!(theme.outcome_color("failure"), theme.error_red);
        assert_eq!(theme.outcome_color("cancelled"), theme.gray);
        assert_eq!(theme.outcome_color("in_progress"), theme.amber);
    }

    #[test]
    fn test_outcome_icons() {
        assert_eq!(icons::outcome("success"), icons::SUCCESS);
        assert_eq!(icons::outcome("timed_out"), icons::FAILURE);
        assert_eq!(icons::outcome("queued"), icons::QUEUED);
    }
}
