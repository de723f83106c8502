//! Event Handling - Keyboard input processing

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

use super::state::UiState;

/// Actions that can be triggered by user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextTab,
    PrevTab,
    Up,
    Down,
    Left,
    Right,
    Select,
    Refresh,
    ToggleLive,
    Dispatch,
    RerunFailed,
    RerunAll,
    CancelRun,
    Logs,
    /// Cancel in-flight fetches, or leave the text editor
    Escape,
    Input(char),
    Backspace,
    None,
}

/// Map a key to an action. While the text editor is open every printable
/// key is text.
pub fn handle_key_event(key: KeyEvent, state: &UiState) -> Action {
    if let (KeyModifiers::CONTROL, KeyCode::Char('c')) = (key.modifiers, key.code) {
        return Action::Quit;
    }

    if state.is_editing() {
        return match key.code {
            KeyCode::Char(c) => Action::Input(c),
            KeyCode::Backspace => Action::Backspace,
            KeyCode::Enter => Action::Select,
            KeyCode::Esc => Action::Escape,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Tab => Action::NextTab,
        KeyCode::BackTab => Action::PrevTab,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Right => Action::Right,
        KeyCode::Enter => Action::Select,
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Char('l') => Action::ToggleLive,
        KeyCode::Char('d') => Action::Dispatch,
        KeyCode::Char('f') => Action::RerunFailed,
        KeyCode::Char('R') => Action::RerunAll,
        KeyCode::Char('c') => Action::CancelRun,
        KeyCode::Char('o') => Action::Logs,
        KeyCode::Esc => Action::Escape,
        _ => Action::None,
    }
}

/// Poll for keyboard events with timeout
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<KeyEvent>> {
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            return Ok(Some(key));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_quit_action() {
        let state = UiState::default();
        assert_eq!(handle_key_event(key(KeyCode::Char('q')), &state), Action::Quit);
    }

    #[test]
    fn test_ctrl_c_quit_even_while_editing() {
        let state = UiState {
            edit_buffer: Some(String::new()),
            ..UiState::default()
        };
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key_event(ctrl_c, &state), Action::Quit);
    }

    #[test]
    fn test_editing_captures_letters() {
        let state = UiState {
            edit_buffer: Some(String::new()),
            ..UiState::default()
        };
        assert_eq!(handle_key_event(key(KeyCode::Char('q')), &state), Action::Input('q'));
        assert_eq!(handle_key_event(key(KeyCode::Char('r')), &state), Action::Input('r'));
        assert_eq!(handle_key_event(key(KeyCode::Esc), &state), Action::Escape);
        assert_eq!(handle_key_event(key(KeyCode::Tab), &state), Action::None);
    }

    #[test]
    fn test_run_action_keys() {
        let state = UiState::default();
        let shifted_r = KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT);
        assert_eq!(handle_key_event(shifted_r, &state), Action::RerunAll);
        assert_eq!(handle_key_event(key(KeyCode::Char('f')), &state), Action::RerunFailed);
        assert_eq!(handle_key_event(key(KeyCode::Char('c')), &state), Action::CancelRun);
        assert_eq!(handle_key_event(key(KeyCode::BackTab), &state), Action::PrevTab);
    }
}
