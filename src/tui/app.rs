//! TUI Application - Main entry point and run loop

use std::io::{self, Stdout};
use std::time::Duration;

use chrono::Utc;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Tabs},
    Frame, Terminal,
};

use super::events::{handle_key_event, poll_event, Action};
use super::state::{RepoPane, UiState};
use super::theme::{icons, DeckTheme};
use super::widgets::utils::{format_age, format_duration, truncate};
use crate::dashboard::Dashboard;
use crate::error::{FlowdeckError, Result};
use crate::gate::ViewId;
use crate::input::{CycleDirection, FieldPath};
use crate::schema::FieldKind;
use crate::sync::{StreamId, StreamStatus};

/// TUI Application
pub struct TuiApp {
    dashboard: Dashboard,
    ui: UiState,
    theme: DeckTheme,
}

impl TuiApp {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            dashboard,
            ui: UiState::default(),
            theme: DeckTheme::new(),
        }
    }

    /// Run the TUI application
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut terminal = self.setup_terminal()?;

        if self.dashboard.repositories().is_empty() {
            self.dashboard.start();
        } else {
            // opened on a repository from the command line
            self.dashboard.refresh(StreamId::Repositories);
            self.ui.repo_pane = RepoPane::Branches;
        }

        let result = self.main_loop(&mut terminal).await;

        self.restore_terminal(&mut terminal)?;

        result
    }

    /// Setup terminal for TUI
    fn setup_terminal(&self) -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(terminal)
    }

    /// Restore terminal to normal state
    fn restore_terminal(
        &self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        Ok(())
    }

    /// Main event loop
    async fn main_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        let tick_rate = Duration::from_millis(16); // ~60fps

        loop {
            // Background results first, so the frame shows them
            self.dashboard.drain();
            self.clamp_cursors();

            terminal.draw(|frame| self.render(frame))?;

            if let Some(key) = poll_event(tick_rate)? {
                let action = handle_key_event(key, &self.ui);
                self.apply(action);
            }

            if self.ui.should_quit {
                break;
            }
            // let spawned fetches make progress on a current-thread runtime
            tokio::task::yield_now().await;
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Input
    // ─────────────────────────────────────────────────────────────────────

    /// Apply one key action; errors become the local notice
    pub(crate) fn apply(&mut self, action: Action) {
        if action == Action::None {
            return;
        }
        self.ui.notice = None;
        if let Err(e) = self.try_apply(action) {
            self.ui.notice = Some(e.to_string());
        }
    }

    fn try_apply(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => self.ui.should_quit = true,
            Action::NextTab => self.ui.tab = self.dashboard.gate().step(self.ui.tab, true),
            Action::PrevTab => self.ui.tab = self.dashboard.gate().step(self.ui.tab, false),
            Action::Up => self.move_row(-1),
            Action::Down => self.move_row(1),
            Action::Left => self.horizontal(CycleDirection::Prev)?,
            Action::Right => self.horizontal(CycleDirection::Next)?,
            Action::Select => self.select()?,
            Action::Input(c) => {
                if let Some(buffer) = self.ui.edit_buffer.as_mut() {
                    buffer.push(c);
                }
            }
            Action::Backspace => {
                if let Some(buffer) = self.ui.edit_buffer.as_mut() {
                    buffer.pop();
                }
            }
            Action::Escape => {
                if self.ui.edit_buffer.take().is_none() {
                    self.dashboard.cancel_fetches();
                }
            }
            Action::Refresh => self.refresh()?,
            Action::ToggleLive => {
                self.dashboard.toggle_live();
            }
            Action::Dispatch => {
                if self.ui.tab != ViewId::Trigger {
                    return Err(FlowdeckError::NoSelection { what: "workflow form" });
                }
                self.dashboard.dispatch()?;
            }
            Action::RerunFailed => {
                let run = self.selected_run()?;
                self.dashboard.rerun_failed_jobs(run)?;
            }
            Action::RerunAll => {
                let run = self.selected_run()?;
                self.dashboard.rerun_workflow(run)?;
            }
            Action::CancelRun => {
                let run = self.selected_run()?;
                self.dashboard.cancel_run(run)?;
            }
            Action::Logs => {
                let run = self.selected_run()?;
                self.dashboard.fetch_logs_url(run)?;
            }
            Action::None => {}
        }
        Ok(())
    }

    fn focused_len(&self) -> usize {
        match (self.ui.tab, self.ui.repo_pane) {
            (ViewId::Repositories, RepoPane::Repositories) => self.dashboard.repositories().len(),
            (ViewId::Repositories, RepoPane::Branches) => self.dashboard.branches().len(),
            (ViewId::History, _) => self.dashboard.runs().len(),
            (ViewId::Workflows, _) => self.dashboard.workflows().len(),
            _ => 0,
        }
    }

    fn move_row(&mut self, delta: isize) {
        if self.ui.tab == ViewId::Trigger {
            if self.ui.is_editing() {
                return;
            }
            if let Some(form) = self.dashboard.form_mut() {
                if delta < 0 {
                    form.prev_row();
                } else {
                    form.next_row();
                }
            }
            return;
        }
        let len = self.focused_len();
        self.ui.move_cursor(delta, len);
    }

    fn horizontal(&mut self, direction: CycleDirection) -> Result<()> {
        match self.ui.tab {
            ViewId::Repositories => {
                self.ui.repo_pane = match direction {
                    CycleDirection::Prev => RepoPane::Repositories,
                    CycleDirection::Next => RepoPane::Branches,
                };
                Ok(())
            }
            ViewId::Trigger => match self.dashboard.form_mut() {
                Some(form) => form.cycle_choice(direction),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    fn select(&mut self) -> Result<()> {
        match (self.ui.tab, self.ui.repo_pane) {
            (ViewId::Repositories, RepoPane::Repositories) => {
                let Some(name) = self
                    .dashboard
                    .repositories()
                    .get(self.ui.cursor())
                    .map(|r| r.name.clone())
                else {
                    return Ok(());
                };
                self.dashboard.select_repository(&name)?;
                self.ui.reset_cursor(ViewId::Repositories, RepoPane::Branches);
                self.ui.reset_cursor(ViewId::History, RepoPane::Repositories);
                self.ui.reset_cursor(ViewId::Workflows, RepoPane::Repositories);
                self.ui.repo_pane = RepoPane::Branches;
            }
            (ViewId::Repositories, RepoPane::Branches) => {
                let Some(branch) = self
                    .dashboard
                    .branches()
                    .get(self.ui.cursor())
                    .map(|b| b.name.clone())
                else {
                    return Ok(());
                };
                self.dashboard.select_branch(&branch)?;
                self.ui.reset_cursor(ViewId::History, RepoPane::Repositories);
                self.ui.reset_cursor(ViewId::Workflows, RepoPane::Repositories);
            }
            (ViewId::Workflows, _) => {
                let Some(file) = self
                    .dashboard
                    .workflows()
                    .get(self.ui.cursor())
                    .map(|w| w.file_name().to_string())
                else {
                    return Ok(());
                };
                self.dashboard.select_workflow(&file)?;
                if !self.dashboard.gate().is_locked(ViewId::Trigger) {
                    self.ui.tab = ViewId::Trigger;
                }
            }
            (ViewId::Trigger, _) => {
                let Some(form) = self.dashboard.form_mut() else {
                    return Ok(());
                };
                if let Some(buffer) = self.ui.edit_buffer.take() {
                    if let Err(e) = form.edit_free_text(&buffer) {
                        // keep the buffer so the operator can fix it
                        self.ui.edit_buffer = Some(buffer);
                        return Err(e);
                    }
                } else if let Some(text) = form.active_text() {
                    self.ui.edit_buffer = Some(text.to_string());
                } else {
                    form.commit_pending();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        let started = match self.ui.tab {
            ViewId::Repositories => {
                let repos = self.dashboard.refresh(StreamId::Repositories);
                self.dashboard.refresh(StreamId::Branches) || repos
            }
            ViewId::History => self.dashboard.refresh(StreamId::RunHistory),
            ViewId::Workflows | ViewId::Trigger => {
                self.dashboard.refresh(StreamId::TriggerableWorkflows)
            }
            ViewId::Info => {
                self.dashboard.refresh_all();
                true
            }
        };
        if started {
            Ok(())
        } else {
            Err(FlowdeckError::NoSelection { what: "repository" })
        }
    }

    fn selected_run(&self) -> Result<u64> {
        if self.ui.tab != ViewId::History {
            return Err(FlowdeckError::NoSelection { what: "run" });
        }
        self.dashboard
            .runs()
            .get(self.ui.cursor())
            .map(|r| r.id)
            .ok_or(FlowdeckError::NoSelection { what: "run" })
    }

    /// Lists are replaced wholesale; keep cursors inside them
    fn clamp_cursors(&mut self) {
        let lens = [
            (ViewId::Repositories, RepoPane::Repositories, self.dashboard.repositories().len()),
            (ViewId::Repositories, RepoPane::Branches, self.dashboard.branches().len()),
            (ViewId::History, RepoPane::Repositories, self.dashboard.runs().len()),
            (ViewId::Workflows, RepoPane::Repositories, self.dashboard.workflows().len()),
        ];
        for (tab, pane, len) in lens {
            self.ui.clamp_cursor(tab, pane, len);
        }
        if self.dashboard.gate().is_locked(self.ui.tab) {
            self.ui.tab = ViewId::Workflows;
            self.ui.edit_buffer = None;
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Tabs, Selection, Content, Status, Footer
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_tabs(frame, chunks[0]);
        self.render_selection(frame, chunks[1]);
        match self.ui.tab {
            ViewId::Repositories => self.render_repositories(frame, chunks[2]),
            ViewId::History => self.render_history(frame, chunks[2]),
            ViewId::Workflows => self.render_workflows(frame, chunks[2]),
            ViewId::Trigger => self.render_trigger(frame, chunks[2]),
            ViewId::Info => self.render_info(frame, chunks[2]),
        }
        self.render_status(frame, chunks[3]);
        self.render_footer(frame, chunks[4]);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let gate = self.dashboard.gate();
        let titles: Vec<Line> = ViewId::ALL
            .iter()
            .map(|view| {
                if gate.is_locked(*view) {
                    Line::from(Span::styled(
                        format!("{} {}", icons::LOCK, view.title()),
                        self.theme.locked(),
                    ))
                } else {
                    Line::from(Span::styled(view.title(), self.theme.text()))
                }
            })
            .collect();

        let tabs = Tabs::new(titles)
            .select(self.ui.tab.index())
            .highlight_style(self.theme.highlight())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.theme.header())
                    .title(" FLOWDECK "),
            );
        frame.render_widget(tabs, area);
    }

    fn render_selection(&self, frame: &mut Frame, area: Rect) {
        let selection = self.dashboard.selection();
        let mut spans = vec![
            Span::raw(" "),
            Span::styled(
                selection.repository().unwrap_or("no repository"),
                self.theme.accent(),
            ),
        ];
        if let Some(branch) = selection.branch() {
            spans.push(Span::styled(" @ ", self.theme.dimmed()));
            spans.push(Span::styled(branch, self.theme.text()));
        }
        if let Some(workflow) = selection.workflow_file() {
            spans.push(Span::styled(" / ", self.theme.dimmed()));
            spans.push(Span::styled(workflow, self.theme.text()));
        }
        if self.dashboard.is_live() {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(
                format!("{} LIVE {}s", icons::LIVE, self.dashboard.poll_interval().as_secs()),
                self.theme.success(),
            ));
        }
        if self.dashboard.is_busy() {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(icons::FETCHING, self.theme.accent()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    /// Panel title with the stream's state
    fn stream_title(&self, label: &str, stream: StreamId) -> String {
        match self.dashboard.stream_status(stream) {
            StreamStatus::Fetching => format!(" {} {} ", label, icons::FETCHING),
            StreamStatus::Failed(_) => format!(" {} {} ", label, icons::FAILURE),
            StreamStatus::Empty => format!(" {} (empty) ", label),
            StreamStatus::Idle | StreamStatus::Ready => format!(" {} ", label),
        }
    }

    fn panel(&self, title: String, focused: bool) -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(if focused {
                self.theme.highlight()
            } else {
                self.theme.dimmed()
            })
            .title(title)
    }

    fn render_repositories(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);
        let now = Utc::now();
        let selected = self.dashboard.selection().repository();

        let rows = self.dashboard.repositories().iter().map(|repo| {
            let marker = if selected == Some(repo.name.as_str()) { "▸" } else { " " };
            Row::new(vec![
                Cell::from(marker),
                Cell::from(repo.name.clone()),
                Cell::from(Span::styled(repo.default_branch.clone(), self.theme.dimmed())),
                Cell::from(repo.workflow_count.to_string()),
                Cell::from(repo.updated_at.map(|t| format_age(t, now)).unwrap_or_default()),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(1),
                Constraint::Min(20),
                Constraint::Length(14),
                Constraint::Length(4),
                Constraint::Length(10),
            ],
        )
        .header(Row::new(vec!["", "Repository", "Default", "WF", "Updated"]).style(self.theme.header()))
        .row_highlight_style(self.theme.selected_row())
        .block(self.panel(
            self.stream_title("REPOSITORIES", StreamId::Repositories),
            self.ui.repo_pane == RepoPane::Repositories,
        ));
        let mut state = TableState::default().with_selected(Some(
            self.ui.cursor_of(ViewId::Repositories, RepoPane::Repositories),
        ));
        frame.render_stateful_widget(table, chunks[0], &mut state);

        let current = self.dashboard.selection().branch();
        let rows = self.dashboard.branches().iter().map(|branch| {
            let style = if current == Some(branch.name.as_str()) {
                self.theme.accent()
            } else {
                self.theme.text()
            };
            Row::new(vec![
                Cell::from(Span::styled(branch.name.clone(), style)),
                Cell::from(if branch.protected { "protected" } else { "" }),
            ])
        });
        let table = Table::new(rows, [Constraint::Min(12), Constraint::Length(10)])
            .row_highlight_style(self.theme.selected_row())
            .block(self.panel(
                self.stream_title("BRANCHES", StreamId::Branches),
                self.ui.repo_pane == RepoPane::Branches,
            ));
        let mut state = TableState::default()
            .with_selected(Some(self.ui.cursor_of(ViewId::Repositories, RepoPane::Branches)));
        frame.render_stateful_widget(table, chunks[1], &mut state);
    }

    fn render_history(&self, frame: &mut Frame, area: Rect) {
        let now = Utc::now();
        let rows = self.dashboard.runs().iter().map(|run| {
            let outcome = run.outcome();
            let color = self.theme.outcome_color(outcome);
            Row::new(vec![
                Cell::from(Span::styled(icons::outcome(outcome), Style::default().fg(color))),
                Cell::from(format!("#{}", run.run_number)),
                Cell::from(truncate(&run.name, 20)),
                Cell::from(truncate(&run.title, 40)),
                Cell::from(Span::styled(outcome.to_string(), Style::default().fg(color))),
                Cell::from(run.triggered_by.clone()),
                Cell::from(format_age(run.started_at, now)),
                Cell::from(if run.is_active() {
                    String::new()
                } else {
                    format_duration(run.duration)
                }),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(1),
                Constraint::Length(6),
                Constraint::Length(20),
                Constraint::Min(20),
                Constraint::Length(12),
                Constraint::Length(14),
                Constraint::Length(9),
                Constraint::Length(8),
            ],
        )
        .header(
            Row::new(vec!["", "Run", "Workflow", "Title", "Status", "By", "Started", "Took"])
                .style(self.theme.header()),
        )
        .row_highlight_style(self.theme.selected_row())
        .block(self.panel(self.stream_title("RUN HISTORY", StreamId::RunHistory), true));
        let mut state = TableState::default()
            .with_selected(Some(self.ui.cursor_of(ViewId::History, RepoPane::Repositories)));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_workflows(&self, frame: &mut Frame, area: Rect) {
        let selected = self.dashboard.selection().workflow_file();
        let rows = self.dashboard.workflows().iter().map(|wf| {
            let marker = if selected == Some(wf.file_name()) { "▸" } else { " " };
            Row::new(vec![
                Cell::from(marker),
                Cell::from(wf.name().to_string()),
                Cell::from(Span::styled(wf.path.clone(), self.theme.dimmed())),
                Cell::from(wf.schema.fields.len().to_string()),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(1),
                Constraint::Min(20),
                Constraint::Min(30),
                Constraint::Length(6),
            ],
        )
        .header(Row::new(vec!["", "Workflow", "File", "Inputs"]).style(self.theme.header()))
        .row_highlight_style(self.theme.selected_row())
        .block(self.panel(
            self.stream_title("DISPATCHABLE WORKFLOWS", StreamId::TriggerableWorkflows),
            true,
        ));
        let mut state = TableState::default()
            .with_selected(Some(self.ui.cursor_of(ViewId::Workflows, RepoPane::Repositories)));
        frame.render_stateful_widget(table, area, &mut state);
    }

    /// Value cell of one form row
    fn form_value(&self, path: &FieldPath, active: bool) -> Line<'static> {
        let Some(form) = self.dashboard.form() else {
            return Line::default();
        };
        let Some(field) = form.fields().iter().find(|f| f.key == path.key) else {
            return Line::default();
        };

        if active {
            if let Some(buffer) = &self.ui.edit_buffer {
                return Line::from(Span::styled(format!("{}▏", buffer), self.theme.accent()));
            }
        }

        let (value, default) = match (&field.kind, &path.subkey) {
            (FieldKind::ObjectMap { entries }, Some(subkey)) => entries
                .iter()
                .find(|e| &e.subkey == subkey)
                .map(|e| (e.value.clone(), e.default.clone()))
                .unwrap_or_default(),
            _ => (field.value.clone(), field.default.clone()),
        };

        if active {
            if let (Some(options), Some(cursor)) = (field.choice_options(), form.choice_cursor()) {
                let spans: Vec<Span<'static>> = options
                    .iter()
                    .enumerate()
                    .map(|(i, option)| {
                        if i == cursor {
                            Span::styled(format!("‹{}› ", option), self.theme.highlight())
                        } else {
                            Span::styled(format!("{} ", option), self.theme.dimmed())
                        }
                    })
                    .collect();
                return Line::from(spans);
            }
        }

        if value.is_empty() {
            Line::from(Span::styled(
                if default.is_empty() {
                    "(unset)".to_string()
                } else {
                    format!("{} (default)", default)
                },
                self.theme.dimmed(),
            ))
        } else {
            Line::from(Span::styled(value, self.theme.text()))
        }
    }

    fn render_trigger(&self, frame: &mut Frame, area: Rect) {
        let Some(form) = self.dashboard.form() else {
            let hint = Paragraph::new(" Select a workflow on the Workflows tab")
                .style(self.theme.dimmed())
                .block(self.panel(" TRIGGER ".to_string(), true));
            frame.render_widget(hint, area);
            return;
        };

        let active = form.active_row();
        let rows = form.rows().iter().enumerate().map(|(i, path)| {
            let field = form.fields().iter().find(|f| f.key == path.key);
            let required = field.map(|f| f.required).unwrap_or(false);
            let label = if required {
                format!("{} *", path)
            } else {
                path.to_string()
            };
            Row::new(vec![
                Cell::from(label),
                Cell::from(Span::styled(
                    field.map(|f| f.kind_name()).unwrap_or_default(),
                    self.theme.dimmed(),
                )),
                Cell::from(self.form_value(path, active == Some(i))),
                Cell::from(Span::styled(
                    field.map(|f| f.description.clone()).unwrap_or_default(),
                    self.theme.dimmed(),
                )),
            ])
        });

        let branch = self.dashboard.selection().branch().unwrap_or_default();
        let table = Table::new(
            rows,
            [
                Constraint::Length(24),
                Constraint::Length(8),
                Constraint::Min(24),
                Constraint::Min(20),
            ],
        )
        .header(Row::new(vec!["Input", "Type", "Value", "Description"]).style(self.theme.header()))
        .row_highlight_style(self.theme.selected_row())
        .block(self.panel(
            format!(" TRIGGER {} on {} ", form.workflow_name(), branch),
            true,
        ));
        let mut state = TableState::default().with_selected(active);
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_info(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![Line::from(Span::styled(" Streams", self.theme.header()))];
        for stream in StreamId::ALL {
            let (text, style) = match self.dashboard.stream_status(stream) {
                StreamStatus::Idle => ("idle".to_string(), self.theme.dimmed()),
                StreamStatus::Fetching => ("fetching".to_string(), self.theme.accent()),
                StreamStatus::Ready => ("ready".to_string(), self.theme.success()),
                StreamStatus::Empty => ("empty".to_string(), self.theme.dimmed()),
                StreamStatus::Failed(failure) => (
                    format!("failed [{}] {}", failure.code, failure.message),
                    self.theme.error(),
                ),
            };
            lines.push(Line::from(vec![
                Span::raw(format!("   {:<14}", stream.label())),
                Span::styled(format!("gen {:<5}", self.dashboard.generation(stream)), self.theme.dimmed()),
                Span::styled(text, style),
            ]));
        }

        lines.push(Line::default());
        lines.push(Line::from(Span::styled(" Live mode", self.theme.header())));
        lines.push(Line::from(format!(
            "   {} (every {}s)",
            if self.dashboard.is_live() { "on" } else { "off" },
            self.dashboard.poll_interval().as_secs()
        )));

        let locked: Vec<&str> = self
            .dashboard
            .gate()
            .locked()
            .iter()
            .map(|v| v.title())
            .collect();
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(" Locked tabs", self.theme.header())));
        lines.push(Line::from(format!(
            "   {}",
            if locked.is_empty() {
                "none".to_string()
            } else {
                locked.join(", ")
            }
        )));

        let paragraph = Paragraph::new(lines).block(self.panel(" INFO ".to_string(), true));
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let line = if let Some(notice) = &self.ui.notice {
            Line::from(Span::styled(format!(" {}", notice), self.theme.warning()))
        } else if let Some(status) = self.dashboard.status_line() {
            Line::from(Span::styled(
                format!(" {}", status.text),
                self.theme.status(status.level),
            ))
        } else {
            Line::default()
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    /// Render footer
    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let keys: &[(&str, &str)] = match self.ui.tab {
            _ if self.ui.is_editing() => &[("[Enter]", " save  "), ("[Esc]", " discard")],
            ViewId::Repositories => &[("[Enter]", " select  "), ("[←→]", " pane  ")],
            ViewId::History => &[
                ("[f]", " rerun failed  "),
                ("[R]", " rerun  "),
                ("[c]", " cancel  "),
                ("[o]", " logs  "),
            ],
            ViewId::Workflows => &[("[Enter]", " open form  ")],
            ViewId::Trigger => &[("[Enter]", " edit  "), ("[←→]", " choice  "), ("[d]", " dispatch  ")],
            ViewId::Info => &[],
        };

        let mut spans = vec![
            Span::styled(" [q]", self.theme.accent()),
            Span::styled("uit  ", self.theme.dimmed()),
            Span::styled("[Tab]", self.theme.accent()),
            Span::styled(" view  ", self.theme.dimmed()),
            Span::styled("[r]", self.theme.accent()),
            Span::styled("efresh  ", self.theme.dimmed()),
            Span::styled("[l]", self.theme.accent()),
            Span::styled("ive  ", self.theme.dimmed()),
        ];
        for (key, label) in keys {
            spans.push(Span::styled(*key, self.theme.accent()));
            spans.push(Span::styled(*label, self.theme.dimmed()));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
