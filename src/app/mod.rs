use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;
use time::OffsetDateTime;

use crate::config::AppConfig;
use crate::export::export_markdown;
use crate::remote::GazetteSource;
use crate::tutorial::TutorialFlagStore;
use crate::ui;
use crate::viewer::{EditOp, Effect, ViewerAction, ViewerState};

pub mod state;
mod worker;

pub use state::{AppState, FocusPane, IndexState, SearchState};
pub use worker::{FetchWorker, WorkerEvent};

enum Action {
    Quit,
    SelectNext,
    SelectPrevious,
    OpenSelected,
    NextPage,
    PreviousPage,
    ToggleFocus,
    TogglePanel,
    StartSearch,
    EnterEdit,
    Export,
    RetryIndex,
    Dismiss,
}

pub struct App {
    pub config: Arc<AppConfig>,
    state: AppState,
    list_state: ListState,
    worker: FetchWorker,
    events: Receiver<WorkerEvent>,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(
        config: Arc<AppConfig>,
        source: Arc<dyn GazetteSource>,
        tutorial: Arc<dyn TutorialFlagStore>,
    ) -> Result<Self> {
        let (worker, events) = FetchWorker::new(
            source,
            config.index.clone(),
            config.viewer.demo_document.clone(),
        )
        .context("starting fetch worker")?;
        let viewer = ViewerState::new(
            config.viewer.initial_markdown.clone(),
            config.viewer.page_window,
        );
        let mut app = Self {
            tick_rate: config.tick_rate(),
            config,
            state: AppState::new(viewer, tutorial),
            list_state: ListState::default(),
            worker,
            events,
            should_quit: false,
        };
        app.load_index();
        Ok(app)
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| {
                    self.list_state.select(self.state.selected_position());
                    ui::draw_app(frame, &self.state, &mut self.list_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                if let Event::Key(key) = event::read().context("reading terminal event")? {
                    self.handle_key(key);
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_worker_event(event);
        }
    }

    fn handle_worker_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::IndexLoaded(result) => self.state.on_index_loaded(result),
            WorkerEvent::Viewer(action) => {
                if let Some(effect) = self.state.dispatch(action) {
                    self.run_effect(effect);
                }
            }
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::FetchDocument { token, record } => {
                self.state
                    .set_status_message(Some(format!("Fetching {}…", record.file_name())));
                self.worker.fetch_document(token, record);
            }
        }
    }

    fn load_index(&mut self) {
        self.state.begin_index_load();
        self.worker.load_index();
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.state.is_editing() {
            self.handle_editor_key(key);
            return;
        }

        if self.state.is_search_active() {
            match key.code {
                KeyCode::Esc => {
                    self.state.cancel_search();
                    return;
                }
                KeyCode::Enter => {
                    self.state.finish_search();
                    return;
                }
                KeyCode::Backspace => {
                    self.state.pop_search_char();
                    return;
                }
                KeyCode::Char(ch) if !has_command_modifier(key) => {
                    self.state.push_search_char(ch);
                    return;
                }
                _ => {}
            }
        }

        if let KeyCode::Char(ch) = key.code {
            if has_command_modifier(key) {
                if ch == 'e' && key.modifiers == KeyModifiers::CONTROL {
                    self.handle_action(Action::Export);
                }
                return;
            }
        }

        let action = match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
            KeyCode::Enter => Some(Action::OpenSelected),
            KeyCode::Char('l') | KeyCode::Right => Some(Action::NextPage),
            KeyCode::Char('h') | KeyCode::Left => Some(Action::PreviousPage),
            KeyCode::Tab => Some(Action::ToggleFocus),
            KeyCode::Char('p') => Some(Action::TogglePanel),
            KeyCode::Char('/') => Some(Action::StartSearch),
            KeyCode::Char('e') => Some(Action::EnterEdit),
            KeyCode::Char('r') => Some(Action::RetryIndex),
            KeyCode::Esc => Some(Action::Dismiss),
            _ => None,
        };

        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::SelectNext => self.state.move_selection(1),
            Action::SelectPrevious => self.state.move_selection(-1),
            Action::OpenSelected => {
                if let Some(effect) = self.state.select_current() {
                    self.run_effect(effect);
                }
            }
            Action::NextPage => {
                self.state.dispatch(ViewerAction::NextPage);
            }
            Action::PreviousPage => {
                self.state.dispatch(ViewerAction::PreviousPage);
            }
            Action::ToggleFocus => self.state.toggle_focus(),
            Action::TogglePanel => {
                self.state.dispatch(ViewerAction::TogglePanel);
            }
            Action::StartSearch => self.state.begin_search(),
            Action::EnterEdit => {
                self.state.begin_editing();
                self.state.set_status_message(Some(
                    "Editing notes: Esc exit • Ctrl-e export • Ctrl-z undo • Ctrl-y redo",
                ));
            }
            Action::Export => self.handle_export(),
            Action::RetryIndex => {
                if matches!(self.state.index, IndexState::Loading) {
                    return;
                }
                self.load_index();
            }
            Action::Dismiss => {
                self.state.dispatch(ViewerAction::DismissMessages);
                self.state.clear_status_message();
            }
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let op = match key.code {
            KeyCode::Esc => {
                self.state.stop_editing();
                self.state.set_status_message(Some("Left note editor"));
                return;
            }
            KeyCode::Char('e') if ctrl => {
                self.handle_export();
                return;
            }
            KeyCode::Char('z') if ctrl => EditOp::Undo,
            KeyCode::Char('y') if ctrl => EditOp::Redo,
            KeyCode::Left if ctrl => EditOp::WordLeft,
            KeyCode::Right if ctrl => EditOp::WordRight,
            KeyCode::Left => EditOp::Left,
            KeyCode::Right => EditOp::Right,
            KeyCode::Up => EditOp::Up,
            KeyCode::Down => EditOp::Down,
            KeyCode::Home => EditOp::Home,
            KeyCode::End => EditOp::End,
            KeyCode::Enter => EditOp::Newline,
            KeyCode::Backspace => EditOp::Backspace,
            KeyCode::Delete => EditOp::Delete,
            KeyCode::Tab => {
                self.state.toggle_focus();
                return;
            }
            KeyCode::Char(ch) if !has_command_modifier(key) => EditOp::Insert(ch),
            // Unbound chords stay inside the editor.
            _ => return,
        };
        self.state.edit(op);
    }

    fn handle_export(&mut self) {
        let dir = self.config.export.directory.clone();
        let title = self.state.export_title().map(str::to_owned);
        let text = self.state.viewer().markdown().text().to_owned();
        match export_markdown(&dir, title.as_deref(), &text) {
            Ok(path) => {
                self.state.record_export(OffsetDateTime::now_utc());
                self.state
                    .set_status_message(Some(format!("Exported to {}", path.display())));
            }
            Err(err) => {
                tracing::error!(?err, "markdown export failed");
                self.state
                    .set_status_message(Some(format!("Export failed: {err:#}")));
            }
        }
    }
}

fn has_command_modifier(key: KeyEvent) -> bool {
    key.modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}
