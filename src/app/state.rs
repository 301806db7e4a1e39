use std::sync::Arc;

use time::OffsetDateTime;

use crate::index::{Index, Record};
use crate::remote::FetchError;
use crate::search::matching_positions;
use crate::tutorial::{TutorialFlagStore, TUTORIAL_PASSED_KEY};
use crate::viewer::{reduce, Effect, EditOp, ViewerAction, ViewerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    List,
    Document,
    Notes,
}

#[derive(Debug, Clone)]
pub enum IndexState {
    Loading,
    Ready(Index),
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub active: bool,
    pub query: String,
}

pub struct AppState {
    pub focus: FocusPane,
    pub index: IndexState,
    pub search: SearchState,
    pub status_message: Option<String>,
    /// Positions into the index of the records matching the query.
    visible: Vec<usize>,
    selected: usize,
    viewer: ViewerState,
    editing: bool,
    last_export: Option<OffsetDateTime>,
    tutorial: Arc<dyn TutorialFlagStore>,
}

impl AppState {
    pub fn new(viewer: ViewerState, tutorial: Arc<dyn TutorialFlagStore>) -> Self {
        Self {
            focus: FocusPane::List,
            index: IndexState::Loading,
            search: SearchState::default(),
            status_message: None,
            visible: Vec::new(),
            selected: 0,
            viewer,
            editing: false,
            last_export: None,
            tutorial,
        }
    }

    pub fn begin_index_load(&mut self) {
        self.index = IndexState::Loading;
        self.visible.clear();
        self.selected = 0;
        self.set_status_message(Some("Loading gazette index…"));
    }

    pub fn on_index_loaded(&mut self, result: Result<Index, FetchError>) {
        match result {
            Ok(index) => {
                let message = match index.dropped_by_filter() {
                    0 => format!("Loaded {} entries", index.len()),
                    hidden => format!(
                        "Loaded {} entries ({hidden} outside the category filter)",
                        index.len()
                    ),
                };
                self.index = IndexState::Ready(index);
                self.recompute_visible();
                self.set_status_message(Some(message));
            }
            Err(err) => {
                let message = err.to_string();
                self.set_status_message(Some(format!(
                    "Index failed: {message} (r to retry)"
                )));
                self.index = IndexState::Failed(message);
                self.visible.clear();
                self.selected = 0;
            }
        }
    }

    pub fn index(&self) -> Option<&Index> {
        match &self.index {
            IndexState::Ready(index) => Some(index),
            _ => None,
        }
    }

    pub fn is_index_failed(&self) -> bool {
        matches!(self.index, IndexState::Failed(_))
    }

    pub fn visible_records(&self) -> Vec<&Record> {
        let Some(index) = self.index() else {
            return Vec::new();
        };
        self.visible
            .iter()
            .filter_map(|&position| index.get(position))
            .collect()
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn selected_position(&self) -> Option<usize> {
        if self.visible.is_empty() {
            None
        } else {
            Some(self.selected)
        }
    }

    pub fn selected_record(&self) -> Option<&Record> {
        let position = *self.visible.get(self.selected)?;
        self.index()?.get(position)
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let last = self.visible.len() as isize - 1;
        let next = (self.selected as isize + delta).clamp(0, last);
        self.selected = next as usize;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::List => FocusPane::Document,
            FocusPane::Document => FocusPane::Notes,
            FocusPane::Notes => FocusPane::List,
        };
        if self.focus != FocusPane::Notes {
            self.editing = false;
        }
    }

    pub fn begin_search(&mut self) {
        self.search.active = true;
        self.focus = FocusPane::List;
    }

    pub fn cancel_search(&mut self) {
        self.search.active = false;
        if !self.search.query.is_empty() {
            self.search.query.clear();
            self.recompute_visible();
        }
    }

    pub fn finish_search(&mut self) {
        self.search.active = false;
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.search.query.push(ch);
        self.recompute_visible();
    }

    pub fn pop_search_char(&mut self) {
        if self.search.query.pop().is_some() {
            self.recompute_visible();
        }
    }

    pub fn search_query(&self) -> &str {
        &self.search.query
    }

    pub fn is_search_active(&self) -> bool {
        self.search.active
    }

    pub fn begin_editing(&mut self) {
        self.focus = FocusPane::Notes;
        self.editing = true;
    }

    pub fn stop_editing(&mut self) {
        self.editing = false;
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn viewer(&self) -> &ViewerState {
        &self.viewer
    }

    /// Runs the viewer reducer and returns the effect the caller must start.
    pub fn dispatch(&mut self, action: ViewerAction) -> Option<Effect> {
        self.apply(action).0
    }

    pub fn select_current(&mut self) -> Option<Effect> {
        let record = self.selected_record()?.clone();
        self.dispatch(ViewerAction::Select(record))
    }

    /// Applies an editor operation; false when it changed nothing.
    pub fn edit(&mut self, op: EditOp) -> bool {
        self.apply(ViewerAction::Edit(op)).1
    }

    fn apply(&mut self, action: ViewerAction) -> (Option<Effect>, bool) {
        let paging = matches!(action, ViewerAction::NextPage | ViewerAction::PreviousPage);
        let transition = reduce(std::mem::take(&mut self.viewer), action);
        self.viewer = transition.state;
        if paging && transition.applied {
            self.tutorial.set(TUTORIAL_PASSED_KEY);
        }
        (transition.effect, transition.applied)
    }

    /// Paging hint shows while a document is open and the user has never paged.
    pub fn show_tutorial_hint(&self) -> bool {
        self.viewer().document().is_some() && !self.tutorial.get(TUTORIAL_PASSED_KEY)
    }

    pub fn export_title(&self) -> Option<&str> {
        self.viewer()
            .selected()
            .filter(|record| !record.is_placeholder())
            .map(|record| record.title.as_str())
    }

    pub fn record_export(&mut self, at: OffsetDateTime) {
        self.last_export = Some(at);
        self.dispatch(ViewerAction::MarkdownExported);
    }

    pub fn last_export(&self) -> Option<OffsetDateTime> {
        self.last_export
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
    }

    fn recompute_visible(&mut self) {
        let selected_id = self.selected_record().map(|record| record.id.clone());
        self.visible = match self.index() {
            Some(index) => matching_positions(index.records(), &self.search.query),
            None => Vec::new(),
        };
        let keep = selected_id.and_then(|id| {
            let index = self.index()?;
            self.visible
                .iter()
                .position(|&position| index.get(position).map(|r| r.id == id).unwrap_or(false))
        });
        self.selected = keep.unwrap_or(0);
    }
}
