use crate::document::DocumentPayload;
use crate::index::Record;
use crate::remote::FetchError;

use super::editor::{EditOp, MarkdownBuffer};
use super::pages::PageCursor;

pub type RequestToken = u64;

pub const DRAFT_NOTICE: &str = "This is a draft";

/// User actions and network completions fed to [`reduce`].
#[derive(Debug, Clone)]
pub enum ViewerAction {
    Select(Record),
    DocumentLoaded {
        token: RequestToken,
        payload: DocumentPayload,
    },
    DocumentFailed {
        token: RequestToken,
        error: FetchError,
    },
    DraftLoaded {
        token: RequestToken,
        markdown: String,
    },
    DraftFailed {
        token: RequestToken,
        error: FetchError,
    },
    NextPage,
    PreviousPage,
    TogglePanel,
    Edit(EditOp),
    MarkdownExported,
    DismissMessages,
}

/// Work the caller must start on behalf of the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchDocument {
        token: RequestToken,
        record: Record,
    },
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub state: ViewerState,
    pub effect: Option<Effect>,
    /// False when the action was dropped (stale token, disabled navigation).
    pub applied: bool,
}

impl Transition {
    fn applied(state: ViewerState) -> Self {
        Self {
            state,
            effect: None,
            applied: true,
        }
    }

    fn ignored(state: ViewerState) -> Self {
        Self {
            state,
            effect: None,
            applied: false,
        }
    }
}

/// Everything the document panel and the note editor show.
#[derive(Debug, Clone)]
pub struct ViewerState {
    selected: Option<Record>,
    document: Option<DocumentPayload>,
    loading: bool,
    pages: PageCursor,
    page_window: u32,
    markdown: MarkdownBuffer,
    latest_token: RequestToken,
    list_open: bool,
    error: Option<FetchError>,
    notice: Option<String>,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new(String::new(), 0)
    }
}

impl ViewerState {
    pub fn new(initial_markdown: impl Into<String>, page_window: u32) -> Self {
        Self {
            selected: None,
            document: None,
            loading: false,
            pages: PageCursor::default(),
            page_window,
            markdown: MarkdownBuffer::new(initial_markdown.into()),
            latest_token: 0,
            list_open: true,
            error: None,
            notice: None,
        }
    }

    pub fn selected(&self) -> Option<&Record> {
        self.selected.as_ref()
    }

    pub fn document(&self) -> Option<&DocumentPayload> {
        self.document.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn pages(&self) -> PageCursor {
        self.pages
    }

    /// Pages mounted around the current one.
    pub fn mounted_pages(&self) -> Vec<u32> {
        if self.document.is_none() {
            return Vec::new();
        }
        self.pages.window(self.page_window)
    }

    pub fn markdown(&self) -> &MarkdownBuffer {
        &self.markdown
    }

    pub fn latest_token(&self) -> RequestToken {
        self.latest_token
    }

    pub fn is_list_open(&self) -> bool {
        self.list_open
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    fn is_current(&self, token: RequestToken) -> bool {
        token == self.latest_token
    }

    fn shows(&self, record: &Record) -> bool {
        let same = self
            .selected
            .as_ref()
            .map(|current| current.id == record.id)
            .unwrap_or(false);
        same && (self.document.is_some() || self.loading)
    }
}

/// Applies one action and returns the next state plus any effect to run.
pub fn reduce(state: ViewerState, action: ViewerAction) -> Transition {
    match action {
        ViewerAction::Select(record) => select(state, record),
        ViewerAction::DocumentLoaded { token, payload } => document_loaded(state, token, payload),
        ViewerAction::DocumentFailed { token, error } => document_failed(state, token, error),
        ViewerAction::DraftLoaded { token, markdown } => draft_loaded(state, token, markdown),
        ViewerAction::DraftFailed { token, error } => draft_failed(state, token, error),
        ViewerAction::NextPage => turn_page(state, PageCursor::next),
        ViewerAction::PreviousPage => turn_page(state, PageCursor::previous),
        ViewerAction::TogglePanel => {
            let mut state = state;
            state.list_open = !state.list_open;
            Transition::applied(state)
        }
        ViewerAction::Edit(op) => {
            let mut state = state;
            let changed = state.markdown.apply(op);
            Transition {
                state,
                effect: None,
                applied: changed,
            }
        }
        ViewerAction::MarkdownExported => {
            let mut state = state;
            state.markdown.mark_clean();
            Transition::applied(state)
        }
        ViewerAction::DismissMessages => {
            let mut state = state;
            state.error = None;
            state.notice = None;
            Transition::applied(state)
        }
    }
}

fn select(mut state: ViewerState, record: Record) -> Transition {
    if state.shows(&record) {
        state.list_open = !state.list_open;
        return Transition::applied(state);
    }

    state.latest_token += 1;
    state.loading = true;
    state.document = None;
    state.pages = PageCursor::default();
    state.error = None;
    state.notice = None;
    state.selected = Some(record.clone());
    let token = state.latest_token;
    tracing::debug!(token, id = %record.id, "document requested");
    Transition {
        state,
        effect: Some(Effect::FetchDocument { token, record }),
        applied: true,
    }
}

fn document_loaded(
    mut state: ViewerState,
    token: RequestToken,
    payload: DocumentPayload,
) -> Transition {
    if !state.is_current(token) {
        tracing::debug!(token, latest = state.latest_token, "discarding stale document");
        return Transition::ignored(state);
    }
    state.loading = false;
    state.pages = PageCursor::reset(payload.page_count);
    state.document = Some(payload);
    state.list_open = false;
    Transition::applied(state)
}

fn document_failed(mut state: ViewerState, token: RequestToken, error: FetchError) -> Transition {
    if !state.is_current(token) {
        tracing::debug!(token, latest = state.latest_token, "discarding stale failure");
        return Transition::ignored(state);
    }
    tracing::warn!(token, %error, "document fetch failed");
    state.loading = false;
    state.document = None;
    state.pages = PageCursor::default();
    state.error = Some(error);
    Transition::applied(state)
}

fn draft_loaded(mut state: ViewerState, token: RequestToken, markdown: String) -> Transition {
    if !state.is_current(token) {
        tracing::debug!(token, latest = state.latest_token, "discarding stale draft");
        return Transition::ignored(state);
    }
    state.markdown.replace(markdown);
    state.notice = Some(DRAFT_NOTICE.to_string());
    Transition::applied(state)
}

fn draft_failed(mut state: ViewerState, token: RequestToken, error: FetchError) -> Transition {
    if !state.is_current(token) {
        tracing::debug!(token, latest = state.latest_token, "discarding stale draft failure");
        return Transition::ignored(state);
    }
    tracing::warn!(token, %error, "draft markdown fetch failed");
    state.error = Some(error);
    Transition::applied(state)
}

fn turn_page(mut state: ViewerState, step: fn(&mut PageCursor) -> bool) -> Transition {
    if state.document.is_none() {
        return Transition::ignored(state);
    }
    let moved = step(&mut state.pages);
    Transition {
        state,
        effect: None,
        applied: moved,
    }
}
