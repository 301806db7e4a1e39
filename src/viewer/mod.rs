//! What the document panel and note editor display, driven by pure reducers.

mod editor;
mod pages;
mod state;

pub use editor::{EditOp, MarkdownBuffer};
pub use pages::{page_window, PageCursor};
pub use state::{reduce, Effect, RequestToken, Transition, ViewerAction, ViewerState, DRAFT_NOTICE};
