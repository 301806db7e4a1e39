//! The note buffer behind the notes pane.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

const HISTORY_LIMIT: usize = 200;

/// Keyboard-level edits applied to the markdown buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Insert(char),
    Newline,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    WordLeft,
    WordRight,
    Undo,
    Redo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Revision {
    text: String,
    cursor: usize,
}

/// Markdown note with a byte cursor that always sits on a grapheme boundary.
///
/// Every text-changing op records one undo step, except that a run of typed
/// word characters collapses into a single step. The buffer is dirty while
/// its text differs from the last loaded or exported text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownBuffer {
    text: String,
    cursor: usize,
    baseline: String,
    undo: Vec<Revision>,
    redo: Vec<Revision>,
    typing: bool,
}

impl MarkdownBuffer {
    pub fn new(text: String) -> Self {
        Self {
            cursor: text.len(),
            baseline: text.clone(),
            text,
            undo: Vec::new(),
            redo: Vec::new(),
            typing: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_dirty(&self) -> bool {
        self.text != self.baseline
    }

    /// Loads a fetched draft; history from the previous note is discarded.
    pub fn replace(&mut self, text: String) {
        *self = Self::new(text);
    }

    /// Records the current text as exported. Undo history survives.
    pub fn mark_clean(&mut self) {
        self.baseline.clone_from(&self.text);
        self.typing = false;
    }

    /// Returns whether the op changed the text or the cursor.
    pub fn apply(&mut self, op: EditOp) -> bool {
        let at = self.cursor;
        match op {
            EditOp::Insert(ch) => {
                let mut encoded = [0u8; 4];
                let word_char = !ch.is_whitespace();
                self.splice(at..at, ch.encode_utf8(&mut encoded), word_char)
            }
            EditOp::Newline => self.splice(at..at, "\n", false),
            EditOp::Backspace => self.splice(prev_boundary(&self.text, at)..at, "", false),
            EditOp::Delete => self.splice(at..next_boundary(&self.text, at), "", false),
            EditOp::Undo => self.travel(true),
            EditOp::Redo => self.travel(false),
            motion => {
                let target = self.motion_target(motion);
                self.typing = false;
                if target == self.cursor {
                    return false;
                }
                self.cursor = target;
                true
            }
        }
    }

    fn motion_target(&self, motion: EditOp) -> usize {
        let text = self.text.as_str();
        let at = self.cursor;
        let line = line_bounds(text, at);
        match motion {
            EditOp::Left => prev_boundary(text, at),
            EditOp::Right => next_boundary(text, at),
            EditOp::Home => line.start,
            EditOp::End => line.end,
            EditOp::Up if line.start == 0 => 0,
            EditOp::Up => {
                let column = text[line.start..at].graphemes(true).count();
                offset_at_column(text, line_bounds(text, line.start - 1), column)
            }
            EditOp::Down if line.end == text.len() => text.len(),
            EditOp::Down => {
                let column = text[line.start..at].graphemes(true).count();
                offset_at_column(text, line_bounds(text, line.end + 1), column)
            }
            EditOp::WordLeft => word_starts(text)
                .filter(|&start| start < at)
                .last()
                .unwrap_or(0),
            EditOp::WordRight => word_starts(text)
                .find(|&start| start > at)
                .unwrap_or(text.len()),
            _ => at,
        }
    }

    /// Replaces `range` with `insert` and leaves the cursor after it.
    fn splice(&mut self, range: Range<usize>, insert: &str, typing: bool) -> bool {
        if range.is_empty() && insert.is_empty() {
            return false;
        }
        if !(typing && self.typing) {
            let snapshot = self.snapshot();
            self.undo.push(snapshot);
            if self.undo.len() > HISTORY_LIMIT {
                self.undo.remove(0);
            }
        }
        self.redo.clear();
        self.text.replace_range(range.clone(), insert);
        self.cursor = range.start + insert.len();
        self.typing = typing;
        true
    }

    fn travel(&mut self, backward: bool) -> bool {
        let (from, to) = if backward {
            (&mut self.undo, &mut self.redo)
        } else {
            (&mut self.redo, &mut self.undo)
        };
        let Some(revision) = from.pop() else {
            return false;
        };
        to.push(Revision {
            text: std::mem::replace(&mut self.text, revision.text),
            cursor: self.cursor,
        });
        self.cursor = revision.cursor;
        self.typing = false;
        true
    }

    fn snapshot(&self) -> Revision {
        Revision {
            text: self.text.clone(),
            cursor: self.cursor,
        }
    }
}

fn prev_boundary(text: &str, at: usize) -> usize {
    text[..at]
        .grapheme_indices(true)
        .next_back()
        .map_or(0, |(offset, _)| offset)
}

fn next_boundary(text: &str, at: usize) -> usize {
    text[at..]
        .graphemes(true)
        .next()
        .map_or(at, |grapheme| at + grapheme.len())
}

fn line_bounds(text: &str, at: usize) -> Range<usize> {
    let start = text[..at].rfind('\n').map_or(0, |newline| newline + 1);
    let end = text[at..].find('\n').map_or(text.len(), |newline| at + newline);
    start..end
}

fn offset_at_column(text: &str, line: Range<usize>, column: usize) -> usize {
    text[line.clone()]
        .grapheme_indices(true)
        .nth(column)
        .map_or(line.end, |(offset, _)| line.start + offset)
}

/// Byte offsets where a word (a segment with a letter or digit) begins.
fn word_starts(text: &str) -> impl Iterator<Item = usize> + '_ {
    text.split_word_bound_indices()
        .filter(|(_, segment)| segment.chars().any(char::is_alphanumeric))
        .map(|(offset, _)| offset)
}
