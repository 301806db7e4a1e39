use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use regex::Regex;
use time::{macros::format_description, OffsetDateTime};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{AppState, FocusPane, IndexState};
use crate::highlight::{build_highlight_regex, split_matches};
use crate::viewer::{MarkdownBuffer, ViewerState};

const DOCUMENT_PANEL_HEIGHT: u16 = 11;

pub fn draw_app(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(frame.size());

    let viewer = state.viewer();
    let (list_area, detail_area) = if viewer.is_list_open() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(vertical[0]);
        (Some(columns[0]), columns[1])
    } else {
        (None, vertical[0])
    };

    if let Some(area) = list_area {
        draw_index_list(frame, state, list_state, area);
    }

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(DOCUMENT_PANEL_HEIGHT), Constraint::Min(3)])
        .split(detail_area);
    draw_document_panel(frame, state, right[0]);
    draw_notes(frame, state, right[1]);

    let status = Paragraph::new(build_status_line(state)).style(Style::default().fg(Color::Gray));
    frame.render_widget(status, vertical[1]);
}

fn pane_style(state: &AppState, pane: FocusPane) -> Style {
    if state.focus == pane {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn draw_index_list(frame: &mut Frame, state: &AppState, list_state: &mut ListState, area: Rect) {
    let highlight_regex = build_highlight_regex(state.search_query());
    let highlight_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let open_id = state.viewer().selected().map(|record| record.id.as_str());

    let mut items = Vec::new();
    for record in state.visible_records() {
        let mut title_spans = Vec::new();
        if open_id == Some(record.id.as_str()) {
            title_spans.push(Span::styled(
                "● ",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ));
        }
        if record.draft {
            title_spans.push(Span::styled(
                "✎ ",
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        title_spans.extend(highlight_line(
            &record.title,
            highlight_regex.as_ref(),
            highlight_style,
            Style::default().add_modifier(Modifier::BOLD),
        ));
        let meta = if record.is_placeholder() {
            "demo document".to_string()
        } else {
            format!("{} • {} • {}", record.date, record.category, record.file_name())
        };
        items.push(ListItem::new(vec![
            Line::from(title_spans),
            Line::from(Span::styled(meta, Style::default().fg(Color::Gray))),
        ]));
    }

    if items.is_empty() {
        let message = match &state.index {
            IndexState::Loading => "Loading gazette index…".to_string(),
            IndexState::Failed(err) => format!("Could not load index: {err}. Press `r` to retry."),
            IndexState::Ready(_) => "No titles match the search.".to_string(),
        };
        items.push(ListItem::new(message));
    }

    let title = match state.index() {
        Some(index) if index.draft_count() > 0 => {
            format!("Ratchakitcha ({} drafts)", index.draft_count())
        }
        _ => "Ratchakitcha".to_string(),
    };
    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(pane_style(state, FocusPane::List)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, area, list_state);
}

fn draw_document_panel(frame: &mut Frame, state: &AppState, area: Rect) {
    let text = document_lines(state.viewer(), state.show_tutorial_hint());
    let panel = Paragraph::new(text)
        .block(
            Block::default()
                .title("Document")
                .borders(Borders::ALL)
                .border_style(pane_style(state, FocusPane::Document)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(Clear, area);
    frame.render_widget(panel, area);
}

fn document_lines(viewer: &ViewerState, tutorial_hint: bool) -> Text<'static> {
    let mut lines = Vec::new();
    if let Some(record) = viewer.selected() {
        lines.push(Line::from(Span::styled(
            record.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        if !record.is_placeholder() {
            lines.push(Line::from(Span::styled(
                format!(
                    "{} • เล่ม {} ตอน {} • หน้า {}",
                    record.date, record.volume, record.part, record.page
                ),
                Style::default().fg(Color::Gray),
            )));
        }
    }

    if let Some(notice) = viewer.notice() {
        lines.push(Line::from(Span::styled(
            notice.to_string(),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )));
    }
    if let Some(error) = viewer.error() {
        lines.push(Line::from(Span::styled(
            format!("! {error}"),
            Style::default().fg(Color::Red),
        )));
    }

    if viewer.is_loading() {
        lines.push(Line::from(Span::styled(
            "Loading document…",
            Style::default().fg(Color::Yellow),
        )));
    } else if let Some(payload) = viewer.document() {
        lines.push(Line::from(format!(
            "{} • {} bytes • data URI {} chars",
            payload.mime,
            payload.byte_len,
            payload.data_uri.len()
        )));
        let pages = viewer.pages();
        let mut page_spans = vec![
            Span::raw("Page "),
            Span::styled(pages.label(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
        ];
        for page in viewer.mounted_pages() {
            let style = if page == pages.current() {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            page_spans.push(Span::styled(format!(" {page} "), style));
        }
        lines.push(Line::from(page_spans));
        if tutorial_hint {
            lines.push(Line::from(Span::styled(
                "Tip: press ←/→ (h/l) to turn pages",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
    } else if viewer.selected().is_none() {
        lines.push(Line::from("Select a gazette entry and press Enter."));
    }

    Text::from(lines)
}

fn draw_notes(frame: &mut Frame, state: &AppState, area: Rect) {
    let markdown = state.viewer().markdown();
    let title = match (state.is_editing(), markdown.is_dirty()) {
        (true, true) => "Notes [EDIT*]",
        (true, false) => "Notes [EDIT]",
        (false, true) => "Notes *",
        (false, false) => "Notes",
    };
    let body: Vec<Line<'static>> = if markdown.text().is_empty() {
        vec![Line::from("")]
    } else {
        markdown
            .text()
            .split('\n')
            .map(|line| Line::from(line.to_string()))
            .collect()
    };
    let notes = Paragraph::new(Text::from(body))
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(pane_style(state, FocusPane::Notes)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(Clear, area);
    frame.render_widget(notes, area);

    if state.is_editing() {
        if let Some((x, y)) = editor_cursor_screen_position(markdown, area) {
            frame.set_cursor(x, y);
        }
    }
}

fn build_status_line(state: &AppState) -> Text<'static> {
    let total = state.visible_len();
    let position = match state.selected_position() {
        Some(selected) => format!("{}/{}", selected + 1, total),
        None => "0/0".to_string(),
    };
    let focus = match state.focus {
        FocusPane::List => "List",
        FocusPane::Document => "Document",
        FocusPane::Notes => "Notes",
    };

    let mut spans = vec![
        Span::raw(format!("Entries: {total}")),
        Span::raw(" | Selected: "),
        Span::styled(position, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" | Focus: "),
        Span::styled(focus, Style::default().add_modifier(Modifier::BOLD)),
    ];

    if state.is_search_active() || !state.search_query().is_empty() {
        let label_style = if state.is_search_active() {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::raw(" | Search "));
        spans.push(Span::styled("/", label_style));
        if state.search_query().is_empty() {
            spans.push(Span::styled(
                "(type to search)",
                Style::default().fg(Color::DarkGray),
            ));
        } else {
            spans.push(Span::styled(
                state.search_query().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }
        if state.is_search_active() {
            spans.push(Span::styled(" ▌", Style::default().fg(Color::Cyan)));
        }
    }

    if let Some(at) = state.last_export() {
        spans.push(Span::raw(" | Notes: saved "));
        spans.push(Span::styled(
            format_time_short(at),
            Style::default().fg(Color::Gray),
        ));
    }

    if let Some(message) = &state.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            message.clone(),
            Style::default().fg(Color::Cyan),
        ));
    }

    let keys = if state.is_editing() {
        "Keys: Esc stop editing • Ctrl-e export • Ctrl-z undo • Ctrl-y redo • Ctrl-←/→ word jump"
    } else {
        "Keys: j/k move • Enter open • h/l page • / search • p panel • e notes • Ctrl-e export • r reload • q quit"
    };
    Text::from(vec![
        Line::from(spans),
        Line::from(Span::styled(keys, Style::default().fg(Color::DarkGray))),
    ])
}

fn format_time_short(dt: OffsetDateTime) -> String {
    dt.format(&format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| dt.unix_timestamp().to_string())
}

fn highlight_line(
    text: &str,
    regex: Option<&Regex>,
    highlight_style: Style,
    base_style: Style,
) -> Vec<Span<'static>> {
    split_matches(text, regex)
        .into_iter()
        .map(|(segment, matched)| {
            let style = if matched { highlight_style } else { base_style };
            Span::styled(segment.to_string(), style)
        })
        .collect()
}

fn editor_cursor_screen_position(markdown: &MarkdownBuffer, area: Rect) -> Option<(u16, u16)> {
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    if inner_width == 0 || inner_height == 0 {
        return None;
    }

    let mut row = 0u16;
    let mut col = 0usize;
    let width_limit = inner_width as usize;
    let buffer = markdown.text();
    let cursor = markdown.cursor().min(buffer.len());

    for grapheme in buffer[..cursor].graphemes(true) {
        if grapheme == "\n" {
            row += 1;
            col = 0;
            continue;
        }
        let glyph_width = UnicodeWidthStr::width(grapheme);
        if glyph_width > 0 && col + glyph_width > width_limit {
            row += 1;
            col = 0;
        }
        col += glyph_width;
    }

    let row = row.min(inner_height - 1);
    let col = col.min(width_limit - 1) as u16;
    Some((area.x + 1 + col, area.y + 1 + row))
}
