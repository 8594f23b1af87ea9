use ratatui::layout::Rect;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use unicode_width::UnicodeWidthChar;

use super::theme::*;
use crate::app::App;
use crate::session::Speaker;

pub fn render_history(f: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER_IDLE))
        .title(Span::styled("Conversation", Style::default().fg(FG_PRIMARY)))
        .style(Style::default().bg(BG_PANEL));
    let inner = block.inner(area);
    let wrap_width = inner.width.max(1) as usize;

    let mut lines: Vec<Line> = Vec::new();
    if !app.settings.has_api_key() {
        push_wrapped_line(
            &mut lines,
            "Add your OpenAI API key to use the chatbot",
            Style::default().fg(ERROR_TEXT),
            wrap_width,
        );
    }

    for entry in app.session.transcript().entries() {
        let (label, label_color, text_style) = match entry.speaker {
            Speaker::User => ("You:", USER_LABEL, Style::default().fg(FG_PRIMARY)),
            Speaker::Assistant if entry.text.starts_with("Error: ") => {
                ("Assistant:", ASSISTANT_LABEL, Style::default().fg(ERROR_TEXT))
            }
            Speaker::Assistant => ("Assistant:", ASSISTANT_LABEL, Style::default().fg(FG_DIM)),
        };
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(label_color).add_modifier(Modifier::BOLD),
        )));
        if entry.text.is_empty() {
            push_wrapped_line(&mut lines, "", text_style, wrap_width);
        } else {
            for line in entry.text.lines() {
                push_wrapped_line(&mut lines, line, text_style, wrap_width);
            }
        }
    }

    if app.is_thinking() {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(
            "Thinking...",
            Style::default().fg(FG_DIM).add_modifier(Modifier::ITALIC),
        )));
    }

    let top = scroll_offset(lines.len(), inner.height, app.chat_scroll);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((top, 0));
    f.render_widget(paragraph, area);
}

pub fn render_input(f: &mut Frame<'_>, app: &App, area: Rect) {
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(
            Style::default()
                .fg(BORDER_FOCUS)
                .add_modifier(Modifier::BOLD),
        )
        .title(Span::styled(
            "Ask a question (Enter to send)",
            Style::default().fg(FG_PRIMARY),
        ))
        .style(Style::default().bg(BG_PANEL));
    let inner = input_block.inner(area);

    let line = if app.input.is_empty() {
        Line::from(Span::styled(
            "Ask a question about your data…",
            Style::default().fg(FG_DIM),
        ))
    } else {
        Line::from(Span::styled(
            app.input.buffer().to_string(),
            Style::default().fg(FG_PRIMARY),
        ))
    };

    let width = inner.width.max(1);
    let cursor_col = app.input.cursor_column();
    let horizontal = cursor_col.saturating_sub(width.saturating_sub(1));

    let paragraph = Paragraph::new(line)
        .block(input_block)
        .style(Style::default().bg(BG_PANEL))
        .scroll((0, horizontal));

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);

    if app.overlay.is_none() {
        f.set_cursor(
            inner.x.saturating_add(cursor_col - horizontal),
            inner.y,
        );
    }
}

/// First visible line so that the newest lines show, moved up by `scroll`.
fn scroll_offset(total_lines: usize, height: u16, scroll: u16) -> u16 {
    let total = total_lines.min(u16::MAX as usize) as u16;
    total.saturating_sub(height).saturating_sub(scroll)
}

fn push_wrapped_line(lines: &mut Vec<Line>, text: &str, style: Style, width: usize) {
    for segment in wrap_to_width(text, width) {
        lines.push(Line::from(Span::styled(segment, style)));
    }
}

fn wrap_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    if text.is_empty() {
        return vec![String::new()];
    }
    let mut result = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1).max(1);
        if current_width + ch_width > width && !current.is_empty() {
            result.push(current);
            current = String::new();
            current_width = 0;
        }
        current.push(ch);
        current_width += ch_width;
    }
    result.push(current);
    result
}
