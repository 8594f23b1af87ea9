//! Read-only rendering of [`App`]. Nothing here mutates state; scrolling and
//! selection live on `App` and are only read.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, OverlayState};
use crate::session::SessionState;
use crate::upload;

mod chat;
mod data;
mod theme;
use theme::*;

const SIDEBAR_WIDTH: u16 = 32;

const KEY_HINTS: [(&str, &str); 8] = [
    ("Ctrl+O", "open CSV file"),
    ("Ctrl+D", "load sample data"),
    ("Ctrl+L", "response language"),
    ("Ctrl+S", "sample questions"),
    ("Ctrl+X", "clear file"),
    ("Ctrl+K", "clear chat"),
    ("PgUp/Dn", "scroll chat"),
    ("Ctrl+Q", "quit"),
];

fn cell_width(text: &str) -> u16 {
    UnicodeWidthStr::width(text).min(u16::MAX as usize) as u16
}

pub fn render(f: &mut Frame<'_>, app: &App) {
    let size = f.size();
    if size.width < 80 || size.height < 24 {
        let block = Paragraph::new("Terminal too small, resize to at least 80x24.")
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .title("YANCCA")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(FG_PRIMARY).bg(MENU_BG)),
            )
            .style(Style::default().fg(FG_PRIMARY).bg(BG_PRIMARY));
        f.render_widget(block, size);
        return;
    }

    let base = Block::default().style(Style::default().bg(BG_PRIMARY));
    f.render_widget(base, size);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(size);
    let title_area = vertical[0];
    let workspace = vertical[1];
    let status_area = vertical[2];

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(40)])
        .split(workspace);

    render_title_bar(f, app, title_area);
    render_sidebar(f, app, columns[0]);
    render_main(f, app, columns[1]);
    render_status_bar(f, app, status_area);

    if let Some(overlay) = app.overlay.as_ref() {
        render_overlay(f, app, overlay);
    }
}

fn render_title_bar(f: &mut Frame<'_>, app: &App, area: Rect) {
    f.render_widget(Clear, area);
    let title = " YANCCA: Yet Another Csv Chatbot Assistant";
    let file = app
        .session
        .source_name()
        .map(|name| format!("{} ", name))
        .unwrap_or_default();
    let padding = area
        .width
        .saturating_sub(cell_width(title))
        .saturating_sub(cell_width(&file));
    let line = Line::from(vec![
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" ".repeat(padding as usize)),
        Span::raw(file),
    ]);
    let bar = Paragraph::new(line).style(Style::default().fg(BAR_TEXT).bg(BAR_BG));
    f.render_widget(bar, area);
}

fn render_sidebar(f: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER_IDLE))
        .title(Span::styled("Configuration", Style::default().fg(FG_PRIMARY)))
        .style(Style::default().bg(BG_PANEL));

    let label = Style::default().fg(FG_DIM);
    let value = Style::default().fg(FG_PRIMARY);

    let mut lines = vec![
        Line::from(Span::styled("Response language", label)),
        Line::from(Span::styled(app.session.locale().to_string(), value)),
        Line::default(),
    ];

    lines.push(if app.settings.has_api_key() {
        Line::from(Span::styled("API Key loaded", Style::default().fg(READY_TEXT)))
    } else {
        Line::from(Span::styled("No API Key found", Style::default().fg(ERROR_TEXT)))
    });
    lines.push(Line::from(Span::styled(
        format!("Model: {}", app.settings.openai_model),
        label,
    )));
    lines.push(Line::default());

    lines.push(Line::from(Span::styled("Current file", label)));
    lines.push(Line::from(Span::styled(
        app.session.source_name().unwrap_or("none").to_string(),
        value,
    )));
    lines.push(Line::from(Span::styled(
        format!("Chat history: {} messages", app.session.transcript().len()),
        value,
    )));
    lines.push(agent_status_line(app));
    lines.push(Line::default());

    for (keys, action) in KEY_HINTS {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<9}", keys), Style::default().fg(BORDER_FOCUS)),
            Span::styled(action, label),
        ]));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn agent_status_line(app: &App) -> Line<'static> {
    match app.session.state() {
        SessionState::Empty => Line::from(Span::styled(
            "Agent: waiting for data",
            Style::default().fg(FG_DIM),
        )),
        SessionState::Ready => Line::from(Span::styled(
            format!("Agent ready ({})", app.session.locale()),
            Style::default().fg(READY_TEXT),
        )),
        SessionState::Loaded if app.agent_failure.is_some() => Line::from(Span::styled(
            "Agent failed, ask to retry",
            Style::default().fg(ERROR_TEXT),
        )),
        SessionState::Loaded if app.settings.has_api_key() => Line::from(Span::styled(
            "Agent: preparing...",
            Style::default().fg(FG_DIM),
        )),
        SessionState::Loaded => Line::from(Span::styled(
            "Agent: needs an API key",
            Style::default().fg(FG_DIM),
        )),
    }
}

fn render_main(f: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(table) = app.session.table() else {
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);
        render_upload_hint(f, app, sections[0]);
        chat::render_input(f, app, sections[1]);
        return;
    };

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(data::PREVIEW_HEIGHT),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(area);

    data::render_metrics(f, app, table, sections[0]);
    data::render_preview(f, table, sections[1]);
    chat::render_history(f, app, sections[2]);
    chat::render_input(f, app, sections[3]);
}

fn render_upload_hint(f: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER_IDLE))
        .style(Style::default().bg(BG_PANEL));
    let dim = Style::default().fg(FG_DIM);
    let mut lines = vec![
        Line::from(Span::styled(
            "Upload a CSV file to get started",
            Style::default().fg(FG_PRIMARY).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            format!("Ctrl+O picks a CSV file under {}", app.scan_root.display()),
            dim,
        )),
        Line::from(Span::styled(
            "Ctrl+D loads a 50-row sample dataset to try things out",
            dim,
        )),
    ];
    if !app.settings.has_api_key() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Add your OpenAI API key to use the chatbot",
            Style::default().fg(ERROR_TEXT),
        )));
    }
    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame<'_>, app: &App, area: Rect) {
    f.render_widget(Clear, area);
    let line = Line::from(vec![
        Span::raw(" "),
        Span::styled(
            app.notice.text.clone(),
            Style::default().fg(notice_color(app.notice.level)),
        ),
    ]);
    let paragraph = Paragraph::new(line)
        .style(Style::default().fg(BAR_TEXT).bg(BAR_BG))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

fn render_overlay(f: &mut Frame<'_>, app: &App, overlay: &OverlayState) {
    match overlay {
        OverlayState::Language(picker) => {
            let current = app.session.locale();
            let items = picker
                .items
                .iter()
                .map(|locale| {
                    let marker = if *locale == current { "* " } else { "  " };
                    format!("{}{}", marker, locale)
                })
                .collect();
            render_list_overlay(f, "Response language", items, picker.selected, "");
        }
        OverlayState::Files(picker) => {
            let items = picker
                .items
                .iter()
                .map(|path| {
                    path.strip_prefix(&app.scan_root)
                        .map(|relative| relative.display().to_string())
                        .unwrap_or_else(|_| upload::display_name(path))
                })
                .collect();
            render_list_overlay(
                f,
                "Open CSV file",
                items,
                picker.selected,
                "No CSV files found",
            );
        }
        OverlayState::SampleQuestions(picker) => {
            let items = picker.items.iter().map(|q| q.to_string()).collect();
            render_list_overlay(f, "Sample questions", items, picker.selected, "");
        }
    }
}

fn render_list_overlay(
    f: &mut Frame<'_>,
    title: &str,
    entries: Vec<String>,
    selected: usize,
    empty_text: &str,
) {
    let area = centered_rect(50, 60, f.size());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(BAR_TEXT).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MENU_BORDER))
        .style(Style::default().bg(MENU_BG));
    f.render_widget(block.clone(), area);
    let inner = block.inner(area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(inner);

    let mut list_state = ListState::default();
    let items: Vec<ListItem> = if entries.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            empty_text.to_string(),
            Style::default().fg(FG_DIM),
        )))]
    } else {
        list_state.select(Some(selected.min(entries.len() - 1)));
        entries
            .into_iter()
            .map(|entry| {
                ListItem::new(Line::from(Span::styled(
                    entry,
                    Style::default().fg(FG_PRIMARY),
                )))
            })
            .collect()
    };

    let list = List::new(items)
        .style(Style::default().bg(MENU_BG))
        .highlight_style(
            Style::default()
                .bg(MENU_HIGHLIGHT_BG)
                .fg(MENU_HIGHLIGHT_TEXT),
        );
    f.render_stateful_widget(list, chunks[0], &mut list_state);

    let instructions = Paragraph::new(Line::from(vec![Span::styled(
        "Up/Down to select, Enter to confirm, Esc to cancel",
        Style::default().fg(FG_DIM),
    )]))
    .style(Style::default().bg(MENU_BG))
    .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[1]);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1])[1]
}
