use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table as TableWidget};

use super::theme::*;
use crate::app::App;
use crate::table::Table;

/// Rows shown in the data preview.
pub const PREVIEW_ROWS: usize = 10;
/// Preview rows plus header and borders.
pub const PREVIEW_HEIGHT: u16 = PREVIEW_ROWS as u16 + 3;
/// Wider tables are cut off with a "+N more" note in the title.
const MAX_PREVIEW_COLUMNS: usize = 8;

pub fn render_metrics(f: &mut Frame<'_>, app: &App, table: &Table, area: Rect) {
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);
    let metrics = [
        format!("Rows: {}", table.row_count()),
        format!("Columns: {}", table.column_count()),
        format!("Language: {}", app.session.locale()),
    ];
    for (metric, cell) in metrics.into_iter().zip(cells.iter()) {
        let widget = Paragraph::new(Span::styled(
            metric,
            Style::default().fg(FG_PRIMARY).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(BORDER_IDLE))
                .style(Style::default().bg(BG_PANEL)),
        );
        f.render_widget(widget, *cell);
    }
}

pub fn render_preview(f: &mut Frame<'_>, table: &Table, area: Rect) {
    let sections = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);
    render_rows(f, table, sections[0]);
    render_column_info(f, table, sections[1]);
}

fn render_rows(f: &mut Frame<'_>, table: &Table, area: Rect) {
    let shown = table.column_count().min(MAX_PREVIEW_COLUMNS);
    let hidden = table.column_count() - shown;
    let title = if hidden > 0 {
        format!("Data preview (+{} more columns)", hidden)
    } else {
        "Data preview".to_string()
    };

    let header = Row::new(
        table
            .columns()
            .iter()
            .take(shown)
            .map(|name| Cell::from(name.as_str())),
    )
    .style(
        Style::default()
            .fg(FG_PRIMARY)
            .bg(HEADER_BG)
            .add_modifier(Modifier::BOLD),
    );
    let rows = table.preview(PREVIEW_ROWS).iter().map(|row| {
        Row::new(row.iter().take(shown).map(|value| Cell::from(value.as_str())))
            .style(Style::default().fg(FG_PRIMARY))
    });
    let widths = vec![Constraint::Ratio(1, shown.max(1) as u32); shown];

    let widget = TableWidget::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(BORDER_IDLE))
                .title(Span::styled(title, Style::default().fg(FG_PRIMARY)))
                .style(Style::default().bg(BG_PANEL)),
        );
    f.render_widget(widget, area);
}

fn render_column_info(f: &mut Frame<'_>, table: &Table, area: Rect) {
    let lines: Vec<Line> = table
        .column_info()
        .into_iter()
        .map(|info| {
            let mut spans = vec![
                Span::styled(info.name, Style::default().fg(FG_PRIMARY)),
                Span::styled(format!("  {}", info.kind), Style::default().fg(FG_DIM)),
            ];
            if info.missing > 0 {
                spans.push(Span::styled(
                    format!("  {} missing", info.missing),
                    Style::default().fg(Color::Yellow),
                ));
            }
            Line::from(spans)
        })
        .collect();
    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(BORDER_IDLE))
            .title(Span::styled("Column info", Style::default().fg(FG_PRIMARY)))
            .style(Style::default().bg(BG_PANEL)),
    );
    f.render_widget(widget, area);
}
