//! Preview of the filtered trip table.
//!
//! Renders a bordered [`ratatui::widgets::Table`] with the first rows of the
//! enriched table, one column per field.

use carshare_core::models::{Table, Value};
use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table as TableWidget},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::themes::Theme;

/// Widest a preview column may grow.
const MAX_COLUMN_WIDTH: usize = 22;

/// Display string for one cell.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "—".to_string(),
        Value::Float(f) => format!("{f:.2}"),
        other => other.to_string(),
    }
}

/// Width for each column: the widest of its header and cells, capped.
pub fn column_widths(table: &Table) -> Vec<u16> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let widest_cell = table
                .rows()
                .iter()
                .map(|row| cell_text(&row[idx]).width())
                .max()
                .unwrap_or(0);
            name.width().max(widest_cell).min(MAX_COLUMN_WIDTH) as u16
        })
        .collect()
}

/// Render `preview` (already cut to the wanted row count). `total_rows` is
/// the size of the table it was taken from.
pub fn render_preview(frame: &mut Frame, area: Rect, preview: &Table, total_rows: usize, theme: &Theme) {
    let title = format!(" Data preview ({} of {} rows) ", preview.len(), total_rows);

    if preview.is_empty() {
        render_no_data(frame, area, &title, theme);
        return;
    }

    let header = Row::new(
        preview
            .columns()
            .iter()
            .map(|c| Cell::from(c.clone()).style(theme.table_header)),
    )
    .height(1);

    let rows: Vec<Row> = preview
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            Row::new(row.iter().map(|v| Cell::from(cell_text(v)))).style(style)
        })
        .collect();

    let widths: Vec<Constraint> = column_widths(preview)
        .into_iter()
        .map(Constraint::Length)
        .collect();

    let table = TableWidget::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(Span::styled(title, theme.header)),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Placeholder shown when the filter leaves no rows.
pub fn render_no_data(frame: &mut Frame, area: Rect, title: &str, theme: &Theme) {
    let text = vec![
        Line::from(Span::styled("No trips match the current selection", theme.warning)),
        Line::from(Span::styled("Press 'c' to show every brand", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(Span::styled(title.to_string(), theme.header)),
        ),
        area,
    );
}
