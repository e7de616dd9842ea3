use carshare_core::formatting::format_compact;
use carshare_core::models::Metric;
use carshare_data::aggregator::Series;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::themes::Theme;

/// Longest label shown before truncation.
const MAX_LABEL_WIDTH: usize = 18;

/// Horizontal bar chart, one row per series point.
///
/// Bars are scaled against the largest value so the longest bar fills
/// `width` columns:
///
/// ```text
/// Paris   ████████████████░░░░  120
/// Lyon    ████████░░░░░░░░░░░░   60
/// ```
pub struct HorizontalBars<'a> {
    pub series: &'a Series,
    /// Columns available for the bar itself.
    pub width: u16,
    pub theme: &'a Theme,
    /// Formats the trailing value label.
    pub value_fmt: fn(f64) -> String,
}

impl<'a> HorizontalBars<'a> {
    pub fn new(series: &'a Series, width: u16, theme: &'a Theme) -> Self {
        Self {
            series,
            width,
            theme,
            value_fmt: format_compact,
        }
    }

    pub fn with_value_fmt(mut self, value_fmt: fn(f64) -> String) -> Self {
        self.value_fmt = value_fmt;
        self
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let label_width = self
            .series
            .points
            .iter()
            .map(|p| p.label.width().min(MAX_LABEL_WIDTH))
            .max()
            .unwrap_or(0);
        let max = self.series.max_value();

        self.series
            .points
            .iter()
            .map(|point| {
                let filled = if max > 0.0 {
                    ((point.value.max(0.0) / max) * self.width as f64).round() as usize
                } else {
                    0
                };
                let filled = filled.min(self.width as usize);
                let empty = self.width as usize - filled;

                Line::from(vec![
                    Span::styled(pad_label(&point.label, label_width), self.theme.label),
                    Span::raw(" "),
                    Span::styled("\u{2588}".repeat(filled), self.theme.bar_fill),
                    Span::styled("\u{2591}".repeat(empty), self.theme.bar_empty),
                    Span::styled(format!(" {}", (self.value_fmt)(point.value)), self.theme.value),
                ])
            })
            .collect()
    }
}

/// Render a bordered bar chart for `metric` or a placeholder explaining why
/// it is unavailable.
pub fn render_bar_chart(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    metric: &Metric<Series>,
    value_fmt: fn(f64) -> String,
    theme: &Theme,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.card_border)
        .title(Span::styled(format!(" {title} "), theme.header));

    let lines = match metric {
        Metric::Computed(series) if series.is_empty() => {
            vec![Line::from(Span::styled("No data for this selection", theme.dim))]
        }
        Metric::Computed(series) => {
            // Borders, label, gap and value label share the row with the bar.
            let reserved = 2 + MAX_LABEL_WIDTH as u16 + 1 + 8;
            let width = area.width.saturating_sub(reserved).max(1);
            let mut lines = vec![Line::from(Span::styled(series.y_label.clone(), theme.dim))];
            lines.extend(
                HorizontalBars::new(series, width, theme)
                    .with_value_fmt(value_fmt)
                    .to_lines(),
            );
            lines
        }
        Metric::Unavailable(reason) => unavailable_lines(&reason.to_string(), theme),
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

pub(crate) fn unavailable_lines(reason: &str, theme: &Theme) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled("Chart unavailable", theme.warning)),
        Line::from(Span::styled(reason.to_string(), theme.dim)),
    ]
}

/// Pad or truncate `label` to exactly `width` display columns.
fn pad_label(label: &str, width: usize) -> String {
    if label.width() <= width {
        return format!("{label}{}", " ".repeat(width - label.width()));
    }
    let mut out = String::new();
    for ch in label.chars() {
        if out.width() + 1 >= width {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    let pad = width.saturating_sub(out.width());
    out.push_str(&" ".repeat(pad));
    out
}
