//! Time series rendering for the revenue-over-time chart.

use carshare_core::formatting::format_compact;
use carshare_core::models::Metric;
use carshare_data::aggregator::Series;
use ratatui::{
    layout::Rect,
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use super::bar_chart::unavailable_lines;
use crate::themes::Theme;

/// Plot coordinates: x is the point index, y its value.
pub fn plot_points(series: &Series) -> Vec<(f64, f64)> {
    series
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.value))
        .collect()
}

/// First, middle and last labels for the x axis.
pub fn x_labels(series: &Series) -> Vec<String> {
    let labels: Vec<&str> = series.points.iter().map(|p| p.label.as_str()).collect();
    match labels.as_slice() {
        [] => Vec::new(),
        [only] => vec![only.to_string()],
        [first, last] => vec![first.to_string(), last.to_string()],
        all => vec![
            all[0].to_string(),
            all[all.len() / 2].to_string(),
            all[all.len() - 1].to_string(),
        ],
    }
}

/// Y bounds starting at zero (or the minimum when negative) with a little
/// headroom so the line does not touch the border.
pub fn y_bounds(series: &Series) -> [f64; 2] {
    let min = series.points.iter().map(|p| p.value).fold(0.0, f64::min);
    let max = series.max_value();
    if max <= min {
        [min, min + 1.0]
    } else {
        [min, max * 1.1]
    }
}

pub fn render_line_chart(frame: &mut Frame, area: Rect, title: &str, metric: &Metric<Series>, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.card_border)
        .title(Span::styled(format!(" {title} "), theme.header));

    let series = match metric {
        Metric::Computed(series) if !series.is_empty() => series,
        Metric::Computed(_) => {
            let placeholder = Line::from(Span::styled("No data for this selection", theme.dim));
            frame.render_widget(Paragraph::new(placeholder).block(block), area);
            return;
        }
        Metric::Unavailable(reason) => {
            let lines = unavailable_lines(&reason.to_string(), theme);
            frame.render_widget(Paragraph::new(lines).block(block), area);
            return;
        }
    };

    let points = plot_points(series);
    let [y_min, y_max] = y_bounds(series);
    let x_max = (points.len().saturating_sub(1) as f64).max(1.0);

    let dataset = Dataset::default()
        .name(series.y_label.clone())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(theme.line)
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(theme.axis)
                .bounds([0.0, x_max])
                .labels(x_labels(series)),
        )
        .y_axis(
            Axis::default()
                .style(theme.axis)
                .bounds([y_min, y_max])
                .labels(vec![format_compact(y_min), format_compact(y_max)]),
        );

    frame.render_widget(chart, area);
}
