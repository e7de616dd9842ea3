//! Headline metric cards.

use carshare_core::formatting::{format_count, format_distance};
use carshare_core::models::{Metric, UNAVAILABLE};
use carshare_data::analysis::DashboardMetrics;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::themes::Theme;

/// A titled box holding one figure and an optional note underneath.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub title: &'static str,
    pub value: String,
    /// Why the value is missing, shown dimmed.
    pub note: Option<String>,
}

impl MetricCard {
    fn from_metric<T>(title: &'static str, metric: &Metric<T>, fmt: impl Fn(&T) -> String) -> Self {
        match metric {
            Metric::Computed(v) => Self {
                title,
                value: fmt(v),
                note: None,
            },
            Metric::Unavailable(reason) => Self {
                title,
                value: UNAVAILABLE.to_string(),
                note: Some(reason.to_string()),
            },
        }
    }
}

/// The three cards in display order: trips, top car, distance.
pub fn metric_cards(metrics: &DashboardMetrics) -> [MetricCard; 3] {
    [
        MetricCard {
            title: "Total Trips",
            value: format_count(metrics.total_trips),
            note: None,
        },
        MetricCard::from_metric("Top Car Model by Revenue", &metrics.top_car, String::clone),
        MetricCard::from_metric("Total Distance (km)", &metrics.total_distance, |km| {
            format_distance(*km)
        }),
    ]
}

/// Render the three cards side by side.
pub fn render_metric_cards(frame: &mut Frame, area: Rect, metrics: &DashboardMetrics, theme: &Theme) {
    let columns = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(area);

    for (card, slot) in metric_cards(metrics).into_iter().zip(columns.iter()) {
        let value_style = if card.note.is_some() {
            theme.warning
        } else {
            theme.value
        };
        let mut lines = vec![Line::from(Span::styled(card.value, value_style))];
        if let Some(note) = card.note {
            lines.push(Line::from(Span::styled(note, theme.dim)));
        }

        let widget = Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.card_border)
                .title(Span::styled(format!(" {} ", card.title), theme.label)),
        );
        frame.render_widget(widget, *slot);
    }
}
