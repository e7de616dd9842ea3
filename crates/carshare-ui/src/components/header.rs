use carshare_core::formatting::format_count;
use carshare_data::filter::BrandFilter;
use ratatui::text::{Line, Span};

use crate::themes::Theme;

/// Marker placed either side of the title.
pub const ACCENT: &str = "🚗";

/// Dashboard header rendering three lines:
///
/// 1. Title.
/// 2. A 60-column `=` separator.
/// 3. Active brand filter and trip counts, e.g.
///    `[ brands: Honda, Toyota | 2 of 3 trips ]`.
pub struct Header<'a> {
    pub filter: &'a BrandFilter,
    pub shown_trips: usize,
    pub total_trips: usize,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(
        filter: &'a BrandFilter,
        shown_trips: usize,
        total_trips: usize,
        theme: &'a Theme,
    ) -> Self {
        Self {
            filter,
            shown_trips,
            total_trips,
            theme,
        }
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let brands = if self.filter.is_empty() {
            "all".to_string()
        } else {
            self.filter.brands().collect::<Vec<_>>().join(", ")
        };

        vec![
            Line::from(vec![
                Span::styled(ACCENT, self.theme.header_accent),
                Span::styled(" CAR SHARING DASHBOARD ", self.theme.header),
                Span::styled(ACCENT, self.theme.header_accent),
            ]),
            Line::from(Span::styled("=".repeat(60), self.theme.separator)),
            Line::from(vec![
                Span::styled("[ brands: ", self.theme.label),
                Span::styled(brands, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(
                    format!(
                        "{} of {} trips",
                        format_count(self.shown_trips),
                        format_count(self.total_trips)
                    ),
                    self.theme.value,
                ),
                Span::styled(" ]", self.theme.label),
            ]),
        ]
    }
}
