//! Multi-select list of car brands.

use carshare_data::filter::BrandFilter;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::themes::Theme;

/// Cursor over the list of selectable brands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandSelector {
    brands: Vec<String>,
    cursor: usize,
}

impl BrandSelector {
    pub fn new(brands: Vec<String>) -> Self {
        Self { brands, cursor: 0 }
    }

    /// Replace the list, keeping the cursor on the same brand when it is
    /// still present.
    pub fn set_brands(&mut self, brands: Vec<String>) {
        let current = self.current().map(str::to_string);
        self.brands = brands;
        self.cursor = current
            .and_then(|b| self.brands.iter().position(|x| *x == b))
            .unwrap_or(0);
    }

    pub fn brands(&self) -> &[String] {
        &self.brands
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Brand under the cursor.
    pub fn current(&self) -> Option<&str> {
        self.brands.get(self.cursor).map(String::as_str)
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.brands.len() {
            self.cursor += 1;
        }
    }

    pub fn to_lines<'a>(&self, filter: &BrandFilter, theme: &'a Theme) -> Vec<Line<'a>> {
        if self.brands.is_empty() {
            return vec![Line::from(Span::styled("No brands available", theme.dim))];
        }

        self.brands
            .iter()
            .enumerate()
            .map(|(i, brand)| {
                let checked = filter.contains(brand);
                let mark = if checked { "[x] " } else { "[ ] " };
                let mark_style = if checked {
                    theme.selector_checked
                } else {
                    theme.dim
                };
                let name_style = if i == self.cursor {
                    theme.selector_cursor
                } else {
                    theme.text
                };
                Line::from(vec![
                    Span::styled(mark, mark_style),
                    Span::styled(brand.clone(), name_style),
                ])
            })
            .collect()
    }
}

/// Render the selector with its key legend in the block title.
pub fn render_brand_selector(
    frame: &mut Frame,
    area: Rect,
    selector: &BrandSelector,
    filter: &BrandFilter,
    theme: &Theme,
) {
    let mut lines = selector.to_lines(filter, theme);
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        if filter.is_empty() {
            "Showing all brands"
        } else {
            "Filter active"
        },
        theme.info,
    )));
    lines.push(Line::from(Span::styled(
        "↑/↓ move  space toggle  c clear  r reload  q quit",
        theme.dim,
    )));

    // Keep the cursor visible in short panes.
    let inner_height = area.height.saturating_sub(2) as usize;
    let scroll = (selector.cursor() + 1).saturating_sub(inner_height.saturating_sub(3));

    let widget = Paragraph::new(lines)
        .scroll((scroll as u16, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.card_border)
                .title(Span::styled(" Select the Car Brand ", theme.header)),
        );
    frame.render_widget(widget, area);
}
