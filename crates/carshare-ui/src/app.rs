//! Application state and terminal event loop.
//!
//! [`App`] owns the theme, the dashboard session and the most recent report.
//! Every brand toggle rebuilds the report from the cached tables; `r` forces
//! the tables to be re-read from disk.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};

use carshare_core::formatting::{format_compact, format_minutes};
use carshare_data::analysis::DashboardReport;
use carshare_runtime::data_manager::TableLoader;
use carshare_runtime::session::DashboardSession;

use crate::components::bar_chart::render_bar_chart;
use crate::components::brand_selector::{render_brand_selector, BrandSelector};
use crate::components::header::Header;
use crate::components::line_chart::render_line_chart;
use crate::components::metrics::render_metric_cards;
use crate::table_view::render_preview;
use crate::themes::Theme;

/// Width of the brand selector pane.
const SELECTOR_WIDTH: u16 = 30;

// ── Action ────────────────────────────────────────────────────────────────────

/// What a key press asks the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    MoveUp,
    MoveDown,
    ToggleBrand,
    ClearBrands,
    Reload,
    Quit,
}

impl Action {
    pub fn from_key(key: KeyEvent) -> Self {
        if key.kind != KeyEventKind::Press {
            return Action::None;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Action::Quit,
            KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
            KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
            KeyCode::Char(' ') | KeyCode::Enter => Action::ToggleBrand,
            KeyCode::Char('c') => Action::ClearBrands,
            KeyCode::Char('r') => Action::Reload,
            _ => Action::None,
        }
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the dashboard TUI.
pub struct App<L> {
    pub theme: Theme,
    session: DashboardSession<L>,
    selector: BrandSelector,
    /// Latest report, `None` until the first successful build or after a
    /// fatal error.
    report: Option<DashboardReport>,
    /// Message of the fatal error that prevented the last rebuild.
    error: Option<String>,
    preview_rows: usize,
    pub should_quit: bool,
}

impl<L: TableLoader> App<L> {
    /// Create the app and build the first report.
    pub fn new(theme_name: &str, session: DashboardSession<L>, preview_rows: usize) -> Self {
        let mut app = Self {
            theme: Theme::from_name(theme_name),
            session,
            selector: BrandSelector::default(),
            report: None,
            error: None,
            preview_rows,
            should_quit: false,
        };
        app.recompute(false);
        app
    }

    pub fn report(&self) -> Option<&DashboardReport> {
        self.report.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selector(&self) -> &BrandSelector {
        &self.selector
    }

    pub fn session(&self) -> &DashboardSession<L> {
        &self.session
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the interactive dashboard until `q`, `Esc` or `Ctrl+C`.
    ///
    /// Uses `crossterm::event::poll` with a 250 ms timeout so the loop never
    /// blocks on input.
    pub fn run(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => self.handle_action(Action::from_key(key)),
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    /// Apply one user action.
    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Quit => self.should_quit = true,
            Action::MoveUp => self.selector.move_up(),
            Action::MoveDown => self.selector.move_down(),
            Action::ToggleBrand => {
                if let Some(brand) = self.selector.current().map(str::to_string) {
                    self.session.toggle_brand(&brand);
                    self.recompute(false);
                }
            }
            Action::ClearBrands => {
                if !self.session.filter().is_empty() {
                    self.session.clear_brands();
                    self.recompute(false);
                }
            }
            Action::Reload => self.recompute(true),
        }
    }

    /// Rebuild the report for the current selection.
    fn recompute(&mut self, force_reload: bool) {
        match self.session.refresh(force_reload) {
            Ok(report) => {
                self.selector.set_brands(report.available_brands.clone());
                self.report = Some(report);
                self.error = None;
            }
            Err(e) => {
                tracing::error!(error = %e, "dashboard rebuild failed");
                self.report = None;
                self.error = Some(e.to_string());
            }
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Render the current state into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, cards_area, body_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(0),
        ])
        .areas(area);

        let (shown, total) = self
            .report
            .as_ref()
            .map_or((0, 0), |r| (r.metrics.total_trips, r.rows_before_filter));
        let header = Header::new(self.session.filter(), shown, total, &self.theme);
        frame.render_widget(Paragraph::new(header.to_lines()), header_area);

        let [selector_area, main_area] =
            Layout::horizontal([Constraint::Length(SELECTOR_WIDTH), Constraint::Min(0)])
                .areas(body_area);
        render_brand_selector(
            frame,
            selector_area,
            &self.selector,
            self.session.filter(),
            &self.theme,
        );

        match (&self.report, &self.error) {
            (Some(report), _) => {
                render_metric_cards(frame, cards_area, &report.metrics, &self.theme);
                self.render_body(frame, main_area, report);
            }
            (None, Some(error)) => self.render_error(frame, cards_area.union(main_area), error),
            (None, None) => {}
        }
    }

    fn render_body(&self, frame: &mut Frame, area: Rect, report: &DashboardReport) {
        let preview = report.preview(self.preview_rows);
        // Borders plus header row.
        let preview_height = preview.len().max(2) as u16 + 3;

        let [preview_area, charts_area] =
            Layout::vertical([Constraint::Length(preview_height), Constraint::Min(0)]).areas(area);
        render_preview(frame, preview_area, &preview, report.table.len(), &self.theme);

        let [top, bottom] =
            Layout::vertical([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)]).areas(charts_area);
        let [city, model] =
            Layout::horizontal([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)]).areas(top);
        let [duration, over_time] =
            Layout::horizontal([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)]).areas(bottom);

        let charts = &report.charts;
        render_bar_chart(frame, city, "Trips by City", &charts.trips_by_city, format_compact, &self.theme);
        render_bar_chart(
            frame,
            model,
            "Revenue by Car Model",
            &charts.revenue_by_model,
            format_compact,
            &self.theme,
        );
        render_bar_chart(
            frame,
            duration,
            "Average Trip Duration per City",
            &charts.avg_duration_by_city,
            format_minutes,
            &self.theme,
        );
        render_line_chart(frame, over_time, "Revenue Over Time", &charts.revenue_by_date, &self.theme);
    }

    fn render_error(&self, frame: &mut Frame, area: Rect, error: &str) {
        let text = vec![
            Line::from(Span::styled("Dashboard unavailable", self.theme.error)),
            Line::from(""),
            Line::from(Span::styled(error.to_string(), self.theme.text)),
            Line::from(""),
            Line::from(Span::styled(
                "Fix the data files and press 'r' to reload, or 'q' to exit",
                self.theme.dim,
            )),
        ];
        frame.render_widget(
            Paragraph::new(text).wrap(Wrap { trim: true }).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.theme.error)
                    .title(" Error "),
            ),
            area,
        );
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use carshare_core::error::{DashboardError, Result};
    use carshare_core::models::{SourceTables, Table, Value};
    use carshare_data::filter::BrandFilter;
    use carshare_runtime::data_manager::DataManager;
    use ratatui::backend::TestBackend;

    struct FixtureLoader {
        fail: Cell<bool>,
        calls: Cell<usize>,
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    impl TableLoader for FixtureLoader {
        fn load(&self) -> Result<SourceTables> {
            self.calls.set(self.calls.get() + 1);
            if self.fail.get() {
                return Err(DashboardError::Config("trips.csv vanished".into()));
            }
            Ok(SourceTables {
                trips: Table::from_rows(
                    "trips",
                    cols(&["id", "car_id", "customer_id", "pickup_time", "dropoff_time", "distance", "revenue"]),
                    vec![
                        vec![Value::Int(1), Value::Int(1), Value::Int(1), text("2024-01-01 10:00:00"), text("2024-01-01 10:45:00"), Value::Int(10), Value::Float(15.0)],
                        vec![Value::Int(2), Value::Int(2), Value::Int(1), text("2024-01-01 12:00:00"), text("2024-01-01 12:20:00"), Value::Int(20), Value::Float(9.5)],
                        vec![Value::Int(3), Value::Int(3), Value::Int(1), text("2024-01-02 08:00:00"), text("2024-01-02 08:30:00"), Value::Int(30), Value::Float(22.0)],
                    ],
                ),
                cars: Table::from_rows(
                    "cars",
                    cols(&["id", "brand", "model", "city_id"]),
                    vec![
                        vec![Value::Int(1), text("Toyota"), text("Yaris"), Value::Int(1)],
                        vec![Value::Int(2), text("Toyota"), text("Corolla"), Value::Int(2)],
                        vec![Value::Int(3), text("Honda"), text("Civic"), Value::Int(1)],
                    ],
                ),
                cities: Table::from_rows(
                    "cities",
                    cols(&["city_id", "city_name"]),
                    vec![vec![Value::Int(1), text("Paris")], vec![Value::Int(2), text("Lyon")]],
                ),
                customers: Table::from_rows("customers", cols(&["id", "name"]), vec![vec![Value::Int(1), text("Ada")]]),
                ratings: Table::default(),
            })
        }
    }

    fn make_app(filter: BrandFilter) -> App<FixtureLoader> {
        let loader = FixtureLoader {
            fail: Cell::new(false),
            calls: Cell::new(0),
        };
        let session = DashboardSession::new(DataManager::new(loader, None), filter);
        App::new("dark", session, 5)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn draw(app: &App<FixtureLoader>, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    // ── Action mapping ────────────────────────────────────────────────────────

    #[test]
    fn test_action_from_key() {
        assert_eq!(Action::from_key(key(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(Action::from_key(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            Action::from_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(Action::from_key(key(KeyCode::Char('c'))), Action::ClearBrands);
        assert_eq!(Action::from_key(key(KeyCode::Char(' '))), Action::ToggleBrand);
        assert_eq!(Action::from_key(key(KeyCode::Up)), Action::MoveUp);
        assert_eq!(Action::from_key(key(KeyCode::Char('j'))), Action::MoveDown);
        assert_eq!(Action::from_key(key(KeyCode::Char('r'))), Action::Reload);
        assert_eq!(Action::from_key(key(KeyCode::Char('x'))), Action::None);
    }

    // ── State changes ─────────────────────────────────────────────────────────

    #[test]
    fn test_initial_report_is_built() {
        let app = make_app(BrandFilter::all());
        let report = app.report().unwrap();
        assert_eq!(report.metrics.total_trips, 3);
        assert_eq!(app.selector().brands(), &["Honda".to_string(), "Toyota".to_string()]);
        assert!(app.error().is_none());
    }

    #[test]
    fn test_toggle_brand_recomputes_from_cache() {
        let mut app = make_app(BrandFilter::all());
        // Cursor starts on "Honda".
        app.handle_action(Action::MoveDown);
        app.handle_action(Action::ToggleBrand);

        let report = app.report().unwrap();
        assert_eq!(report.metrics.total_trips, 2);
        assert!(app.session().filter().contains("Toyota"));
        assert_eq!(app.session().manager().loader().calls.get(), 1);

        app.handle_action(Action::ClearBrands);
        assert_eq!(app.report().unwrap().metrics.total_trips, 3);
    }

    #[test]
    fn test_reload_reads_tables_again() {
        let mut app = make_app(BrandFilter::all());
        app.handle_action(Action::Reload);
        assert_eq!(app.session().manager().loader().calls.get(), 2);
    }

    #[test]
    fn test_failed_reload_shows_error_instead_of_stale_report() {
        let mut app = make_app(BrandFilter::all());
        app.session().manager().loader().fail.set(true);
        app.handle_action(Action::Reload);

        assert!(app.report().is_none());
        assert!(app.error().unwrap().contains("trips.csv vanished"));

        let screen = draw(&app, 120, 40);
        assert!(screen.contains("Dashboard unavailable"));

        app.session().manager().loader().fail.set(false);
        app.handle_action(Action::Reload);
        assert!(app.report().is_some());
    }

    #[test]
    fn test_quit() {
        let mut app = make_app(BrandFilter::all());
        app.handle_action(Action::from_key(key(KeyCode::Char('q'))));
        assert!(app.should_quit);
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    #[test]
    fn test_render_full_dashboard() {
        let app = make_app(BrandFilter::new(["Toyota"]));
        let screen = draw(&app, 160, 50);
        assert!(screen.contains("CAR SHARING DASHBOARD"));
        assert!(screen.contains("Total Trips"));
        assert!(screen.contains("Trips by City"));
        assert!(screen.contains("Revenue Over Time"));
    }

    #[test]
    fn test_render_small_terminal_does_not_panic() {
        let app = make_app(BrandFilter::all());
        draw(&app, 40, 12);
        draw(&app, 1, 1);
    }
}
