//! Non-interactive renderings of a report: plain text and JSON.

use std::fmt::Write;

use carshare_core::formatting::{format_compact, format_count, format_minutes};
use carshare_core::models::Metric;
use carshare_data::aggregator::Series;
use carshare_data::analysis::DashboardReport;
use carshare_ui::components::metrics::metric_cards;
use carshare_ui::table_view::{cell_text, column_widths};

/// Plain-text summary: filter, the three metrics, each series and a preview
/// of the first `preview_rows` rows.
pub fn render_summary(report: &DashboardReport, preview_rows: usize) -> String {
    let mut out = String::new();
    let brands = if report.filter.is_empty() {
        "all".to_string()
    } else {
        report.filter.brands().collect::<Vec<_>>().join(", ")
    };

    let _ = writeln!(out, "Car Sharing Dashboard");
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(
        out,
        "Brands: {brands} ({} of {} trips)",
        format_count(report.metrics.total_trips),
        format_count(report.rows_before_filter)
    );
    let _ = writeln!(out);

    for card in metric_cards(&report.metrics) {
        let _ = match card.note {
            Some(note) => writeln!(out, "{:<26}{} ({note})", format!("{}:", card.title), card.value),
            None => writeln!(out, "{:<26}{}", format!("{}:", card.title), card.value),
        };
    }

    for (title, metric) in report.charts.all() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{title}");
        write_series(&mut out, metric, title == "Average Trip Duration per City");
    }

    let preview = report.preview(preview_rows);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Data preview ({} of {} rows)",
        preview.len(),
        report.table.len()
    );
    if preview.columns().is_empty() {
        return out;
    }
    let widths: Vec<usize> = column_widths(&preview).into_iter().map(usize::from).collect();
    let header: Vec<String> = preview
        .columns()
        .iter()
        .zip(&widths)
        .map(|(c, w)| fit(c, *w))
        .collect();
    let _ = writeln!(out, "  {}", header.join("  ").trim_end());
    for row in preview.rows() {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| fit(&cell_text(v), *w))
            .collect();
        let _ = writeln!(out, "  {}", cells.join("  ").trim_end());
    }
    out
}

fn write_series(out: &mut String, metric: &Metric<Series>, minutes: bool) {
    let series = match metric {
        Metric::Unavailable(reason) => {
            let _ = writeln!(out, "  unavailable ({reason})");
            return;
        }
        Metric::Computed(series) if series.is_empty() => {
            let _ = writeln!(out, "  (no data)");
            return;
        }
        Metric::Computed(series) => series,
    };

    let label_width = series
        .points
        .iter()
        .map(|p| p.label.chars().count())
        .max()
        .unwrap_or(0);
    for point in &series.points {
        let value = if minutes {
            format_minutes(point.value)
        } else {
            format_compact(point.value)
        };
        let _ = writeln!(out, "  {:<label_width$}  {value}", point.label);
    }
}

/// Pad or cut `s` to `width` characters.
fn fit(s: &str, width: usize) -> String {
    let count = s.chars().count();
    if count > width {
        let mut cut: String = s.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    } else {
        format!("{s}{}", " ".repeat(width - count))
    }
}

/// JSON document: the serialised report plus the preview rows.
pub fn render_json(report: &DashboardReport, preview_rows: usize) -> serde_json::Result<String> {
    let doc = serde_json::json!({
        "report": report,
        "preview": report.preview(preview_rows),
    });
    serde_json::to_string_pretty(&doc)
}
