//! Scalar metrics and grouped series over the enriched trip table.
//!
//! Every computation returns `Result` so a missing column or a bad cell
//! surfaces as a scoped error; callers wrap these in
//! [`Metric`](carshare_core::models::Metric) to keep one failure from
//! blocking the rest.

use std::collections::BTreeMap;

use carshare_core::error::{DashboardError, Result};
use carshare_core::models::{Table, Value};
use carshare_core::time_utils::duration_minutes;
use serde::Serialize;

use crate::columns;

// ── Series ────────────────────────────────────────────────────────────────────

/// How a series is meant to be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Line,
}

/// One labelled value of a grouped series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// A grouped aggregate ready for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub title: String,
    pub y_label: String,
    pub kind: ChartKind,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    fn new(
        title: &str,
        y_label: &str,
        kind: ChartKind,
        points: impl IntoIterator<Item = (String, f64)>,
    ) -> Self {
        Self {
            title: title.to_string(),
            y_label: y_label.to_string(),
            kind,
            points: points
                .into_iter()
                .map(|(label, value)| SeriesPoint { label, value })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Largest value in the series, `0.0` when empty.
    pub fn max_value(&self) -> f64 {
        self.points.iter().map(|p| p.value).fold(0.0, f64::max)
    }
}

// ── TripAggregator ────────────────────────────────────────────────────────────

/// Stateless helper computing dashboard figures from a trip table.
pub struct TripAggregator;

impl TripAggregator {
    /// Number of trips (rows).
    pub fn total_trips(table: &Table) -> usize {
        table.len()
    }

    /// Sum of `distance`. Null cells count as zero.
    pub fn total_distance(table: &Table) -> Result<f64> {
        Ok(numeric_column(table, columns::DISTANCE)?.into_iter().flatten().sum())
    }

    /// Model with the largest summed revenue.
    ///
    /// Ties go to the alphabetically first model. `Ok(None)` when no row has
    /// a model.
    pub fn top_car(table: &Table) -> Result<Option<String>> {
        let revenue = sum_by(table, columns::MODEL, columns::REVENUE)?;
        let mut best: Option<(String, f64)> = None;
        for (model, total) in revenue {
            match &best {
                Some((_, current)) if *current >= total => {}
                _ => best = Some((model, total)),
            }
        }
        Ok(best.map(|(model, _)| model))
    }

    /// Trip count per city, most trips first (ties alphabetical).
    pub fn trips_by_city(table: &Table) -> Result<Series> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for city in table.column(columns::CITY_NAME)?.filter_map(Value::group_key) {
            *counts.entry(city).or_default() += 1;
        }

        let mut points: Vec<(String, usize)> = counts.into_iter().collect();
        points.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Ok(Series::new(
            "Trips by City",
            "Number of Trips",
            ChartKind::Bar,
            points.into_iter().map(|(city, n)| (city, n as f64)),
        ))
    }

    /// Summed revenue per car model, sorted by model.
    pub fn revenue_by_model(table: &Table) -> Result<Series> {
        let totals = sum_by(table, columns::MODEL, columns::REVENUE)?;
        Ok(Series::new(
            "Revenue by Car Model",
            "Total Revenue",
            ChartKind::Bar,
            totals,
        ))
    }

    /// Mean trip duration in minutes per city, sorted by city.
    ///
    /// Trips without both timestamps are ignored; a city with no measurable
    /// trip has no point.
    pub fn avg_duration_by_city(table: &Table) -> Result<Series> {
        let durations = Self::trip_durations(table)?;
        let city_idx = table.require_column(columns::CITY_NAME)?;

        let mut groups: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for (row, duration) in table.rows().iter().zip(durations) {
            let (Some(city), Some(minutes)) = (row[city_idx].group_key(), duration) else {
                continue;
            };
            let slot = groups.entry(city).or_default();
            slot.0 += minutes;
            slot.1 += 1;
        }

        Ok(Series::new(
            "Average Trip Duration per City",
            "Duration (minutes)",
            ChartKind::Bar,
            groups
                .into_iter()
                .map(|(city, (sum, n))| (city, sum / n as f64)),
        ))
    }

    /// Summed revenue per pickup date, in date order.
    pub fn revenue_by_date(table: &Table) -> Result<Series> {
        let totals = sum_by(table, columns::PICKUP_DATE, columns::REVENUE)?;
        Ok(Series::new(
            "Revenue Over Time",
            "Total Revenue",
            ChartKind::Line,
            totals,
        ))
    }

    /// Per-row `dropoff_time - pickup_time` in minutes.
    ///
    /// `None` where either timestamp is null.
    pub fn trip_durations(table: &Table) -> Result<Vec<Option<f64>>> {
        let pickup = table.require_column(columns::PICKUP_TIME)?;
        let dropoff = table.require_column(columns::DROPOFF_TIME)?;

        table
            .rows()
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let start = timestamp_cell(&cells[pickup], columns::PICKUP_TIME, row)?;
                let end = timestamp_cell(&cells[dropoff], columns::DROPOFF_TIME, row)?;
                Ok(start.zip(end).map(|(s, e)| duration_minutes(s, e)))
            })
            .collect()
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Cells of a numeric column as `f64`; nulls map to `None`, text is an error.
fn numeric_column(table: &Table, column: &str) -> Result<Vec<Option<f64>>> {
    table
        .column(column)?
        .enumerate()
        .map(|(row, value)| numeric_cell(value, column, row))
        .collect()
}

fn numeric_cell(value: &Value, column: &str, row: usize) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Float(f) if f.is_nan() => Ok(None),
        Value::Int(_) | Value::Float(_) => Ok(value.as_f64()),
        other => Err(DashboardError::DataFormat {
            column: column.to_string(),
            row,
            value: other.to_string(),
        }),
    }
}

fn timestamp_cell(
    value: &Value,
    column: &str,
    row: usize,
) -> Result<Option<chrono::NaiveDateTime>> {
    match value {
        Value::Null => Ok(None),
        Value::Timestamp(ts) => Ok(Some(*ts)),
        other => Err(DashboardError::DataFormat {
            column: column.to_string(),
            row,
            value: other.to_string(),
        }),
    }
}

/// Sum `value_col` grouped by `key_col`. Rows with a null key are skipped;
/// null values contribute zero.
///
/// The value column is checked first so a missing `revenue` is what gets
/// reported even when the key column is also absent.
fn sum_by(table: &Table, key_col: &str, value_col: &str) -> Result<BTreeMap<String, f64>> {
    let values = numeric_column(table, value_col)?;
    let keys = table.column(key_col)?;

    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for (key, value) in keys.zip(values) {
        if let Some(key) = key.group_key() {
            *totals.entry(key).or_default() += value.unwrap_or(0.0);
        }
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32) -> Value {
        Value::Timestamp(
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap(),
        )
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        Table::from_rows("t", columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    fn revenue_table() -> Table {
        table(
            &["model", "city_name", "revenue", "pickup_date"],
            vec![
                vec![text("Yaris"), text("Paris"), Value::Float(10.0), text("2024-01-02")],
                vec![text("Civic"), text("Lyon"), Value::Int(25), text("2024-01-01")],
                vec![text("Yaris"), text("Paris"), Value::Int(20), text("2024-01-01")],
                vec![Value::Null, text("Nice"), Value::Int(100), Value::Null],
                vec![text("Civic"), Value::Null, Value::Null, text("2024-01-02")],
            ],
        )
    }

    // ── scalar metrics ────────────────────────────────────────────────────────

    #[test]
    fn test_total_trips_is_row_count() {
        assert_eq!(TripAggregator::total_trips(&revenue_table()), 5);
        assert_eq!(TripAggregator::total_trips(&Table::default()), 0);
    }

    #[test]
    fn test_total_distance_treats_null_as_zero() {
        let t = table(
            &["distance"],
            vec![vec![Value::Int(10)], vec![Value::Null], vec![Value::Float(2.5)]],
        );
        assert!((TripAggregator::total_distance(&t).unwrap() - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_total_distance_zero_and_empty() {
        let zeros = table(&["distance"], vec![vec![Value::Int(0)], vec![Value::Int(0)]]);
        assert_eq!(TripAggregator::total_distance(&zeros).unwrap(), 0.0);
        let empty = table(&["distance"], vec![]);
        assert_eq!(TripAggregator::total_distance(&empty).unwrap(), 0.0);
    }

    #[test]
    fn test_total_distance_requires_column() {
        let err = TripAggregator::total_distance(&revenue_table()).unwrap_err();
        assert!(matches!(err, DashboardError::Schema { ref column } if column == "distance"));
    }

    #[test]
    fn test_total_distance_rejects_text() {
        let t = table(&["distance"], vec![vec![text("far")]]);
        let err = TripAggregator::total_distance(&t).unwrap_err();
        assert!(matches!(err, DashboardError::DataFormat { .. }));
    }

    #[test]
    fn test_top_car_by_summed_revenue() {
        // Yaris 30, Civic 25, null model ignored.
        assert_eq!(
            TripAggregator::top_car(&revenue_table()).unwrap(),
            Some("Yaris".to_string())
        );
    }

    #[test]
    fn test_top_car_tie_goes_to_first_model() {
        let t = table(
            &["model", "revenue"],
            vec![
                vec![text("Zoe"), Value::Int(5)],
                vec![text("Aygo"), Value::Int(5)],
            ],
        );
        assert_eq!(TripAggregator::top_car(&t).unwrap(), Some("Aygo".to_string()));
    }

    #[test]
    fn test_top_car_without_revenue_is_schema_error() {
        let t = table(&["model"], vec![vec![text("Yaris")]]);
        let err = TripAggregator::top_car(&t).unwrap_err();
        assert!(matches!(err, DashboardError::Schema { ref column } if column == "revenue"));
    }

    #[test]
    fn test_top_car_empty_table_is_none() {
        let t = table(&["model", "revenue"], vec![]);
        assert_eq!(TripAggregator::top_car(&t).unwrap(), None);
    }

    // ── grouped series ────────────────────────────────────────────────────────

    #[test]
    fn test_trips_by_city_sorted_by_count() {
        let series = TripAggregator::trips_by_city(&revenue_table()).unwrap();
        let labels: Vec<&str> = series.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Paris", "Lyon", "Nice"]);
        assert_eq!(series.points[0].value, 2.0);
        assert_eq!(series.kind, ChartKind::Bar);
        assert_eq!(series.max_value(), 2.0);
    }

    #[test]
    fn test_revenue_by_model() {
        let series = TripAggregator::revenue_by_model(&revenue_table()).unwrap();
        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[0].label, "Civic");
        assert_eq!(series.points[0].value, 25.0);
        assert_eq!(series.points[1].label, "Yaris");
        assert_eq!(series.points[1].value, 30.0);
    }

    #[test]
    fn test_revenue_by_date_is_line_in_date_order() {
        let series = TripAggregator::revenue_by_date(&revenue_table()).unwrap();
        assert_eq!(series.kind, ChartKind::Line);
        let labels: Vec<&str> = series.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-01-01", "2024-01-02"]);
        assert_eq!(series.points[0].value, 45.0);
        assert_eq!(series.points[1].value, 10.0);
    }

    #[test]
    fn test_revenue_series_require_revenue() {
        let t = revenue_table().drop_columns(&["revenue"]);
        assert!(TripAggregator::revenue_by_model(&t).is_err());
        assert!(TripAggregator::revenue_by_date(&t).is_err());
        assert!(TripAggregator::trips_by_city(&t).is_ok());
    }

    #[test]
    fn test_trip_duration_forty_five_minutes() {
        let t = table(
            &["city_name", "pickup_time", "dropoff_time"],
            vec![vec![text("Paris"), ts(10, 0), ts(10, 45)]],
        );
        assert_eq!(TripAggregator::trip_durations(&t).unwrap(), vec![Some(45.0)]);

        let series = TripAggregator::avg_duration_by_city(&t).unwrap();
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].label, "Paris");
        assert!((series.points[0].value - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_avg_duration_skips_missing_times() {
        let t = table(
            &["city_name", "pickup_time", "dropoff_time"],
            vec![
                vec![text("Paris"), ts(10, 0), ts(10, 30)],
                vec![text("Paris"), ts(11, 0), ts(12, 0)],
                vec![text("Lyon"), ts(9, 0), Value::Null],
            ],
        );
        let series = TripAggregator::avg_duration_by_city(&t).unwrap();
        assert_eq!(series.points.len(), 1);
        assert!((series.points[0].value - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_avg_duration_rejects_unparsed_times() {
        let t = table(
            &["city_name", "pickup_time", "dropoff_time"],
            vec![vec![text("Paris"), text("10:00"), ts(10, 45)]],
        );
        let err = TripAggregator::avg_duration_by_city(&t).unwrap_err();
        assert!(matches!(err, DashboardError::DataFormat { ref column, .. } if column == "pickup_time"));
    }

    #[test]
    fn test_avg_duration_requires_time_columns() {
        let t = table(&["city_name"], vec![vec![text("Paris")]]);
        let err = TripAggregator::avg_duration_by_city(&t).unwrap_err();
        assert!(matches!(err, DashboardError::Schema { ref column } if column == "pickup_time"));
    }

    #[test]
    fn test_series_serialises() {
        let series = TripAggregator::revenue_by_model(&revenue_table()).unwrap();
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["kind"], "bar");
        assert_eq!(json["points"][0]["label"], "Civic");
    }
}
