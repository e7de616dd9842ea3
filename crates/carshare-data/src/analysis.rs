//! Dashboard pipeline.
//!
//! Takes the loaded source tables and a brand filter and produces a
//! [`DashboardReport`] ready for the presentation layer. Pure and
//! deterministic: the same inputs always give an equal report.

use std::time::Instant;

use carshare_core::error::Result;
use carshare_core::models::{Metric, SourceTables, Table, UnavailableReason};
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregator::{Series, TripAggregator};
use crate::enrich::{build_enriched, EnrichedTrips};
use crate::filter::{available_brands, BrandFilter};

// ── Public types ──────────────────────────────────────────────────────────────

/// The three headline figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub total_trips: usize,
    pub total_distance: Metric<f64>,
    /// Model with the highest summed revenue.
    pub top_car: Metric<String>,
}

/// The four grouped series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardCharts {
    pub trips_by_city: Metric<Series>,
    pub revenue_by_model: Metric<Series>,
    pub avg_duration_by_city: Metric<Series>,
    pub revenue_by_date: Metric<Series>,
}

impl DashboardCharts {
    /// Series in display order.
    pub fn all(&self) -> [(&'static str, &Metric<Series>); 4] {
        [
            ("Trips by City", &self.trips_by_city),
            ("Revenue by Car Model", &self.revenue_by_model),
            ("Average Trip Duration per City", &self.avg_duration_by_city),
            ("Revenue Over Time", &self.revenue_by_date),
        ]
    }
}

/// Everything the dashboard shows for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub metrics: DashboardMetrics,
    pub charts: DashboardCharts,
    /// Brands selectable in the filter, taken from the unfiltered table.
    pub available_brands: Vec<String>,
    pub filter: BrandFilter,
    /// Enriched rows before the brand filter was applied.
    pub rows_before_filter: usize,
    /// The filtered enriched table.
    #[serde(skip)]
    pub table: Table,
}

impl DashboardReport {
    /// First `n` rows of the filtered table.
    pub fn preview(&self, n: usize) -> Table {
        self.table.head(n)
    }
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full pipeline.
///
/// 1. Parse trip timestamps and join cars, cities and customers.
/// 2. Apply `filter`.
/// 3. Compute metrics and series, each independently.
///
/// Errors returned here are fatal to the whole view: unreadable joins or a
/// brand filter on a table without `brand`. A metric whose own inputs are
/// missing or malformed is reported as [`Metric::Unavailable`] instead.
pub fn build_report(tables: &SourceTables, filter: &BrandFilter) -> Result<DashboardReport> {
    let start = Instant::now();

    let enriched = build_enriched(tables)?;
    let brands = available_brands(&enriched.table);
    let rows_before_filter = enriched.table.len();
    let filtered = enriched.with_table(filter.apply(&enriched.table)?);

    let metrics = compute_metrics(&filtered.table)?;
    let charts = compute_charts(&filtered)?;

    for (name, series) in charts.all() {
        if let Some(reason) = series.reason() {
            warn!(chart = name, %reason, "chart unavailable");
        }
    }
    debug!(
        rows_before_filter,
        rows = filtered.table.len(),
        brands = brands.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "built dashboard report"
    );

    Ok(DashboardReport {
        metrics,
        charts,
        available_brands: brands,
        filter: filter.clone(),
        rows_before_filter,
        table: filtered.table,
    })
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn compute_metrics(table: &Table) -> Result<DashboardMetrics> {
    let top_car = match Metric::from_result(TripAggregator::top_car(table))? {
        Metric::Computed(Some(model)) => Metric::Computed(model),
        Metric::Computed(None) => Metric::Unavailable(UnavailableReason::NoData),
        Metric::Unavailable(reason) => Metric::Unavailable(reason),
    };

    Ok(DashboardMetrics {
        total_trips: TripAggregator::total_trips(table),
        total_distance: Metric::from_result(TripAggregator::total_distance(table))?,
        top_car,
    })
}

fn compute_charts(trips: &EnrichedTrips) -> Result<DashboardCharts> {
    let table = &trips.table;
    // Series derived from timestamps cannot be trusted once parsing failed.
    let timed = |f: fn(&Table) -> Result<Series>| -> Result<Metric<Series>> {
        match &trips.time_issue {
            Some(reason) => Ok(Metric::Unavailable(reason.clone())),
            None => Metric::from_result(f(table)),
        }
    };

    Ok(DashboardCharts {
        trips_by_city: Metric::from_result(TripAggregator::trips_by_city(table))?,
        revenue_by_model: Metric::from_result(TripAggregator::revenue_by_model(table))?,
        avg_duration_by_city: timed(TripAggregator::avg_duration_by_city)?,
        revenue_by_date: timed(TripAggregator::revenue_by_date)?,
    })
}
