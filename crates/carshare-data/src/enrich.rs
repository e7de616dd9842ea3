//! Builds the enriched trip table.
//!
//! Trips are timestamp-normalised, then left-joined with cars, cities and
//! customers. Join keys are declared explicitly with [`JoinSpec`]; the right
//! key column is never carried into the result, and a right-hand column whose
//! name already exists on the left is renamed `<right table>_<column>`.

use std::collections::HashMap;

use carshare_core::error::{DashboardError, Result};
use carshare_core::models::{JoinKey, SourceTables, Table, UnavailableReason, Value};
use carshare_core::time_utils::parse_timestamp;
use tracing::{debug, warn};

use crate::columns;

// ── EnrichedTrips ─────────────────────────────────────────────────────────────

/// The denormalised trip table plus any problem found in its timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTrips {
    pub table: Table,
    /// Set when `pickup_time`/`dropoff_time` could not be parsed; metrics
    /// derived from them report this reason instead of a value.
    pub time_issue: Option<UnavailableReason>,
}

impl EnrichedTrips {
    /// Same trips restricted to a new table (e.g. after filtering).
    pub fn with_table(&self, table: Table) -> Self {
        Self {
            table,
            time_issue: self.time_issue.clone(),
        }
    }
}

// ── JoinSpec ──────────────────────────────────────────────────────────────────

/// Explicit key pair for a left join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinSpec<'a> {
    pub left_key: &'a str,
    pub right_key: &'a str,
}

impl<'a> JoinSpec<'a> {
    pub fn new(left_key: &'a str, right_key: &'a str) -> Self {
        Self {
            left_key,
            right_key,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Run steps 1 to 5 of the pipeline: parse trip times, join cars, cities and
/// customers, then drop the identifier columns.
///
/// Unparsable timestamps do not abort the build; the raw columns are kept and
/// [`EnrichedTrips::time_issue`] records why time-based metrics are missing.
pub fn build_enriched(tables: &SourceTables) -> Result<EnrichedTrips> {
    let (trips, time_issue) = match parse_trip_times(&tables.trips) {
        Ok(parsed) => (parsed, None),
        Err(err) => match UnavailableReason::from_error(&err) {
            Some(reason) => {
                warn!(error = %err, "trip timestamps unusable; time-based metrics disabled");
                (tables.trips.clone(), Some(reason))
            }
            None => return Err(err),
        },
    };

    let with_cars = left_join(
        &trips,
        &tables.cars,
        JoinSpec::new(columns::CAR_ID, columns::ID),
    )?;
    let with_cities = left_join(
        &with_cars,
        &tables.cities,
        JoinSpec::new(columns::CITY_ID, columns::CITY_ID),
    )?;
    let with_customers = left_join(
        &with_cities,
        &tables.customers,
        JoinSpec::new(columns::CUSTOMER_ID, columns::ID),
    )?;

    let table = with_customers
        .drop_columns(columns::REDUNDANT_IDS)
        .renamed("enriched_trips");

    debug!(
        trips = tables.trips.len(),
        rows = table.len(),
        columns = table.columns().len(),
        "built enriched trip table"
    );
    Ok(EnrichedTrips { table, time_issue })
}

/// Parse `pickup_time` and `dropoff_time` into timestamps and derive
/// `pickup_date`.
///
/// Empty cells stay null. An absent column is left absent. Any other cell
/// that does not parse is a [`DashboardError::DataFormat`].
pub fn parse_trip_times(trips: &Table) -> Result<Table> {
    let mut out = trips.clone();

    for column in [columns::PICKUP_TIME, columns::DROPOFF_TIME] {
        let Some(idx) = out.column_index(column) else {
            debug!(column, "timestamp column absent; skipping");
            continue;
        };
        let parsed = out
            .rows()
            .iter()
            .enumerate()
            .map(|(row, cells)| parse_time_cell(&cells[idx], column, row))
            .collect::<Result<Vec<_>>>()?;
        out = out.with_column(column, parsed);
    }

    let dates: Option<Vec<Value>> = out.column(columns::PICKUP_TIME).ok().map(|cells| {
        cells
            .map(|v| match v {
                Value::Timestamp(ts) => Value::Date(ts.date()),
                _ => Value::Null,
            })
            .collect()
    });
    if let Some(dates) = dates {
        out = out.with_column(columns::PICKUP_DATE, dates);
    }

    Ok(out)
}

/// Left join `left` with `right` on `spec`.
///
/// Every left row is kept. Unmatched or null keys fill the right columns with
/// nulls; a key occurring several times on the right repeats the left row
/// once per match.
pub fn left_join(left: &Table, right: &Table, spec: JoinSpec<'_>) -> Result<Table> {
    let left_idx = left.require_column(spec.left_key)?;
    let right_idx = right
        .require_column(spec.right_key)
        .map_err(|_| DashboardError::missing_column(format!("{}.{}", right.name(), spec.right_key)))?;

    let carried: Vec<usize> = (0..right.columns().len())
        .filter(|&i| i != right_idx)
        .collect();

    let mut columns: Vec<String> = left.columns().to_vec();
    for &i in &carried {
        let name = reconcile_name(&columns, right.name(), &right.columns()[i]);
        columns.push(name);
    }

    let mut index: HashMap<JoinKey, Vec<usize>> = HashMap::new();
    for (pos, row) in right.rows().iter().enumerate() {
        if let Some(key) = row[right_idx].join_key() {
            index.entry(key).or_default().push(pos);
        }
    }

    let mut joined = Table::new(left.name(), columns);
    let mut unmatched = 0usize;
    let mut expanded = 0usize;

    for row in left.rows() {
        let matches = row[left_idx]
            .join_key()
            .and_then(|key| index.get(&key))
            .map(Vec::as_slice)
            .unwrap_or_default();

        if matches.is_empty() {
            unmatched += 1;
            let mut out = row.clone();
            out.extend(carried.iter().map(|_| Value::Null));
            joined.push_row(out);
            continue;
        }

        expanded += matches.len() - 1;
        for &pos in matches {
            let right_row = &right.rows()[pos];
            let mut out = row.clone();
            out.extend(carried.iter().map(|&i| right_row[i].clone()));
            joined.push_row(out);
        }
    }

    debug!(
        left = left.name(),
        right = right.name(),
        key = spec.left_key,
        rows = joined.len(),
        unmatched,
        expanded,
        "left join"
    );
    Ok(joined)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_time_cell(value: &Value, column: &str, row: usize) -> Result<Value> {
    match value {
        Value::Null | Value::Timestamp(_) => Ok(value.clone()),
        Value::Date(d) => Ok(d.and_hms_opt(0, 0, 0).map_or(Value::Null, Value::Timestamp)),
        Value::Text(s) => parse_timestamp(s)
            .map(Value::Timestamp)
            .ok_or_else(|| DashboardError::DataFormat {
                column: column.to_string(),
                row,
                value: s.clone(),
            }),
        other => Err(DashboardError::DataFormat {
            column: column.to_string(),
            row,
            value: other.to_string(),
        }),
    }
}

/// Name for a carried right-hand column that does not clash with `existing`.
fn reconcile_name(existing: &[String], right_table: &str, column: &str) -> String {
    if !existing.iter().any(|c| c == column) {
        return column.to_string();
    }
    let base = format!("{right_table}_{column}");
    let mut candidate = base.clone();
    let mut n = 2;
    while existing.iter().any(|c| *c == candidate) {
        candidate = format!("{base}_{n}");
        n += 1;
    }
    candidate
}
