use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::{DashboardError, Result};

/// Placeholder shown wherever a metric could not be computed.
pub const UNAVAILABLE: &str = "unavailable";

// ── Value ─────────────────────────────────────────────────────────────────────

/// A single dynamically typed cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Empty cell, unmatched join column or unparsable optional value.
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell. `None` for nulls and non-numeric cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if f.is_nan() => None,
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Key used when partitioning rows into groups. Nulls form no group.
    pub fn group_key(&self) -> Option<String> {
        if self.is_null() {
            None
        } else {
            Some(self.to_string())
        }
    }

    /// Normalised key used to match rows across tables.
    ///
    /// Integral floats compare equal to ints so that `3` and `3.0` join.
    pub fn join_key(&self) -> Option<JoinKey> {
        match self {
            Value::Null => None,
            Value::Int(i) => Some(JoinKey::Int(*i)),
            Value::Float(f) if f.is_nan() => None,
            Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some(JoinKey::Int(*f as i64))
            }
            other => Some(JoinKey::Text(other.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Hashable join key derived from a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinKey {
    Int(i64),
    Text(String),
}

// ── Table ─────────────────────────────────────────────────────────────────────

/// An immutable in-memory table: ordered column names plus rows of cells.
///
/// Every row holds exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given column names.
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from rows, padding short rows with nulls and
    /// truncating long ones.
    pub fn from_rows(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: impl IntoIterator<Item = Vec<Value>>,
    ) -> Self {
        let mut table = Self::new(name, columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Append a row, normalising it to the table width.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Index of `column`, or a [`DashboardError::Schema`] when absent.
    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| DashboardError::missing_column(column))
    }

    /// Iterate over the cells of one column.
    pub fn column(&self, column: &str) -> Result<impl Iterator<Item = &Value> + '_> {
        let idx = self.require_column(column)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Cell at `row` in `column`, `None` when either is out of range.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Return a copy with `column` set to `values`, replacing an existing
    /// column of the same name or appending a new one.
    ///
    /// `values` is normalised to the row count (missing cells become null).
    pub fn with_column(&self, column: &str, mut values: Vec<Value>) -> Table {
        values.resize(self.rows.len(), Value::Null);
        let mut out = self.clone();
        match out.column_index(column) {
            Some(idx) => {
                for (row, value) in out.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                out.columns.push(column.to_string());
                for (row, value) in out.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        out
    }

    /// Return a copy without the named columns. Absent names are ignored.
    pub fn drop_columns(&self, names: &[&str]) -> Table {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !names.contains(&self.columns[i].as_str()))
            .collect();
        if keep.len() == self.columns.len() {
            return self.clone();
        }

        let columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Table {
            name: self.name.clone(),
            columns,
            rows,
        }
    }

    /// Return a copy holding only the rows for which `keep` is true.
    pub fn filter_rows(&self, mut keep: impl FnMut(&[Value]) -> bool) -> Table {
        Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r.as_slice())).cloned().collect(),
        }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Same table under a different name.
    pub fn renamed(mut self, name: impl Into<String>) -> Table {
        self.name = name.into();
        self
    }
}

// ── Source tables ─────────────────────────────────────────────────────────────

/// The five datasets the dashboard is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Trips,
    Cars,
    Cities,
    Customers,
    Ratings,
}

impl Dataset {
    pub const ALL: [Dataset; 5] = [
        Dataset::Trips,
        Dataset::Cars,
        Dataset::Cities,
        Dataset::Customers,
        Dataset::Ratings,
    ];

    /// Logical name, also the file stem on disk.
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Trips => "trips",
            Dataset::Cars => "cars",
            Dataset::Cities => "cities",
            Dataset::Customers => "customers",
            Dataset::Ratings => "ratings",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name())
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Snapshot of all loaded source tables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceTables {
    pub trips: Table,
    pub cars: Table,
    pub cities: Table,
    pub customers: Table,
    /// Loaded for completeness; no metric consumes it.
    pub ratings: Table,
}

impl SourceTables {
    pub fn get(&self, dataset: Dataset) -> &Table {
        match dataset {
            Dataset::Trips => &self.trips,
            Dataset::Cars => &self.cars,
            Dataset::Cities => &self.cities,
            Dataset::Customers => &self.customers,
            Dataset::Ratings => &self.ratings,
        }
    }

    /// Total rows across all five tables.
    pub fn total_rows(&self) -> usize {
        Dataset::ALL.iter().map(|d| self.get(*d).len()).sum()
    }
}

// ── Metric ────────────────────────────────────────────────────────────────────

/// Why a metric could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnavailableReason {
    /// A column the metric depends on is absent.
    MissingColumn { column: String },
    /// A cell could not be read in the type the metric needs.
    InvalidValue { column: String, detail: String },
    /// The table has no rows to reduce.
    NoData,
}

impl UnavailableReason {
    /// Reason corresponding to a scoped error, `None` for fatal errors.
    pub fn from_error(err: &DashboardError) -> Option<Self> {
        match err {
            DashboardError::Schema { column } => Some(Self::MissingColumn {
                column: column.clone(),
            }),
            DashboardError::DataFormat { column, row, value } => Some(Self::InvalidValue {
                column: column.clone(),
                detail: format!("{value:?} at row {row}"),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { column } => write!(f, "column '{column}' not present"),
            Self::InvalidValue { column, detail } => {
                write!(f, "invalid data in '{column}': {detail}")
            }
            Self::NoData => f.write_str("no rows"),
        }
    }
}

/// Result of a metric whose inputs may be missing.
///
/// Distinguishes "not computed" from "computed as zero".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Metric<T> {
    Computed(T),
    Unavailable(UnavailableReason),
}

impl<T> Metric<T> {
    /// Convert a computation result, turning scoped errors (missing column,
    /// bad cell) into [`Metric::Unavailable`] and passing fatal ones through.
    pub fn from_result(result: Result<T>) -> Result<Metric<T>> {
        match result {
            Ok(value) => Ok(Metric::Computed(value)),
            Err(err) => match UnavailableReason::from_error(&err) {
                Some(reason) => Ok(Metric::Unavailable(reason)),
                None => Err(err),
            },
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Computed(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Metric::Computed(v) => Some(v),
            Metric::Unavailable(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&UnavailableReason> {
        match self {
            Metric::Computed(_) => None,
            Metric::Unavailable(r) => Some(r),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Metric<U> {
        match self {
            Metric::Computed(v) => Metric::Computed(f(v)),
            Metric::Unavailable(r) => Metric::Unavailable(r),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Metric<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Computed(v) => v.fmt(f),
            Metric::Unavailable(_) => f.write_str(UNAVAILABLE),
        }
    }
}
