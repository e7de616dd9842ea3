//! CSV loading for the five dashboard datasets.
//!
//! Each file is read whole into a [`Table`]. Column types are inferred from
//! content: a column whose non-empty cells all parse as integers becomes
//! `Int`, else as floats becomes `Float`, otherwise `Text`. Empty cells and
//! the usual missing-value markers become `Null`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use carshare_core::error::{DashboardError, Result};
use carshare_core::models::{Dataset, SourceTables, Table, Value};
use tracing::debug;

/// Cell contents treated as missing values.
const NULL_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
];

// ── DataSources ───────────────────────────────────────────────────────────────

/// Fixed on-disk locations of the five source tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSources {
    dir: PathBuf,
}

impl DataSources {
    /// Sources laid out as `<dir>/<dataset>.csv`.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, dataset: Dataset) -> PathBuf {
        self.dir.join(dataset.file_name())
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load all five datasets. Fails on the first missing or malformed file.
pub fn load_sources(sources: &DataSources) -> Result<SourceTables> {
    let start = Instant::now();
    let load = |dataset: Dataset| load_table(dataset.name(), &sources.path(dataset));

    let tables = SourceTables {
        trips: load(Dataset::Trips)?,
        cars: load(Dataset::Cars)?,
        cities: load(Dataset::Cities)?,
        customers: load(Dataset::Customers)?,
        ratings: load(Dataset::Ratings)?,
    };

    debug!(
        dir = %sources.dir().display(),
        rows = tables.total_rows(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "loaded source tables"
    );
    Ok(tables)
}

/// Read one CSV file with a header row into a typed [`Table`].
pub fn load_table(name: &str, path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).map_err(|source| DashboardError::FileRead {
        name: name.to_string(),
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(name, path, file)
}

/// Parse CSV content from any reader. `path` is only used in error messages.
pub fn parse_table<R: std::io::Read>(name: &str, path: &Path, input: R) -> Result<Table> {
    let malformed = |detail: String| DashboardError::DataSource {
        name: name.to_string(),
        path: path.to_path_buf(),
        detail,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| malformed(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(malformed("missing header row".to_string()));
    }
    let columns = dedupe_headers(headers);

    let mut raw: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| malformed(e.to_string()))?;
        raw.push(record.iter().map(str::to_string).collect());
    }

    let kinds: Vec<CellKind> = (0..columns.len())
        .map(|idx| infer_kind(raw.iter().map(|row| row[idx].as_str())))
        .collect();

    let rows = raw.into_iter().map(|row| {
        row.into_iter()
            .zip(&kinds)
            .map(|(cell, kind)| convert(cell, *kind))
            .collect()
    });
    let table = Table::from_rows(name, columns, rows);

    debug!(
        table = name,
        rows = table.len(),
        columns = table.columns().len(),
        "parsed csv"
    );
    Ok(table)
}

// ── Type inference ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Int,
    Float,
    Text,
}

fn is_null_marker(cell: &str) -> bool {
    NULL_MARKERS.contains(&cell)
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> CellKind {
    let mut kind = CellKind::Int;
    for cell in cells.filter(|c| !is_null_marker(c)) {
        if kind == CellKind::Int && cell.parse::<i64>().is_err() {
            kind = CellKind::Float;
        }
        if kind == CellKind::Float && cell.parse::<f64>().is_err() {
            return CellKind::Text;
        }
    }
    kind
}

fn convert(cell: String, kind: CellKind) -> Value {
    if is_null_marker(&cell) {
        return Value::Null;
    }
    match kind {
        CellKind::Int => cell.parse().map(Value::Int).unwrap_or(Value::Text(cell)),
        CellKind::Float => cell.parse().map(Value::Float).unwrap_or(Value::Text(cell)),
        CellKind::Text => Value::Text(cell),
    }
}

/// Suffix repeated header names (`id`, `id.1`, ...) so lookups stay unambiguous.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .map(|h| {
            let count = seen.entry(h.clone()).or_insert(0);
            let name = if *count == 0 {
                h
            } else {
                format!("{h}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<Table> {
        parse_table("t", Path::new("t.csv"), content.as_bytes())
    }

    #[test]
    fn test_infers_int_float_text() {
        let t = parse("id,distance,brand\n1,10.5,Toyota\n2,20,Honda\n").unwrap();
        assert_eq!(t.value(0, "id"), Some(&Value::Int(1)));
        assert_eq!(t.value(1, "distance"), Some(&Value::Float(20.0)));
        assert_eq!(t.value(0, "brand"), Some(&Value::Text("Toyota".into())));
    }

    #[test]
    fn test_empty_and_na_cells_are_null() {
        let t = parse("id,revenue\n1,\n2,NaN\n3,12\n").unwrap();
        assert_eq!(t.value(0, "revenue"), Some(&Value::Null));
        assert_eq!(t.value(1, "revenue"), Some(&Value::Null));
        assert_eq!(t.value(2, "revenue"), Some(&Value::Int(12)));
    }

    #[test]
    fn test_mixed_column_falls_back_to_text() {
        let t = parse("code\n1\nA2\n").unwrap();
        assert_eq!(t.value(0, "code"), Some(&Value::Text("1".into())));
        assert_eq!(t.value(1, "code"), Some(&Value::Text("A2".into())));
    }

    #[test]
    fn test_trims_whitespace() {
        let t = parse("id , brand\n 7 , Kia \n").unwrap();
        assert_eq!(t.columns(), &["id".to_string(), "brand".to_string()]);
        assert_eq!(t.value(0, "id"), Some(&Value::Int(7)));
        assert_eq!(t.value(0, "brand"), Some(&Value::Text("Kia".into())));
    }

    #[test]
    fn test_header_only_file_is_empty_table() {
        let t = parse("id,brand\n").unwrap();
        assert!(t.is_empty());
        assert_eq!(t.columns().len(), 2);
    }

    #[test]
    fn test_duplicate_headers_are_suffixed() {
        let t = parse("id,id,name\n1,2,x\n").unwrap();
        assert_eq!(t.columns(), &["id", "id.1", "name"].map(String::from));
    }

    #[test]
    fn test_ragged_rows_are_malformed() {
        let err = parse("a,b\n1,2\n3\n").unwrap_err();
        assert!(matches!(err, DashboardError::DataSource { .. }), "{err}");
    }

    #[test]
    fn test_empty_file_is_malformed() {
        let err = parse("").unwrap_err();
        assert!(matches!(err, DashboardError::DataSource { .. }), "{err}");
    }

    #[test]
    fn test_missing_file_is_file_read_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_table("trips", &tmp.path().join("trips.csv")).unwrap_err();
        match err {
            DashboardError::FileRead { name, .. } => assert_eq!(name, "trips"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_sources_reads_all_five() {
        let tmp = TempDir::new().unwrap();
        for dataset in Dataset::ALL {
            std::fs::write(
                tmp.path().join(dataset.file_name()),
                format!("id,label\n1,{}\n", dataset.name()),
            )
            .unwrap();
        }

        let sources = DataSources::from_dir(tmp.path());
        let tables = load_sources(&sources).unwrap();
        assert_eq!(tables.total_rows(), 5);
        assert_eq!(
            tables.ratings.value(0, "label"),
            Some(&Value::Text("ratings".into()))
        );
        assert_eq!(tables.cars.name(), "cars");
    }

    #[test]
    fn test_load_sources_fails_when_one_file_missing() {
        let tmp = TempDir::new().unwrap();
        for dataset in [Dataset::Trips, Dataset::Cars, Dataset::Cities, Dataset::Customers] {
            std::fs::write(tmp.path().join(dataset.file_name()), "id\n1\n").unwrap();
        }

        let err = load_sources(&DataSources::from_dir(tmp.path())).unwrap_err();
        match err {
            DashboardError::FileRead { name, .. } => assert_eq!(name, "ratings"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
