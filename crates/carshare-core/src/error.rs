use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the carshare dashboard.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A source file could not be opened or read from disk.
    #[error("Failed to read {name} data from {path}: {source}")]
    FileRead {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file exists but is not a well-formed CSV table.
    #[error("Malformed {name} data in {path}: {detail}")]
    DataSource {
        name: String,
        path: PathBuf,
        detail: String,
    },

    /// A cell value could not be interpreted in the type its column requires.
    #[error("Invalid value {value:?} in column '{column}' at row {row}")]
    DataFormat {
        column: String,
        row: usize,
        value: String,
    },

    /// A column required by a computation is absent from the table.
    #[error("Missing required column '{column}'")]
    Schema { column: String },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to serialise a report or settings file.
    #[error("Failed to serialise JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DashboardError {
    /// Shorthand for [`DashboardError::Schema`].
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::Schema {
            column: column.into(),
        }
    }

    /// `true` for errors that only invalidate the metrics depending on the
    /// offending column, as opposed to the whole dashboard.
    pub fn is_scoped(&self) -> bool {
        matches!(self, Self::Schema { .. } | Self::DataFormat { .. })
    }
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;
