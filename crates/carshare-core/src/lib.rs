//! Shared building blocks for the carshare dashboard.
//!
//! Holds the error taxonomy, the in-memory table model, typed metric
//! results, timestamp parsing, number formatting and CLI settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{DashboardError, Result};
pub use models::{Dataset, Metric, SourceTables, Table, UnavailableReason, Value};
