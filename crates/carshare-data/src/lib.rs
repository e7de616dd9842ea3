//! Data layer for the carshare dashboard.
//!
//! Loads the five CSV datasets, joins them into one trip table, applies the
//! brand filter and computes the dashboard metrics and grouped series.

pub mod aggregator;
pub mod analysis;
pub mod columns;
pub mod enrich;
pub mod filter;
pub mod reader;

pub use analysis::{build_report, DashboardReport};
pub use filter::BrandFilter;
pub use reader::DataSources;
