//! Runtime layer for the carshare dashboard.
//!
//! Owns the source-table cache and the interactive session state that sits
//! between the data pipeline and the UI.

pub mod data_manager;
pub mod session;

pub use carshare_core as core;
pub use carshare_data as data;
