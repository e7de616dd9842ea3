//! Terminal UI layer for the carshare dashboard.
//!
//! Provides themes, metric cards, bar and line charts, the brand selector,
//! the data preview table and the interactive event loop, all rendered with
//! [`ratatui`].

pub mod app;
pub mod components;
pub mod table_view;
pub mod themes;

pub use carshare_core as core;
