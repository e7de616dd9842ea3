pub mod bar_chart;
pub mod brand_selector;
pub mod header;
pub mod line_chart;
pub mod metrics;
