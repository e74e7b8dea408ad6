//! Pull-based observability for the exporter
//!
//! The latest measurement per target is kept in a private Prometheus
//! registry and rendered in the text exposition format on every scrape.

pub mod metrics;

pub use metrics::Metrics;
