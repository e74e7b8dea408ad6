// Scrape-time cache decision
pub mod cache_gate;

// Per-target measurement cycle
pub mod orchestrator;

// Pipeline facade
pub mod exporter;
