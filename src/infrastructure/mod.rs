pub mod metrics;

// Re-export the factory function for easy access
pub use metrics::create_prom_metrics;
