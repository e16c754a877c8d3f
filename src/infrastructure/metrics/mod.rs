pub mod prometheus;

// Re-export the factory function and the building blocks for easy access
pub use self::prometheus::create as create_prom_metrics;
pub use self::prometheus::{
    Counter, DefaultMetricsConfig, Histogram, MetricRegistry, PrometheusMetrics, SamplerHandle,
};
