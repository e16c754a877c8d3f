mod counters;
mod default_metrics;
mod histograms;
mod process_stats;
mod prometheus_metrics;
mod registry;

pub use counters::Counter;
pub use default_metrics::{DefaultMetricsConfig, SamplerHandle};
pub use histograms::Histogram;
pub use prometheus_metrics::PrometheusMetrics;
pub use registry::MetricRegistry;

use crate::config::MetricsConfig;
use std::sync::Arc;

/// Creates the Prometheus metrics backend.
///
/// Builds a fresh registry, starts default process metrics under the
/// configured prefix, and registers the HTTP request counter and duration
/// histogram. Must be called from within a tokio runtime.
///
/// Returns the metrics instance together with the sampler handle, which the
/// caller stops on shutdown.
pub fn create(config: &MetricsConfig) -> anyhow::Result<(crate::domain::MetricsPtr, SamplerHandle)> {
    // ---
    tracing::info!("Initializing Prometheus metrics");

    let registry = Arc::new(MetricRegistry::new());
    let sampler = registry.collect_default_metrics(&DefaultMetricsConfig {
        prefix: config.prefix.clone(),
        timeout: config.sampling_timeout,
        interval: config.sampling_interval,
    })?;
    let metrics = PrometheusMetrics::new(registry, &config.prefix)?;

    Ok((Arc::new(metrics), sampler))
}
