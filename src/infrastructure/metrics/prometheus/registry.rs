//! Ordered metric registry.
//!
//! Unlike `prometheus::Registry`, which sorts families by name on every
//! gather, this registry keeps metrics in registration order and encodes
//! each one independently. A metric that fails to encode is dropped from
//! the scrape with a warning instead of failing the whole response.

use super::default_metrics::{spawn_sampler, DefaultMetricsConfig, ProcessMetrics, SamplerHandle};
use crate::domain::MetricsError;
use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::TextEncoder;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

type MetricPtr = Arc<dyn Collector>;

/// Owns every metric exposed on the scrape endpoint.
///
/// Registration is expected during startup. Recording goes straight to the
/// metric handles (which are atomic per series), so the lock here only
/// guards the list itself.
#[derive(Default)]
pub struct MetricRegistry {
    metrics: RwLock<Vec<MetricPtr>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `metric` to the registry.
    ///
    /// Fails with [`MetricsError::DuplicateMetricName`] if any name the
    /// metric describes is already taken, in which case nothing is added.
    pub fn register<C>(&self, metric: C) -> Result<(), MetricsError>
    where
        C: Collector + 'static,
    {
        // ---
        let mut metrics = self.metrics.write().map_err(|_| lock_poisoned())?;

        let taken: HashSet<&str> = metrics
            .iter()
            .flat_map(|existing| existing.desc())
            .map(|desc| desc.fq_name.as_str())
            .collect();

        if let Some(desc) = metric
            .desc()
            .into_iter()
            .find(|desc| taken.contains(desc.fq_name.as_str()))
        {
            return Err(MetricsError::DuplicateMetricName(desc.fq_name.clone()));
        }

        tracing::debug!(
            names = ?metric.desc().iter().map(|desc| &desc.fq_name).collect::<Vec<_>>(),
            "Registered metric"
        );
        metrics.push(Arc::new(metric));

        Ok(())
    }

    /// Registers the process metrics bundle under `config.prefix` and starts
    /// the background sampler that keeps it fresh.
    ///
    /// Must be called from within a tokio runtime. The returned handle stops
    /// the sampler when [`SamplerHandle::stop`] is awaited or when dropped.
    pub fn collect_default_metrics(
        &self,
        config: &DefaultMetricsConfig,
    ) -> Result<SamplerHandle, MetricsError> {
        // ---
        let process = ProcessMetrics::new(&config.prefix)?;
        self.register(process.clone())?;

        tracing::info!(
            prefix = %config.prefix,
            interval = ?config.interval,
            timeout = ?config.timeout,
            "Collecting default process metrics"
        );

        Ok(spawn_sampler(process, config))
    }

    /// Lazily serializes each registered metric, in registration order.
    ///
    /// Metrics without any series yet produce no block. Reading never
    /// modifies metric state.
    pub fn collect(&self) -> Result<impl Iterator<Item = String>, MetricsError> {
        // ---
        // Clone the handles so encoding happens outside the lock.
        let metrics = self.metrics.read().map_err(|_| lock_poisoned())?.clone();

        Ok(metrics
            .into_iter()
            .filter_map(|metric| encode_metric(metric.as_ref())))
    }

    /// Full exposition body: every block from [`MetricRegistry::collect`].
    pub fn render(&self) -> Result<String, MetricsError> {
        Ok(self.collect()?.collect())
    }

    /// MIME type of the exposition body.
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }

    /// Number of registered metrics.
    pub fn len(&self) -> usize {
        self.metrics.read().map(|metrics| metrics.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn encode_metric(metric: &dyn Collector) -> Option<String> {
    // ---
    let families: Vec<MetricFamily> = metric
        .collect()
        .into_iter()
        .filter(|family| !family.get_metric().is_empty())
        .collect();

    if families.is_empty() {
        return None;
    }

    let mut block = String::new();
    match TextEncoder::new().encode_utf8(&families, &mut block) {
        Ok(()) => Some(block),
        Err(err) => {
            let name = metric
                .desc()
                .first()
                .map(|desc| desc.fq_name.clone())
                .unwrap_or_default();
            tracing::warn!(metric = %name, error = %err, "Skipping metric that failed to serialize");
            None
        }
    }
}

fn lock_poisoned() -> MetricsError {
    MetricsError::Serialization("metric registry lock poisoned".to_string())
}
