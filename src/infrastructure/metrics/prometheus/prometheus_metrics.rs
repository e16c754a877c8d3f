//! Prometheus metrics implementation.
//!
//! This module provides the concrete implementation of the `Metrics` trait.
//! It owns an injected [`MetricRegistry`] plus the two request metrics, and
//! translates each [`Observation`] into one counter increment and one
//! histogram observation.

use super::{Counter, Histogram, MetricRegistry};
use crate::domain::{Metrics, MetricsError, Observation};
use std::sync::Arc;

/// Label names shared by both request metrics, in exposition order.
pub const HTTP_LABELS: [&str; 3] = ["method", "path", "status"];

/// Prometheus-based metrics implementation.
pub struct PrometheusMetrics {
    registry: Arc<MetricRegistry>,
    requests_total: Counter,
    request_duration: Histogram,
}

impl PrometheusMetrics {
    /// Declares `<prefix>http_requests_total` and
    /// `<prefix>http_request_duration_seconds` and registers both in
    /// `registry`.
    ///
    /// # Errors
    /// Fails with [`MetricsError::DuplicateMetricName`] if either name is
    /// already taken. Callers treat this as fatal at startup.
    pub fn new(registry: Arc<MetricRegistry>, prefix: &str) -> Result<Self, MetricsError> {
        // ---
        let requests_total = Counter::new(
            &format!("{prefix}http_requests_total"),
            "Total number of HTTP requests",
            &HTTP_LABELS,
        )?;
        let request_duration = Histogram::new(
            &format!("{prefix}http_request_duration_seconds"),
            "Duration of HTTP requests in seconds",
            &HTTP_LABELS,
        )?;

        registry.register(requests_total.clone())?;
        registry.register(request_duration.clone())?;
        tracing::info!("Creating Prometheus metrics");

        Ok(Self {
            registry,
            requests_total,
            request_duration,
        })
    }
}

impl Metrics for PrometheusMetrics {
    fn render(&self) -> Result<String, MetricsError> {
        self.registry.render()
    }

    fn content_type(&self) -> &'static str {
        self.registry.content_type()
    }

    fn record_http_request(&self, observation: &Observation) {
        // ---
        let status = observation.status.to_string();
        let labels = [observation.method.as_str(), observation.path.as_str(), status.as_str()];

        if let Err(err) = self.requests_total.increment(&labels) {
            tracing::warn!(error = %err, "Failed to count HTTP request");
        }
        if let Err(err) = self
            .request_duration
            .observe(&labels, observation.duration_seconds())
        {
            tracing::warn!(error = %err, "Failed to observe HTTP request duration");
        }
    }
}
