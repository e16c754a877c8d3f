use std::time::Duration;

/// Failures raised by the metrics core.
///
/// Only `DuplicateMetricName` and `InvalidMetric` are expected at startup and
/// are treated as fatal there. Everything else is produced at runtime and is
/// logged by the caller instead of being surfaced to the instrumented request.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("a metric named `{0}` is already registered")]
    DuplicateMetricName(String),

    #[error("invalid metric definition: {0}")]
    InvalidMetric(#[source] prometheus::Error),

    #[error("labels for `{metric}` do not match its declared label names: {source}")]
    LabelMismatch {
        metric: String,
        #[source]
        source: prometheus::Error,
    },

    #[error("counter `{metric}` cannot be incremented by {amount}")]
    InvalidIncrement { metric: String, amount: f64 },

    #[error("histogram `{metric}` cannot observe {value}")]
    InvalidObservation { metric: String, value: f64 },

    #[error("default metrics sampling did not finish within {0:?}")]
    SamplingTimeout(Duration),

    #[error("default metrics sampling failed: {0}")]
    SamplingFailed(String),

    #[error("failed to serialize metrics: {0}")]
    Serialization(String),
}
