use super::MetricsError;
use std::sync::Arc;
use std::time::Duration;

/// One completed HTTP request, as seen by the instrumentation middleware.
///
/// `path` is the raw request path without the query string. It is not
/// templated, so `/users/1` and `/users/2` become distinct label values.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub method: String,
    pub path: String,
    pub status: u16,
    pub duration: Duration,
}

impl Observation {
    /// Elapsed time in seconds, the unit the duration histogram is declared in.
    pub fn duration_seconds(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

/// Abstraction for application metrics (request counter, latency histogram
/// and exposition).
pub trait Metrics: Send + Sync + 'static {
    // ---
    /// Render current metrics in Prometheus text format.
    fn render(&self) -> Result<String, MetricsError>;

    /// MIME type of the output of [`Metrics::render`].
    fn content_type(&self) -> &'static str;

    /// Record one completed HTTP request.
    ///
    /// Implementations must not panic or block; failures are logged.
    fn record_http_request(&self, observation: &Observation);
}

/// Type alias for any backend that implements Metrics.
pub type MetricsPtr = Arc<dyn Metrics>;
