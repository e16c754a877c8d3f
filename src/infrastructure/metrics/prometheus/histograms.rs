use crate::domain::MetricsError;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{HistogramOpts, HistogramVec};

/// Histogram partitioned by a fixed, ordered list of label names.
///
/// Buckets are cumulative: an observation lands in every bucket whose upper
/// bound is greater than or equal to the value, plus the implicit `+Inf`
/// bucket, which therefore always equals the observation count.
#[derive(Clone)]
pub struct Histogram {
    name: String,
    inner: HistogramVec,
}

impl Histogram {
    /// Declares a histogram with the default latency buckets
    /// (`0.005` to `10` seconds).
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self, MetricsError> {
        Self::with_buckets(name, help, label_names, prometheus::DEFAULT_BUCKETS.to_vec())
    }

    /// Declares a histogram with explicit bucket upper bounds, which must be
    /// strictly ascending.
    pub fn with_buckets(
        name: &str,
        help: &str,
        label_names: &[&str],
        buckets: Vec<f64>,
    ) -> Result<Self, MetricsError> {
        // ---
        // The vec only validates buckets when a series is first created.
        if buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(MetricsError::InvalidMetric(prometheus::Error::Msg(format!(
                "histogram `{name}` buckets must be strictly ascending: {buckets:?}"
            ))));
        }

        let opts = HistogramOpts::new(name, help).buckets(buckets);
        let inner = HistogramVec::new(opts, label_names).map_err(MetricsError::InvalidMetric)?;

        Ok(Self {
            name: name.to_string(),
            inner,
        })
    }

    /// Records `value` into the series identified by `labels`.
    ///
    /// Values must be finite and non-negative; anything else would corrupt
    /// the series sum for good.
    pub fn observe(&self, labels: &[&str], value: f64) -> Result<(), MetricsError> {
        // ---
        if !value.is_finite() || value < 0.0 {
            return Err(MetricsError::InvalidObservation {
                metric: self.name.clone(),
                value,
            });
        }

        let series = self
            .inner
            .get_metric_with_label_values(labels)
            .map_err(|source| MetricsError::LabelMismatch {
                metric: self.name.clone(),
                source,
            })?;
        series.observe(value);

        Ok(())
    }
}

impl Collector for Histogram {
    fn desc(&self) -> Vec<&Desc> {
        self.inner.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.inner.collect()
    }
}
