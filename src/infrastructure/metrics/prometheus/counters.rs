use crate::domain::MetricsError;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{CounterVec, Opts};

/// Monotonically increasing counter partitioned by a fixed, ordered list of
/// label names.
///
/// Cloning is cheap and every clone shares the same series, which is how
/// the registry and the request path hold the same counter.
#[derive(Clone)]
pub struct Counter {
    name: String,
    inner: CounterVec,
}

impl Counter {
    /// Declares a counter. Fails if the name or a label name is not a valid
    /// Prometheus identifier.
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self, MetricsError> {
        // ---
        let inner =
            CounterVec::new(Opts::new(name, help), label_names).map_err(MetricsError::InvalidMetric)?;

        Ok(Self {
            name: name.to_string(),
            inner,
        })
    }

    /// Adds one to the series identified by `labels`.
    pub fn increment(&self, labels: &[&str]) -> Result<(), MetricsError> {
        self.increment_by(labels, 1.0)
    }

    /// Adds `amount` to the series identified by `labels`.
    ///
    /// `labels` must hold one value per declared label name, in declaration
    /// order. Negative and NaN amounts are rejected so the value never
    /// decreases.
    pub fn increment_by(&self, labels: &[&str], amount: f64) -> Result<(), MetricsError> {
        // ---
        if amount.is_nan() || amount < 0.0 {
            return Err(MetricsError::InvalidIncrement {
                metric: self.name.clone(),
                amount,
            });
        }

        let series = self
            .inner
            .get_metric_with_label_values(labels)
            .map_err(|source| MetricsError::LabelMismatch {
                metric: self.name.clone(),
                source,
            })?;
        series.inc_by(amount);

        Ok(())
    }
}

impl Collector for Counter {
    fn desc(&self) -> Vec<&Desc> {
        self.inner.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.inner.collect()
    }
}
