//! Default process metrics and the background task that samples them.

use super::process_stats::{ProcessSource, ProcessStats};
use crate::domain::MetricsError;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Counter, Gauge, Opts};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Settings for [`MetricRegistry::collect_default_metrics`](super::MetricRegistry::collect_default_metrics).
#[derive(Debug, Clone)]
pub struct DefaultMetricsConfig {
    /// Prepended to every default metric name.
    pub prefix: String,

    /// Longest a single sampling tick may take before it is abandoned.
    pub timeout: Duration,

    /// Time between sampling ticks.
    pub interval: Duration,
}

impl Default for DefaultMetricsConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            timeout: Duration::from_secs(10),
            interval: Duration::from_secs(10),
        }
    }
}

/// Process-level metrics, registered as one unit so the whole bundle either
/// registers or is rejected.
#[derive(Clone)]
pub(crate) struct ProcessMetrics {
    source: Arc<ProcessSource>,
    started: Instant,
    cpu_user: Counter,
    cpu_system: Counter,
    cpu_total: Counter,
    start_time: Gauge,
    uptime: Gauge,
    resident_memory: Gauge,
    virtual_memory: Gauge,
    open_fds: Gauge,
    max_fds: Gauge,
    threads: Gauge,
}

impl ProcessMetrics {
    pub(crate) fn new(prefix: &str) -> Result<Self, MetricsError> {
        // ---
        let opts = |name: &str, help: &str| Opts::new(format!("{prefix}{name}"), help);
        let gauge = |name: &str, help: &str| {
            Gauge::with_opts(opts(name, help)).map_err(MetricsError::InvalidMetric)
        };
        let counter = |name: &str, help: &str| {
            Counter::with_opts(opts(name, help)).map_err(MetricsError::InvalidMetric)
        };

        let metrics = Self {
            source: Arc::new(ProcessSource::new()),
            started: Instant::now(),
            cpu_user: counter(
                "process_cpu_user_seconds_total",
                "Total user CPU time spent in seconds.",
            )?,
            cpu_system: counter(
                "process_cpu_system_seconds_total",
                "Total system CPU time spent in seconds.",
            )?,
            cpu_total: counter(
                "process_cpu_seconds_total",
                "Total user and system CPU time spent in seconds.",
            )?,
            start_time: gauge(
                "process_start_time_seconds",
                "Start time of the process since unix epoch in seconds.",
            )?,
            uptime: gauge("process_uptime_seconds", "Process uptime in seconds.")?,
            resident_memory: gauge(
                "process_resident_memory_bytes",
                "Resident memory size in bytes.",
            )?,
            virtual_memory: gauge(
                "process_virtual_memory_bytes",
                "Virtual memory size in bytes.",
            )?,
            open_fds: gauge("process_open_fds", "Number of open file descriptors.")?,
            max_fds: gauge(
                "process_max_fds",
                "Maximum number of open file descriptors.",
            )?,
            threads: gauge("process_threads", "Number of OS threads in the process.")?,
        };

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        metrics.start_time.set(now.as_secs() as f64);

        Ok(metrics)
    }

    fn parts(&self) -> [&dyn Collector; 10] {
        [
            &self.cpu_user,
            &self.cpu_system,
            &self.cpu_total,
            &self.start_time,
            &self.uptime,
            &self.resident_memory,
            &self.virtual_memory,
            &self.open_fds,
            &self.max_fds,
            &self.threads,
        ]
    }

    /// Runs one sampling tick.
    ///
    /// Uptime is always refreshed. OS statistics that cannot be read keep
    /// their previous value; the whole read is abandoned after `timeout`.
    pub(crate) async fn sample(&self, timeout: Duration) -> Result<(), MetricsError> {
        // ---
        self.uptime.set(self.started.elapsed().as_secs_f64());

        let source = Arc::clone(&self.source);
        let read = tokio::task::spawn_blocking(move || source.read());

        let stats = tokio::time::timeout(timeout, read)
            .await
            .map_err(|_| MetricsError::SamplingTimeout(timeout))?
            .map_err(|err| MetricsError::SamplingFailed(err.to_string()))?;

        self.apply(stats);
        Ok(())
    }

    fn apply(&self, stats: ProcessStats) {
        // ---
        if let (Ok(user), Ok(system)) = (&stats.cpu_user_seconds, &stats.cpu_system_seconds) {
            advance(&self.cpu_total, user + system);
        }
        advance_with(&self.cpu_user, stats.cpu_user_seconds);
        advance_with(&self.cpu_system, stats.cpu_system_seconds);

        update(&self.resident_memory, stats.resident_memory_bytes);
        update(&self.virtual_memory, stats.virtual_memory_bytes);
        update(&self.open_fds, stats.open_fds);
        update(&self.max_fds, stats.max_fds);
        update(&self.threads, stats.threads);
    }
}

fn metric_name(metric: &dyn Collector) -> String {
    metric
        .desc()
        .first()
        .map(|desc| desc.fq_name.clone())
        .unwrap_or_default()
}

fn update(gauge: &Gauge, value: io::Result<f64>) {
    match value {
        Ok(value) => gauge.set(value),
        Err(err) => {
            tracing::warn!(metric = %metric_name(gauge), error = %err, "Keeping last value of process metric");
        }
    }
}

fn advance_with(counter: &Counter, value: io::Result<f64>) {
    match value {
        Ok(value) => advance(counter, value),
        Err(err) => {
            tracing::warn!(metric = %metric_name(counter), error = %err, "Keeping last value of process metric");
        }
    }
}

/// Moves a cumulative counter up to `total`. Counters never go down.
fn advance(counter: &Counter, total: f64) {
    let delta = total - counter.get();
    if delta > 0.0 {
        counter.inc_by(delta);
    }
}

impl Collector for ProcessMetrics {
    fn desc(&self) -> Vec<&Desc> {
        self.parts()
            .into_iter()
            .flat_map(|metric| metric.desc())
            .collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.parts()
            .into_iter()
            .flat_map(|metric| metric.collect())
            .collect()
    }
}

/// Lifecycle handle for the default metrics sampler.
///
/// Dropping the handle cancels the task; [`SamplerHandle::stop`] also waits
/// for it to exit.
#[derive(Debug)]
pub struct SamplerHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SamplerHandle {
    /// Stops future ticks. A tick in progress is abandoned; gauges are
    /// updated one value at a time, so none is left half-written.
    pub async fn stop(mut self) {
        // ---
        self.cancel.cancel();

        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "Default metrics sampler ended abnormally");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawns the periodic sampler. The first tick runs immediately.
pub(crate) fn spawn_sampler(metrics: ProcessMetrics, config: &DefaultMetricsConfig) -> SamplerHandle {
    // ---
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let timeout = config.timeout;
    // tokio::time::interval panics on a zero period
    let period = config.interval.max(Duration::from_millis(1));

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                _ = token.cancelled() => break,
                result = metrics.sample(timeout) => {
                    if let Err(err) = result {
                        tracing::warn!(error = %err, "Default metrics sampling skipped");
                    }
                }
            }
        }

        tracing::debug!("Default metrics sampler stopped");
    });

    SamplerHandle {
        cancel,
        task: Some(task),
    }
}
