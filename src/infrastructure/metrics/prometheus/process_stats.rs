//! Process statistics for the default metrics bundle.
//!
//! Memory, file descriptor and thread counts come from the `prometheus`
//! crate's [`ProcessCollector`]; CPU time is split into user and system
//! from `/proc/self/stat`. Both read procfs, so the read is blocking and
//! only available on Linux. Each statistic is reported separately so one
//! unreadable value does not discard the others.

use prometheus::proto::MetricFamily;
use std::io;

#[cfg(target_os = "linux")]
use prometheus::core::Collector;
#[cfg(target_os = "linux")]
use prometheus::process_collector::ProcessCollector;

#[derive(Debug)]
pub(crate) struct ProcessStats {
    pub cpu_user_seconds: io::Result<f64>,
    pub cpu_system_seconds: io::Result<f64>,
    pub resident_memory_bytes: io::Result<f64>,
    pub virtual_memory_bytes: io::Result<f64>,
    pub open_fds: io::Result<f64>,
    pub max_fds: io::Result<f64>,
    pub threads: io::Result<f64>,
}

/// Reads statistics of the current process.
pub(crate) struct ProcessSource {
    #[cfg(target_os = "linux")]
    collector: ProcessCollector,
}

impl ProcessSource {
    pub(crate) fn new() -> Self {
        Self {
            #[cfg(target_os = "linux")]
            collector: ProcessCollector::for_self(),
        }
    }

    /// Blocking read; run it off the async workers.
    #[cfg(target_os = "linux")]
    pub(crate) fn read(&self) -> ProcessStats {
        // ---
        let families = self.collector.collect();
        let (cpu_user_seconds, cpu_system_seconds) = match read_cpu_ticks() {
            Ok((user, system)) => {
                let ticks = procfs::ticks_per_second();
                (
                    Ok(ticks_to_seconds(user, ticks)),
                    Ok(ticks_to_seconds(system, ticks)),
                )
            }
            Err(err) => (
                Err(io::Error::new(err.kind(), err.to_string())),
                Err(err),
            ),
        };

        ProcessStats {
            cpu_user_seconds,
            cpu_system_seconds,
            resident_memory_bytes: gauge_value(&families, "process_resident_memory_bytes"),
            virtual_memory_bytes: gauge_value(&families, "process_virtual_memory_bytes"),
            open_fds: gauge_value(&families, "process_open_fds"),
            max_fds: gauge_value(&families, "process_max_fds"),
            threads: gauge_value(&families, "process_threads"),
        }
    }

    #[cfg(not(target_os = "linux"))]
    pub(crate) fn read(&self) -> ProcessStats {
        let unsupported = || {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "process statistics need procfs",
            ))
        };

        ProcessStats {
            cpu_user_seconds: unsupported(),
            cpu_system_seconds: unsupported(),
            resident_memory_bytes: unsupported(),
            virtual_memory_bytes: unsupported(),
            open_fds: unsupported(),
            max_fds: unsupported(),
            threads: unsupported(),
        }
    }
}

#[cfg(target_os = "linux")]
fn read_cpu_ticks() -> io::Result<(u64, u64)> {
    let stat = procfs::process::Process::myself()
        .and_then(|process| process.stat())
        .map_err(io::Error::other)?;
    Ok((stat.utime, stat.stime))
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn ticks_to_seconds(ticks: u64, ticks_per_second: u64) -> f64 {
    ticks as f64 / ticks_per_second.max(1) as f64
}

/// Value of the single-gauge family `name`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn gauge_value(families: &[MetricFamily], name: &str) -> io::Result<f64> {
    families
        .iter()
        .find(|family| family.name() == name)
        .and_then(|family| family.get_metric().first())
        .map(|metric| metric.gauge.value())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{name} not reported by the process collector"),
            )
        })
}
