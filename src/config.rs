// src/config.rs

//! Application configuration loaded from environment variables.
//!
//! This module defines all startup-time configuration for the service.
//! Every setting has a default; values that parse but make no sense are
//! rejected eagerly and treated as deployment errors rather than
//! recoverable runtime conditions.

use anyhow::{ensure, Result};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================
// Local macros (config-only, intentionally explicit)
// ============================================================

/// Reads an optional environment variable and attempts to parse it.
///
/// If the variable is missing or cannot be parsed, the provided
/// default value is used. This macro is appropriate for non-critical
/// tuning parameters where fallback behavior is acceptable.
macro_rules! optional_env_parse {
    // ---
    ($key:literal, $ty:ty, $default:expr) => {
        std::env::var($key)
            .ok()
            .and_then(|v| v.parse::<$ty>().ok())
            .unwrap_or($default)
    };
}

/// Reads an optional string environment variable with a default.
macro_rules! optional_env {
    // ---
    ($key:literal, $default:expr) => {
        std::env::var($key).unwrap_or_else(|_| $default.to_string())
    };
}

#[cfg(test)]
/// Asserts that a configuration constructor fails because of an invalid
/// value for the given environment variable.
///
/// This macro is intended for config unit tests only and enforces
/// consistent error messages across failure cases.
macro_rules! assert_invalid_config {
    // ---
    ($expr:expr, $key:literal) => {{
        let err = $expr.expect_err("expected configuration error");
        assert!(
            err.to_string()
                .contains(concat!("Invalid configuration: ", $key)),
            "unexpected error: {err}"
        );
    }};
}

// ============================================================
// Public configuration facade
// ============================================================

/// Aggregated application configuration.
///
/// This is the single source of truth for startup configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: server::ServerConfig,
    pub metrics: metrics::MetricsConfig,
}

impl AppConfig {
    /// Loads and validates all application configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if any value is invalid.
    /// This function is intended to be called exactly once at startup.
    pub fn from_env() -> Result<Self> {
        // ---
        Ok(Self {
            server: server::ServerConfig::from_env()?,
            metrics: metrics::MetricsConfig::from_env()?,
        })
    }
}

// ============================================================
// Server configuration
// ============================================================

mod server {
    // ---
    use super::*;

    /// HTTP listener and static content settings.
    #[derive(Debug, Clone)]
    pub struct ServerConfig {
        /// Interface to bind. Defaults to all interfaces.
        pub host: String,

        /// Listen port, from `PORT`. Defaults to 3001.
        pub port: u16,

        /// Directory served as the site root. Defaults to `public`.
        pub static_dir: PathBuf,
    }

    impl ServerConfig {
        /// Builds a [`ServerConfig`] from environment variables.
        pub fn from_env() -> Result<Self> {
            // ---
            let host = optional_env!("TODO_BIND_HOST", "0.0.0.0");
            let port = optional_env_parse!("PORT", u16, 3001);
            let static_dir = PathBuf::from(optional_env!("TODO_STATIC_DIR", "public"));

            ensure!(!host.trim().is_empty(), "Invalid configuration: TODO_BIND_HOST is empty");

            Ok(Self {
                host,
                port,
                static_dir,
            })
        }

        /// `host:port` in the form accepted by `TcpListener::bind`.
        pub fn bind_addr(&self) -> String {
            format!("{}:{}", self.host, self.port)
        }
    }
}
pub use server::ServerConfig;

// ============================================================
// Metrics configuration
// ============================================================

mod metrics {
    // ---
    use super::*;

    /// Metric naming and default process metrics sampling.
    #[derive(Debug, Clone)]
    pub struct MetricsConfig {
        /// Prepended to every metric name. Defaults to `todo_`.
        pub prefix: String,

        /// Longest one sampling tick may take. Defaults to 10 seconds.
        pub sampling_timeout: Duration,

        /// Time between sampling ticks. Defaults to 10 seconds.
        pub sampling_interval: Duration,
    }

    impl MetricsConfig {
        /// Builds a [`MetricsConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if the prefix cannot start a Prometheus metric
        /// name or the sampling interval is zero.
        pub fn from_env() -> Result<Self> {
            // ---
            let prefix = optional_env!("TODO_METRICS_PREFIX", "todo_");
            let timeout_ms = optional_env_parse!("TODO_METRICS_TIMEOUT_MS", u64, 10_000);
            let interval_ms = optional_env_parse!("TODO_METRICS_INTERVAL_MS", u64, 10_000);

            ensure!(
                is_valid_prefix(&prefix),
                "Invalid configuration: TODO_METRICS_PREFIX `{prefix}` is not a valid metric name prefix"
            );
            ensure!(
                interval_ms > 0,
                "Invalid configuration: TODO_METRICS_INTERVAL_MS must be greater than zero"
            );

            Ok(Self {
                prefix,
                sampling_timeout: Duration::from_millis(timeout_ms),
                sampling_interval: Duration::from_millis(interval_ms),
            })
        }
    }

    /// Prometheus names match `[a-zA-Z_:][a-zA-Z0-9_:]*`; an empty prefix is allowed.
    fn is_valid_prefix(prefix: &str) -> bool {
        let mut chars = prefix.chars();
        match chars.next() {
            None => true,
            Some(first) if first.is_ascii_alphabetic() || first == '_' || first == ':' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
            }
            Some(_) => false,
        }
    }
}
pub use metrics::MetricsConfig;

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use anyhow::Result;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "PORT",
            "TODO_BIND_HOST",
            "TODO_STATIC_DIR",
            "TODO_METRICS_PREFIX",
            "TODO_METRICS_TIMEOUT_MS",
            "TODO_METRICS_INTERVAL_MS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn server_defaults_applied() -> Result<()> {
        // ---
        clear_env();

        let cfg = server::ServerConfig::from_env()?;
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.static_dir, PathBuf::from("public"));
        assert_eq!(cfg.bind_addr(), "0.0.0.0:3001");

        Ok(())
    }

    #[test]
    #[serial]
    fn server_overrides_defaults() -> Result<()> {
        // ---
        clear_env();
        std::env::set_var("PORT", "8088");
        std::env::set_var("TODO_BIND_HOST", "127.0.0.1");
        std::env::set_var("TODO_STATIC_DIR", "/srv/www");

        let cfg = server::ServerConfig::from_env()?;
        assert_eq!(cfg.bind_addr(), "127.0.0.1:8088");
        assert_eq!(cfg.static_dir, PathBuf::from("/srv/www"));

        clear_env();
        Ok(())
    }

    #[test]
    #[serial]
    fn unparseable_port_falls_back_to_default() -> Result<()> {
        // ---
        clear_env();
        std::env::set_var("PORT", "not-a-port");

        let cfg = server::ServerConfig::from_env()?;
        assert_eq!(cfg.port, 3001);

        clear_env();
        Ok(())
    }

    #[test]
    #[serial]
    fn metrics_defaults_applied() -> Result<()> {
        // ---
        clear_env();

        let cfg = metrics::MetricsConfig::from_env()?;
        assert_eq!(cfg.prefix, "todo_");
        assert_eq!(cfg.sampling_timeout.as_secs(), 10);
        assert_eq!(cfg.sampling_interval.as_secs(), 10);

        Ok(())
    }

    #[test]
    #[serial]
    fn metrics_overrides_defaults() -> Result<()> {
        // ---
        clear_env();
        std::env::set_var("TODO_METRICS_PREFIX", "");
        std::env::set_var("TODO_METRICS_TIMEOUT_MS", "250");
        std::env::set_var("TODO_METRICS_INTERVAL_MS", "1500");

        let cfg = metrics::MetricsConfig::from_env()?;
        assert_eq!(cfg.prefix, "");
        assert_eq!(cfg.sampling_timeout.as_millis(), 250);
        assert_eq!(cfg.sampling_interval.as_millis(), 1500);

        clear_env();
        Ok(())
    }

    #[test]
    #[serial]
    fn invalid_prefix_fails() {
        // ---
        clear_env();
        std::env::set_var("TODO_METRICS_PREFIX", "9lives-");

        assert_invalid_config!(metrics::MetricsConfig::from_env(), "TODO_METRICS_PREFIX");

        clear_env();
    }

    #[test]
    #[serial]
    fn zero_interval_fails() {
        // ---
        clear_env();
        std::env::set_var("TODO_METRICS_INTERVAL_MS", "0");

        assert_invalid_config!(metrics::MetricsConfig::from_env(), "TODO_METRICS_INTERVAL_MS");

        clear_env();
    }

    #[test]
    #[serial]
    fn app_config_from_env_success() -> Result<()> {
        // ---
        clear_env();

        let cfg = AppConfig::from_env()?;
        assert_eq!(cfg.server.port, 3001);
        assert_eq!(cfg.metrics.prefix, "todo_");

        Ok(())
    }
}
