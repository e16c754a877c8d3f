// src/lib.rs
use anyhow::Result;
use app_state::AppState;
use axum::{
    routing::{get, get_service},
    Router,
};

use handlers::{health_check, index_service, metrics_handler, static_service};
use middleware::track_http_requests;

// Public exports (visible outside this module)
pub mod domain;

// Internal-only exports (sibling access within this module)
mod app_state;
mod config;
mod handlers;
mod infrastructure;
mod middleware;

pub use config::*;

// Publicly expose the metrics building blocks
pub use infrastructure::create_prom_metrics;
pub use infrastructure::metrics::{
    Counter, DefaultMetricsConfig, Histogram, MetricRegistry, PrometheusMetrics, SamplerHandle,
};

/// A fully wired application: the router plus the background work that must
/// be stopped on shutdown.
pub struct App {
    pub router: Router,
    pub sampler: SamplerHandle,
}

/// Installs the global tracing subscriber, honouring `RUST_LOG` (default
/// `info`). Ignores the call if a subscriber is already installed.
pub fn init_tracing() {
    // ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .ok(); // Ignores if already initialized
}

/// Build the application from configuration.
///
/// Creates a fresh metrics registry (default process metrics plus the HTTP
/// request metrics) and the router serving `/`, `/health`, `/metrics` and
/// static files. Every route, including the static fallback and `/metrics`
/// itself, is instrumented.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
/// Fails if metric registration fails (e.g. a duplicate metric name).
pub fn create_app(config: &AppConfig) -> Result<App> {
    // ---
    let (metrics, sampler) = create_prom_metrics(&config.metrics)?;
    let app_state = AppState::new(metrics);

    let static_dir = &config.server.static_dir;
    let router = Router::new()
        .route("/", get_service(index_service(static_dir)))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .fallback_service(static_service(static_dir))
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            track_http_requests,
        ))
        .with_state(app_state);

    Ok(App { router, sampler })
}
