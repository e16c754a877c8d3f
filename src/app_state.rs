//! Application state management.
//!
//! This module defines the shared state structure that gets passed to all
//! Axum handlers and middleware via the `State` extractor. The state is
//! cheaply cloneable (an `Arc` inside) so each request gets its own copy
//! without touching the underlying metrics.

use crate::domain::MetricsPtr;

/// Shared application state passed to all Axum handlers.
///
/// # Lifecycle
///
/// 1. Created once in `create_app()` during application startup
/// 2. Attached to the Axum router via `.with_state(app_state)` and to the
///    request metrics middleware via `from_fn_with_state`
/// 3. Cloned automatically by Axum for each incoming HTTP request
#[derive(Clone)]
pub(crate) struct AppState {
    /// Metrics implementation for recording requests and rendering scrapes.
    ///
    /// Injected at construction; there is no global registry.
    metrics: MetricsPtr,
}

impl AppState {
    // ---

    pub fn new(metrics: MetricsPtr) -> Self {
        AppState { metrics }
    }

    /// Get a reference to the metrics implementation.
    pub(crate) fn metrics(&self) -> &MetricsPtr {
        // ---
        &self.metrics
    }
}
