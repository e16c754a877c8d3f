use crate::app_state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

/// Body returned when the registry cannot be rendered. Details are logged,
/// never sent to the scraper.
const RENDER_FAILED: &str = "failed to collect metrics";

/// Handler for the `/metrics` endpoint.
///
/// Returns the full registry snapshot in Prometheus text format, with the
/// registry's versioned content type. Rendering only reads metric state.
pub async fn metrics_handler(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, &'static str)> {
    // ---
    let metrics = app_state.metrics();

    let metrics_text = metrics.render().map_err(|err| {
        tracing::error!(error = %err, "Failed to render metrics");
        (StatusCode::INTERNAL_SERVER_ERROR, RENDER_FAILED)
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, metrics.content_type())],
        metrics_text,
    ))
}
