// Middleware applied to the whole router
mod request_metrics;

pub(crate) use request_metrics::track_http_requests;
