mod errors;
mod metrics;

// Publicly expose the Metrics abstraction
pub use errors::MetricsError;
pub use metrics::{Metrics, MetricsPtr, Observation};
