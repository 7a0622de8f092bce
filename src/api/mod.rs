//! API layer
//!
//! HTTP handlers for:
//! - Availability checks (username, enterprise slug)
//! - Deployment status
//! - Metrics (Prometheus)

mod availability;
pub mod metrics;
mod status;

use axum::{Router, routing::get};

use crate::AppState;
use crate::error::{AppError, method_not_allowed};

pub use availability::availability_router;
pub use metrics::metrics_router;
pub use status::StatusResponse;

/// Create the `/api` router
///
/// Unknown `/api/*` paths answer 404 JSON instead of falling through
/// to the front end.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/status", get(status::status).fallback(method_not_allowed))
        .merge(availability_router())
        .fallback(api_not_found)
}

async fn api_not_found() -> AppError {
    AppError::NotFound
}
