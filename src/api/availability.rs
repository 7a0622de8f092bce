//! Availability check endpoints
//!
//! Called directly from the front end (and from other origins), so the
//! router carries a permissive CORS layer.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::Method,
    routing::get,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::AppState;
use crate::error::{AppError, method_not_allowed};
use crate::service::{AvailabilityReport, is_valid_username};

/// Create availability router
///
/// Routes:
/// - GET /check?slug= - Enterprise slug
/// - GET /check/username?name= - Username
pub fn availability_router() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/check", get(check_enterprise).fallback(method_not_allowed))
        .route(
            "/check/username",
            get(check_username).fallback(method_not_allowed),
        )
        .layer(cors)
}

/// Accepts either `slug` or `name`
#[derive(Debug, Deserialize)]
struct CheckQuery {
    slug: Option<String>,
    name: Option<String>,
}

impl CheckQuery {
    fn target(&self) -> Option<&str> {
        [self.slug.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
    }
}

/// GET /api/check
async fn check_enterprise(
    State(state): State<AppState>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<AvailabilityReport>, AppError> {
    let slug = query
        .target()
        .ok_or_else(|| AppError::Validation("missing slug".to_string()))?;

    Ok(Json(state.availability.check_enterprise(slug).await))
}

/// GET /api/check/username
async fn check_username(
    State(state): State<AppState>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<AvailabilityReport>, AppError> {
    let name = query
        .target()
        .ok_or_else(|| AppError::Validation("missing name".to_string()))?;

    if !is_valid_username(name) {
        return Err(AppError::Validation(
            "invalid username: use letters, digits and inner hyphens (1-39 characters)"
                .to_string(),
        ));
    }

    Ok(Json(state.availability.check_username(name).await))
}
