//! Deployment self-check
//!
//! Reports whether credentials are configured without revealing them.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub message: &'static str,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub github_client_id: &'static str,
    pub session_encryption: bool,
}

/// GET /api/status
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let github_client_id = if state.config.auth.github.client_id().is_some() {
        "Set"
    } else {
        "Not set"
    };

    Json(StatusResponse {
        message: "API is working!",
        timestamp: chrono::Utc::now(),
        github_client_id,
        session_encryption: state.codec.is_encrypted(),
    })
}
