//! slugcheck - GitHub OAuth login and name availability checker
//!
//! # Architecture
//!
//! ```text
//! browser ──► /auth/login ──► github.com/login/oauth/authorize
//!                                        │
//! browser ◄── 302 /?auth=success ◄── /auth/callback ──► token exchange + /user
//!    │
//!    ├──► /auth/user    (reads the github_session cookie)
//!    ├──► /auth/logout  (clears cookies)
//!    └──► /api/check    (HEAD/GET against GitHub, CORS *)
//! ```
//!
//! # Modules
//!
//! - `auth`: GitHub OAuth flow, CSRF state, session cookie codec
//! - `service`: Availability checks against GitHub
//! - `api`: HTTP handlers for availability, status and metrics
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod service;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Handlers share no mutable state; everything here is read-only
/// after startup.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Session cookie codec (encrypted when a secret is configured)
    pub codec: Arc<auth::SessionCodec>,

    /// GitHub OAuth + user API client
    pub github: Arc<auth::GitHubClient>,

    /// Username / enterprise slug checker
    pub availability: Arc<service::AvailabilityService>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Build the shared HTTP client
    /// 2. Derive the session codec from the configured secret
    /// 3. Wire the GitHub and availability clients
    ///
    /// # Errors
    /// Returns error if the HTTP client or codec cannot be built
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("slugcheck/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let codec = auth::SessionCodec::new(config.auth.session_secret())?;
        tracing::info!(encrypted = codec.is_encrypted(), "Session codec ready");

        let github = auth::GitHubClient::new(http_client.clone(), &config.github);
        let availability = service::AvailabilityService::new(http_client, &config.github);

        Ok(Self {
            config: Arc::new(config),
            codec: Arc::new(codec),
            github: Arc::new(github),
            availability: Arc::new(availability),
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{
        compression::CompressionLayer,
        services::{ServeDir, ServeFile},
        trace::TraceLayer,
    };

    let cors_layer = build_cors_layer(&state.config.server);
    let static_dir = &state.config.frontend.static_dir;
    let frontend =
        ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(auth::auth_router().layer(cors_layer))
        .nest("/api", api::api_router())
        .merge(api::metrics_router())
        .fallback_service(frontend)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(metrics::track_requests))
        .with_state(state)
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let allowed_origin = server.base_url();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin from server base URL; denying cross-origin requests"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
