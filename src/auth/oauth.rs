//! GitHub OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with GitHub.
//! The callback never answers with an error body: every outcome is a
//! 302 back to the front end carrying `?auth=success` or `?error=<reason>`.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use thiserror::Error;

use super::cookies::{self, SESSION_COOKIE_NAME, STATE_COOKIE_NAME};
use super::github::GitHubError;
use super::middleware::SessionStatus;
use super::session::Session;
use super::state::{issue_state_token, validate_state_token};
use crate::AppState;
use crate::config::{ServerConfig, is_local_host};
use crate::error::{AppError, method_not_allowed};
use crate::metrics::OAUTH_LOGINS_TOTAL;

/// Path GitHub redirects back to
pub const CALLBACK_PATH: &str = "/auth/callback";

/// Create authentication router
///
/// Routes:
/// - GET /auth/login - Redirect to GitHub
/// - GET /auth/callback - OAuth callback
/// - POST /auth/logout - Logout (JSON), GET for navigation (redirect)
/// - GET /auth/user - Current session
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login).fallback(method_not_allowed))
        .route(CALLBACK_PATH, get(callback).fallback(method_not_allowed))
        .route(
            "/auth/logout",
            get(logout_navigation)
                .post(logout_api)
                .fallback(method_not_allowed),
        )
        .route("/auth/user", get(current_user).fallback(method_not_allowed))
}

/// Why a callback did not produce a session
///
/// Each variant maps to the reason code appended to the front-end redirect.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// GitHub reported an error, either on redirect or during token exchange
    #[error("GitHub returned OAuth error: {0}")]
    Provider(String),

    #[error("missing code or state parameter")]
    InvalidRequest,

    #[error("state validation failed")]
    StateMismatch,

    #[error("GitHub OAuth credentials are not configured")]
    Configuration,

    #[error("no access token received")]
    NoToken,

    #[error("GitHub user lookup failed with status {0}")]
    UserFetchFailed(u16),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl CallbackError {
    /// Machine-readable reason code
    pub fn reason(&self) -> &str {
        match self {
            CallbackError::Provider(error) => error,
            CallbackError::InvalidRequest => "invalid_request",
            CallbackError::StateMismatch => "state_mismatch",
            CallbackError::Configuration => "configuration_error",
            CallbackError::NoToken => "no_token",
            CallbackError::UserFetchFailed(_) => "user_fetch_failed",
            CallbackError::Unexpected(_) => "callback_error",
        }
    }
}

// =============================================================================
// Login
// =============================================================================

/// GET /auth/login
///
/// Redirects user to GitHub authorization page.
///
/// # Steps
/// 1. Generate CSRF state token
/// 2. Store state in cookie
/// 3. Redirect to GitHub with client_id, redirect_uri, scope, state
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Response), AppError> {
    let auth = &state.config.auth;
    let client_id = auth.github.client_id().ok_or_else(|| {
        tracing::error!("GITHUB_CLIENT_ID is not set");
        AppError::Config("OAuth configuration error".to_string())
    })?;

    let redirect_uri = callback_url(&headers, &state.config.server);
    let csrf_state = issue_state_token();
    let url = state
        .github
        .authorize_url(client_id, &redirect_uri, &auth.scope, &csrf_state)?;

    tracing::info!(
        client_id = %client_id.chars().take(10).collect::<String>(),
        redirect_uri = %redirect_uri,
        "GitHub OAuth login initiated"
    );

    let jar = jar.add(cookies::state_cookie(
        csrf_state,
        auth.state_max_age,
        auth.cookie_same_site,
    ));

    Ok((jar, found(url.as_str())))
}

// =============================================================================
// Callback
// =============================================================================

/// Query parameters from GitHub callback
#[derive(Debug, Default, Deserialize)]
struct CallbackQuery {
    /// Authorization code
    code: Option<String>,
    /// CSRF state token
    state: Option<String>,
    /// OAuth error (e.g. access_denied)
    error: Option<String>,
}

/// GET /auth/callback
///
/// Handles OAuth callback from GitHub.
///
/// # Steps
/// 1. Bail out on a GitHub-reported error
/// 2. Verify CSRF state
/// 3. Exchange code for access token
/// 4. Fetch user info from GitHub
/// 5. Seal session into cookie, clear state cookie
/// 6. Redirect to front end
async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> (CookieJar, Response) {
    let query = query.map(|Query(query)| query).unwrap_or_default();
    let saved_state = jar
        .get(STATE_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned());

    let auth = &state.config.auth;
    let jar = jar.add(cookies::expired_cookie(
        STATE_COOKIE_NAME,
        auth.cookie_same_site,
    ));

    match complete_login(&state, &headers, query, saved_state.as_deref()).await {
        Ok(cookie_value) => {
            OAUTH_LOGINS_TOTAL.with_label_values(&["success"]).inc();
            let jar = jar.add(cookies::session_cookie(
                cookie_value,
                auth.session_max_age,
                auth.cookie_same_site,
            ));
            (jar, found("/?auth=success"))
        }
        Err(error) => {
            let reason = error.reason();
            match &error {
                CallbackError::Unexpected(cause) => {
                    tracing::error!(error = %cause, "OAuth callback error")
                }
                other => tracing::warn!(reason, error = %other, "OAuth callback rejected"),
            }
            OAUTH_LOGINS_TOTAL.with_label_values(&[metric_outcome(&error)]).inc();
            let location = format!("/?error={}", urlencoding::encode(reason));
            (jar, found(&location))
        }
    }
}

async fn complete_login(
    state: &AppState,
    headers: &HeaderMap,
    query: CallbackQuery,
    saved_state: Option<&str>,
) -> Result<String, CallbackError> {
    if let Some(error) = query.error.filter(|e| !e.is_empty()) {
        return Err(CallbackError::Provider(error));
    }

    let (Some(code), Some(received_state)) = (
        query.code.filter(|c| !c.is_empty()),
        query.state.filter(|s| !s.is_empty()),
    ) else {
        return Err(CallbackError::InvalidRequest);
    };

    if !validate_state_token(saved_state, Some(&received_state)) {
        return Err(CallbackError::StateMismatch);
    }

    let credentials = &state.config.auth.github;
    let (Some(client_id), Some(client_secret)) =
        (credentials.client_id(), credentials.client_secret())
    else {
        return Err(CallbackError::Configuration);
    };

    let redirect_uri = callback_url(headers, &state.config.server);
    let token = state
        .github
        .exchange_code(client_id, client_secret, &code, &redirect_uri)
        .await
        .map_err(|e| CallbackError::Unexpected(e.into()))?;

    if let Some(error) = token.error {
        tracing::warn!(
            error = %error,
            description = token.error_description.as_deref().unwrap_or_default(),
            "Token exchange error"
        );
        return Err(CallbackError::Provider(error));
    }

    let access_token = token
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or(CallbackError::NoToken)?;

    let user = state
        .github
        .fetch_user(&access_token)
        .await
        .map_err(|e| match e {
            GitHubError::Status(status) => CallbackError::UserFetchFailed(status),
            other => CallbackError::Unexpected(other.into()),
        })?;

    tracing::info!(
        username = %user.login,
        user_id = user.id,
        "GitHub OAuth success"
    );

    let session = Session {
        username: user.login,
        display_name: user.name,
        avatar_url: user.avatar_url,
        user_id: user.id,
        access_token,
        issued_at: chrono::Utc::now(),
    };

    state
        .codec
        .encode(&session)
        .map_err(|e| CallbackError::Unexpected(e.into()))
}

/// Bound the metric label set: provider errors are free-form.
fn metric_outcome(error: &CallbackError) -> &'static str {
    match error {
        CallbackError::Provider(_) => "provider_error",
        CallbackError::InvalidRequest => "invalid_request",
        CallbackError::StateMismatch => "state_mismatch",
        CallbackError::Configuration => "configuration_error",
        CallbackError::NoToken => "no_token",
        CallbackError::UserFetchFailed(_) => "user_fetch_failed",
        CallbackError::Unexpected(_) => "callback_error",
    }
}

// =============================================================================
// Session reader
// =============================================================================

/// GET /auth/user
///
/// Returns the session user without the access token, or 401.
async fn current_user(status: SessionStatus) -> Response {
    match status {
        SessionStatus::Active(session) => Json(serde_json::json!({
            "authenticated": true,
            "user": session.user(),
        }))
        .into_response(),
        other => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "authenticated": false,
                "error": other.reason(),
            })),
        )
            .into_response(),
    }
}

// =============================================================================
// Logout
// =============================================================================

fn clear_auth_cookies(jar: CookieJar, state: &AppState) -> CookieJar {
    let same_site = state.config.auth.cookie_same_site;
    jar.add(cookies::expired_cookie(SESSION_COOKIE_NAME, same_site))
        .add(cookies::expired_cookie(STATE_COOKIE_NAME, same_site))
}

/// POST /auth/logout
///
/// Clears both cookies and acknowledges with JSON.
async fn logout_api(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    tracing::info!("User logged out");
    (
        clear_auth_cookies(jar, &state),
        Json(serde_json::json!({
            "success": true,
            "message": "Logged out successfully",
        })),
    )
}

/// GET /auth/logout
///
/// Clears both cookies and redirects to the front end.
async fn logout_navigation(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    tracing::info!("User logged out");
    (clear_auth_cookies(jar, &state), found("/"))
}

// =============================================================================
// Helpers
// =============================================================================

/// 302 Found redirect
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Callback URL derived from the request's Host header
///
/// Plain http is only used for local hosts.
fn callback_url(headers: &HeaderMap, server: &ServerConfig) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .unwrap_or(server.domain.as_str());
    let protocol = if is_local_host(host) { "http" } else { "https" };

    format!("{protocol}://{host}{CALLBACK_PATH}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn server() -> ServerConfig {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            domain: "slugcheck.example.com".to_string(),
            protocol: "https".to_string(),
        }
    }

    fn with_host(host: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static(host));
        headers
    }

    #[test]
    fn callback_url_uses_https_for_public_hosts() {
        assert_eq!(
            callback_url(&with_host("slug.example.org"), &server()),
            "https://slug.example.org/auth/callback"
        );
    }

    #[test]
    fn callback_url_uses_http_for_localhost() {
        assert_eq!(
            callback_url(&with_host("localhost:3000"), &server()),
            "http://localhost:3000/auth/callback"
        );
    }

    #[test]
    fn callback_url_falls_back_to_configured_domain() {
        assert_eq!(
            callback_url(&HeaderMap::new(), &server()),
            "https://slugcheck.example.com/auth/callback"
        );
    }

    #[test]
    fn reasons_match_redirect_codes() {
        assert_eq!(
            CallbackError::Provider("access_denied".into()).reason(),
            "access_denied"
        );
        assert_eq!(CallbackError::InvalidRequest.reason(), "invalid_request");
        assert_eq!(CallbackError::StateMismatch.reason(), "state_mismatch");
        assert_eq!(CallbackError::Configuration.reason(), "configuration_error");
        assert_eq!(CallbackError::NoToken.reason(), "no_token");
        assert_eq!(
            CallbackError::UserFetchFailed(401).reason(),
            "user_fetch_failed"
        );
        assert_eq!(
            CallbackError::Unexpected(anyhow::anyhow!("boom")).reason(),
            "callback_error"
        );
    }

    #[test]
    fn found_is_a_302_with_location() {
        let response = found("/?auth=success");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/?auth=success");
    }
}
