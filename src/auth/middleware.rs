//! Session extraction
//!
//! Reads the session cookie on behalf of handlers.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;

use super::cookies::SESSION_COOKIE_NAME;
use super::session::Session;
use crate::AppState;

/// Outcome of reading the session cookie
#[derive(Debug, Clone)]
pub enum SessionStatus {
    /// Valid, unexpired session
    Active(Session),
    /// No session cookie (or an empty one)
    Missing,
    /// Cookie present but could not be decoded or authenticated
    Invalid,
    /// Cookie decoded but older than the configured max age
    Expired,
}

impl SessionStatus {
    /// Short reason reported to unauthenticated clients
    pub fn reason(&self) -> &'static str {
        match self {
            SessionStatus::Active(_) => "Authenticated",
            SessionStatus::Missing => "No session found",
            SessionStatus::Invalid => "Invalid session",
            SessionStatus::Expired => "Session expired",
        }
    }

    /// Resolve a raw cookie value against the codec and expiry window
    pub fn from_cookie(value: Option<&str>, state: &AppState) -> Self {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            return SessionStatus::Missing;
        };

        match state.codec.decode(value) {
            None => SessionStatus::Invalid,
            Some(session) if session.is_expired(state.config.auth.session_max_age) => {
                SessionStatus::Expired
            }
            Some(session) => SessionStatus::Active(session),
        }
    }
}

/// Extractor for the session state of the current request
///
/// Never rejects: failures are folded into the returned status.
///
/// # Usage
/// ```ignore
/// async fn handler(status: SessionStatus) -> impl IntoResponse {
///     match status {
///         SessionStatus::Active(session) => format!("Hello, {}", session.username),
///         other => other.reason().to_string(),
///     }
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for SessionStatus
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let value = jar.get(SESSION_COOKIE_NAME).map(|cookie| cookie.value());

        let status = SessionStatus::from_cookie(value, &app_state);
        if !matches!(status, SessionStatus::Active(_) | SessionStatus::Missing) {
            tracing::debug!(reason = status.reason(), "Ignoring session cookie");
        }

        Ok(status)
    }
}
