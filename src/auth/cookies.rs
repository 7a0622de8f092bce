use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::config::CookieSameSite;

/// Short-lived CSRF state cookie
pub const STATE_COOKIE_NAME: &str = "oauth_state";
/// Session cookie carrying the encoded session record
pub const SESSION_COOKIE_NAME: &str = "github_session";

impl From<CookieSameSite> for SameSite {
    fn from(value: CookieSameSite) -> Self {
        match value {
            CookieSameSite::Strict => SameSite::Strict,
            CookieSameSite::Lax => SameSite::Lax,
        }
    }
}

fn hardened(
    name: &'static str,
    value: String,
    max_age: Duration,
    same_site: CookieSameSite,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(same_site.into())
        .path("/")
        .max_age(max_age)
        .build()
}

/// Create the CSRF state cookie for the authorization request.
pub(super) fn state_cookie(
    state: String,
    max_age_secs: i64,
    same_site: CookieSameSite,
) -> Cookie<'static> {
    hardened(
        STATE_COOKIE_NAME,
        state,
        Duration::seconds(max_age_secs),
        same_site,
    )
}

/// Create the session cookie.
pub(super) fn session_cookie(
    value: String,
    max_age_secs: i64,
    same_site: CookieSameSite,
) -> Cookie<'static> {
    hardened(
        SESSION_COOKIE_NAME,
        value,
        Duration::seconds(max_age_secs),
        same_site,
    )
}

/// Create an empty, immediately-expiring cookie that overwrites `name`.
///
/// Added to the jar rather than removed so the header is sent even when
/// the browser did not present the cookie.
pub(super) fn expired_cookie(name: &'static str, same_site: CookieSameSite) -> Cookie<'static> {
    hardened(name, String::new(), Duration::ZERO, same_site)
}
