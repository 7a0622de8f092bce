//! GitHub OAuth authentication
//!
//! Handles:
//! - GitHub OAuth flow (login, callback, logout)
//! - CSRF state tokens
//! - Cookie-held, optionally encrypted sessions

mod cookies;
pub mod github;
mod middleware;
mod oauth;
pub mod session;
pub mod state;

pub use cookies::{SESSION_COOKIE_NAME, STATE_COOKIE_NAME};
pub use github::GitHubClient;
pub use middleware::SessionStatus;
pub use oauth::{CALLBACK_PATH, CallbackError, auth_router};
pub use session::{Session, SessionCodec, SessionUser};
pub use state::{issue_state_token, validate_state_token};
