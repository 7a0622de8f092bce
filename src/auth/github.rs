//! GitHub OAuth and user API client

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::GitHubEndpoints;
use crate::error::AppError;

/// Errors from outbound GitHub requests
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Connection, timeout or body decoding failure
    #[error("request to GitHub failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// GitHub answered with a non-success status
    #[error("GitHub responded with status {0}")]
    Status(u16),
}

/// GitHub token response
///
/// GitHub reports exchange failures with HTTP 200 and an `error` field.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GitHub user info
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub id: u64,
    pub avatar_url: String,
    pub name: Option<String>,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

/// Client for github.com OAuth endpoints and the authenticated-user API
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    oauth_url: String,
    api_url: String,
}

impl GitHubClient {
    pub fn new(http: reqwest::Client, endpoints: &GitHubEndpoints) -> Self {
        Self {
            http,
            oauth_url: endpoints.oauth_url.trim_end_matches('/').to_string(),
            api_url: endpoints.api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build the authorization URL the browser is sent to
    ///
    /// # Errors
    /// Returns error if the configured OAuth base URL is invalid
    pub fn authorize_url(
        &self,
        client_id: &str,
        redirect_uri: &str,
        scope: &str,
        state: &str,
    ) -> Result<Url, AppError> {
        Url::parse_with_params(
            &format!("{}/login/oauth/authorize", self.oauth_url),
            &[
                ("client_id", client_id),
                ("redirect_uri", redirect_uri),
                ("scope", scope),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Config(format!("invalid GitHub OAuth URL: {e}")))
    }

    /// Exchange an authorization code for an access token
    pub async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, GitHubError> {
        let response = self
            .http
            .post(format!("{}/login/oauth/access_token", self.oauth_url))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&TokenRequest {
                client_id,
                client_secret,
                code,
                redirect_uri,
            })
            .send()
            .await?;

        Ok(response.json().await?)
    }

    /// Fetch the profile of the user owning `access_token`
    pub async fn fetch_user(&self, access_token: &str) -> Result<GitHubUser, GitHubError> {
        let response = self
            .http
            .get(format!("{}/user", self.api_url))
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GitHubError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}
