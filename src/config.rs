//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (SLUGCHECK__*)
//! 4. Deployment variables (GITHUB_CLIENT_ID, GITHUB_CLIENT_SECRET, SESSION_SECRET, PORT)

use serde::Deserialize;
use std::{net::IpAddr, path::PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub github: GitHubEndpoints,
    pub frontend: FrontendConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 3000)
    pub port: u16,
    /// Public domain, used when a request carries no Host header
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the public base URL
    ///
    /// # Returns
    /// Full URL like "https://slugcheck.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Authentication configuration (GitHub OAuth + session cookie)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to derive the session encryption key.
    ///
    /// When absent, session cookies are only base64-encoded.
    pub session_secret: Option<String>,
    /// Session max age in seconds (default: 604800 = 7 days)
    pub session_max_age: i64,
    /// CSRF state cookie max age in seconds (default: 600)
    pub state_max_age: i64,
    /// OAuth scope requested from GitHub
    pub scope: String,
    /// SameSite attribute for the session and state cookies
    #[serde(default)]
    pub cookie_same_site: CookieSameSite,
    #[serde(default)]
    pub github: GitHubOAuthConfig,
}

/// SameSite policy for auth cookies
///
/// `lax` is needed when browsers must send the state cookie on the
/// cross-site redirect back from GitHub.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CookieSameSite {
    #[default]
    Strict,
    Lax,
}

impl AuthConfig {
    /// Session secret with surrounding whitespace removed, if non-empty
    pub fn session_secret(&self) -> Option<&str> {
        non_empty(self.session_secret.as_deref())
    }
}

/// GitHub OAuth application credentials
///
/// Both are optional so the server can start without them; the OAuth
/// routes report a configuration error instead.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GitHubOAuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl GitHubOAuthConfig {
    pub fn client_id(&self) -> Option<&str> {
        non_empty(self.client_id.as_deref())
    }

    pub fn client_secret(&self) -> Option<&str> {
        non_empty(self.client_secret.as_deref())
    }
}

/// Base URLs of the GitHub services the server talks to
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubEndpoints {
    /// OAuth host (authorize + access_token), e.g. "https://github.com"
    pub oauth_url: String,
    /// REST API host, e.g. "https://api.github.com"
    pub api_url: String,
    /// Web host used for enterprise slug lookups, e.g. "https://github.com"
    pub web_url: String,
}

/// Static front end configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FrontendConfig {
    /// Directory holding index.html and assets
    pub static_dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

const MIN_SESSION_SECRET_BYTES: usize = 16;

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (SLUGCHECK__*)
    /// 5. GITHUB_CLIENT_ID / GITHUB_CLIENT_SECRET / SESSION_SECRET / PORT
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.domain", "localhost:3000")?
            .set_default("server.protocol", "http")?
            .set_default("auth.session_max_age", 604800)?
            .set_default("auth.state_max_age", 600)?
            .set_default("auth.scope", "read:user user:email")?
            .set_default("auth.cookie_same_site", "strict")?
            .set_default("github.oauth_url", "https://github.com")?
            .set_default("github.api_url", "https://api.github.com")?
            .set_default("github.web_url", "https://github.com")?
            .set_default("frontend.static_dir", "public")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (SLUGCHECK__*)
            .add_source(
                Environment::with_prefix("SLUGCHECK")
                    .separator("__")
                    .try_parsing(true),
            )
            // Plain deployment variables win over everything else
            .set_override_option("auth.github.client_id", env("GITHUB_CLIENT_ID"))?
            .set_override_option("auth.github.client_secret", env("GITHUB_CLIENT_SECRET"))?
            .set_override_option("auth.session_secret", env("SESSION_SECRET"))?
            .set_override_option("server.port", env("PORT"))?
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.auth.session_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        if self.auth.state_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.state_max_age must be greater than 0".to_string(),
            ));
        }

        match self.auth.session_secret() {
            Some(secret) if secret.len() < MIN_SESSION_SECRET_BYTES => {
                return Err(crate::error::AppError::Config(format!(
                    "auth.session_secret must be at least {} bytes",
                    MIN_SESSION_SECRET_BYTES
                )));
            }
            Some(_) => {}
            None => tracing::warn!(
                "SESSION_SECRET is not set; session cookies will be base64-encoded, not encrypted"
            ),
        }

        if self.auth.github.client_id().is_none() || self.auth.github.client_secret().is_none() {
            tracing::warn!("GitHub OAuth credentials are not configured; login will fail");
        }

        for (key, value) in [
            ("github.oauth_url", &self.github.oauth_url),
            ("github.api_url", &self.github.api_url),
            ("github.web_url", &self.github.web_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                crate::error::AppError::Config(format!("{key} is not a valid URL: {e}"))
            })?;
        }

        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn normalized_host(host: &str) -> String {
    let trimmed = host.trim();
    let parsed_host = url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .trim_end_matches('.')
        .to_ascii_lowercase()
}

/// Whether a Host header value names the local machine.
///
/// Accepts an optional port, e.g. "localhost:3000" or "127.0.0.1:8080".
pub fn is_local_host(host: &str) -> bool {
    let host = normalized_host(host);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}
