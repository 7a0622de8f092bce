//! Common test utilities for E2E tests

pub mod github_stub;

use std::path::PathBuf;

use github_stub::{CLIENT_ID, CLIENT_SECRET, GitHubStub};
use slugcheck::auth::Session;
use slugcheck::{AppState, config};
use tokio::net::TcpListener;

pub const SESSION_SECRET: &str = "test-session-secret-32-bytes-long";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub client: reqwest::Client,
    pub github: GitHubStub,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server after adjusting the default test configuration
    pub async fn with_config(customize: impl FnOnce(&mut config::AppConfig)) -> Self {
        let github = GitHubStub::start().await;

        let mut config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
            },
            auth: config::AuthConfig {
                session_secret: Some(SESSION_SECRET.to_string()),
                session_max_age: 604_800,
                state_max_age: 600,
                scope: "read:user user:email".to_string(),
                cookie_same_site: config::CookieSameSite::Strict,
                github: config::GitHubOAuthConfig {
                    client_id: Some(CLIENT_ID.to_string()),
                    client_secret: Some(CLIENT_SECRET.to_string()),
                },
            },
            github: config::GitHubEndpoints {
                oauth_url: github.base_url.clone(),
                api_url: github.base_url.clone(),
                web_url: github.base_url.clone(),
            },
            frontend: config::FrontendConfig {
                static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public"),
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };
        customize(&mut config);

        slugcheck::metrics::init_metrics();

        // Initialize app state
        let state = AppState::new(config).unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = slugcheck::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            client: no_redirect_client(),
            github,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Encode a session the way the server would
    pub fn session_cookie(&self, session: &Session) -> String {
        self.state
            .codec
            .encode(session)
            .expect("session encodes")
    }
}

/// Client that surfaces redirects instead of following them
pub fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .expect("failed to build no-redirect client")
}

/// All Set-Cookie header values of a response
pub fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(ToString::to_string))
        .collect()
}

/// The Set-Cookie header for `name`, if any
pub fn find_cookie<'a>(set_cookies: &'a [String], name: &str) -> Option<&'a str> {
    set_cookies
        .iter()
        .find(|c| c.starts_with(&format!("{name}=")))
        .map(String::as_str)
}

/// The value carried by the Set-Cookie header for `name`
pub fn cookie_value(set_cookies: &[String], name: &str) -> Option<String> {
    find_cookie(set_cookies, name)
        .and_then(|c| c.split(';').next())
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| value.to_string())
}

/// Location header of a redirect
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string()
}
