//! Availability service
//!
//! Asks GitHub whether a username or enterprise slug is already taken.
//! A single request per check; failures are reported, never retried.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::GitHubEndpoints;
use crate::metrics::AVAILABILITY_CHECKS_TOTAL;

lazy_static! {
    /// GitHub login rule: alphanumerics and inner hyphens, 1-39 chars
    static ref USERNAME_PATTERN: Regex =
        Regex::new(r"^[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,37}[a-zA-Z0-9])?$")
            .expect("username pattern is valid");
}

/// Whether `name` is a syntactically valid GitHub username
pub fn is_valid_username(name: &str) -> bool {
    USERNAME_PATTERN.is_match(name)
}

/// Map an HTTP status to existence
///
/// `Some(true)` taken, `Some(false)` available, `None` inconclusive.
pub fn classify_status(status: u16) -> Option<bool> {
    match status {
        200 | 301 | 302 => Some(true),
        404 => Some(false),
        _ => None,
    }
}

/// Which namespace a check targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Username,
    Enterprise,
}

impl CheckKind {
    fn label(self) -> &'static str {
        match self {
            CheckKind::Username => "username",
            CheckKind::Enterprise => "enterprise",
        }
    }
}

/// Public details of an existing account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub login: String,
    #[serde(alias = "html_url")]
    pub html_url: String,
    #[serde(alias = "created_at")]
    pub created_at: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
}

/// Result of one availability check
///
/// `ok` is false when GitHub's answer was inconclusive or unreachable;
/// `exists` is only present when `ok` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    /// Upstream HTTP status, 0 when no response was received
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<PublicProfile>,
}

impl AvailabilityReport {
    fn from_status(status: u16) -> Self {
        let exists = classify_status(status);
        Self {
            ok: exists.is_some(),
            exists,
            status,
            profile: None,
        }
    }

    fn unreachable() -> Self {
        Self {
            ok: false,
            exists: None,
            status: 0,
            profile: None,
        }
    }

    fn result_label(&self) -> &'static str {
        match self.exists {
            Some(true) => "taken",
            Some(false) => "available",
            None if self.status == 0 => "network_error",
            None => "inconclusive",
        }
    }
}

/// Availability service
#[derive(Clone)]
pub struct AvailabilityService {
    http: reqwest::Client,
    api_url: String,
    web_url: String,
}

impl AvailabilityService {
    /// Create new availability service
    pub fn new(http: reqwest::Client, endpoints: &GitHubEndpoints) -> Self {
        Self {
            http,
            api_url: endpoints.api_url.trim_end_matches('/').to_string(),
            web_url: endpoints.web_url.trim_end_matches('/').to_string(),
        }
    }

    /// Check an enterprise slug with a HEAD to `{web}/enterprises/{slug}`
    pub async fn check_enterprise(&self, slug: &str) -> AvailabilityReport {
        let target = format!("{}/enterprises/{}", self.web_url, urlencoding::encode(slug));
        let report = match self.http.head(&target).send().await {
            Ok(response) => AvailabilityReport::from_status(response.status().as_u16()),
            Err(error) => {
                tracing::warn!(%error, target = %target, "Enterprise slug check failed");
                AvailabilityReport::unreachable()
            }
        };

        record(CheckKind::Enterprise, &target, &report);
        report
    }

    /// Check a username with a GET to `{api}/users/{name}`
    ///
    /// Existing accounts come back with their public profile.
    pub async fn check_username(&self, name: &str) -> AvailabilityReport {
        let target = format!("{}/users/{}", self.api_url, urlencoding::encode(name));
        let report = match self
            .http
            .get(&target)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
        {
            Ok(response) => {
                let mut report = AvailabilityReport::from_status(response.status().as_u16());
                if report.exists == Some(true) {
                    report.profile = response.json::<PublicProfile>().await.ok();
                }
                report
            }
            Err(error) => {
                tracing::warn!(%error, target = %target, "Username check failed");
                AvailabilityReport::unreachable()
            }
        };

        record(CheckKind::Username, &target, &report);
        report
    }
}

fn record(kind: CheckKind, target: &str, report: &AvailabilityReport) {
    tracing::info!(
        kind = kind.label(),
        target = %target,
        status = report.status,
        exists = ?report.exists,
        "Availability checked"
    );
    AVAILABILITY_CHECKS_TOTAL
        .with_label_values(&[kind.label(), report.result_label()])
        .inc();
}
