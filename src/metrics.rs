//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("slugcheck_http_requests_total", "Total number of HTTP requests"),
        &["method", "status"]
    ).expect("metric can be created");

    // OAuth Metrics
    pub static ref OAUTH_LOGINS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("slugcheck_oauth_logins_total", "OAuth callbacks by outcome"),
        &["outcome"]
    ).expect("metric can be created");

    // Availability Metrics
    pub static ref AVAILABILITY_CHECKS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("slugcheck_availability_checks_total", "Availability checks by kind and result"),
        &["kind", "result"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("slugcheck_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
///
/// Safe to call more than once; later registrations are ignored.
pub fn init_metrics() {
    let collectors: [Box<dyn prometheus::core::Collector>; 4] = [
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(OAUTH_LOGINS_TOTAL.clone()),
        Box::new(AVAILABILITY_CHECKS_TOTAL.clone()),
        Box::new(ERRORS_TOTAL.clone()),
    ];

    for collector in collectors {
        if let Err(error) = REGISTRY.register(collector) {
            tracing::debug!(%error, "Metric already registered");
        }
    }

    tracing::info!("Metrics registry initialized");
}

/// Middleware counting every response by method and status.
pub async fn track_requests(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().to_string();
    let response = next.run(request).await;
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), response.status().as_str()])
        .inc();
    response
}
