//! E2E tests for health check, status and static front end

mod common;

use common::TestServer;
use serde_json::Value;

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_root_serves_front_end() {
    let server = TestServer::new().await;

    let response = server.client.get(server.url("/")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("GitHub Slug Checker"));
}

#[tokio::test]
async fn test_deep_links_fall_back_to_index() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/some/client/route"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("GitHub Slug Checker"));
}

#[tokio::test]
async fn test_static_assets_are_served() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/js/app.js"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("class SlugCheckerApp"));
}

#[tokio::test]
async fn test_unknown_api_route_is_json_404() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/unknown/route"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Resource not found");
}

#[tokio::test]
async fn test_status_reports_configuration() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/status"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "API is working!");
    assert_eq!(body["githubClientId"], "Set");
    assert_eq!(body["sessionEncryption"], true);
    assert!(body["timestamp"].is_string());

    let text = body.to_string();
    assert!(!text.contains("test-client-id"));
    assert!(!text.contains("test-client-secret"));
}

#[tokio::test]
async fn test_status_without_credentials() {
    let server = TestServer::with_config(|config| {
        config.auth.github.client_id = None;
        config.auth.session_secret = None;
    })
    .await;

    let response = server
        .client
        .get(server.url("/api/status"))
        .send()
        .await
        .unwrap();

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["githubClientId"], "Not set");
    assert_eq!(body["sessionEncryption"], false);
}

#[tokio::test]
async fn test_metrics_exposes_counters() {
    let server = TestServer::new().await;

    server.client.get(server.url("/health")).send().await.unwrap();
    let response = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("http_requests_total"));
}
