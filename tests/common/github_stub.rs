//! Local stand-in for the GitHub endpoints the server calls

use axum::{
    Json, Router,
    extract::Path,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const CLIENT_ID: &str = "test-client-id";
pub const CLIENT_SECRET: &str = "test-client-secret";

/// Code that exchanges for a token whose /user lookup succeeds
pub const GOOD_CODE: &str = "good-code";
/// Code that exchanges for a token GitHub then refuses on /user
pub const REVOKED_CODE: &str = "revoked-code";
/// Code whose exchange answers without a token or error
pub const EMPTY_CODE: &str = "empty-code";

pub const ACCESS_TOKEN: &str = "gho_stubtoken";
const REVOKED_TOKEN: &str = "gho_revoked";

/// Running stub server
pub struct GitHubStub {
    pub base_url: String,
}

impl GitHubStub {
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/login/oauth/access_token", post(access_token))
            .route("/user", get(user))
            .route("/users/:name", get(public_user))
            .route("/enterprises/:slug", get(enterprise));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
        }
    }
}

async fn access_token(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(
        headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()),
        Some("application/json")
    );

    if body["client_id"] != CLIENT_ID || body["client_secret"] != CLIENT_SECRET {
        return Json(json!({ "error": "incorrect_client_credentials" }));
    }

    match body["code"].as_str() {
        Some(GOOD_CODE) => Json(json!({
            "access_token": ACCESS_TOKEN,
            "token_type": "bearer",
            "scope": "read:user,user:email",
        })),
        Some(REVOKED_CODE) => Json(json!({
            "access_token": REVOKED_TOKEN,
            "token_type": "bearer",
            "scope": "",
        })),
        Some(EMPTY_CODE) => Json(json!({})),
        _ => Json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired.",
        })),
    }
}

async fn user(headers: HeaderMap) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {ACCESS_TOKEN}"));

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Bad credentials" })),
        )
            .into_response();
    }

    Json(json!({
        "login": "octocat",
        "id": 583231,
        "avatar_url": "https://avatars.githubusercontent.com/u/583231?v=4",
        "name": "The Octocat",
        "email": null,
    }))
    .into_response()
}

async fn public_user(Path(name): Path<String>) -> Response {
    match name.as_str() {
        "octocat" => Json(json!({
            "login": "octocat",
            "id": 583231,
            "html_url": "https://github.com/octocat",
            "created_at": "2011-01-25T18:44:36Z",
            "name": "The Octocat",
            "company": "@github",
        }))
        .into_response(),
        "ratelimited" => StatusCode::FORBIDDEN.into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" }))).into_response(),
    }
}

async fn enterprise(Path(slug): Path<String>) -> Response {
    match slug.as_str() {
        "github" | "a/b" => StatusCode::OK.into_response(),
        "moved" => (
            StatusCode::FOUND,
            [(header::LOCATION, "/enterprises/github")],
        )
            .into_response(),
        "teapot" => StatusCode::IM_A_TEAPOT.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}
