//! integration tests for the `/health` and `/version` endpoints

mod common;

use axum::http::StatusCode;
use serde::Deserialize;
use tower::ServiceExt;

use common::{body_json, get_request, test_app};

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionResponse {
    version: String,
    realm_id: String,
}

#[tokio::test]
async fn test_health_endpoint_returns_pass() {
    let app = test_app();

    let response = app.oneshot(get_request("/health")).await.expect("request failed");

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .expect("should have content-type header")
        .to_str()
        .expect("content-type should be valid string");
    assert!(
        content_type.contains("application/health+json"),
        "content-type should be application/health+json, got: {}",
        content_type
    );

    let body: HealthResponse = body_json(response).await;
    assert_eq!(body.status, "pass");
}

#[tokio::test]
async fn test_version_reports_crate_version_and_realm() {
    let app = test_app();

    let response = app.oneshot(get_request("/version")).await.expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let body: VersionResponse = body_json(response).await;
    assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(body.realm_id, "realm-local");
}
