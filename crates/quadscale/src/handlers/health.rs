//! health check endpoint handler

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// health check response body
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// content-type for health check responses per RFC 8040
const HEALTH_CONTENT_TYPE: &str = "application/health+json; charset=utf-8";

/// GET /health - health check endpoint
///
/// all state is in-process, so a responding server is a healthy one.
pub async fn health() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HEALTH_CONTENT_TYPE)],
        Json(HealthResponse { status: "pass" }),
    )
        .into_response()
}
