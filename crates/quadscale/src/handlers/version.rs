//! version endpoint handler

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::AppState;

/// version information response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    /// crate version from Cargo.toml
    pub version: &'static str,
    /// identifier of the realm answering
    pub realm_id: String,
}

/// GET /version - version and realm identity
pub async fn version(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        realm_id: state.config.realm_id.clone(),
    })
}
