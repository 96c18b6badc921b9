//! decision endpoints: rbac evaluation, cross-realm authorization and
//! zone access checks.
//!
//! decisions are data, not errors: every well-formed request gets a 200
//! carrying allow or deny with a reason. only malformed input or a bad
//! token produces an error status.

use std::net::IpAddr;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use quadscale_trust::CrossRealmRequest;
use quadscale_types::{PolicyContext, PolicyDecision};
use quadscale_zones::ZoneDecision;

use super::ApiError;
use crate::AppState;

/// body for POST /auth/zone-check
#[derive(Debug, Deserialize)]
pub struct ZoneCheckRequest {
    /// bearer token to verify claims from.
    pub token: String,
    /// zone the caller wants to reach.
    pub zone: String,
    /// caller's ip, for origin-zone checks.
    #[serde(default)]
    pub ip: Option<IpAddr>,
}

/// POST /auth/evaluate - run the local rbac engine
pub async fn evaluate(
    State(state): State<AppState>,
    Json(context): Json<PolicyContext>,
) -> Json<PolicyDecision> {
    Json(state.rbac.evaluate(&context))
}

/// POST /auth/authorize - run the cross-realm pipeline
pub async fn authorize(
    State(state): State<AppState>,
    Json(request): Json<CrossRealmRequest>,
) -> Json<PolicyDecision> {
    Json(state.trust.authorize(&request))
}

/// POST /auth/zone-check - verify a token and gate it on a zone
pub async fn zone_check(
    State(state): State<AppState>,
    Json(request): Json<ZoneCheckRequest>,
) -> Result<Json<ZoneDecision>, ApiError> {
    let claims = state
        .verifier
        .verify(&request.token)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;
    Ok(Json(
        state.zones.check_access(&claims, &request.zone, request.ip),
    ))
}
