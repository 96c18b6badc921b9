//! federation protocol handlers.
//!
//! one handler per rpc in the peer-to-peer contract; all state changes
//! go through the [`FederationServer`](quadscale_federation::FederationServer).

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use quadscale_proto::{
    JoinRequest, JoinResponse, LeaveRequest, LeaveResponse, PingResponse, ResolveRequest,
    ResolveResponse, ServiceSummary, SyncRequest, SyncResponse, TrustExchangeRequest,
    TrustExchangeResponse,
};

use super::ApiError;
use crate::AppState;

/// body for POST /services
#[derive(Debug, Deserialize)]
pub struct RegisterServiceRequest {
    /// service name, unique within the realm.
    pub name: String,
    /// where the service is reachable.
    pub endpoint: String,
    /// zones allowed to see the service; empty means unrestricted.
    #[serde(default)]
    pub zones: Vec<String>,
    /// whether the service is visible from every zone.
    #[serde(default = "default_public")]
    pub public: bool,
    /// advertised version string.
    #[serde(default)]
    pub version: String,
}

fn default_public() -> bool {
    true
}

/// POST /federation/join - accept a realm into the federation
pub async fn join(
    State(state): State<AppState>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ApiError> {
    let response = state.federation.join_federation(&request).await?;
    Ok(Json(response))
}

/// POST /federation/leave - remove a peer from the federation
pub async fn leave(
    State(state): State<AppState>,
    Json(request): Json<LeaveRequest>,
) -> Result<Json<LeaveResponse>, ApiError> {
    let response = state.federation.leave_federation(&request).await?;
    Ok(Json(response))
}

/// POST /federation/sync - merge a peer's catalog, return our services
pub async fn sync(
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, ApiError> {
    let response = state.federation.sync_services(&request)?;
    Ok(Json(response))
}

/// POST /federation/resolve - resolve a service by name
///
/// always 200; a miss is `found: false`, not an error.
pub async fn resolve(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Json<ResolveResponse> {
    Json(state.federation.resolve_service(&request).await)
}

/// POST /federation/trust - grant permissions to a peer
pub async fn trust(
    State(state): State<AppState>,
    Json(request): Json<TrustExchangeRequest>,
) -> Result<Json<TrustExchangeResponse>, ApiError> {
    let response = state.federation.exchange_trust(&request)?;
    Ok(Json(response))
}

/// GET /federation/ping - liveness probe
pub async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    Json(state.federation.ping())
}

/// GET /services - services owned by this realm
pub async fn list_local_services(State(state): State<AppState>) -> Json<Vec<ServiceSummary>> {
    Json(state.federation.local_services())
}

/// POST /services - register a locally-owned service
pub async fn register_service(
    State(state): State<AppState>,
    Json(request): Json<RegisterServiceRequest>,
) -> Result<(), ApiError> {
    state.federation.register_service(ServiceSummary {
        realm: String::new(), // stamped with the local realm id on insert
        name: request.name,
        endpoint: request.endpoint,
        zones: request.zones,
        public: request.public,
        healthy: true,
        version: request.version,
    })?;
    Ok(())
}

/// DELETE /services/{name} - remove a locally-owned service
pub async fn unregister_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<(), ApiError> {
    state.federation.unregister_service(&name)?;
    Ok(())
}
