//! global admin handlers: the dashboard read surface plus the few
//! mutations operators need (realm registration, alert ack, policy
//! upload).

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use quadscale_admin::{Alert, DistributedPolicy, FederationStats, RealmInfo, ServiceInfo};

use super::ApiError;
use crate::AppState;

/// body for POST /admin/realms
#[derive(Debug, Deserialize)]
pub struct RegisterRealmRequest {
    /// realm identifier.
    pub id: String,
    /// human-readable name.
    #[serde(default)]
    pub name: String,
    /// federation endpoint.
    pub endpoint: String,
}

/// body for POST /admin/alerts/{id}/ack
#[derive(Debug, Deserialize)]
pub struct AckAlertRequest {
    /// who is acknowledging.
    pub acked_by: String,
}

/// body for PUT /admin/policies
#[derive(Debug, Deserialize)]
pub struct SetPolicyRequest {
    /// policy identifier.
    pub id: String,
    /// what kind of policy this is.
    pub policy_type: String,
    /// realms the policy targets; empty means all.
    #[serde(default)]
    pub realms: Vec<String>,
    /// the policy payload.
    pub content: serde_json::Value,
    /// whether the policy is active.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// GET /admin/realms - registered realms, sorted by name
pub async fn list_realms(State(state): State<AppState>) -> Json<Vec<RealmInfo>> {
    Json(state.admin.list_realms())
}

/// POST /admin/realms - register a realm for monitoring
pub async fn register_realm(
    State(state): State<AppState>,
    Json(request): Json<RegisterRealmRequest>,
) -> Result<Json<RealmInfo>, ApiError> {
    let realm = state
        .admin
        .register_realm(request.id, request.name, request.endpoint)?;
    Ok(Json(realm))
}

/// DELETE /admin/realms/{id} - unregister a realm
pub async fn unregister_realm(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(), ApiError> {
    state.admin.unregister_realm(&id)?;
    Ok(())
}

/// GET /admin/services - cached service rows, sorted realm then name
pub async fn list_services(State(state): State<AppState>) -> Json<Vec<ServiceInfo>> {
    Json(state.admin.list_services())
}

/// GET /admin/alerts - all alerts, newest first
pub async fn list_alerts(State(state): State<AppState>) -> Json<Vec<Alert>> {
    Json(state.admin.list_alerts())
}

/// POST /admin/alerts/{id}/ack - acknowledge an alert
pub async fn ack_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AckAlertRequest>,
) -> Result<Json<Alert>, ApiError> {
    let alert = state.admin.ack_alert(&id, request.acked_by)?;
    Ok(Json(alert))
}

/// GET /admin/policies - all policies, sorted by id
pub async fn list_policies(State(state): State<AppState>) -> Json<Vec<DistributedPolicy>> {
    Json(state.admin.list_policies())
}

/// PUT /admin/policies - create or update a policy
pub async fn set_policy(
    State(state): State<AppState>,
    Json(request): Json<SetPolicyRequest>,
) -> Result<Json<DistributedPolicy>, ApiError> {
    let policy = state.admin.set_policy(
        request.id,
        request.policy_type,
        request.realms,
        request.content,
        request.enabled,
    )?;
    Ok(Json(policy))
}

/// GET /admin/stats - aggregate over the registry's current state
pub async fn stats(State(state): State<AppState>) -> Json<FederationStats> {
    Json(state.monitor.stats())
}
