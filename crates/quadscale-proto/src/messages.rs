//! federation request/response pairs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quadscale_types::Permission;

use crate::service::ServiceSummary;

/// a peer as seen in join responses and peer listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    /// realm identifier.
    pub id: String,
    /// human-readable realm name.
    pub name: String,
    /// federation endpoint of the realm.
    pub endpoint: String,
    /// public key advertised by the realm, if any.
    #[serde(default)]
    pub public_key: Option<String>,
}

/// request to join a federation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    /// realm requesting to join.
    pub realm_id: String,
    /// human-readable name of the joining realm.
    #[serde(default)]
    pub realm_name: String,
    /// federation endpoint of the joining realm.
    pub endpoint: String,
    /// public key of the joining realm, if it has one.
    #[serde(default)]
    pub public_key: Option<String>,
}

/// response to a successful join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    /// the realm that accepted the join.
    pub realm_id: String,
    /// federation-wide identifier, minted by the first realm ever joined.
    pub federation_id: String,
    /// opaque trust token minted for the new peer.
    pub trust_token: String,
    /// the full current peer list, including the responding realm.
    pub peers: Vec<PeerInfo>,
}

/// request to leave a federation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// realm leaving.
    pub realm_id: String,
}

/// response to a leave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveResponse {
    /// realm that left.
    pub realm_id: String,
}

/// push of a remote realm's service catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequest {
    /// realm pushing its catalog.
    pub realm_id: String,
    /// the services the realm currently reports.
    pub services: Vec<ServiceSummary>,
}

/// the responding realm's locally-owned services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    /// services owned by the responding realm.
    pub services: Vec<ServiceSummary>,
}

/// request to resolve a service by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRequest {
    /// service name, without realm prefix.
    pub name: String,
    /// zone of the requester, for visibility checks.
    #[serde(default)]
    pub zone: Option<String>,
    /// set when a peer forwards the request; forwarded requests are
    /// answered from local state only (single-hop, no longer chains).
    #[serde(default)]
    pub forwarded: bool,
}

/// how a resolved service is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    /// the service lives in the resolving realm; connect directly.
    Direct,
    /// the service lives in a peer realm; go through its endpoint.
    Proxy,
}

/// result of a resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    /// whether the service was found.
    pub found: bool,
    /// how to reach it, when found.
    #[serde(default)]
    pub access: Option<AccessKind>,
    /// endpoint to connect or proxy through, when found.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// realm that owns the service, when found.
    #[serde(default)]
    pub realm: Option<String>,
}

impl ResolveResponse {
    /// a "not found" response.
    pub fn not_found() -> Self {
        Self {
            found: false,
            access: None,
            endpoint: None,
            realm: None,
        }
    }
}

/// request for permissions from a federation peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustExchangeRequest {
    /// realm requesting permissions.
    pub realm_id: String,
    /// the permissions it asks for.
    pub requested_permissions: Vec<Permission>,
}

/// permissions granted by the peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustExchangeResponse {
    /// the granted permissions.
    pub granted: Vec<Permission>,
}

/// liveness probe response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    /// realm that answered.
    pub realm_id: String,
    /// reported health flag.
    pub healthy: bool,
    /// services the realm currently owns.
    pub service_count: usize,
    /// peers the realm currently has.
    pub peer_count: usize,
    /// when the probe was answered.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_request_round_trips() {
        let req = JoinRequest {
            realm_id: "realm-b".to_string(),
            realm_name: "Realm B".to_string(),
            endpoint: "http://realm-b.campus:8080".to_string(),
            public_key: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        let parsed: JoinRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.realm_id, "realm-b");
        assert_eq!(parsed.endpoint, req.endpoint);
    }

    #[test]
    fn resolve_access_kind_serializes_lowercase() {
        let json = serde_json::to_string(&AccessKind::Proxy).unwrap();
        assert_eq!(json, "\"proxy\"");
    }

    #[test]
    fn missing_optional_fields_default() {
        let req: ResolveRequest = serde_json::from_str(r#"{"name":"svc-1"}"#).unwrap();
        assert_eq!(req.zone, None);
    }
}
