//! the federation server: peer lifecycle, catalog sync and resolution.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::Utc;
use rand::RngCore;
use tracing::{debug, info, warn};

use quadscale_proto::{
    AccessKind, JoinRequest, JoinResponse, LeaveRequest, LeaveResponse, PeerInfo, PingResponse,
    ResolveRequest, ResolveResponse, ServiceSummary, SyncRequest, SyncResponse,
    TrustExchangeRequest, TrustExchangeResponse,
};
use quadscale_types::{Error, KvStore, Result};

use crate::client::{FederationClient, Transport};
use crate::events::{Event, EventBus};
use crate::peer::{PeerRealm, PeerStatus};

/// identity of the local realm as presented to peers.
#[derive(Debug, Clone)]
pub struct RealmIdentity {
    /// realm identifier.
    pub id: String,
    /// human-readable name.
    pub name: String,
    /// federation endpoint peers should use to reach us.
    pub endpoint: String,
}

/// the peer-to-peer federation server for one realm.
///
/// owns the peer set, the locally-owned service list and the federated
/// catalog. no lock is held across a network call: outbound operations
/// copy what they need, release the lock, perform i/o and re-acquire to
/// commit.
pub struct FederationServer {
    local: RealmIdentity,
    transport: Arc<dyn Transport>,
    store: Arc<dyn KvStore>,
    events: EventBus,
    federation_id: RwLock<Option<String>>,
    peers: RwLock<HashMap<String, PeerRealm>>,
    local_services: RwLock<HashMap<String, ServiceSummary>>,
    catalog: RwLock<HashMap<String, ServiceSummary>>,
}

/// store key for the trust token shared with `realm_id`.
fn trust_token_key(realm_id: &str) -> String {
    format!("trust-token/{}", realm_id)
}

impl FederationServer {
    /// create a federation server for the given realm identity.
    ///
    /// trust tokens are persisted through `store` so a restarted realm
    /// can recover them.
    pub fn new(
        local: RealmIdentity,
        transport: Arc<dyn Transport>,
        store: Arc<dyn KvStore>,
        events: EventBus,
    ) -> Self {
        Self {
            local,
            transport,
            store,
            events,
            federation_id: RwLock::new(None),
            peers: RwLock::new(HashMap::new()),
            local_services: RwLock::new(HashMap::new()),
            catalog: RwLock::new(HashMap::new()),
        }
    }

    /// the local realm identity.
    pub fn identity(&self) -> &RealmIdentity {
        &self.local
    }

    /// the federation id, once one exists.
    pub fn federation_id(&self) -> Option<String> {
        self.federation_id
            .read()
            .expect("federation id lock poisoned")
            .clone()
    }

    /// register a service owned by this realm.
    pub fn register_service(&self, mut service: ServiceSummary) -> Result<()> {
        if service.name.is_empty() {
            return Err(Error::validation("service name cannot be empty"));
        }
        service.realm = self.local.id.clone();
        let key = service.key();
        {
            let mut local = self.local_services.write().expect("service lock poisoned");
            local.insert(service.name.clone(), service.clone());
        }
        let mut catalog = self.catalog.write().expect("catalog lock poisoned");
        catalog.insert(key, service);
        Ok(())
    }

    /// remove a locally-owned service.
    pub fn unregister_service(&self, name: &str) -> Result<()> {
        let removed = {
            let mut local = self.local_services.write().expect("service lock poisoned");
            local.remove(name)
        };
        let Some(service) = removed else {
            return Err(Error::not_found(format!("no local service '{}'", name)));
        };
        let mut catalog = self.catalog.write().expect("catalog lock poisoned");
        catalog.remove(&service.key());
        Ok(())
    }

    /// services owned by this realm, sorted by name.
    pub fn local_services(&self) -> Vec<ServiceSummary> {
        let local = self.local_services.read().expect("service lock poisoned");
        let mut all: Vec<ServiceSummary> = local.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// the full federated catalog, sorted by key.
    pub fn catalog(&self) -> Vec<ServiceSummary> {
        let catalog = self.catalog.read().expect("catalog lock poisoned");
        let mut all: Vec<ServiceSummary> = catalog.values().cloned().collect();
        all.sort_by_key(|s| s.key());
        all
    }

    /// current peers, sorted by realm id.
    pub fn list_peers(&self) -> Vec<PeerRealm> {
        let peers = self.peers.read().expect("peer lock poisoned");
        let mut all: Vec<PeerRealm> = peers.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// one peer by realm id.
    pub fn get_peer(&self, realm_id: &str) -> Option<PeerRealm> {
        let peers = self.peers.read().expect("peer lock poisoned");
        peers.get(realm_id).cloned()
    }

    /// handle an incoming join request.
    ///
    /// the first join ever mints the federation id; independently
    /// bootstrapped federations keep their own ids and are never
    /// reconciled. a fresh 32-byte trust token is minted for the peer,
    /// persisted in the store, and the response carries the full peer
    /// list including ourselves.
    pub async fn join_federation(&self, request: &JoinRequest) -> Result<JoinResponse> {
        if request.realm_id.is_empty() {
            return Err(Error::validation("realm_id is required to join"));
        }
        if request.endpoint.is_empty() {
            return Err(Error::validation("endpoint is required to join"));
        }

        let trust_token = mint_trust_token();
        {
            let mut peers = self.peers.write().expect("peer lock poisoned");
            if peers.contains_key(&request.realm_id) {
                return Err(Error::validation(format!(
                    "realm '{}' is already a federation peer",
                    request.realm_id
                )));
            }
            let peer = PeerRealm::joined(
                request.realm_id.clone(),
                request.realm_name.clone(),
                request.endpoint.clone(),
                request.public_key.clone(),
                trust_token.clone(),
            );
            peers.insert(request.realm_id.clone(), peer);
        }

        if let Err(e) = self
            .store
            .set(&trust_token_key(&request.realm_id), &trust_token, None)
            .await
        {
            // the peer entry must not outlive its persisted token
            let mut peers = self.peers.write().expect("peer lock poisoned");
            peers.remove(&request.realm_id);
            return Err(e);
        }

        let federation_id = {
            let mut id = self.federation_id.write().expect("federation id lock poisoned");
            id.get_or_insert_with(mint_federation_id).clone()
        };

        info!(realm = %request.realm_id, endpoint = %request.endpoint, "peer joined federation");
        self.events.publish(Event::PeerJoined {
            realm: request.realm_id.clone(),
        });

        Ok(JoinResponse {
            realm_id: self.local.id.clone(),
            federation_id,
            trust_token,
            peers: self.peer_infos_including_self(),
        })
    }

    /// handle an incoming leave request.
    ///
    /// removes the peer, drops its connection with the entry and
    /// discards its persisted trust token.
    pub async fn leave_federation(&self, request: &LeaveRequest) -> Result<LeaveResponse> {
        let removed = {
            let mut peers = self.peers.write().expect("peer lock poisoned");
            peers.remove(&request.realm_id)
        };
        if removed.is_none() {
            return Err(Error::not_found(format!(
                "realm '{}' is not a federation peer",
                request.realm_id
            )));
        }
        self.store
            .delete(&trust_token_key(&request.realm_id))
            .await?;

        info!(realm = %request.realm_id, "peer left federation");
        self.events.publish(Event::PeerLeft {
            realm: request.realm_id.clone(),
        });
        Ok(LeaveResponse {
            realm_id: request.realm_id.clone(),
        })
    }

    /// handle an incoming catalog sync.
    ///
    /// merges the remote's entries into the federated catalog with
    /// overwrite semantics - entries for services the remote stops
    /// reporting are kept until overwritten (best-effort freshness, no
    /// tombstones). returns our own locally-owned services.
    pub fn sync_services(&self, request: &SyncRequest) -> Result<SyncResponse> {
        {
            let mut peers = self.peers.write().expect("peer lock poisoned");
            let Some(peer) = peers.get_mut(&request.realm_id) else {
                return Err(Error::not_found(format!(
                    "realm '{}' is not a federation peer; join first",
                    request.realm_id
                )));
            };
            peer.last_seen = Utc::now();
        }

        let mut merged = 0usize;
        {
            let mut catalog = self.catalog.write().expect("catalog lock poisoned");
            for service in &request.services {
                catalog.insert(service.key(), service.clone());
                merged += 1;
            }
        }
        debug!(realm = %request.realm_id, merged, "merged service catalog");

        Ok(SyncResponse {
            services: self.local_services(),
        })
    }

    /// resolve a service by name.
    ///
    /// local and federated catalog entries are consulted first; entries
    /// that are not public and carry a zone allow-list are hidden from
    /// requesters outside those zones. a miss is forwarded synchronously
    /// to each peer, first success wins; forwarded requests are answered
    /// from local state only, so chains never exceed one hop.
    pub async fn resolve_service(&self, request: &ResolveRequest) -> ResolveResponse {
        let hit = {
            let local = self.local_services.read().expect("service lock poisoned");
            local.values().find(|s| s.name == request.name).cloned()
        }
        .or_else(|| {
            let catalog = self.catalog.read().expect("catalog lock poisoned");
            catalog.values().find(|s| s.name == request.name).cloned()
        });

        if let Some(service) = hit {
            if !service.visible_from(request.zone.as_deref()) {
                debug!(
                    service = %service.name,
                    zone = ?request.zone,
                    "service hidden from requesting zone"
                );
                return ResolveResponse::not_found();
            }
            if service.realm == self.local.id {
                return ResolveResponse {
                    found: true,
                    access: Some(AccessKind::Direct),
                    endpoint: Some(service.endpoint.clone()),
                    realm: Some(service.realm),
                };
            }
            // owned by a peer: proxy through the peer's endpoint
            let endpoint = self
                .get_peer(&service.realm)
                .map(|p| p.endpoint)
                .unwrap_or_else(|| service.endpoint.clone());
            return ResolveResponse {
                found: true,
                access: Some(AccessKind::Proxy),
                endpoint: Some(endpoint),
                realm: Some(service.realm),
            };
        }

        if request.forwarded {
            return ResolveResponse::not_found();
        }

        // single-hop forward: copy the peer set out, then call without
        // holding any lock
        let peer_ids: Vec<String> = {
            let peers = self.peers.read().expect("peer lock poisoned");
            peers.keys().cloned().collect()
        };
        let forwarded = ResolveRequest {
            name: request.name.clone(),
            zone: request.zone.clone(),
            forwarded: true,
        };
        for peer_id in peer_ids {
            let Ok(client) = self.client_for(&peer_id) else {
                continue;
            };
            match client.resolve(&forwarded).await {
                Ok(response) if response.found => {
                    debug!(peer = %peer_id, service = %request.name, "resolved via peer");
                    return response;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(peer = %peer_id, error = %e, "forwarded resolve failed");
                }
            }
        }

        ResolveResponse::not_found()
    }

    /// handle an incoming trust exchange.
    ///
    /// grants every requested permission to a known peer and promotes
    /// it to [`PeerStatus::Trusted`]. this does not consult the
    /// cross-realm authorizer; see DESIGN.md for the recorded gap.
    pub fn exchange_trust(&self, request: &TrustExchangeRequest) -> Result<TrustExchangeResponse> {
        let mut peers = self.peers.write().expect("peer lock poisoned");
        let Some(peer) = peers.get_mut(&request.realm_id) else {
            return Err(Error::not_found(format!(
                "realm '{}' is not a federation peer",
                request.realm_id
            )));
        };

        for permission in &request.requested_permissions {
            if !peer.permissions.contains(permission) {
                peer.permissions.push(permission.clone());
            }
        }
        peer.status = PeerStatus::Trusted;
        info!(
            realm = %request.realm_id,
            granted = request.requested_permissions.len(),
            "trust exchange granted"
        );

        Ok(TrustExchangeResponse {
            granted: request.requested_permissions.clone(),
        })
    }

    /// liveness probe; always healthy, with current counts.
    pub fn ping(&self) -> PingResponse {
        let service_count = self
            .local_services
            .read()
            .expect("service lock poisoned")
            .len();
        let peer_count = self.peers.read().expect("peer lock poisoned").len();
        PingResponse {
            realm_id: self.local.id.clone(),
            healthy: true,
            service_count,
            peer_count,
            timestamp: Utc::now(),
        }
    }

    /// initiate federation with the realm at `endpoint`.
    ///
    /// the caller-side mirror of [`join_federation`](Self::join_federation):
    /// sends our identity, adopts the returned federation id if we have
    /// none, and records the responder as a peer.
    pub async fn join_peer(&self, endpoint: &str) -> Result<JoinResponse> {
        let request = JoinRequest {
            realm_id: self.local.id.clone(),
            realm_name: self.local.name.clone(),
            endpoint: self.local.endpoint.clone(),
            public_key: None,
        };
        let response = self.transport.join(endpoint, &request).await?;

        {
            let mut id = self.federation_id.write().expect("federation id lock poisoned");
            if id.is_none() {
                *id = Some(response.federation_id.clone());
            }
        }

        let responder_name = response
            .peers
            .iter()
            .find(|p| p.id == response.realm_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        {
            let mut peers = self.peers.write().expect("peer lock poisoned");
            peers.insert(
                response.realm_id.clone(),
                PeerRealm::joined(
                    response.realm_id.clone(),
                    responder_name,
                    endpoint,
                    None,
                    response.trust_token.clone(),
                ),
            );
        }
        self.store
            .set(
                &trust_token_key(&response.realm_id),
                &response.trust_token,
                None,
            )
            .await?;

        info!(realm = %response.realm_id, %endpoint, "joined peer realm");
        self.events.publish(Event::PeerJoined {
            realm: response.realm_id.clone(),
        });
        Ok(response)
    }

    /// push our catalog to a peer and merge its services back.
    ///
    /// returns the number of services merged from the peer.
    pub async fn sync_with_peer(&self, realm_id: &str) -> Result<usize> {
        let client = self.client_for(realm_id)?;
        let request = SyncRequest {
            realm_id: self.local.id.clone(),
            services: self.local_services(),
        };

        let response = client.sync(&request).await?;

        let merged = response.services.len();
        {
            let mut catalog = self.catalog.write().expect("catalog lock poisoned");
            for service in response.services {
                catalog.insert(service.key(), service);
            }
        }
        {
            let mut peers = self.peers.write().expect("peer lock poisoned");
            if let Some(peer) = peers.get_mut(realm_id) {
                peer.last_seen = Utc::now();
            }
        }
        Ok(merged)
    }

    /// the lazily-established client for a peer.
    pub fn client_for(&self, realm_id: &str) -> Result<FederationClient> {
        let mut peers = self.peers.write().expect("peer lock poisoned");
        let Some(peer) = peers.get_mut(realm_id) else {
            return Err(Error::not_found(format!(
                "realm '{}' is not a federation peer",
                realm_id
            )));
        };
        let client = peer.connection.get_or_insert_with(|| {
            FederationClient::new(Arc::clone(&self.transport), peer.endpoint.clone())
        });
        Ok(client.clone())
    }

    /// drop the cached connection for a peer, forcing reconnect.
    pub fn drop_connection(&self, realm_id: &str) {
        let mut peers = self.peers.write().expect("peer lock poisoned");
        if let Some(peer) = peers.get_mut(realm_id) {
            peer.connection = None;
        }
    }

    fn peer_infos_including_self(&self) -> Vec<PeerInfo> {
        let peers = self.peers.read().expect("peer lock poisoned");
        let mut infos: Vec<PeerInfo> = peers
            .values()
            .map(|p| PeerInfo {
                id: p.id.clone(),
                name: p.name.clone(),
                endpoint: p.endpoint.clone(),
                public_key: p.public_key.clone(),
            })
            .collect();
        infos.push(PeerInfo {
            id: self.local.id.clone(),
            name: self.local.name.clone(),
            endpoint: self.local.endpoint.clone(),
            public_key: None,
        });
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }
}

/// a fresh random 32-byte trust token, base64-encoded.
fn mint_trust_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

/// a fresh federation-wide identifier.
fn mint_federation_id() -> String {
    let mut bytes = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("fed-{}", URL_SAFE_NO_PAD.encode(bytes))
}
