//! federation peer state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quadscale_types::Permission;

use crate::client::FederationClient;

/// lifecycle state of a federation peer.
///
/// `Unknown -> Peered` on a successful join, `Peered -> Trusted` after
/// a trust exchange, removed entirely on leave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerStatus {
    /// not (yet) part of the federation.
    #[default]
    Unknown,
    /// joined; catalog sync and resolve are available.
    Peered,
    /// joined and granted permissions through trust exchange.
    Trusted,
}

/// a realm this server federates with.
///
/// created on successful join, destroyed on leave. the connection is
/// lazily established and owned by the federation server.
#[derive(Clone, Serialize, Deserialize)]
pub struct PeerRealm {
    /// realm identifier.
    pub id: String,
    /// human-readable name.
    pub name: String,
    /// federation endpoint.
    pub endpoint: String,
    /// public key the realm advertised, if any.
    pub public_key: Option<String>,
    /// lifecycle state.
    pub status: PeerStatus,
    /// opaque token minted for this peer at join.
    pub trust_token: String,
    /// permissions granted through trust exchange.
    pub permissions: Vec<Permission>,
    /// when the peer joined.
    pub joined_at: DateTime<Utc>,
    /// last successful contact.
    pub last_seen: DateTime<Utc>,
    /// lazily-built client for outbound calls to this peer.
    #[serde(skip)]
    pub(crate) connection: Option<FederationClient>,
}

impl PeerRealm {
    /// create a freshly joined peer.
    pub fn joined(
        id: impl Into<String>,
        name: impl Into<String>,
        endpoint: impl Into<String>,
        public_key: Option<String>,
        trust_token: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            endpoint: endpoint.into(),
            public_key,
            status: PeerStatus::Peered,
            trust_token: trust_token.into(),
            permissions: Vec::new(),
            joined_at: now,
            last_seen: now,
            connection: None,
        }
    }
}

impl std::fmt::Debug for PeerRealm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerRealm")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("status", &self.status)
            .field("connected", &self.connection.is_some())
            .finish_non_exhaustive()
    }
}
