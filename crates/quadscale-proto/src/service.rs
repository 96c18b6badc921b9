//! the federated service catalog row.

use serde::{Deserialize, Serialize};

/// one row of the federated service catalog.
///
/// catalog entries are keyed by `"realm/name"` and merge with
/// last-write-wins semantics on sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSummary {
    /// realm that owns the service.
    pub realm: String,
    /// service name, unique within its realm.
    pub name: String,
    /// endpoint the service is reachable at.
    pub endpoint: String,
    /// zones allowed to resolve the service; empty means unrestricted.
    #[serde(default)]
    pub zones: Vec<String>,
    /// whether the service is visible outside its zone allow-list.
    #[serde(default)]
    pub public: bool,
    /// last reported health.
    #[serde(default)]
    pub healthy: bool,
    /// reported service version.
    #[serde(default)]
    pub version: String,
}

impl ServiceSummary {
    /// the catalog key, `"realm/name"`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.realm, self.name)
    }

    /// whether a requester in `zone` may see this service.
    ///
    /// public services and services without a zone allow-list are
    /// visible to everyone.
    pub fn visible_from(&self, zone: Option<&str>) -> bool {
        if self.public || self.zones.is_empty() {
            return true;
        }
        zone.is_some_and(|z| self.zones.iter().any(|allowed| allowed == z))
    }
}
