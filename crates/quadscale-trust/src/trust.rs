//! the trust relationship record.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quadscale_types::Permission;

use crate::level::TrustLevel;

/// a trust relationship with one remote realm.
///
/// owned by the local realm's authorizer; one entry per remote realm,
/// last-write-wins on re-establishment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealmTrust {
    /// deterministic id, `"{local}->{remote}"`.
    #[serde(default)]
    pub id: String,
    /// the realm that owns this entry.
    #[serde(default)]
    pub local_realm: String,
    /// the trusted remote realm.
    pub remote_realm: String,
    /// how far the remote realm is trusted.
    #[serde(default)]
    pub trust_level: TrustLevel,
    /// explicit permission grants; empty means level-only trust.
    #[serde(default)]
    pub permissions: Vec<Permission>,
    /// remote role -> local role overrides; `"*"` maps any role.
    #[serde(default)]
    pub role_mapping: HashMap<String, String>,
    /// whether the remote realm holds a mirror entry for us.
    #[serde(default)]
    pub bidirectional: bool,
    /// when the trust lapses, if ever.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// when the trust was first established.
    pub created_at: DateTime<Utc>,
    /// when the trust was last (re-)established.
    pub updated_at: DateTime<Utc>,
}

impl RealmTrust {
    /// a new level-only trust entry for a remote realm.
    pub fn new(remote_realm: impl Into<String>, trust_level: TrustLevel) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            local_realm: String::new(),
            remote_realm: remote_realm.into(),
            trust_level,
            permissions: Vec::new(),
            role_mapping: HashMap::new(),
            bidirectional: false,
            expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// whether the trust has lapsed.
    pub fn is_expired(&self) -> bool {
        matches!(self.expires_at, Some(at) if at <= Utc::now())
    }

    /// the local role a remote role maps to.
    ///
    /// explicit mapping wins, then the `"*"` wildcard mapping, then the
    /// trust-level demotion table.
    pub fn map_role(&self, remote_role: &str) -> String {
        if let Some(local) = self.role_mapping.get(remote_role) {
            return local.clone();
        }
        if let Some(local) = self.role_mapping.get("*") {
            return local.clone();
        }
        self.trust_level.demote(remote_role).to_string()
    }
}
