//! role and ssid-mapping types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::permission::Permission;

/// a named set of permissions with optional inheritance.
///
/// `inherits` may form a cycle; permission resolution tolerates cycles
/// with a visited-set rather than rejecting them at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// unique role identifier (e.g. "teacher").
    pub id: String,
    /// human-readable name.
    pub name: String,
    /// permissions granted directly by this role.
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
    /// ids of roles whose permissions this role also holds.
    #[serde(default)]
    pub inherits: Vec<String>,
    /// precedence when several roles apply; higher wins.
    #[serde(default)]
    pub priority: i32,
}

impl Role {
    /// create a role with no permissions.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            permissions: BTreeSet::new(),
            inherits: Vec::new(),
            priority: 0,
        }
    }

    /// add a direct permission.
    pub fn with_permission(mut self, perm: impl Into<Permission>) -> Self {
        self.permissions.insert(perm.into());
        self
    }

    /// add an inherited role id.
    pub fn with_inherit(mut self, role_id: impl Into<String>) -> Self {
        self.inherits.push(role_id.into());
        self
    }

    /// set the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// maps wifi ssid patterns to a role, optionally scoped to a zone.
///
/// the mapping collection is kept sorted by descending priority;
/// the first pattern match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsidRoleMapping {
    /// unique mapping identifier.
    pub id: String,
    /// ssid patterns; `*` is a wildcard segment separator.
    pub ssids: Vec<String>,
    /// role granted when a pattern matches.
    pub role_id: String,
    /// if set, the mapping only applies within this zone.
    #[serde(default)]
    pub zone: Option<String>,
    /// precedence; higher priority mappings are checked first.
    #[serde(default)]
    pub priority: i32,
}
