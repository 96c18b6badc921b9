//! the rbac evaluation engine.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use tracing::debug;

use quadscale_types::{Error, Permission, PolicyContext, PolicyDecision, Result, Role, SsidRoleMapping};

use crate::action::action_to_permission;
use crate::pattern::matches_pattern;

/// outcome of resolving a role from an ssid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRole {
    /// the resolved role id.
    pub role_id: String,
    /// false when no mapping matched and the default role was used.
    pub matched: bool,
}

/// thread-safe role-based permission engine.
///
/// owns the role registry and the ssid mapping list behind read/write
/// locks; readers take shared locks, so evaluation is safe from
/// concurrent handlers. constructed per instance - never a global.
pub struct RbacEngine {
    roles: RwLock<HashMap<String, Role>>,
    mappings: RwLock<Vec<SsidRoleMapping>>,
    default_role: String,
}

impl RbacEngine {
    /// create an engine with the five built-in campus roles.
    ///
    /// the built-ins form a strict inheritance chain
    /// `guest ⊂ student ⊂ teacher ⊂ admin ⊂ superadmin`,
    /// with superadmin holding the universal wildcard.
    pub fn new(default_role: impl Into<String>) -> Self {
        let engine = Self {
            roles: RwLock::new(HashMap::new()),
            mappings: RwLock::new(Vec::new()),
            default_role: default_role.into(),
        };
        engine.bootstrap_builtin_roles();
        engine
    }

    fn bootstrap_builtin_roles(&self) {
        let builtins = [
            Role::new("guest", "Guest")
                .with_permission("service:view")
                .with_permission("service:list")
                .with_priority(0),
            Role::new("student", "Student")
                .with_inherit("guest")
                .with_permission("service:access")
                .with_priority(10),
            Role::new("teacher", "Teacher")
                .with_inherit("student")
                .with_permission("service:register")
                .with_permission("service:unregister")
                .with_priority(20),
            Role::new("admin", "Administrator")
                .with_inherit("teacher")
                .with_permission("realm:manage")
                .with_permission("realm:trust")
                .with_permission("user:manage")
                .with_priority(30),
            Role::new("superadmin", "Super Administrator")
                .with_inherit("admin")
                .with_permission("*")
                .with_priority(40),
        ];

        let mut roles = self.roles.write().expect("role lock poisoned");
        for role in builtins {
            roles.insert(role.id.clone(), role);
        }
    }

    /// add or replace a role.
    pub fn add_role(&self, role: Role) -> Result<()> {
        if role.id.is_empty() {
            return Err(Error::validation("role id cannot be empty"));
        }
        let mut roles = self.roles.write().expect("role lock poisoned");
        roles.insert(role.id.clone(), role);
        Ok(())
    }

    /// get a role by id.
    pub fn get_role(&self, id: &str) -> Option<Role> {
        let roles = self.roles.read().expect("role lock poisoned");
        roles.get(id).cloned()
    }

    /// list all roles, sorted by id.
    pub fn list_roles(&self) -> Vec<Role> {
        let roles = self.roles.read().expect("role lock poisoned");
        let mut all: Vec<Role> = roles.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// add an ssid-to-role mapping.
    ///
    /// the mapping list stays sorted by descending priority so that
    /// [`resolve_role_from_ssid`](Self::resolve_role_from_ssid) can take
    /// the first match.
    pub fn add_ssid_mapping(&self, mapping: SsidRoleMapping) -> Result<()> {
        if mapping.id.is_empty() {
            return Err(Error::validation("mapping id cannot be empty"));
        }
        if mapping.role_id.is_empty() {
            return Err(Error::validation("mapping role_id cannot be empty"));
        }
        if mapping.ssids.is_empty() {
            return Err(Error::validation("mapping needs at least one ssid pattern"));
        }
        {
            let roles = self.roles.read().expect("role lock poisoned");
            if !roles.contains_key(&mapping.role_id) {
                return Err(Error::not_found(format!(
                    "role '{}' does not exist",
                    mapping.role_id
                )));
            }
        }

        let mut mappings = self.mappings.write().expect("mapping lock poisoned");
        mappings.push(mapping);
        // stable: equal-priority mappings keep insertion order
        mappings.sort_by_key(|m| std::cmp::Reverse(m.priority));
        Ok(())
    }

    /// list all ssid mappings in evaluation order.
    pub fn list_ssid_mappings(&self) -> Vec<SsidRoleMapping> {
        let mappings = self.mappings.read().expect("mapping lock poisoned");
        mappings.clone()
    }

    /// resolve a role from an ssid, scanning mappings in priority order.
    ///
    /// mappings scoped to a different zone are skipped. when nothing
    /// matches, the configured default role is returned with
    /// `matched = false`.
    pub fn resolve_role_from_ssid(&self, ssid: &str, zone: Option<&str>) -> ResolvedRole {
        let mappings = self.mappings.read().expect("mapping lock poisoned");
        for mapping in mappings.iter() {
            if let Some(ref mapping_zone) = mapping.zone {
                if zone != Some(mapping_zone.as_str()) {
                    continue;
                }
            }
            if mapping.ssids.iter().any(|p| matches_pattern(ssid, p)) {
                return ResolvedRole {
                    role_id: mapping.role_id.clone(),
                    matched: true,
                };
            }
        }
        ResolvedRole {
            role_id: self.default_role.clone(),
            matched: false,
        }
    }

    /// the effective permission set of a role.
    ///
    /// depth-first union of inherited permissions (collected before the
    /// role's own; duplicates allowed). a visited-set keyed by role id
    /// guarantees termination even when `inherits` contains a cycle -
    /// cycles are tolerated, just de-duplicated away.
    pub fn all_permissions(&self, role_id: &str) -> Vec<Permission> {
        let roles = self.roles.read().expect("role lock poisoned");
        let mut visited = HashSet::new();
        let mut out = Vec::new();
        collect_permissions(&roles, role_id, &mut visited, &mut out);
        out
    }

    /// whether a role holds a permission, directly or by inheritance.
    ///
    /// a permission is held if any resolved grant equals it, is the
    /// universal wildcard, or is a namespace wildcard covering it.
    pub fn has_permission(&self, role_id: &str, perm: &Permission) -> bool {
        self.all_permissions(role_id)
            .iter()
            .any(|granted| granted.grants(perm))
    }

    /// evaluate one authorization request.
    ///
    /// resolves the role (explicit, then ssid mapping, then default),
    /// translates the action to a permission, and checks the role's
    /// effective grants. actions outside the permission table require no
    /// permission and are allowed unconditionally - a deliberate
    /// low-friction default for unmapped verbs, not a bug.
    pub fn evaluate(&self, ctx: &PolicyContext) -> PolicyDecision {
        let role_id = match ctx.role.as_deref().filter(|r| !r.is_empty()) {
            Some(role) => role.to_string(),
            None => match ctx.ssid.as_deref() {
                Some(ssid) => {
                    let resolved = self.resolve_role_from_ssid(ssid, ctx.zone.as_deref());
                    debug!(
                        ssid,
                        role = %resolved.role_id,
                        matched = resolved.matched,
                        "resolved role from ssid"
                    );
                    resolved.role_id
                }
                None => self.default_role.clone(),
            },
        };

        let permissions = self.all_permissions(&role_id);

        let Some(required) = action_to_permission(&ctx.action) else {
            return PolicyDecision {
                allowed: true,
                role: role_id,
                permissions,
                reason: format!("action '{}' requires no permission", ctx.action),
                expires_at: None,
            };
        };

        let allowed = permissions.iter().any(|granted| granted.grants(&required));
        let reason = if allowed {
            format!("role '{}' holds '{}'", role_id, required)
        } else {
            format!("role '{}' lacks '{}'", role_id, required)
        };

        PolicyDecision {
            allowed,
            role: role_id,
            permissions,
            reason,
            expires_at: None,
        }
    }
}

/// depth-first permission collection with a visited-set.
fn collect_permissions(
    roles: &HashMap<String, Role>,
    role_id: &str,
    visited: &mut HashSet<String>,
    out: &mut Vec<Permission>,
) {
    if !visited.insert(role_id.to_string()) {
        return;
    }
    let Some(role) = roles.get(role_id) else {
        return;
    };
    for parent in &role.inherits {
        collect_permissions(roles, parent, visited, out);
    }
    out.extend(role.permissions.iter().cloned());
}
