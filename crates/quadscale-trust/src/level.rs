//! the trust-level lattice.

use serde::{Deserialize, Serialize};

use quadscale_rbac::action_verb;

/// how far a remote realm is trusted.
///
/// levels are totally ordered: `None < Read < Access < Register < Full`.
/// an action is permitted only when the established level is at least
/// the minimum the action demands.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    /// no trust; remote users are treated as guests.
    #[default]
    None,
    /// read-only visibility into the local catalog.
    Read,
    /// may access local services.
    Access,
    /// may register services in the local realm.
    Register,
    /// full trust; remote roles carry over unchanged.
    Full,
}

impl TrustLevel {
    /// the minimum trust level an action demands.
    ///
    /// keyed on the action's verb: list/view need `Read`, access needs
    /// `Access`, register/unregister need `Register`, administrative
    /// verbs need `Full`. unknown verbs default to `Access`.
    pub fn required_for(action: &str) -> Self {
        match action_verb(action) {
            "list" | "view" => TrustLevel::Read,
            "access" => TrustLevel::Access,
            "register" | "unregister" => TrustLevel::Register,
            "admin" | "manage" | "federate" | "trust" => TrustLevel::Full,
            _ => TrustLevel::Access,
        }
    }

    /// demote a remote role according to this trust level.
    ///
    /// applied only when the trust carries no explicit role mapping:
    /// `Full` keeps the role, `Register` caps privileged roles at
    /// teacher, `Access` caps them at student, `Read` and `None` force
    /// guest.
    pub fn demote<'a>(&self, remote_role: &'a str) -> &'a str {
        match self {
            TrustLevel::Full => remote_role,
            TrustLevel::Register => match remote_role {
                "admin" | "superadmin" => "teacher",
                other => other,
            },
            TrustLevel::Access => match remote_role {
                "admin" | "superadmin" | "teacher" => "student",
                other => other,
            },
            TrustLevel::Read | TrustLevel::None => "guest",
        }
    }
}
