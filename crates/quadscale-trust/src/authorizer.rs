//! the cross-realm authorization pipeline.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use quadscale_rbac::{action_to_permission, RbacEngine};
use quadscale_types::{Error, PolicyContext, PolicyDecision, Result};

use crate::level::TrustLevel;
use crate::trust::RealmTrust;

/// an incoming request from another realm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossRealmRequest {
    /// realm the request originates from.
    pub source_realm: String,
    /// the subject's role in its home realm.
    pub remote_role: String,
    /// subject identifier.
    pub subject: String,
    /// verb being attempted.
    pub action: String,
    /// resource the action targets.
    pub resource: String,
    /// network zone of the subject, if known.
    #[serde(default)]
    pub zone: Option<String>,
}

/// registry of trust relationships plus the authorization pipeline.
///
/// holds one [`RealmTrust`] per remote realm and delegates final
/// decisions to the local [`RbacEngine`]. injected per instance, never
/// a process-wide singleton.
pub struct TrustAuthorizer {
    local_realm: String,
    rbac: Arc<RbacEngine>,
    trusts: RwLock<HashMap<String, RealmTrust>>,
}

impl TrustAuthorizer {
    /// create an authorizer for the given local realm.
    pub fn new(local_realm: impl Into<String>, rbac: Arc<RbacEngine>) -> Self {
        Self {
            local_realm: local_realm.into(),
            rbac,
            trusts: RwLock::new(HashMap::new()),
        }
    }

    /// establish (or re-establish) trust with a remote realm.
    ///
    /// fills in `local_realm` and the deterministic id when absent.
    /// re-establishing preserves `created_at` and refreshes
    /// `updated_at`; the entry itself is last-write-wins.
    pub fn establish_trust(&self, mut trust: RealmTrust) -> Result<RealmTrust> {
        if trust.remote_realm.is_empty() {
            return Err(Error::validation("remote_realm cannot be empty"));
        }
        if trust.local_realm.is_empty() {
            trust.local_realm = self.local_realm.clone();
        }
        if trust.id.is_empty() {
            trust.id = format!("{}->{}", trust.local_realm, trust.remote_realm);
        }
        trust.updated_at = Utc::now();

        let mut trusts = self.trusts.write().expect("trust lock poisoned");
        if let Some(existing) = trusts.get(&trust.remote_realm) {
            trust.created_at = existing.created_at;
        }
        debug!(
            remote = %trust.remote_realm,
            level = ?trust.trust_level,
            "trust established"
        );
        trusts.insert(trust.remote_realm.clone(), trust.clone());
        Ok(trust)
    }

    /// remove the trust entry for a remote realm.
    pub fn revoke_trust(&self, remote_realm: &str) -> Result<()> {
        let mut trusts = self.trusts.write().expect("trust lock poisoned");
        trusts
            .remove(remote_realm)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("no trust with realm '{}'", remote_realm)))
    }

    /// get the trust entry for a remote realm.
    pub fn get_trust(&self, remote_realm: &str) -> Option<RealmTrust> {
        let trusts = self.trusts.read().expect("trust lock poisoned");
        trusts.get(remote_realm).cloned()
    }

    /// list all trust entries, sorted by remote realm.
    pub fn list_trusts(&self) -> Vec<RealmTrust> {
        let trusts = self.trusts.read().expect("trust lock poisoned");
        let mut all: Vec<RealmTrust> = trusts.values().cloned().collect();
        all.sort_by(|a, b| a.remote_realm.cmp(&b.remote_realm));
        all
    }

    /// authorize a cross-realm request.
    ///
    /// checks run in a fixed order and the first failing check wins:
    /// trust existence, expiry, trust level floor, the explicit
    /// permission allow-list, then delegation to the rbac engine with
    /// the mapped local role. the returned decision carries the trust's
    /// expiry either way.
    pub fn authorize(&self, request: &CrossRealmRequest) -> PolicyDecision {
        let Some(trust) = self.get_trust(&request.source_realm) else {
            return PolicyDecision::deny(
                request.remote_role.clone(),
                format!("no trust established with realm '{}'", request.source_realm),
            );
        };

        if trust.is_expired() {
            return PolicyDecision::deny(
                request.remote_role.clone(),
                format!("trust with realm '{}' has expired", request.source_realm),
            );
        }

        let local_role = trust.map_role(&request.remote_role);

        let required_level = TrustLevel::required_for(&request.action);
        if trust.trust_level < required_level {
            return PolicyDecision::deny(
                local_role,
                format!(
                    "trust level {:?} is below {:?} required for action '{}'",
                    trust.trust_level, required_level, request.action
                ),
            );
        }

        // explicit allow-list: only the named permissions (or "*") pass
        if !trust.permissions.is_empty() {
            if let Some(required) = action_to_permission(&request.action) {
                let listed = trust
                    .permissions
                    .iter()
                    .any(|p| p.is_wildcard() || *p == required);
                if !listed {
                    return PolicyDecision::deny(
                        local_role,
                        format!(
                            "permission '{}' is not in the trust grant list",
                            required
                        ),
                    );
                }
            }
        }

        let ctx = PolicyContext {
            subject: request.subject.clone(),
            role: Some(local_role),
            ssid: None,
            zone: request.zone.clone(),
            action: request.action.clone(),
            resource: request.resource.clone(),
            source_realm: Some(request.source_realm.clone()),
        };
        let mut decision = self.rbac.evaluate(&ctx);
        decision.expires_at = trust.expires_at;
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authorizer() -> TrustAuthorizer {
        TrustAuthorizer::new("realm-a", Arc::new(RbacEngine::new("guest")))
    }

    fn request(action: &str, remote_role: &str) -> CrossRealmRequest {
        CrossRealmRequest {
            source_realm: "realm-b".to_string(),
            remote_role: remote_role.to_string(),
            subject: "bob@realm-b".to_string(),
            action: action.to_string(),
            resource: "svc-1".to_string(),
            zone: None,
        }
    }

    #[test]
    fn no_trust_is_denied() {
        let auth = authorizer();
        let decision = auth.authorize(&request("service.access", "student"));
        assert!(!decision.allowed);
        assert!(decision.reason.contains("no trust established"));
    }

    #[test]
    fn establish_requires_remote_realm() {
        let auth = authorizer();
        let err = auth
            .establish_trust(RealmTrust::new("", TrustLevel::Read))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn establish_autofills_id_and_local_realm() {
        let auth = authorizer();
        let trust = auth
            .establish_trust(RealmTrust::new("realm-b", TrustLevel::Access))
            .unwrap();
        assert_eq!(trust.id, "realm-a->realm-b");
        assert_eq!(trust.local_realm, "realm-a");
    }

    #[test]
    fn reestablish_preserves_created_at() {
        let auth = authorizer();
        let first = auth
            .establish_trust(RealmTrust::new("realm-b", TrustLevel::Read))
            .unwrap();

        let second = auth
            .establish_trust(RealmTrust::new("realm-b", TrustLevel::Full))
            .unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(
            auth.get_trust("realm-b").unwrap().trust_level,
            TrustLevel::Full
        );
    }

    #[test]
    fn revoke_unknown_trust_fails() {
        let auth = authorizer();
        assert!(matches!(
            auth.revoke_trust("realm-z").unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[test]
    fn read_level_denies_access_action() {
        let auth = authorizer();
        auth.establish_trust(RealmTrust::new("realm-b", TrustLevel::Read))
            .unwrap();

        let decision = auth.authorize(&request("service.access", "student"));
        assert!(!decision.allowed);
        assert!(decision.reason.contains("below"));
    }

    #[test]
    fn full_trust_keeps_remote_role() {
        let auth = authorizer();
        auth.establish_trust(RealmTrust::new("realm-b", TrustLevel::Full))
            .unwrap();

        let decision = auth.authorize(&request("service.access", "admin"));
        assert!(decision.allowed);
        assert_eq!(decision.role, "admin");
    }

    #[test]
    fn expired_trust_is_denied_regardless_of_level() {
        let auth = authorizer();
        let mut trust = RealmTrust::new("realm-b", TrustLevel::Full);
        trust.expires_at = Some(Utc::now() - chrono::Duration::hours(1));
        auth.establish_trust(trust).unwrap();

        let decision = auth.authorize(&request("service.list", "admin"));
        assert!(!decision.allowed);
        assert!(decision.reason.contains("expired"));
    }

    #[test]
    fn access_level_demotes_teacher_to_student() {
        let auth = authorizer();
        auth.establish_trust(RealmTrust::new("realm-b", TrustLevel::Access))
            .unwrap();

        // student can access but not register
        let decision = auth.authorize(&request("service.access", "teacher"));
        assert!(decision.allowed);
        assert_eq!(decision.role, "student");
    }

    #[test]
    fn allow_list_restricts_even_high_trust() {
        let auth = authorizer();
        let mut trust = RealmTrust::new("realm-b", TrustLevel::Full);
        trust.permissions = vec!["service:list".into()];
        auth.establish_trust(trust).unwrap();

        let denied = auth.authorize(&request("service.access", "admin"));
        assert!(!denied.allowed);
        assert!(denied.reason.contains("grant list"));

        let allowed = auth.authorize(&request("service.list", "admin"));
        assert!(allowed.allowed);
    }

    #[test]
    fn wildcard_in_allow_list_passes_everything() {
        let auth = authorizer();
        let mut trust = RealmTrust::new("realm-b", TrustLevel::Full);
        trust.permissions = vec!["*".into()];
        auth.establish_trust(trust).unwrap();

        let decision = auth.authorize(&request("service.access", "admin"));
        assert!(decision.allowed);
    }

    #[test]
    fn decision_carries_trust_expiry() {
        let auth = authorizer();
        let expires = Utc::now() + chrono::Duration::hours(6);
        let mut trust = RealmTrust::new("realm-b", TrustLevel::Full);
        trust.expires_at = Some(expires);
        auth.establish_trust(trust).unwrap();

        let decision = auth.authorize(&request("service.access", "student"));
        assert_eq!(decision.expires_at, Some(expires));
    }
}
