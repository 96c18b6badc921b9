//! the zone registry and access gate.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::RwLock;

use chrono::Utc;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use quadscale_types::{Claims, Error, Result};

use crate::zone::{Zone, ZoneDefinition, ZonePolicy};

/// the outcome of one zone access check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneDecision {
    /// whether access is allowed.
    pub allowed: bool,
    /// human-readable explanation.
    pub reason: String,
}

impl ZoneDecision {
    fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// registry of zones and their policies.
///
/// zones are kept in registration order so that
/// [`zone_for_ip`](Self::zone_for_ip) has a deterministic tie-break when
/// subnets overlap: first registered containing subnet wins.
pub struct ZoneManager {
    zones: RwLock<Vec<Zone>>,
    policies: RwLock<HashMap<String, ZonePolicy>>,
}

impl Default for ZoneManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneManager {
    /// create an empty manager.
    pub fn new() -> Self {
        Self {
            zones: RwLock::new(Vec::new()),
            policies: RwLock::new(HashMap::new()),
        }
    }

    /// register a zone, parsing its cidr subnet eagerly.
    ///
    /// malformed cidr fails here, not at lookup time. re-registering a
    /// zone id replaces the zone in place, keeping its position in the
    /// lookup order.
    pub fn register_zone(&self, def: ZoneDefinition) -> Result<Zone> {
        if def.id.is_empty() {
            return Err(Error::validation("zone id cannot be empty"));
        }
        let subnet = match def.subnet.as_deref() {
            Some(cidr) => Some(cidr.parse::<IpNet>().map_err(|_| {
                Error::validation(format!("invalid CIDR '{}' for zone '{}'", cidr, def.id))
            })?),
            None => None,
        };
        let zone = Zone {
            id: def.id,
            name: def.name,
            subnet,
            access_level: def.access_level,
            description: def.description,
        };

        let mut zones = self.zones.write().expect("zone lock poisoned");
        match zones.iter_mut().find(|z| z.id == zone.id) {
            Some(existing) => *existing = zone.clone(),
            None => zones.push(zone.clone()),
        }
        Ok(zone)
    }

    /// get a zone by id.
    pub fn get_zone(&self, id: &str) -> Option<Zone> {
        let zones = self.zones.read().expect("zone lock poisoned");
        zones.iter().find(|z| z.id == id).cloned()
    }

    /// list all zones in registration order.
    pub fn list_zones(&self) -> Vec<Zone> {
        let zones = self.zones.read().expect("zone lock poisoned");
        zones.clone()
    }

    /// attach (or replace) a policy for a zone.
    pub fn set_policy(&self, policy: ZonePolicy) -> Result<()> {
        if policy.zone_id.is_empty() {
            return Err(Error::validation("policy zone_id cannot be empty"));
        }
        if policy.time_restrictions.iter().any(|t| !t.is_valid()) {
            return Err(Error::validation(
                "time restriction days must be 1..=7 and non-empty",
            ));
        }
        let mut policies = self.policies.write().expect("policy lock poisoned");
        policies.insert(policy.zone_id.clone(), policy);
        Ok(())
    }

    /// get the policy for a zone, if one is set.
    pub fn get_policy(&self, zone_id: &str) -> Option<ZonePolicy> {
        let policies = self.policies.read().expect("policy lock poisoned");
        policies.get(zone_id).cloned()
    }

    /// the first registered zone whose subnet contains `ip`.
    pub fn zone_for_ip(&self, ip: IpAddr) -> Option<Zone> {
        let zones = self.zones.read().expect("zone lock poisoned");
        zones
            .iter()
            .find(|z| z.subnet.is_some_and(|net| net.contains(&ip)))
            .cloned()
    }

    /// check whether `claims` may access `target_zone` from `client_ip`.
    ///
    /// evaluation order: the zone must exist; with a policy, the deny
    /// list vetoes, the allow list overrides role and origin checks,
    /// then allowed roles, origin-zone authentication and time windows
    /// apply; without a policy the claims must already list the zone
    /// (or `"*"`). finally, a zone with `access_level > 0` requires the
    /// caller to hold that zone literally in its claims even if earlier
    /// checks passed.
    pub fn check_access(
        &self,
        claims: &Claims,
        target_zone: &str,
        client_ip: Option<IpAddr>,
    ) -> ZoneDecision {
        let Some(zone) = self.get_zone(target_zone) else {
            return ZoneDecision::deny(format!("zone '{}' does not exist", target_zone));
        };

        let decision = match self.get_policy(target_zone) {
            Some(policy) => self.check_policy(claims, &zone, &policy, client_ip),
            None => {
                if claims.holds_zone(target_zone) {
                    ZoneDecision::allow(format!("claims list zone '{}'", target_zone))
                } else {
                    ZoneDecision::deny(format!(
                        "no policy for zone '{}' and claims do not list it",
                        target_zone
                    ))
                }
            }
        };
        if !decision.allowed {
            return decision;
        }

        // elevated zones demand an explicit claim regardless of policy
        if zone.access_level > 0 && !claims.zones.iter().any(|z| z == target_zone) {
            return ZoneDecision::deny(format!(
                "zone '{}' requires explicit entitlement (access level {})",
                target_zone, zone.access_level
            ));
        }

        decision
    }

    fn check_policy(
        &self,
        claims: &Claims,
        zone: &Zone,
        policy: &ZonePolicy,
        client_ip: Option<IpAddr>,
    ) -> ZoneDecision {
        // deny list wins over everything
        if policy.denied_users.contains(&claims.subject) {
            return ZoneDecision::deny(format!(
                "user '{}' is denied in zone '{}'",
                claims.subject, zone.id
            ));
        }

        // allow list overrides role and origin checks
        if policy.allowed_users.contains(&claims.subject) {
            return ZoneDecision::allow(format!(
                "user '{}' is always allowed in zone '{}'",
                claims.subject, zone.id
            ));
        }

        if !policy.allowed_roles.is_empty() {
            let role_ok = claims
                .role
                .as_ref()
                .is_some_and(|r| policy.allowed_roles.contains(r));
            if !role_ok {
                return ZoneDecision::deny(format!(
                    "role {:?} is not allowed in zone '{}'",
                    claims.role, zone.id
                ));
            }
        }

        if policy.require_zone_auth {
            let client_zone = client_ip.and_then(|ip| self.zone_for_ip(ip));
            let origin_ok = match client_zone {
                Some(ref origin) => {
                    origin.id == zone.id || policy.allowed_from.contains(&origin.id)
                }
                None => false,
            };
            if !origin_ok {
                debug!(
                    zone = %zone.id,
                    origin = ?client_zone.map(|z| z.id),
                    "zone origin check failed"
                );
                return ZoneDecision::deny(format!(
                    "zone '{}' requires origin from an approved zone",
                    zone.id
                ));
            }
        }

        if !policy.time_restrictions.is_empty() {
            let now = Utc::now();
            if !policy.time_restrictions.iter().any(|t| t.contains(now)) {
                return ZoneDecision::deny(format!(
                    "zone '{}' is outside its access window",
                    zone.id
                ));
            }
        }

        ZoneDecision::allow(format!("policy for zone '{}' allows access", zone.id))
    }
}
