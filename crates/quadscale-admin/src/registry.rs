//! the cluster-wide registry: realms, cached services, alerts, policies.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use quadscale_federation::{Event, EventBus};
use quadscale_proto::ServiceSummary;
use quadscale_types::{Error, Result};

/// health of a registered realm, as last observed by the monitor.
///
/// a freshly registered realm starts online; the monitor downgrades it
/// when probes say otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RealmStatus {
    /// administratively taken out of rotation.
    Offline,
    /// reachable and reporting healthy.
    #[default]
    Online,
    /// last probe succeeded but the realm reported unhealthy.
    Degraded,
    /// last probe failed.
    Unreachable,
}

/// a realm registered with the global admin.
///
/// registration is explicit; only the monitor mutates status and the
/// observed counts afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealmInfo {
    /// realm identifier.
    pub id: String,
    /// human-readable name.
    pub name: String,
    /// federation endpoint of the realm.
    pub endpoint: String,
    /// last observed health.
    pub status: RealmStatus,
    /// services the realm reported at the last successful probe.
    pub service_count: usize,
    /// peers the realm reported at the last successful probe.
    pub peer_count: usize,
    /// last successful contact.
    pub last_seen: Option<DateTime<Utc>>,
    /// when the realm was registered.
    pub joined_at: DateTime<Utc>,
}

/// severity of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// informational.
    Info,
    /// something worth looking at.
    Warning,
    /// something broken.
    Error,
    /// something broken that needs attention now.
    Critical,
}

/// an alert raised against a realm.
///
/// alerts are append-only; acknowledging records who and when, nothing
/// is ever deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// alert identifier.
    pub id: String,
    /// the realm the alert concerns.
    pub realm: String,
    /// severity.
    pub level: AlertLevel,
    /// what happened.
    pub message: String,
    /// when the alert fired.
    pub created_at: DateTime<Utc>,
    /// when the alert was acknowledged, if it was.
    pub acked_at: Option<DateTime<Utc>>,
    /// who acknowledged it.
    pub acked_by: Option<String>,
}

/// a cached row of a remote realm's service catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// realm that owns the service.
    pub realm: String,
    /// service name.
    pub name: String,
    /// service endpoint.
    pub endpoint: String,
    /// zones the service is restricted to.
    pub zones: Vec<String>,
    /// whether the service is visible from everywhere.
    pub public: bool,
    /// health the owning realm reported.
    pub healthy: bool,
    /// service version string.
    pub version: String,
    /// when this row was last refreshed.
    pub updated_at: DateTime<Utc>,
}

impl ServiceInfo {
    fn from_summary(summary: ServiceSummary) -> Self {
        Self {
            realm: summary.realm,
            name: summary.name,
            endpoint: summary.endpoint,
            zones: summary.zones,
            public: summary.public,
            healthy: summary.healthy,
            version: summary.version,
            updated_at: Utc::now(),
        }
    }
}

/// a policy blob distributed to realms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributedPolicy {
    /// policy identifier.
    pub id: String,
    /// what kind of policy this is (opaque to the registry).
    pub policy_type: String,
    /// realms the policy targets; empty or a `"*"` entry means all.
    pub realms: Vec<String>,
    /// the policy payload.
    pub content: serde_json::Value,
    /// whether the policy is active.
    pub enabled: bool,
    /// incremented on every update.
    pub version: u64,
    /// when the policy was first created.
    pub created_at: DateTime<Utc>,
    /// when the policy was last updated.
    pub updated_at: DateTime<Utc>,
}

impl DistributedPolicy {
    /// whether this policy targets the given realm.
    pub fn applies_to(&self, realm: &str) -> bool {
        self.realms.is_empty() || self.realms.iter().any(|r| r == "*" || r == realm)
    }
}

/// the global admin registry.
///
/// each collection sits behind its own lock so realm probes, alert
/// writes and policy reads never contend with each other.
pub struct GlobalAdmin {
    events: EventBus,
    realms: RwLock<HashMap<String, RealmInfo>>,
    services: RwLock<HashMap<String, ServiceInfo>>,
    alerts: RwLock<Vec<Alert>>,
    policies: RwLock<HashMap<String, DistributedPolicy>>,
    alert_seq: AtomicU64,
}

impl GlobalAdmin {
    /// create an empty registry publishing on the given bus.
    pub fn new(events: EventBus) -> Self {
        Self {
            events,
            realms: RwLock::new(HashMap::new()),
            services: RwLock::new(HashMap::new()),
            alerts: RwLock::new(Vec::new()),
            policies: RwLock::new(HashMap::new()),
            alert_seq: AtomicU64::new(1),
        }
    }

    /// register a realm.
    pub fn register_realm(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<RealmInfo> {
        let id = id.into();
        let endpoint = endpoint.into();
        if id.is_empty() {
            return Err(Error::validation("realm id cannot be empty"));
        }
        if endpoint.is_empty() {
            return Err(Error::validation("realm endpoint cannot be empty"));
        }

        let realm = RealmInfo {
            id: id.clone(),
            name: name.into(),
            endpoint,
            status: RealmStatus::Online,
            service_count: 0,
            peer_count: 0,
            last_seen: None,
            joined_at: Utc::now(),
        };
        {
            let mut realms = self.realms.write().expect("realm lock poisoned");
            if realms.contains_key(&id) {
                return Err(Error::validation(format!(
                    "realm '{}' is already registered",
                    id
                )));
            }
            realms.insert(id.clone(), realm.clone());
        }

        info!(realm = %id, "realm registered");
        self.events.publish(Event::RealmRegistered { realm: id });
        Ok(realm)
    }

    /// unregister a realm and drop its cached services.
    pub fn unregister_realm(&self, id: &str) -> Result<()> {
        let removed = {
            let mut realms = self.realms.write().expect("realm lock poisoned");
            realms.remove(id)
        };
        if removed.is_none() {
            return Err(Error::not_found(format!("realm '{}' is not registered", id)));
        }

        {
            let mut services = self.services.write().expect("service lock poisoned");
            services.retain(|_, s| s.realm != id);
        }

        info!(realm = %id, "realm unregistered");
        self.events.publish(Event::RealmUnregistered {
            realm: id.to_string(),
        });
        Ok(())
    }

    /// one realm by id.
    pub fn get_realm(&self, id: &str) -> Option<RealmInfo> {
        let realms = self.realms.read().expect("realm lock poisoned");
        realms.get(id).cloned()
    }

    /// all registered realms, sorted by name.
    pub fn list_realms(&self) -> Vec<RealmInfo> {
        let realms = self.realms.read().expect("realm lock poisoned");
        let mut all: Vec<RealmInfo> = realms.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// record the outcome of a successful probe.
    ///
    /// returns the previous status.
    pub fn mark_reachable(
        &self,
        id: &str,
        healthy: bool,
        service_count: usize,
        peer_count: usize,
    ) -> Result<RealmStatus> {
        let mut realms = self.realms.write().expect("realm lock poisoned");
        let Some(realm) = realms.get_mut(id) else {
            return Err(Error::not_found(format!("realm '{}' is not registered", id)));
        };
        let previous = realm.status;
        realm.status = if healthy {
            RealmStatus::Online
        } else {
            RealmStatus::Degraded
        };
        realm.service_count = service_count;
        realm.peer_count = peer_count;
        realm.last_seen = Some(Utc::now());
        Ok(previous)
    }

    /// record a failed probe.
    ///
    /// returns the previous status so callers can deduplicate alerts on
    /// the first transition into unreachable.
    pub fn mark_unreachable(&self, id: &str) -> Result<RealmStatus> {
        let mut realms = self.realms.write().expect("realm lock poisoned");
        let Some(realm) = realms.get_mut(id) else {
            return Err(Error::not_found(format!("realm '{}' is not registered", id)));
        };
        let previous = realm.status;
        realm.status = RealmStatus::Unreachable;
        Ok(previous)
    }

    /// replace the cached catalog rows for a realm.
    pub fn upsert_services(&self, realm: &str, services: Vec<ServiceSummary>) {
        let mut cache = self.services.write().expect("service lock poisoned");
        cache.retain(|_, s| s.realm != realm);
        for summary in services {
            let info = ServiceInfo::from_summary(summary);
            cache.insert(format!("{}/{}", info.realm, info.name), info);
        }
    }

    /// all cached services, sorted by realm then name.
    pub fn list_services(&self) -> Vec<ServiceInfo> {
        let cache = self.services.read().expect("service lock poisoned");
        let mut all: Vec<ServiceInfo> = cache.values().cloned().collect();
        all.sort_by(|a, b| a.realm.cmp(&b.realm).then_with(|| a.name.cmp(&b.name)));
        all
    }

    /// raise an alert against a realm.
    pub fn fire_alert(
        &self,
        realm: impl Into<String>,
        level: AlertLevel,
        message: impl Into<String>,
    ) -> Alert {
        let realm = realm.into();
        let message = message.into();
        let alert = Alert {
            id: format!("alert-{}", self.alert_seq.fetch_add(1, Ordering::Relaxed)),
            realm: realm.clone(),
            level,
            message: message.clone(),
            created_at: Utc::now(),
            acked_at: None,
            acked_by: None,
        };
        {
            let mut alerts = self.alerts.write().expect("alert lock poisoned");
            alerts.push(alert.clone());
        }

        warn!(realm = %realm, ?level, %message, "alert fired");
        self.events.publish(Event::AlertFired { realm, message });
        alert
    }

    /// acknowledge an alert.
    pub fn ack_alert(&self, id: &str, acked_by: impl Into<String>) -> Result<Alert> {
        let mut alerts = self.alerts.write().expect("alert lock poisoned");
        let Some(alert) = alerts.iter_mut().find(|a| a.id == id) else {
            return Err(Error::not_found(format!("no alert '{}'", id)));
        };
        alert.acked_at = Some(Utc::now());
        alert.acked_by = Some(acked_by.into());
        Ok(alert.clone())
    }

    /// all alerts, newest first.
    pub fn list_alerts(&self) -> Vec<Alert> {
        let alerts = self.alerts.read().expect("alert lock poisoned");
        let mut all = alerts.clone();
        all.reverse();
        all
    }

    /// alerts that have not been acknowledged, newest first.
    pub fn unacked_alerts(&self) -> Vec<Alert> {
        self.list_alerts()
            .into_iter()
            .filter(|a| a.acked_at.is_none())
            .collect()
    }

    /// create or update a policy.
    ///
    /// updating bumps the version and preserves the original creation
    /// time.
    pub fn set_policy(
        &self,
        id: impl Into<String>,
        policy_type: impl Into<String>,
        realms: Vec<String>,
        content: serde_json::Value,
        enabled: bool,
    ) -> Result<DistributedPolicy> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::validation("policy id cannot be empty"));
        }

        let now = Utc::now();
        let mut policies = self.policies.write().expect("policy lock poisoned");
        let policy = match policies.get(&id) {
            Some(existing) => DistributedPolicy {
                id: id.clone(),
                policy_type: policy_type.into(),
                realms,
                content,
                enabled,
                version: existing.version + 1,
                created_at: existing.created_at,
                updated_at: now,
            },
            None => DistributedPolicy {
                id: id.clone(),
                policy_type: policy_type.into(),
                realms,
                content,
                enabled,
                version: 1,
                created_at: now,
                updated_at: now,
            },
        };
        policies.insert(id, policy.clone());
        Ok(policy)
    }

    /// one policy by id.
    pub fn get_policy(&self, id: &str) -> Option<DistributedPolicy> {
        let policies = self.policies.read().expect("policy lock poisoned");
        policies.get(id).cloned()
    }

    /// delete a policy.
    pub fn delete_policy(&self, id: &str) -> Result<()> {
        let mut policies = self.policies.write().expect("policy lock poisoned");
        if policies.remove(id).is_none() {
            return Err(Error::not_found(format!("no policy '{}'", id)));
        }
        Ok(())
    }

    /// all policies, sorted by id.
    pub fn list_policies(&self) -> Vec<DistributedPolicy> {
        let policies = self.policies.read().expect("policy lock poisoned");
        let mut all: Vec<DistributedPolicy> = policies.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// policies that target the given realm, sorted by id.
    pub fn policies_for_realm(&self, realm: &str) -> Vec<DistributedPolicy> {
        self.list_policies()
            .into_iter()
            .filter(|p| p.enabled && p.applies_to(realm))
            .collect()
    }
}
