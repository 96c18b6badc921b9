//! periodic health sweep over registered realms.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use quadscale_federation::{FederationClient, Transport};
use quadscale_proto::SyncRequest;

use crate::registry::{AlertLevel, GlobalAdmin, RealmStatus};

/// aggregate cluster statistics over the registry's current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederationStats {
    /// registered realms.
    pub total_realms: usize,
    /// realms currently online.
    pub online_realms: usize,
    /// realms reachable but reporting unhealthy.
    pub degraded_realms: usize,
    /// realms that did not answer the last probe.
    pub unreachable_realms: usize,
    /// cached service rows.
    pub total_services: usize,
    /// cached service rows reporting healthy.
    pub healthy_services: usize,
    /// alerts ever fired.
    pub total_alerts: usize,
    /// alerts still unacknowledged.
    pub unacked_alerts: usize,
    /// when the aggregate was computed.
    pub generated_at: DateTime<Utc>,
}

struct MonitorTask {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// pings every registered realm on an interval and keeps the registry's
/// status columns fresh.
///
/// clients are pooled per realm and dropped on probe failure so the
/// next tick reconnects from scratch. a realm entering unreachable
/// fires exactly one alert; further failed ticks stay silent until the
/// realm recovers.
pub struct RealmMonitor {
    admin: Arc<GlobalAdmin>,
    transport: Arc<dyn Transport>,
    local_realm: String,
    interval: Duration,
    clients: Mutex<HashMap<String, FederationClient>>,
    task: Mutex<Option<MonitorTask>>,
}

impl RealmMonitor {
    /// create a monitor over the given registry.
    pub fn new(
        admin: Arc<GlobalAdmin>,
        transport: Arc<dyn Transport>,
        local_realm: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            admin,
            transport,
            local_realm: local_realm.into(),
            interval,
            clients: Mutex::new(HashMap::new()),
            task: Mutex::new(None),
        }
    }

    /// probe every registered realm once, concurrently.
    pub async fn check_all_realms(&self) {
        let realms = self.admin.list_realms();
        let mut probes = JoinSet::new();
        for realm in realms {
            let client = self.client_for(&realm.id, &realm.endpoint);
            probes.spawn(async move { (realm.id, client.ping().await) });
        }

        while let Some(joined) = probes.join_next().await {
            let Ok((realm_id, outcome)) = joined else {
                continue;
            };
            match outcome {
                Ok(pong) => {
                    debug!(realm = %realm_id, healthy = pong.healthy, "realm probe ok");
                    let _ = self.admin.mark_reachable(
                        &realm_id,
                        pong.healthy,
                        pong.service_count,
                        pong.peer_count,
                    );
                }
                Err(e) => {
                    self.drop_client(&realm_id);
                    // alert only on the first transition into unreachable
                    if let Ok(previous) = self.admin.mark_unreachable(&realm_id) {
                        if previous != RealmStatus::Unreachable {
                            self.admin.fire_alert(
                                realm_id.clone(),
                                AlertLevel::Error,
                                format!("realm unreachable: {}", e),
                            );
                        } else {
                            debug!(realm = %realm_id, "realm still unreachable");
                        }
                    }
                }
            }
        }
    }

    /// pull service catalogs from every realm not marked unreachable.
    ///
    /// returns the number of realms that answered.
    pub async fn sync_all_realms(&self) -> usize {
        let realms: Vec<_> = self
            .admin
            .list_realms()
            .into_iter()
            .filter(|r| r.status != RealmStatus::Unreachable)
            .collect();

        let mut pulls = JoinSet::new();
        for realm in realms {
            let client = self.client_for(&realm.id, &realm.endpoint);
            let request = SyncRequest {
                realm_id: self.local_realm.clone(),
                services: Vec::new(),
            };
            pulls.spawn(async move { (realm.id, client.sync(&request).await) });
        }

        let mut synced = 0usize;
        while let Some(joined) = pulls.join_next().await {
            let Ok((realm_id, outcome)) = joined else {
                continue;
            };
            match outcome {
                Ok(response) => {
                    self.admin.upsert_services(&realm_id, response.services);
                    synced += 1;
                }
                Err(e) => {
                    warn!(realm = %realm_id, error = %e, "catalog pull failed");
                }
            }
        }
        synced
    }

    /// one monitor tick: probe every realm, then pull catalogs from the
    /// ones still reachable.
    pub async fn tick(&self) {
        self.check_all_realms().await;
        self.sync_all_realms().await;
    }

    /// aggregate the registry's current state.
    ///
    /// purely a read: no probing, no status changes, no alerts. the
    /// ticker loop keeps the underlying state fresh.
    pub fn stats(&self) -> FederationStats {
        let realms = self.admin.list_realms();
        let services = self.admin.list_services();
        FederationStats {
            total_realms: realms.len(),
            online_realms: realms
                .iter()
                .filter(|r| r.status == RealmStatus::Online)
                .count(),
            degraded_realms: realms
                .iter()
                .filter(|r| r.status == RealmStatus::Degraded)
                .count(),
            unreachable_realms: realms
                .iter()
                .filter(|r| r.status == RealmStatus::Unreachable)
                .count(),
            total_services: services.len(),
            healthy_services: services.iter().filter(|s| s.healthy).count(),
            total_alerts: self.admin.list_alerts().len(),
            unacked_alerts: self.admin.unacked_alerts().len(),
            generated_at: Utc::now(),
        }
    }

    /// spawn the background sweep loop.
    ///
    /// idempotent; a second call while running is a no-op.
    pub fn start(self: &Arc<Self>) {
        let mut task = self.task.lock().expect("task lock poisoned");
        if task.is_some() {
            return;
        }

        let (cancel, mut cancelled) = watch::channel(false);
        let monitor = Arc::clone(self);
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "realm monitor started");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        monitor.tick().await;
                    }
                    _ = cancelled.changed() => {
                        info!("realm monitor stopped");
                        break;
                    }
                }
            }
        });
        *task = Some(MonitorTask { cancel, handle });
    }

    /// cancel the sweep loop and wait for it to finish.
    pub async fn stop(&self) {
        let task = {
            let mut slot = self.task.lock().expect("task lock poisoned");
            slot.take()
        };
        if let Some(task) = task {
            let _ = task.cancel.send(true);
            let _ = task.handle.await;
        }
    }

    fn client_for(&self, realm_id: &str, endpoint: &str) -> FederationClient {
        let mut clients = self.clients.lock().expect("client lock poisoned");
        clients
            .entry(realm_id.to_string())
            .or_insert_with(|| FederationClient::new(Arc::clone(&self.transport), endpoint))
            .clone()
    }

    fn drop_client(&self, realm_id: &str) {
        let mut clients = self.clients.lock().expect("client lock poisoned");
        clients.remove(realm_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use quadscale_federation::EventBus;
    use quadscale_proto::{
        JoinRequest, JoinResponse, LeaveRequest, LeaveResponse, PingResponse, ResolveRequest,
        ResolveResponse, ServiceSummary, SyncResponse, TrustExchangeRequest, TrustExchangeResponse,
    };
    use quadscale_types::Error;

    /// transport whose ping/sync outcomes are driven by a mutable table
    /// keyed on endpoint; endpoints without an entry are unreachable.
    #[derive(Default)]
    struct ScriptedTransport {
        healthy: Mutex<HashMap<String, bool>>,
        catalogs: Mutex<HashMap<String, Vec<ServiceSummary>>>,
    }

    impl ScriptedTransport {
        fn set_up(&self, endpoint: &str, healthy: bool) {
            self.healthy
                .lock()
                .unwrap()
                .insert(endpoint.to_string(), healthy);
        }

        fn set_down(&self, endpoint: &str) {
            self.healthy.lock().unwrap().remove(endpoint);
        }

        fn set_catalog(&self, endpoint: &str, services: Vec<ServiceSummary>) {
            self.catalogs
                .lock()
                .unwrap()
                .insert(endpoint.to_string(), services);
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn join(
            &self,
            endpoint: &str,
            _: &JoinRequest,
        ) -> quadscale_types::Result<JoinResponse> {
            Err(Error::unreachable(endpoint.to_string()))
        }

        async fn leave(
            &self,
            endpoint: &str,
            _: &LeaveRequest,
        ) -> quadscale_types::Result<LeaveResponse> {
            Err(Error::unreachable(endpoint.to_string()))
        }

        async fn sync(
            &self,
            endpoint: &str,
            _: &SyncRequest,
        ) -> quadscale_types::Result<SyncResponse> {
            self.catalogs
                .lock()
                .unwrap()
                .get(endpoint)
                .cloned()
                .map(|services| SyncResponse { services })
                .ok_or_else(|| Error::unreachable(endpoint.to_string()))
        }

        async fn resolve(
            &self,
            endpoint: &str,
            _: &ResolveRequest,
        ) -> quadscale_types::Result<ResolveResponse> {
            Err(Error::unreachable(endpoint.to_string()))
        }

        async fn exchange_trust(
            &self,
            endpoint: &str,
            _: &TrustExchangeRequest,
        ) -> quadscale_types::Result<TrustExchangeResponse> {
            Err(Error::unreachable(endpoint.to_string()))
        }

        async fn ping(&self, endpoint: &str) -> quadscale_types::Result<PingResponse> {
            match self.healthy.lock().unwrap().get(endpoint) {
                Some(&healthy) => Ok(PingResponse {
                    realm_id: endpoint.to_string(),
                    healthy,
                    service_count: 2,
                    peer_count: 1,
                    timestamp: Utc::now(),
                }),
                None => Err(Error::unreachable(endpoint.to_string())),
            }
        }
    }

    fn setup() -> (Arc<GlobalAdmin>, Arc<ScriptedTransport>, Arc<RealmMonitor>) {
        let admin = Arc::new(GlobalAdmin::new(EventBus::new()));
        let transport = Arc::new(ScriptedTransport::default());
        let monitor = Arc::new(RealmMonitor::new(
            admin.clone(),
            transport.clone(),
            "admin-realm",
            Duration::from_secs(30),
        ));
        (admin, transport, monitor)
    }

    fn summary(realm: &str, name: &str) -> ServiceSummary {
        ServiceSummary {
            realm: realm.to_string(),
            name: name.to_string(),
            endpoint: format!("http://{}/{}", realm, name),
            zones: vec![],
            public: true,
            healthy: true,
            version: "1".to_string(),
        }
    }

    #[tokio::test]
    async fn successful_probe_refreshes_status_and_counts() {
        let (admin, transport, monitor) = setup();
        admin.register_realm("realm-a", "A", "http://a").unwrap();
        transport.set_up("http://a", true);

        monitor.check_all_realms().await;

        let realm = admin.get_realm("realm-a").unwrap();
        assert_eq!(realm.status, RealmStatus::Online);
        assert_eq!(realm.service_count, 2);
        assert_eq!(realm.peer_count, 1);
    }

    #[tokio::test]
    async fn unhealthy_probe_marks_degraded_without_alert() {
        let (admin, transport, monitor) = setup();
        admin.register_realm("realm-a", "A", "http://a").unwrap();
        transport.set_up("http://a", false);

        monitor.check_all_realms().await;

        assert_eq!(
            admin.get_realm("realm-a").unwrap().status,
            RealmStatus::Degraded
        );
        assert!(admin.list_alerts().is_empty());
    }

    #[tokio::test]
    async fn alert_fires_once_per_unreachable_episode() {
        let (admin, transport, monitor) = setup();
        admin.register_realm("realm-a", "A", "http://a").unwrap();

        // two failed sweeps fire a single alert
        monitor.check_all_realms().await;
        monitor.check_all_realms().await;
        assert_eq!(admin.list_alerts().len(), 1);

        // recovery then failure starts a new episode
        transport.set_up("http://a", true);
        monitor.check_all_realms().await;
        assert_eq!(
            admin.get_realm("realm-a").unwrap().status,
            RealmStatus::Online
        );
        transport.set_down("http://a");
        monitor.check_all_realms().await;
        assert_eq!(admin.list_alerts().len(), 2);
    }

    #[tokio::test]
    async fn sync_skips_unreachable_realms() {
        let (admin, transport, monitor) = setup();
        admin.register_realm("realm-a", "A", "http://a").unwrap();
        admin.register_realm("realm-b", "B", "http://b").unwrap();
        transport.set_up("http://a", true);
        transport.set_catalog("http://a", vec![summary("realm-a", "svc-1")]);
        transport.set_catalog("http://b", vec![summary("realm-b", "svc-2")]);

        // realm-b goes unreachable in the sweep
        monitor.check_all_realms().await;
        assert_eq!(
            admin.get_realm("realm-b").unwrap().status,
            RealmStatus::Unreachable
        );

        let synced = monitor.sync_all_realms().await;
        assert_eq!(synced, 1);
        let realms: Vec<String> = admin.list_services().into_iter().map(|s| s.realm).collect();
        assert_eq!(realms, vec!["realm-a"]);
    }

    #[test]
    fn registered_realm_counts_as_online_before_any_probe() {
        let (admin, _transport, monitor) = setup();
        admin.register_realm("realm-a", "A", "http://a").unwrap();

        let stats = monitor.stats();
        assert_eq!(stats.total_realms, 1);
        assert_eq!(stats.online_realms, 1);
        assert_eq!(stats.unreachable_realms, 0);
    }

    #[test]
    fn stats_is_a_pure_read() {
        // registering a realm and firing one warning alert must show up
        // as one online realm and one active alert; computing the
        // aggregate changes nothing and fires nothing
        let (admin, _transport, monitor) = setup();
        admin.register_realm("realm-a", "A", "http://a").unwrap();
        admin.fire_alert("realm-a", AlertLevel::Warning, "disk filling up");
        admin.upsert_services("realm-a", vec![summary("realm-a", "svc-1")]);

        let stats = monitor.stats();
        assert_eq!(stats.total_realms, 1);
        assert_eq!(stats.online_realms, 1);
        assert_eq!(stats.total_services, 1);
        assert_eq!(stats.healthy_services, 1);
        assert_eq!(stats.total_alerts, 1);
        assert_eq!(stats.unacked_alerts, 1);

        // no probe happened, so the realm is untouched and no second
        // alert appeared
        assert_eq!(
            admin.get_realm("realm-a").unwrap().status,
            RealmStatus::Online
        );
        let again = monitor.stats();
        assert_eq!(again.total_alerts, 1);
    }

    #[tokio::test]
    async fn stats_reflects_the_last_sweep() {
        let (admin, transport, monitor) = setup();
        admin.register_realm("realm-a", "A", "http://a").unwrap();
        admin.register_realm("realm-b", "B", "http://b").unwrap();
        admin.register_realm("realm-c", "C", "http://c").unwrap();
        transport.set_up("http://a", true);
        transport.set_up("http://b", false);

        monitor.check_all_realms().await;

        let stats = monitor.stats();
        assert_eq!(stats.total_realms, 3);
        assert_eq!(stats.online_realms, 1);
        assert_eq!(stats.degraded_realms, 1);
        assert_eq!(stats.unreachable_realms, 1);
        assert_eq!(stats.total_alerts, 1);
        assert_eq!(stats.unacked_alerts, 1);
    }

    #[tokio::test]
    async fn unhealthy_catalog_rows_are_counted_separately() {
        let (admin, _transport, monitor) = setup();
        let mut sick = summary("realm-a", "svc-sick");
        sick.healthy = false;
        admin.upsert_services(
            "realm-a",
            vec![summary("realm-a", "svc-ok"), sick],
        );

        let stats = monitor.stats();
        assert_eq!(stats.total_services, 2);
        assert_eq!(stats.healthy_services, 1);
    }

    #[tokio::test]
    async fn tick_probes_and_pulls_catalogs() {
        let (admin, transport, monitor) = setup();
        admin.register_realm("realm-a", "A", "http://a").unwrap();
        transport.set_up("http://a", true);
        transport.set_catalog("http://a", vec![summary("realm-a", "svc-1")]);

        monitor.tick().await;

        // one tick both refreshed the realm and populated the cache
        assert_eq!(
            admin.get_realm("realm-a").unwrap().status,
            RealmStatus::Online
        );
        assert_eq!(monitor.stats().total_services, 1);
    }

    #[tokio::test]
    async fn start_is_idempotent_and_stop_joins_the_task() {
        let (_admin, _transport, monitor) = setup();
        monitor.start();
        monitor.start();
        monitor.stop().await;
        // stopping again is harmless
        monitor.stop().await;
    }
}
