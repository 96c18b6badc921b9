//! quadscale library - http handlers and application setup.
//!
//! this crate wires the realm's engines together and exposes them over
//! http:
//! - [`handlers`]: request handlers for federation, admin and decision endpoints
//! - [`cli`]: command-line interface implementation

#![warn(missing_docs)]

pub mod cli;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{delete, get, post},
    Router,
};

use quadscale_admin::{GlobalAdmin, RealmMonitor};
use quadscale_federation::{EventBus, FederationServer, RealmIdentity, Transport};
use quadscale_rbac::RbacEngine;
use quadscale_trust::TrustAuthorizer;
use quadscale_types::{Config, KvStore, TokenVerifier};
use quadscale_zones::ZoneManager;

/// shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// server configuration.
    pub config: Config,
    /// role and permission engine.
    pub rbac: Arc<RbacEngine>,
    /// cross-realm trust authorizer.
    pub trust: Arc<TrustAuthorizer>,
    /// zone registry and access gate.
    pub zones: Arc<ZoneManager>,
    /// federation peer server.
    pub federation: Arc<FederationServer>,
    /// cluster-wide registry.
    pub admin: Arc<GlobalAdmin>,
    /// realm health monitor.
    pub monitor: Arc<RealmMonitor>,
    /// token verification seam.
    pub verifier: Arc<dyn TokenVerifier>,
    /// broadcast bus for cluster events.
    pub events: EventBus,
}

impl AppState {
    /// build the full engine stack for one realm.
    pub fn new(
        config: Config,
        verifier: Arc<dyn TokenVerifier>,
        store: Arc<dyn KvStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let events = EventBus::new();
        let rbac = Arc::new(RbacEngine::new(config.default_role.clone()));
        let trust = Arc::new(TrustAuthorizer::new(
            config.realm_id.clone(),
            Arc::clone(&rbac),
        ));
        let zones = Arc::new(ZoneManager::new());
        let federation = Arc::new(FederationServer::new(
            RealmIdentity {
                id: config.realm_id.clone(),
                name: config.realm_name.clone(),
                endpoint: config.endpoint.clone(),
            },
            Arc::clone(&transport),
            store,
            events.clone(),
        ));
        let admin = Arc::new(GlobalAdmin::new(events.clone()));
        let monitor = Arc::new(RealmMonitor::new(
            Arc::clone(&admin),
            transport,
            config.realm_id.clone(),
            Duration::from_secs(config.monitor.interval_secs),
        ));

        Self {
            config,
            rbac,
            trust,
            zones,
            federation,
            admin,
            monitor,
            verifier,
            events,
        }
    }
}

/// create the axum application with all routes.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        .route("/federation/join", post(handlers::federation::join))
        .route("/federation/leave", post(handlers::federation::leave))
        .route("/federation/sync", post(handlers::federation::sync))
        .route("/federation/resolve", post(handlers::federation::resolve))
        .route("/federation/trust", post(handlers::federation::trust))
        .route("/federation/ping", get(handlers::federation::ping))
        .route(
            "/services",
            get(handlers::federation::list_local_services)
                .post(handlers::federation::register_service),
        )
        .route(
            "/services/{name}",
            delete(handlers::federation::unregister_service),
        )
        .route(
            "/admin/realms",
            get(handlers::admin::list_realms).post(handlers::admin::register_realm),
        )
        .route(
            "/admin/realms/{id}",
            delete(handlers::admin::unregister_realm),
        )
        .route("/admin/services", get(handlers::admin::list_services))
        .route("/admin/alerts", get(handlers::admin::list_alerts))
        .route("/admin/alerts/{id}/ack", post(handlers::admin::ack_alert))
        .route(
            "/admin/policies",
            get(handlers::admin::list_policies).put(handlers::admin::set_policy),
        )
        .route("/admin/stats", get(handlers::admin::stats))
        .route("/auth/evaluate", post(handlers::auth::evaluate))
        .route("/auth/authorize", post(handlers::auth::authorize))
        .route("/auth/zone-check", post(handlers::auth::zone_check))
        .with_state(state)
}
