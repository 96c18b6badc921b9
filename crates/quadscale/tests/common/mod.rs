//! shared helpers for integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use chrono::Utc;

use quadscale::{create_app, AppState};
use quadscale_federation::Transport;
use quadscale_proto::{
    JoinRequest, JoinResponse, LeaveRequest, LeaveResponse, PingResponse, ResolveRequest,
    ResolveResponse, ServiceSummary, SyncRequest, SyncResponse, TrustExchangeRequest,
    TrustExchangeResponse,
};
use quadscale_types::test_utils::TestClaimsBuilder;
use quadscale_types::{Config, Error, MemoryStore, StaticTokenVerifier};

/// token the test verifier accepts.
pub const STUDENT_TOKEN: &str = "student-token";

/// transport stub whose ping/sync outcomes are driven per endpoint;
/// endpoints without an entry are unreachable.
#[derive(Default)]
pub struct ScriptedTransport {
    healthy: Mutex<HashMap<String, bool>>,
    catalogs: Mutex<HashMap<String, Vec<ServiceSummary>>>,
}

impl ScriptedTransport {
    pub fn set_up(&self, endpoint: &str, healthy: bool) {
        self.healthy
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), healthy);
    }

    #[allow(dead_code)]
    pub fn set_catalog(&self, endpoint: &str, services: Vec<ServiceSummary>) {
        self.catalogs
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), services);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn join(&self, endpoint: &str, _: &JoinRequest) -> quadscale_types::Result<JoinResponse> {
        Err(Error::unreachable(endpoint.to_string()))
    }

    async fn leave(
        &self,
        endpoint: &str,
        _: &LeaveRequest,
    ) -> quadscale_types::Result<LeaveResponse> {
        Err(Error::unreachable(endpoint.to_string()))
    }

    async fn sync(&self, endpoint: &str, _: &SyncRequest) -> quadscale_types::Result<SyncResponse> {
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
                service_count: 1,
                peer_count: 0,
                timestamp: Utc::now(),
            }),
            None => Err(Error::unreachable(endpoint.to_string())),
        }
    }
}

/// application state over a scripted transport and a static verifier
/// that accepts [`STUDENT_TOKEN`].
pub fn test_state(transport: Arc<ScriptedTransport>) -> AppState {
    let claims = TestClaimsBuilder::new("alice")
        .with_role("student")
        .holding_zone("lab")
        .build();
    let verifier = StaticTokenVerifier::new().with_token(STUDENT_TOKEN, claims);
    AppState::new(
        Config::default(),
        Arc::new(verifier),
        Arc::new(MemoryStore::new()),
        transport,
    )
}

/// a fully-wired app with default state.
pub fn test_app() -> Router {
    create_app(test_state(Arc::new(ScriptedTransport::default())))
}

/// build a json POST request.
pub fn post_json(uri: &str, body: &impl serde::Serialize) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .expect("failed to build request")
}

/// build a GET request.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request")
}

/// deserialize a response body.
pub async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("failed to parse body")
}
