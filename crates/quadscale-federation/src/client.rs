//! the federation transport and per-peer client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use quadscale_proto::{
    JoinRequest, JoinResponse, LeaveRequest, LeaveResponse, PingResponse, ResolveRequest,
    ResolveResponse, SyncRequest, SyncResponse, TrustExchangeRequest, TrustExchangeResponse,
};
use quadscale_types::{Error, Result};

/// the federation rpc surface, abstracted over the wire.
///
/// the http implementation is [`HttpTransport`]; tests swap in mocks.
/// every call carries a bounded timeout - a slow peer costs at most
/// that timeout, never more.
#[async_trait]
pub trait Transport: Send + Sync {
    /// ask the realm at `endpoint` to accept us into its federation.
    async fn join(&self, endpoint: &str, request: &JoinRequest) -> Result<JoinResponse>;

    /// tell the realm at `endpoint` we are leaving.
    async fn leave(&self, endpoint: &str, request: &LeaveRequest) -> Result<LeaveResponse>;

    /// push our catalog to `endpoint` and receive its own services.
    async fn sync(&self, endpoint: &str, request: &SyncRequest) -> Result<SyncResponse>;

    /// resolve a service name at `endpoint`.
    async fn resolve(&self, endpoint: &str, request: &ResolveRequest) -> Result<ResolveResponse>;

    /// request permissions from the realm at `endpoint`.
    async fn exchange_trust(
        &self,
        endpoint: &str,
        request: &TrustExchangeRequest,
    ) -> Result<TrustExchangeResponse>;

    /// liveness probe.
    async fn ping(&self, endpoint: &str) -> Result<PingResponse>;
}

/// json-over-http implementation of [`Transport`].
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// create a transport with the given per-call timeout.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self { client }
    }

    async fn post<Req, Resp>(&self, endpoint: &str, path: &str, request: &Req) -> Result<Resp>
    where
        Req: serde::Serialize + Sync,
        Resp: serde::de::DeserializeOwned,
    {
        let url = format!("{}/federation/{}", endpoint.trim_end_matches('/'), path);
        debug!(%url, "federation rpc");
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::unreachable(format!("{url}: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::unreachable(format!("{url}: {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| Error::unreachable(format!("{url}: invalid response: {e}")))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn join(&self, endpoint: &str, request: &JoinRequest) -> Result<JoinResponse> {
        self.post(endpoint, "join", request).await
    }

    async fn leave(&self, endpoint: &str, request: &LeaveRequest) -> Result<LeaveResponse> {
        self.post(endpoint, "leave", request).await
    }

    async fn sync(&self, endpoint: &str, request: &SyncRequest) -> Result<SyncResponse> {
        self.post(endpoint, "sync", request).await
    }

    async fn resolve(&self, endpoint: &str, request: &ResolveRequest) -> Result<ResolveResponse> {
        self.post(endpoint, "resolve", request).await
    }

    async fn exchange_trust(
        &self,
        endpoint: &str,
        request: &TrustExchangeRequest,
    ) -> Result<TrustExchangeResponse> {
        self.post(endpoint, "trust", request).await
    }

    async fn ping(&self, endpoint: &str) -> Result<PingResponse> {
        let url = format!("{}/federation/ping", endpoint.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::unreachable(format!("{url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::unreachable(format!("{url}: {}", response.status())));
        }

        response
            .json()
            .await
            .map_err(|e| Error::unreachable(format!("{url}: invalid response: {e}")))
    }
}

/// a lazily-established connection to one peer.
///
/// bundles the shared transport with the peer's endpoint. cheap to
/// clone; dropping the last handle "closes" the connection.
#[derive(Clone)]
pub struct FederationClient {
    transport: Arc<dyn Transport>,
    endpoint: String,
}

impl FederationClient {
    /// create a client for a peer endpoint.
    pub fn new(transport: Arc<dyn Transport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    /// the peer endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// probe the peer.
    pub async fn ping(&self) -> Result<PingResponse> {
        self.transport.ping(&self.endpoint).await
    }

    /// push a catalog and receive the peer's services.
    pub async fn sync(&self, request: &SyncRequest) -> Result<SyncResponse> {
        self.transport.sync(&self.endpoint, request).await
    }

    /// resolve a service at the peer.
    pub async fn resolve(&self, request: &ResolveRequest) -> Result<ResolveResponse> {
        self.transport.resolve(&self.endpoint, request).await
    }

    /// request permissions from the peer.
    pub async fn exchange_trust(
        &self,
        request: &TrustExchangeRequest,
    ) -> Result<TrustExchangeResponse> {
        self.transport.exchange_trust(&self.endpoint, request).await
    }
}
