//! external collaborator seams: token verification and key-value persistence.
//!
//! the core treats both as narrow interfaces. production deployments
//! plug in a real identity provider and store; the in-memory
//! implementations here back tests and single-node setups.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::claims::Claims;
use crate::error::Error;
use crate::Result;

/// verifies an opaque token and returns the claims it carries.
pub trait TokenVerifier: Send + Sync {
    /// verify `token`, returning its claims or a validation error.
    fn verify(&self, token: &str) -> Result<Claims>;
}

/// fail-fast key-value persistence with optional ttl.
///
/// used for trust tokens and realm/service persistence. the core never
/// depends on the store's internal engine.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// fetch the value for `key`, if present and unexpired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// store `value` under `key`, optionally expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// remove `key` if present.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// in-memory [`KvStore`] with lazy ttl expiry.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, (String, Option<DateTime<Utc>>)>>,
}

impl MemoryStore {
    /// create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().expect("store lock poisoned");
        Ok(entries.get(key).and_then(|(value, expires)| {
            match expires {
                Some(at) if *at <= Utc::now() => None,
                _ => Some(value.clone()),
            }
        }))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let expires = ttl.and_then(|d| {
            chrono::Duration::from_std(d)
                .ok()
                .map(|d| Utc::now() + d)
        });
        let mut entries = self.entries.write().expect("store lock poisoned");
        entries.insert(key.to_string(), (value.to_string(), expires));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().expect("store lock poisoned");
        entries.remove(key);
        Ok(())
    }
}

/// [`TokenVerifier`] backed by a fixed token table.
///
/// intended for tests and local development.
#[derive(Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Claims>,
}

impl StaticTokenVerifier {
    /// create an empty verifier (rejects every token).
    pub fn new() -> Self {
        Self::default()
    }

    /// register a token with the claims it should yield.
    pub fn with_token(mut self, token: impl Into<String>, claims: Claims) -> Self {
        self.tokens.insert(token.into(), claims);
        self
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Result<Claims> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| Error::validation("unknown token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_set_get_delete() {
        let store = MemoryStore::new();
        store.set("k", "v", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_ttl_expires() {
        let store = MemoryStore::new();
        store
            .set("k", "v", Some(Duration::from_millis(10)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[test]
    fn static_verifier_rejects_unknown_token() {
        let verifier = StaticTokenVerifier::new();
        assert!(verifier.verify("nope").is_err());
    }

    #[test]
    fn static_verifier_returns_registered_claims() {
        let claims = Claims::new("alice");
        let verifier = StaticTokenVerifier::new().with_token("tok-alice", claims.clone());
        assert_eq!(verifier.verify("tok-alice").unwrap(), claims);
    }
}
