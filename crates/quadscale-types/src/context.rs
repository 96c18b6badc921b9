//! the request/response pair for one authorization evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::permission::Permission;

/// everything the policy engine needs to evaluate one request.
///
/// ephemeral - built per request, never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyContext {
    /// subject making the request.
    pub subject: String,
    /// role asserted for the subject, if already resolved.
    #[serde(default)]
    pub role: Option<String>,
    /// wifi ssid the subject connected through, if known.
    #[serde(default)]
    pub ssid: Option<String>,
    /// network zone of the subject.
    #[serde(default)]
    pub zone: Option<String>,
    /// verb being attempted (e.g. "access", "register").
    pub action: String,
    /// resource the action targets.
    pub resource: String,
    /// realm the request originated from, for cross-realm calls.
    #[serde(default)]
    pub source_realm: Option<String>,
}

/// the outcome of one authorization evaluation.
///
/// denial is expressed here, never as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// whether the request is allowed.
    pub allowed: bool,
    /// the role the decision was made for.
    pub role: String,
    /// the full effective permission set of that role.
    pub permissions: Vec<Permission>,
    /// human-readable explanation, for allow and deny alike.
    pub reason: String,
    /// when the underlying grant expires, if it does.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PolicyDecision {
    /// a denial with the given role and reason.
    pub fn deny(role: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            role: role.into(),
            permissions: Vec::new(),
            reason: reason.into(),
            expires_at: None,
        }
    }

    /// an allowance with the given role and reason.
    pub fn allow(role: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            role: role.into(),
            permissions: Vec::new(),
            reason: reason.into(),
            expires_at: None,
        }
    }
}
