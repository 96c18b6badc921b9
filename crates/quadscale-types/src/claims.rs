//! verified identity claims.

use serde::{Deserialize, Serialize};

/// claims extracted from a verified token.
///
/// populated by the token/identity provider seam ([`crate::TokenVerifier`])
/// and carried into zone checks and policy evaluation. the core never
/// inspects the token itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// subject identifier (user or service principal).
    pub subject: String,
    /// resolved role id, if the provider asserts one.
    #[serde(default)]
    pub role: Option<String>,
    /// the zone the subject authenticated from, if known.
    #[serde(default)]
    pub zone: Option<String>,
    /// zones the subject is entitled to; may contain `"*"`.
    #[serde(default)]
    pub zones: Vec<String>,
}

impl Claims {
    /// create claims for a subject with no role or zone entitlements.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Default::default()
        }
    }

    /// whether the claims entitle the subject to `zone`.
    ///
    /// the universal `"*"` entitlement covers every zone.
    pub fn holds_zone(&self, zone: &str) -> bool {
        self.zones.iter().any(|z| z == zone || z == "*")
    }
}
