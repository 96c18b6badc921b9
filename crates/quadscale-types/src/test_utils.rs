//! test utilities for creating claims and policy contexts.
//!
//! this module provides builder patterns for creating test instances
//! of quadscale types without needing to specify all fields.

use crate::{Claims, PolicyContext};

/// builder for creating test [`Claims`] instances.
///
/// # example
/// ```
/// use quadscale_types::test_utils::TestClaimsBuilder;
///
/// let claims = TestClaimsBuilder::new("alice")
///     .with_role("student")
///     .with_zone("lab")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct TestClaimsBuilder {
    subject: String,
    role: Option<String>,
    zone: Option<String>,
    zones: Vec<String>,
}

impl TestClaimsBuilder {
    /// create a new builder for the given subject.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            role: None,
            zone: None,
            zones: vec![],
        }
    }

    /// set the asserted role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// set the zone the subject authenticated from.
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// add a zone entitlement.
    pub fn holding_zone(mut self, zone: impl Into<String>) -> Self {
        self.zones.push(zone.into());
        self
    }

    /// build the claims.
    pub fn build(self) -> Claims {
        Claims {
            subject: self.subject,
            role: self.role,
            zone: self.zone,
            zones: self.zones,
        }
    }
}

/// build a policy context for an action on a resource.
///
/// fills only the fields every evaluation needs; callers set the rest.
pub fn test_context(
    subject: &str,
    action: &str,
    resource: &str,
) -> PolicyContext {
    PolicyContext {
        subject: subject.to_string(),
        action: action.to_string(),
        resource: resource.to_string(),
        ..Default::default()
    }
}
