//! permission tags with wildcard grant semantics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// an opaque capability tag.
///
/// permissions are `"namespace:action"` strings (e.g. `"service:register"`),
/// the universal wildcard `"*"`, or a namespace wildcard `"namespace:*"`.
/// immutable once defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    /// the universal wildcard permission.
    pub fn wildcard() -> Self {
        Self("*".to_string())
    }

    /// create a permission from a tag string.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// the raw tag string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// true if this is the universal wildcard `"*"`.
    pub fn is_wildcard(&self) -> bool {
        self.0 == "*"
    }

    /// the namespace part of `"namespace:action"`, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.0.split_once(':').map(|(ns, _)| ns)
    }

    /// whether holding this permission grants `requested`.
    ///
    /// a permission grants a request if it is equal, is the universal
    /// wildcard, or is a namespace wildcard `"ns:*"` whose namespace
    /// matches the request's namespace.
    pub fn grants(&self, requested: &Permission) -> bool {
        if self.is_wildcard() || self.0 == requested.0 {
            return true;
        }
        match self.0.split_once(':') {
            Some((ns, "*")) => requested.namespace() == Some(ns),
            _ => false,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Permission {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_grants() {
        let p = Permission::new("service:register");
        assert!(p.grants(&Permission::new("service:register")));
        assert!(!p.grants(&Permission::new("service:access")));
    }

    #[test]
    fn universal_wildcard_grants_everything() {
        let p = Permission::wildcard();
        assert!(p.grants(&Permission::new("service:register")));
        assert!(p.grants(&Permission::new("realm:admin")));
        assert!(p.grants(&Permission::wildcard()));
    }

    #[test]
    fn namespace_wildcard_grants_within_namespace() {
        let p = Permission::new("service:*");
        assert!(p.grants(&Permission::new("service:register")));
        assert!(p.grants(&Permission::new("service:access")));
        assert!(!p.grants(&Permission::new("realm:admin")));
    }

    #[test]
    fn namespace_wildcard_does_not_grant_bare_tag() {
        // a request without a namespace has nothing to match "service:*"
        let p = Permission::new("service:*");
        assert!(!p.grants(&Permission::new("service")));
    }
}
