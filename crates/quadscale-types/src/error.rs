//! error types shared across quadscale crates.

use thiserror::Error;

/// errors that can occur in quadscale core operations.
///
/// authorization denials are never errors - they are decision values
/// carrying a reason string. This enum covers the cases where a request
/// itself is malformed or refers to state that does not exist.
#[derive(Debug, Error)]
pub enum Error {
    /// a required field is missing or malformed. the caller must fix
    /// the request; these are never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// the referenced role/realm/policy/trust does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// a federation peer could not be reached.
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// a trust or session lifetime has elapsed.
    #[error("expired: {0}")]
    Expired(String),

    /// configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// create a not-found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// create an unreachable error.
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::Unreachable(msg.into())
    }

    /// create an expired error.
    pub fn expired(msg: impl Into<String>) -> Self {
        Self::Expired(msg.into())
    }
}
