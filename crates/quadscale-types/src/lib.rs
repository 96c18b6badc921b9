//! core types for quadscale - a campus mesh control plane in rust.
//!
//! this crate provides the fundamental data structures used throughout quadscale:
//! - [`Permission`]: opaque capability tags with wildcard grants
//! - [`Role`]: named permission sets with inheritance
//! - [`Claims`]: verified identity attached to a request
//! - [`PolicyContext`] / [`PolicyDecision`]: one authorization evaluation
//! - [`Config`]: application configuration

#![warn(missing_docs)]

mod claims;
mod config;
mod context;
mod error;
mod permission;
mod role;
mod store;

/// builders for tests across the workspace.
pub mod test_utils;

pub use claims::Claims;
pub use config::{Config, FederationConfig, MonitorConfig};
pub use context::{PolicyContext, PolicyDecision};
pub use error::Error;
pub use permission::Permission;
pub use role::{Role, SsidRoleMapping};
pub use store::{KvStore, MemoryStore, StaticTokenVerifier, TokenVerifier};

/// result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;
