//! cross-realm trust and authorization for quadscale.
//!
//! realms that federate establish a [`RealmTrust`] relationship; the
//! [`TrustAuthorizer`] evaluates incoming cross-realm requests against
//! that relationship and delegates the final decision to the local rbac
//! engine. trust levels form a lattice
//! `None < Read < Access < Register < Full`; lower levels demote the
//! remote role before evaluation.

#![warn(missing_docs)]

pub mod authorizer;
pub mod level;
pub mod trust;

pub use authorizer::{CrossRealmRequest, TrustAuthorizer};
pub use level::TrustLevel;
pub use trust::RealmTrust;

pub use quadscale_types::{Error, Result};
