//! network-zone access control for quadscale.
//!
//! zones are named network regions, optionally backed by a cidr subnet.
//! a [`ZonePolicy`] attaches allow/deny lists and origin rules to a
//! zone; zones without a policy fall back to "the caller's claims must
//! already list the zone". this layer is independent of the rbac
//! engine - it gates on network position, not capabilities.

#![warn(missing_docs)]

pub mod manager;
pub mod zone;

pub use manager::{ZoneDecision, ZoneManager};
pub use zone::{TimeRestriction, Zone, ZoneDefinition, ZonePolicy};

pub use quadscale_types::{Error, Result};
