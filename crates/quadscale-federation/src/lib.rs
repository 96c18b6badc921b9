//! peer-to-peer federation for quadscale.
//!
//! a realm joins a federation by calling another realm's join endpoint;
//! the pair then exchange service catalogs, resolve services across the
//! boundary and optionally exchange trust. peer state is a small state
//! machine: `Unknown -> Peered -> Trusted -> removed`. all federation
//! state is eventually consistent - there is no consensus protocol, and
//! a peer is trusted once joined.

#![warn(missing_docs)]

pub mod client;
pub mod events;
pub mod peer;
pub mod server;

pub use client::{FederationClient, HttpTransport, Transport};
pub use events::{Event, EventBus};
pub use peer::{PeerRealm, PeerStatus};
pub use server::{FederationServer, RealmIdentity};

pub use quadscale_types::{Error, Result};
