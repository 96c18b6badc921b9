//! global admin registry and realm monitor for quadscale.
//!
//! the [`GlobalAdmin`] holds the cluster-wide view: registered realms,
//! their cached service catalogs, alerts and distributed policy blobs.
//! the [`RealmMonitor`] keeps that view fresh with a periodic health
//! sweep over every registered realm.

#![warn(missing_docs)]

pub mod monitor;
pub mod registry;

pub use monitor::{FederationStats, RealmMonitor};
pub use registry::{
    Alert, AlertLevel, DistributedPolicy, GlobalAdmin, RealmInfo, RealmStatus, ServiceInfo,
};

pub use quadscale_types::{Error, Result};
