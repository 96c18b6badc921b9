//! role-based access control for quadscale.
//!
//! this crate implements the permission engine: a role registry with
//! inheritance, ssid-to-role mappings with wildcard patterns, and the
//! single-decision [`RbacEngine::evaluate`] entry point. resolution is
//! deny-by-default with one deliberate exception: actions outside the
//! permission table require no permission and are allowed.

#![warn(missing_docs)]

pub mod action;
pub mod engine;
pub mod pattern;

pub use action::{action_to_permission, action_verb};
pub use engine::{RbacEngine, ResolvedRole};
pub use pattern::matches_pattern;

pub use quadscale_types::{Error, Result};
