//! http handlers for quadscale api endpoints.

pub mod admin;
pub mod auth;
mod error;
pub mod federation;
mod health;
mod version;

pub use error::{ApiError, OptionExt, ResultExt};
pub use health::health;
pub use version::version;
