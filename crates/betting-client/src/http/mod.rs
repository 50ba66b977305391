//! HTTP layer
//!
//! reqwest-based gateway plus session/token header handling.

pub mod auth;
pub mod gateway;

pub use auth::*;
pub use gateway::*;
