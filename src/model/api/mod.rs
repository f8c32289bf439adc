//! API-compatible types, serialised as JSON request and response bodies.

pub mod auth;
pub mod ballot;
pub mod results;
pub mod voter;
