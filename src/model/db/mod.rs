//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in a DB-friendly way, e.g.:
//!
//! - Master data IDs are integers stored in the `_id` field.
//! - Vote IDs are generated by MongoDB.

pub mod candidate;
pub mod position;
pub mod vote;
pub mod voter;
