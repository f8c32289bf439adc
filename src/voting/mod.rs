//! The voting core: session guard, ballot submission and tallying.

pub mod ballot;
pub mod guard;
pub mod store;
pub mod submission;
pub mod tally;
