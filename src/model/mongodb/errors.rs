//! Server error codes the mongodb crate has no constants for.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure};

pub const WRITE_CONFLICT: i32 = 112;

/// Return true if the given error means another transaction touched the same
/// document first.
///
/// Other transient transaction errors (network errors, stepdowns, lock
/// timeouts) are not write conflicts.
pub fn is_write_conflict(err: &DbError) -> bool {
    match *err.kind {
        ErrorKind::Command(ref e) => e.code == WRITE_CONFLICT,
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == WRITE_CONFLICT,
        _ => false,
    }
}
