//! SIP account directory: the account store, per-user projections used by the
//! webphone, and session lookup.

pub mod access;
pub mod accounts;
pub mod error;
pub mod projection;
pub mod sessions;

#[cfg(test)]
mod testing;

pub use access::Viewer;
pub use error::{ConstraintViolation, DirectoryError, Result, ValidationError};
