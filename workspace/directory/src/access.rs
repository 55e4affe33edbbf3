//! Query capabilities.
//!
//! User-facing reads go through [`Viewer`], which limits non-administrators to
//! their own SIP account. A few internal projections must see accounts the
//! caller could not read directly; those require a [`SystemAccess`], which
//! only this crate can create.

use model::entities::user;
use tracing::trace;

/// The identity a permission-checked query runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: i32,
    pub is_admin: bool,
}

impl Viewer {
    pub fn can_see_owner(&self, owner_id: i32) -> bool {
        self.is_admin || self.user_id == owner_id
    }
}

impl From<&user::Model> for Viewer {
    fn from(user: &user::Model) -> Self {
        Self {
            user_id: user.id,
            is_admin: user.is_admin,
        }
    }
}

/// Capability for queries that ignore per-user visibility.
#[derive(Debug)]
pub struct SystemAccess {
    _private: (),
}

impl SystemAccess {
    pub(crate) fn grant(purpose: &'static str) -> Self {
        trace!(purpose, "granting system access");
        Self { _private: () }
    }
}
