//! This file serves as the root for all SeaORM entity modules.
//! Users own at most one SIP account; sessions authenticate users.

pub mod session;
pub mod sip_account;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::session::Entity as Session;
    pub use super::sip_account::Entity as SipAccount;
    pub use super::user::Entity as User;
}
