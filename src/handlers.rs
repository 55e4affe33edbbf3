pub mod health;
pub mod sip_accounts;
pub mod users;
pub mod webphone;
