pub mod create_user;
pub mod import_accounts;
pub mod initdb;
pub mod issue_session;
pub mod migrate_and_serve;
pub mod serve;

pub use create_user::create_user;
pub use import_accounts::import_accounts;
pub use initdb::init_database;
pub use issue_session::issue_session;
pub use migrate_and_serve::migrate_and_serve;
pub use serve::serve;
