use migration::{Migrator, MigratorTrait};
use model::entities::user;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};

use crate::accounts::NewSipAccount;

/// In-memory SQLite database with all migrations applied.
pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

pub async fn new_user(db: &DatabaseConnection, username: &str, is_admin: bool) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        display_name: Set(format!("{} (display)", username)),
        email: Set(Some(format!("{}@example.com", username))),
        is_admin: Set(is_admin),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test user")
}

pub fn sample_account(user_id: i32, extension: &str) -> NewSipAccount {
    NewSipAccount {
        label: None,
        user_id,
        extension: extension.to_string(),
        auth_username: extension.to_string(),
        auth_password: "secret".to_string(),
        sip_domain: "pbx.example.com".to_string(),
        sip_websocket_uri: "wss://pbx.example.com:8089/ws".to_string(),
        ..Default::default()
    }
}
