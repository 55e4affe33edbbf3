use anyhow::{Context, Result};
use model::entities::user;
use sea_orm::{ActiveModelTrait, Database, Set};
use tracing::{debug, info, trace};

pub async fn create_user(
    database_url: &str,
    username: &str,
    display_name: Option<String>,
    email: Option<String>,
    is_admin: bool,
) -> Result<()> {
    trace!("Entering create_user function");
    debug!("Database URL: {}", database_url);

    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", database_url))?;

    let created = user::ActiveModel {
        username: Set(username.to_string()),
        display_name: Set(display_name.unwrap_or_else(|| username.to_string())),
        email: Set(email.filter(|e| !e.trim().is_empty())),
        is_admin: Set(is_admin),
        ..Default::default()
    }
    .insert(&db)
    .await
    .with_context(|| format!("Failed to create user '{}'", username))?;

    info!(
        "Created user {} with ID {} (admin: {})",
        created.username, created.id, created.is_admin
    );
    Ok(())
}
