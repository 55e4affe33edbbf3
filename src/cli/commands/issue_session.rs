use anyhow::{Context, Result, anyhow};
use directory::sessions;
use model::entities::user;
use sea_orm::{ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{debug, info, trace};

/// Issue a session for `username` and return its token.
pub async fn issue_for_username(db: &DatabaseConnection, username: &str) -> Result<String> {
    let owner = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .ok_or_else(|| anyhow!("Unknown user '{}'", username))?;

    let session = sessions::issue(db, owner.id).await?;
    info!("Issued session for {}", owner.username);
    Ok(session.token)
}

pub async fn issue_session(database_url: &str, username: &str) -> Result<String> {
    trace!("Entering issue_session function");
    debug!("Database URL: {}", database_url);

    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", database_url))?;

    issue_for_username(&db, username).await
}
