//! Session tokens standing in for the host application's login sessions.

use chrono::Utc;
use model::entities::{session, user};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{DirectoryError, Result};

/// Creates a new session for `user_id` and returns it with its token.
#[instrument(skip(db))]
pub async fn issue(db: &DatabaseConnection, user_id: i32) -> Result<session::Model> {
    if user::Entity::find_by_id(user_id).one(db).await?.is_none() {
        return Err(DirectoryError::not_found("User", user_id));
    }

    let session = session::ActiveModel {
        token: Set(Uuid::new_v4().simple().to_string()),
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    info!("Issued session for user {}", user_id);
    Ok(session)
}

/// Resolves a token to its user. Unknown tokens yield `None`.
#[instrument(skip_all)]
pub async fn resolve(db: &DatabaseConnection, token: &str) -> Result<Option<user::Model>> {
    let found = session::Entity::find_by_id(token.to_string())
        .find_also_related(user::Entity)
        .one(db)
        .await?;

    match found {
        Some((_, Some(user))) => Ok(Some(user)),
        _ => {
            debug!("Session token did not resolve to a user");
            Ok(None)
        }
    }
}

/// Removes a session. Returns whether a session was deleted.
#[instrument(skip_all)]
pub async fn revoke(db: &DatabaseConnection, token: &str) -> Result<bool> {
    let result = session::Entity::delete_by_id(token.to_string())
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}
