use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::{debug, error};

/// Error types for the SIP directory
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// A field value was rejected before reaching storage
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A uniqueness, reference or required-field rule was violated
    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Authentication required")]
    Unauthorized,

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("WebSocket URI must start with ws:// or wss:// (value: {0})")]
    WebsocketUri(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstraintViolation {
    #[error("Each SIP extension must be unique (extension: {0})")]
    DuplicateExtension(String),

    #[error("Each user can only own a single SIP account (user id: {0})")]
    DuplicateOwner(i32),

    #[error("Owner with id {0} does not exist")]
    UnknownOwner(i32),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

impl DirectoryError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DirectoryError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Translates a storage error raised while writing a SIP account into the
    /// constraint it violated. Errors that are not constraint failures are
    /// passed through as `Database`.
    pub fn from_account_write(err: DbErr, extension: &str, user_id: i32) -> Self {
        let classified = err
            .sql_err()
            .and_then(|sql_err| classify_violation(&sql_err, extension, user_id));

        match classified {
            Some(violation) => {
                debug!(%violation, "SIP account write rejected by storage constraint");
                DirectoryError::Constraint(violation)
            }
            None => {
                error!(?err, "SIP account write failed");
                DirectoryError::Database(err)
            }
        }
    }
}

/// Matches a constraint failure against the `sip_accounts` columns and the
/// unique index names from the migration. SQLite reports the column
/// (`sip_accounts.user_id`), Postgres and MySQL report the index name.
fn classify_violation(
    sql_err: &SqlErr,
    extension: &str,
    user_id: i32,
) -> Option<ConstraintViolation> {
    match sql_err {
        SqlErr::UniqueConstraintViolation(msg) => {
            let msg = msg.to_lowercase();
            if msg.contains("user_id") || msg.contains("sip_accounts_user_unique") {
                Some(ConstraintViolation::DuplicateOwner(user_id))
            } else if msg.contains("extension") {
                Some(ConstraintViolation::DuplicateExtension(extension.to_string()))
            } else {
                None
            }
        }
        SqlErr::ForeignKeyConstraintViolation(_) => {
            Some(ConstraintViolation::UnknownOwner(user_id))
        }
        _ => None,
    }
}

/// Type alias for Result with DirectoryError
pub type Result<T> = std::result::Result<T, DirectoryError>;
