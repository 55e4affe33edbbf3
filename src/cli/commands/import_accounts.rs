use anyhow::{Context, Result};
use directory::accounts::{self, NewSipAccount};
use model::entities::user;
use sea_orm::{ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, trace};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid accounts file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Unknown user '{0}'")]
    UnknownUser(String),
}

/// Top level of an accounts file
#[derive(Debug, Deserialize)]
struct AccountsFile {
    accounts: Vec<ImportedAccount>,
}

#[derive(Deserialize)]
struct ImportedAccount {
    /// Owner, referenced by username
    username: String,
    label: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    extension: String,
    #[serde(deserialize_with = "string_or_number")]
    auth_username: String,
    auth_password: String,
    sip_domain: String,
    sip_websocket_uri: String,
    outbound_proxy: Option<String>,
    stun_server: Option<String>,
    turn_server: Option<String>,
    turn_username: Option<String>,
    turn_password: Option<String>,
    enabled: Option<bool>,
}

impl std::fmt::Debug for ImportedAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportedAccount")
            .field("username", &self.username)
            .field("extension", &self.extension)
            .finish_non_exhaustive()
    }
}

/// Extensions are often written unquoted in YAML, so numbers are accepted too.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

fn parse_accounts(contents: &str) -> Result<AccountsFile, ImportError> {
    Ok(serde_yaml::from_str(contents)?)
}

fn read_accounts(path: &Path) -> Result<AccountsFile, ImportError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_accounts(&contents)
}

async fn resolve_owners(
    db: &DatabaseConnection,
    file: AccountsFile,
) -> Result<Vec<NewSipAccount>> {
    let mut records = Vec::with_capacity(file.accounts.len());

    for entry in file.accounts {
        let owner = user::Entity::find()
            .filter(user::Column::Username.eq(entry.username.as_str()))
            .one(db)
            .await?
            .ok_or_else(|| ImportError::UnknownUser(entry.username.clone()))?;
        debug!("Extension {} belongs to user {}", entry.extension, owner.id);

        records.push(NewSipAccount {
            label: entry.label,
            user_id: owner.id,
            extension: entry.extension,
            auth_username: entry.auth_username,
            auth_password: entry.auth_password,
            sip_domain: entry.sip_domain,
            sip_websocket_uri: entry.sip_websocket_uri,
            outbound_proxy: entry.outbound_proxy,
            stun_server: entry.stun_server,
            turn_server: entry.turn_server,
            turn_username: entry.turn_username,
            turn_password: entry.turn_password,
            enabled: entry.enabled,
        });
    }

    Ok(records)
}

/// Create every account listed in the file, in a single transaction.
pub async fn import_into(db: &DatabaseConnection, path: &Path) -> Result<usize> {
    let file = read_accounts(path)?;
    info!("Read {} account(s) from {}", file.accounts.len(), path.display());

    let records = resolve_owners(db, file).await?;
    let created = accounts::create_many(db, records)
        .await
        .context("SIP account import rejected")?;
    Ok(created.len())
}

pub async fn import_accounts(path: &Path, database_url: &str) -> Result<()> {
    trace!("Entering import_accounts function");
    debug!("Database URL: {}", database_url);

    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", database_url))?;

    let count = import_into(&db, path).await?;
    info!("Imported {} SIP account(s)", count);
    Ok(())
}
