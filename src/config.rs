use anyhow::Result;
use ::config::{Config, Environment, File};
use sea_orm::Database;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::schemas::AppState;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://sipdesk.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_LOG_FILTER: &str = "sipdesk=debug,directory=debug,tower_http=debug,axum::rejection=trace";

/// Runtime settings.
///
/// Sources, lowest precedence first: built-in defaults, an optional
/// `sipdesk.toml` in the working directory, then `SIPDESK_*` environment
/// variables (e.g. `SIPDESK_DATABASE_URL`). CLI flags override the result.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub log_filter: String,
    pub request_timeout_secs: u64,
    pub metrics_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            request_timeout_secs: 30,
            metrics_enabled: true,
        }
    }
}

impl Settings {
    /// Load settings from `.env`, `sipdesk.toml` and the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load_from("sipdesk")
    }

    fn load_from(config_name: &str) -> Result<Self> {
        let defaults = Settings::default();
        let settings = Config::builder()
            .set_default("database_url", defaults.database_url)?
            .set_default("bind_address", defaults.bind_address)?
            .set_default("log_filter", defaults.log_filter)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("metrics_enabled", defaults.metrics_enabled)?
            .add_source(File::with_name(config_name).required(false))
            .add_source(Environment::with_prefix("SIPDESK"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Connect to the configured database and build the shared state.
pub async fn initialize_app_state(settings: Settings) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;

    Ok(AppState {
        db,
        settings: Arc::new(settings),
    })
}
