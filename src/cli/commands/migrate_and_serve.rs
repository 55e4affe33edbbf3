use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, trace};

use super::initdb::connect_and_migrate;
use super::serve::run_server;
use crate::config::Settings;
use crate::schemas::AppState;

pub async fn migrate_and_serve(settings: Settings) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");
    debug!("Database URL: {}", settings.database_url);
    debug!("Bind address: {}", settings.bind_address);

    // Reuse the migrated connection for serving
    let db = connect_and_migrate(&settings.database_url).await?;
    let state = AppState {
        db,
        settings: Arc::new(settings),
    };

    run_server(state).await
}
