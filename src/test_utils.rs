#[cfg(test)]
pub mod test_utils {
    use crate::config::Settings;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use directory::sessions;
    use migration::{Migrator, MigratorTrait};
    use model::entities::user;
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
    use std::sync::Arc;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Users and session tokens seeded into every test application.
    pub struct TestApp {
        pub router: Router,
        pub state: AppState,
        pub admin: user::Model,
        pub admin_token: String,
        pub user: user::Model,
        pub user_token: String,
    }

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    pub async fn insert_user(
        db: &DatabaseConnection,
        username: &str,
        display_name: &str,
        is_admin: bool,
    ) -> user::Model {
        user::ActiveModel {
            username: Set(username.to_string()),
            display_name: Set(display_name.to_string()),
            email: Set(Some(format!("{}@example.com", username))),
            is_admin: Set(is_admin),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test user")
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state() -> AppState {
        AppState {
            db: setup_test_db().await,
            settings: Arc::new(Settings::default()),
        }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is read from RUST_LOG, defaulting to WARN. The returned
    /// guard removes the subscriber when dropped.
    pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing, with an administrator and a regular user
    /// that both hold a session.
    pub async fn setup_test_app() -> TestApp {
        let state = setup_test_app_state().await;

        let admin = insert_user(&state.db, "admin", "Administrator", true).await;
        let user = insert_user(&state.db, "alice", "Alice Example", false).await;
        let admin_token = sessions::issue(&state.db, admin.id)
            .await
            .expect("Failed to issue admin session")
            .token;
        let user_token = sessions::issue(&state.db, user.id)
            .await
            .expect("Failed to issue user session")
            .token;

        let router = create_router(state.clone());
        TestApp {
            router,
            state,
            admin,
            admin_token,
            user,
            user_token,
        }
    }
}
