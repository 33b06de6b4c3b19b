//! Shared application state.

use std::time::Duration;

use parlour_db::{Database, DbConfig};

use crate::auth::JwtManager;
use crate::config::ServerConfig;
use crate::notifier::ReminderNotifier;

/// Handed to every handler as `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub notifier: ReminderNotifier,
    pub config: ServerConfig,
}

impl AppState {
    /// Opens the database named in `config` and wires up the services.
    pub async fn from_config(config: ServerConfig) -> anyhow::Result<Self> {
        let db = Database::new(
            DbConfig::new(&config.database.path).max_connections(config.database.max_connections),
        )
        .await?;
        Self::with_database(config, db)
    }

    pub fn with_database(config: ServerConfig, db: Database) -> anyhow::Result<Self> {
        let jwt = JwtManager::new(&config.auth.jwt_secret, config.auth.token_ttl_secs);
        let notifier = ReminderNotifier::new(
            Duration::from_secs(config.notifications.webhook_timeout_secs),
            config.notifications.max_attempts,
        )?;

        Ok(AppState {
            db,
            jwt,
            notifier,
            config,
        })
    }
}
