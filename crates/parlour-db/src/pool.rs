//! # Connection Pool
//!
//! Opens the Parlour database file and hands out repositories.
//!
//! ```text
//!   ServerConfig.database ──► DbConfig ──► SqliteConnectOptions
//!                                              │  WAL, NORMAL sync,
//!                                              │  foreign keys, busy wait
//!                                              ▼
//!                                         SqlitePool ──► migrations
//!                                              │
//!              ┌───────────────┬───────────────┼───────────────┐
//!              ▼               ▼               ▼               ▼
//!         customers()       jobs()        invoices()      settings() ...
//! ```
//!
//! The office and the engineers' tablets all go through one server, so
//! contention is low. WAL lets the calendar and report reads carry on
//! while a job line is being written; a second writer waits up to
//! `busy_timeout` for the lock rather than erroring straight away.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{
    CustomerRepository, EngineerRepository, InventoryRepository, InvoiceRepository,
    JobRepository, PaymentRepository, QuoteRepository, SequenceRepository, SettingsRepository,
    StatementRepository, UserRepository,
};

const MEMORY: &str = ":memory:";

/// How to open the database. Built from the `[database]` table of the
/// server config, or `in_memory()` in tests.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first start. `:memory:` for a throwaway db.
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Wait for a free pooled connection.
    pub connect_timeout: Duration,
    /// Idle connections are dropped after this.
    pub idle_timeout: Duration,
    /// Wait for SQLite's write lock.
    pub busy_timeout: Duration,
    /// Apply pending migrations as part of `Database::new`.
    pub run_migrations: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            database_path: PathBuf::from("parlour.db"),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(10 * 60),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            ..Default::default()
        }
    }

    /// A private in-memory database. It only exists while its single
    /// connection does, so the pool never grows past one and never idles it out.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(MEMORY),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60 * 60),
            ..Default::default()
        }
    }

    pub fn max_connections(self, max_connections: u32) -> Self {
        DbConfig {
            max_connections,
            ..self
        }
    }

    pub fn min_connections(self, min_connections: u32) -> Self {
        DbConfig {
            min_connections,
            ..self
        }
    }

    pub fn connect_timeout(self, connect_timeout: Duration) -> Self {
        DbConfig {
            connect_timeout,
            ..self
        }
    }

    pub fn busy_timeout(self, busy_timeout: Duration) -> Self {
        DbConfig {
            busy_timeout,
            ..self
        }
    }

    pub fn run_migrations(self, run_migrations: bool) -> Self {
        DbConfig {
            run_migrations,
            ..self
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(MEMORY)
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let url = format!("sqlite://{}?mode=rwc", self.database_path.display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(format!("{url}: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout);

        // WAL needs a real file next to the database
        let options = if self.is_in_memory() {
            options
        } else {
            options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };

        Ok(options)
    }
}

/// Handle to the Parlour database. Clones share one pool.
///
/// Handlers reach data through the typed accessors, e.g.
/// `state.db.jobs().get_detail(&id)`.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        let options = config.connect_options()?;
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            max = config.max_connections,
            min = config.min_connections,
            in_memory = config.is_in_memory(),
            "Pool ready"
        );

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Raw pool, for transactions that span repositories.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.pool.clone())
    }

    pub fn engineers(&self) -> EngineerRepository {
        EngineerRepository::new(self.pool.clone())
    }

    pub fn jobs(&self) -> JobRepository {
        JobRepository::new(self.pool.clone())
    }

    pub fn invoices(&self) -> InvoiceRepository {
        InvoiceRepository::new(self.pool.clone())
    }

    pub fn payments(&self) -> PaymentRepository {
        PaymentRepository::new(self.pool.clone())
    }

    pub fn quotes(&self) -> QuoteRepository {
        QuoteRepository::new(self.pool.clone())
    }

    pub fn statements(&self) -> StatementRepository {
        StatementRepository::new(self.pool.clone())
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn sequences(&self) -> SequenceRepository {
        SequenceRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections to come back, then closes them.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// `true` when a trivial query round-trips. Backs `GET /api/health`.
    pub async fn health_check(&self) -> bool {
        let ping: Result<i64, _> = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await;
        matches!(ping, Ok(1))
    }
}
