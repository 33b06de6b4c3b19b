//! # Schema Migrations
//!
//! The SQL under `migrations/sqlite/` is compiled into the binary, so a
//! fresh server or a test database gets the full schema with no files on
//! disk. sqlx records each applied script in `_sqlx_migrations` and
//! refuses to start if an applied script has since been edited: schema
//! changes go in a new `NNNN_description.sql`, never into an old one.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever has not been applied yet. Safe to call on every start.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (total, before) = migration_status(pool).await?;

    // Runs even when nothing is pending so edited scripts are still caught
    MIGRATOR.run(pool).await?;

    if before < total {
        info!(applied = total - before, total, "Schema migrated");
    } else {
        debug!(total, "Schema up to date");
    }
    Ok(())
}

/// `(embedded, applied)` script counts. Before the first run there is no
/// bookkeeping table, which counts as nothing applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let tracked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;

    let applied: i64 = if tracked == 0 {
        0
    } else {
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?
    };

    Ok((MIGRATOR.migrations.len(), applied as usize))
}
