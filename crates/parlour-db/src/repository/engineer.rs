//! # Engineer Repository
//!
//! The field team. Engineers are deactivated rather than deleted so the
//! jobs they worked keep their assignment.

use chrono::Utc;
use parlour_core::{Engineer, EngineerInput};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{clean, new_id};

const ENGINEER_COLUMNS: &str = r#"
    id, name, email, phone, hourly_rate_pence, is_active, created_at, updated_at
"#;

pub(crate) async fn find<'e, E>(executor: E, id: &str) -> DbResult<Option<Engineer>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {} FROM engineers WHERE id = ?1", ENGINEER_COLUMNS);
    let engineer = sqlx::query_as::<_, Engineer>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(engineer)
}

/// Loads an engineer that can take new work.
pub(crate) async fn require_active<'e, E>(executor: E, id: &str) -> DbResult<Engineer>
where
    E: SqliteExecutor<'e>,
{
    let engineer = find(executor, id)
        .await?
        .ok_or_else(|| DbError::not_found("Engineer", id))?;

    if !engineer.is_active {
        return Err(DbError::conflict(format!(
            "engineer {} is inactive",
            engineer.name
        )));
    }

    Ok(engineer)
}

#[derive(Debug, Clone)]
pub struct EngineerRepository {
    pool: SqlitePool,
}

impl EngineerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EngineerRepository { pool }
    }

    pub async fn list(&self, active_only: bool) -> DbResult<Vec<Engineer>> {
        let sql = if active_only {
            format!(
                "SELECT {} FROM engineers WHERE is_active = 1 ORDER BY name COLLATE NOCASE",
                ENGINEER_COLUMNS
            )
        } else {
            format!(
                "SELECT {} FROM engineers ORDER BY is_active DESC, name COLLATE NOCASE",
                ENGINEER_COLUMNS
            )
        };

        let engineers = sqlx::query_as::<_, Engineer>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(engineers)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Engineer>> {
        find(&self.pool, id).await
    }

    pub async fn create(&self, input: &EngineerInput) -> DbResult<Engineer> {
        input.validate()?;

        let id = new_id();
        debug!(id = %id, name = %input.name, "Creating engineer");

        sqlx::query(
            r#"
            INSERT INTO engineers (
                id, name, email, phone, hourly_rate_pence, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
        )
        .bind(&id)
        .bind(input.name.trim())
        .bind(clean(&input.email))
        .bind(clean(&input.phone))
        .bind(input.hourly_rate_pence)
        .bind(input.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        find(&self.pool, &id)
            .await?
            .ok_or_else(|| DbError::not_found("Engineer", &id))
    }

    pub async fn update(&self, id: &str, input: &EngineerInput) -> DbResult<Engineer> {
        input.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE engineers SET
                name = ?2,
                email = ?3,
                phone = ?4,
                hourly_rate_pence = ?5,
                is_active = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(clean(&input.email))
        .bind(clean(&input.phone))
        .bind(input.hourly_rate_pence)
        .bind(input.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Engineer", id));
        }

        find(&self.pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("Engineer", id))
    }

    /// Marks an engineer inactive. Existing jobs keep the assignment; new
    /// jobs can no longer be given to them.
    pub async fn deactivate(&self, id: &str) -> DbResult<Engineer> {
        let result = sqlx::query("UPDATE engineers SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Engineer", id));
        }

        info!(id = %id, "Engineer deactivated");
        find(&self.pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("Engineer", id))
    }
}
