//! # Statement Repository
//!
//! Job statements: a numbered, frozen copy of a job's lines with parts,
//! labour and sundries totalled separately. Later edits to the job do not
//! change a statement already generated.

use chrono::{Datelike, Utc};
use parlour_core::totals::StatementBreakdown;
use parlour_core::{DocumentKind, Statement, StatementDetail, StatementItem};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, clean, job, new_id, sequence, settings};

const STATEMENT_COLUMNS: &str = r#"
    id, statement_number, customer_id, job_id, issue_date, parts_total_pence,
    labour_total_pence, other_total_pence, subtotal_pence, vat_pence,
    vat_rate_bps, total_pence, notes, created_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, statement_id, kind, description, quantity_hundredths, unit_price_pence,
    line_total_pence, position
"#;

async fn find<'e, E>(executor: E, id: &str) -> DbResult<Option<Statement>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {} FROM statements WHERE id = ?1", STATEMENT_COLUMNS);
    let statement = sqlx::query_as::<_, Statement>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(statement)
}

#[derive(Debug, Clone)]
pub struct StatementRepository {
    pool: SqlitePool,
}

impl StatementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StatementRepository { pool }
    }

    /// Lists statements, newest first, optionally for one customer.
    pub async fn list(&self, customer_id: Option<&str>) -> DbResult<Vec<Statement>> {
        let statements = match customer_id {
            Some(customer_id) => {
                let sql = format!(
                    "SELECT {} FROM statements WHERE customer_id = ?1 ORDER BY issue_date DESC, statement_number DESC",
                    STATEMENT_COLUMNS
                );
                sqlx::query_as::<_, Statement>(&sql)
                    .bind(customer_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM statements ORDER BY issue_date DESC, statement_number DESC",
                    STATEMENT_COLUMNS
                );
                sqlx::query_as::<_, Statement>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(statements)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Statement>> {
        find(&self.pool, id).await
    }

    pub async fn get_detail(&self, id: &str) -> DbResult<Option<StatementDetail>> {
        let Some(statement) = find(&self.pool, id).await? else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {} FROM statement_items WHERE statement_id = ?1 ORDER BY position",
            ITEM_COLUMNS
        );
        let items = sqlx::query_as::<_, StatementItem>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(Some(StatementDetail { statement, items }))
    }

    /// Generates a numbered statement from a job's current lines.
    ///
    /// Refused with `Conflict` for a job with no lines.
    pub async fn generate_for_job(
        &self,
        job_id: &str,
        notes: Option<String>,
    ) -> DbResult<StatementDetail> {
        let mut tx = begin_write(&self.pool).await?;
        let job = job::require(&mut *tx, job_id).await?;
        let items = job::items_on(&mut *tx, job_id).await?;

        if items.is_empty() {
            return Err(DbError::conflict("job has no lines for a statement"));
        }

        let settings = settings::load(&mut *tx).await?;
        let rate = settings.vat_rate();
        let breakdown = StatementBreakdown::from_job_items(&items, rate);
        let issue_date = Utc::now().date_naive();

        let number = sequence::allocate_number(
            &mut tx,
            DocumentKind::Statement,
            &settings.statement_prefix,
            issue_date.year(),
        )
        .await?;

        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO statements (
                id, statement_number, customer_id, job_id, issue_date,
                parts_total_pence, labour_total_pence, other_total_pence,
                subtotal_pence, vat_pence, vat_rate_bps, total_pence, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&id)
        .bind(&number)
        .bind(&job.customer_id)
        .bind(job_id)
        .bind(issue_date)
        .bind(breakdown.parts.pence())
        .bind(breakdown.labour.pence())
        .bind(breakdown.other.pence())
        .bind(breakdown.totals.subtotal.pence())
        .bind(breakdown.totals.vat.pence())
        .bind(rate.bps())
        .bind(breakdown.totals.total.pence())
        .bind(clean(&notes))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO statement_items (
                    id, statement_id, kind, description, quantity_hundredths,
                    unit_price_pence, line_total_pence, position
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(new_id())
            .bind(&id)
            .bind(item.kind)
            .bind(&item.description)
            .bind(item.quantity_hundredths)
            .bind(item.unit_price_pence)
            .bind(item.line_total_pence)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(id = %id, number = %number, job_id = %job_id, "Statement generated");

        self.get_detail(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Statement", &id))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM statements WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Statement", id));
        }

        info!(id = %id, "Statement deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
