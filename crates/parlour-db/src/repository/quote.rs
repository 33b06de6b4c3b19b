//! # Quote Repository
//!
//! Priced proposals. An accepted quote converts into a Pending job carrying
//! the quote's lines.
//!
//! ## Status Flow
//! ```text
//! Draft ──► Sent ──► Accepted ──convert_to_job──► (job_id set)
//!   │         │
//!   │         ├────► Declined ─┐
//!   │         └────► Expired ──┤
//!   └─────────────────────────►┴──► back to Draft for rework
//! ```

use chrono::{Datelike, Days, NaiveDate, Utc};
use parlour_core::totals::{DocumentTotals, LineInput};
use parlour_core::{
    CoreError, DocumentKind, Job, JobStatus, LineKind, Quote, QuoteDetail, QuoteInput, QuoteItem,
    QuoteStatus, VatRate,
};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, clean, customer, job, new_id, sequence, settings};

/// Days a quote stays valid when no date is given.
pub const DEFAULT_VALIDITY_DAYS: u64 = 30;

const QUOTE_COLUMNS: &str = r#"
    id, quote_number, customer_id, status, issue_date, valid_until,
    subtotal_pence, vat_pence, vat_rate_bps, total_pence, notes, job_id,
    created_at, updated_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, quote_id, description, quantity_hundredths, unit_price_pence,
    line_total_pence, position
"#;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteFilter {
    pub status: Option<QuoteStatus>,
    pub customer_id: Option<String>,
}

async fn find<'e, E>(executor: E, id: &str) -> DbResult<Option<Quote>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {} FROM quotes WHERE id = ?1", QUOTE_COLUMNS);
    let quote = sqlx::query_as::<_, Quote>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(quote)
}

async fn require<'e, E>(executor: E, id: &str) -> DbResult<Quote>
where
    E: SqliteExecutor<'e>,
{
    find(executor, id)
        .await?
        .ok_or_else(|| DbError::not_found("Quote", id))
}

async fn items_on<'e, E>(executor: E, quote_id: &str) -> DbResult<Vec<QuoteItem>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM quote_items WHERE quote_id = ?1 ORDER BY position",
        ITEM_COLUMNS
    );
    let items = sqlx::query_as::<_, QuoteItem>(&sql)
        .bind(quote_id)
        .fetch_all(executor)
        .await?;
    Ok(items)
}

async fn replace_lines(
    conn: &mut SqliteConnection,
    quote_id: &str,
    lines: &[LineInput],
) -> DbResult<()> {
    sqlx::query("DELETE FROM quote_items WHERE quote_id = ?1")
        .bind(quote_id)
        .execute(&mut *conn)
        .await?;

    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO quote_items (
                id, quote_id, description, quantity_hundredths,
                unit_price_pence, line_total_pence, position
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(new_id())
        .bind(quote_id)
        .bind(&line.description)
        .bind(line.quantity.hundredths())
        .bind(line.unit_price.pence())
        .bind(line.line_total().pence())
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

fn invalid_state(quote: &Quote, action: &str) -> DbError {
    CoreError::document_state("Quote", quote.quote_number.as_str(), quote.status, action).into()
}

fn resolve_dates(
    issue_date: Option<NaiveDate>,
    valid_until: Option<NaiveDate>,
) -> (NaiveDate, NaiveDate) {
    let issue = issue_date.unwrap_or_else(|| Utc::now().date_naive());
    let until = valid_until.unwrap_or_else(|| {
        issue
            .checked_add_days(Days::new(DEFAULT_VALIDITY_DAYS))
            .unwrap_or(issue)
    });
    (issue, until)
}

/// Repository for quote database operations.
#[derive(Debug, Clone)]
pub struct QuoteRepository {
    pool: SqlitePool,
}

impl QuoteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        QuoteRepository { pool }
    }

    pub async fn list(&self, filter: &QuoteFilter) -> DbResult<Vec<Quote>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM quotes WHERE 1 = 1", QUOTE_COLUMNS));

        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(customer_id) = filter.customer_id.as_deref() {
            qb.push(" AND customer_id = ").push_bind(customer_id);
        }
        qb.push(" ORDER BY issue_date DESC, quote_number DESC");

        let quotes = qb.build_query_as::<Quote>().fetch_all(&self.pool).await?;
        Ok(quotes)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Quote>> {
        find(&self.pool, id).await
    }

    pub async fn get_detail(&self, id: &str) -> DbResult<Option<QuoteDetail>> {
        let Some(quote) = find(&self.pool, id).await? else {
            return Ok(None);
        };
        let items = items_on(&self.pool, id).await?;
        Ok(Some(QuoteDetail { quote, items }))
    }

    /// Creates a numbered draft quote, valid for 30 days unless a date is
    /// given.
    pub async fn create(&self, input: &QuoteInput) -> DbResult<QuoteDetail> {
        input.validate()?;

        let mut tx = begin_write(&self.pool).await?;
        customer::require(&mut *tx, &input.customer_id).await?;

        let settings = settings::load(&mut *tx).await?;
        let (issue_date, valid_until) = resolve_dates(input.issue_date, input.valid_until);
        let rate: VatRate = settings.vat_rate();
        let lines: Vec<LineInput> = input.items.iter().map(LineInput::from).collect();
        let totals = DocumentTotals::from_lines(&lines, rate);

        let number = sequence::allocate_number(
            &mut tx,
            DocumentKind::Quote,
            &settings.quote_prefix,
            issue_date.year(),
        )
        .await?;

        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO quotes (
                id, quote_number, customer_id, status, issue_date, valid_until,
                subtotal_pence, vat_pence, vat_rate_bps, total_pence, notes, job_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, 'draft', ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL, ?11, ?11)
            "#,
        )
        .bind(&id)
        .bind(&number)
        .bind(&input.customer_id)
        .bind(issue_date)
        .bind(valid_until)
        .bind(totals.subtotal.pence())
        .bind(totals.vat.pence())
        .bind(rate.bps())
        .bind(totals.total.pence())
        .bind(clean(&input.notes))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        replace_lines(&mut tx, &id, &lines).await?;
        tx.commit().await?;

        info!(id = %id, number = %number, total = totals.total.pence(), "Quote created");
        self.detail_or_missing(&id).await
    }

    /// Replaces a draft quote's header and lines.
    pub async fn update(&self, id: &str, input: &QuoteInput) -> DbResult<QuoteDetail> {
        input.validate()?;

        let mut tx = begin_write(&self.pool).await?;
        let quote = require(&mut *tx, id).await?;
        if quote.status != QuoteStatus::Draft {
            return Err(invalid_state(&quote, "edit"));
        }
        if quote.customer_id != input.customer_id {
            customer::require(&mut *tx, &input.customer_id).await?;
        }

        let rate = settings::load(&mut *tx).await?.vat_rate();
        let lines: Vec<LineInput> = input.items.iter().map(LineInput::from).collect();
        let totals = DocumentTotals::from_lines(&lines, rate);
        let (issue_date, valid_until) = resolve_dates(
            input.issue_date.or(Some(quote.issue_date)),
            input.valid_until.or(Some(quote.valid_until)),
        );

        sqlx::query(
            r#"
            UPDATE quotes SET
                customer_id = ?2,
                issue_date = ?3,
                valid_until = ?4,
                subtotal_pence = ?5,
                vat_pence = ?6,
                vat_rate_bps = ?7,
                total_pence = ?8,
                notes = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.customer_id)
        .bind(issue_date)
        .bind(valid_until)
        .bind(totals.subtotal.pence())
        .bind(totals.vat.pence())
        .bind(rate.bps())
        .bind(totals.total.pence())
        .bind(clean(&input.notes))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        replace_lines(&mut tx, id, &lines).await?;
        tx.commit().await?;

        debug!(id = %id, "Draft quote updated");
        self.detail_or_missing(id).await
    }

    pub async fn set_status(&self, id: &str, status: QuoteStatus) -> DbResult<Quote> {
        let mut tx = begin_write(&self.pool).await?;
        let quote = require(&mut *tx, id).await?;

        if quote.job_id.is_some() && status != quote.status {
            return Err(invalid_state(&quote, "change a converted quote"));
        }
        if !quote.status.can_become(status) {
            return Err(invalid_state(&quote, &format!("move to {}", status)));
        }

        sqlx::query("UPDATE quotes SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        let updated = require(&mut *tx, id).await?;
        tx.commit().await?;

        info!(id = %id, from = %quote.status, to = %status, "Quote status changed");
        Ok(updated)
    }

    /// Turns an accepted quote into a Pending job with the quote's lines.
    ///
    /// Lines carry no inventory link, so no stock moves. A quote converts
    /// once; a second attempt is a `Conflict`.
    pub async fn convert_to_job(&self, id: &str) -> DbResult<Job> {
        let mut tx = begin_write(&self.pool).await?;
        let quote = require(&mut *tx, id).await?;

        if let Some(job_id) = quote.job_id.as_deref() {
            return Err(DbError::conflict(format!(
                "quote {} already converted to job {}",
                quote.quote_number, job_id
            )));
        }
        if quote.status != QuoteStatus::Accepted {
            return Err(invalid_state(&quote, "convert a quote that is not accepted"));
        }

        let job_id = new_id();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, customer_id, engineer_id, quote_id, title, description, status,
                scheduled_date, completed_date, subtotal_pence, vat_pence, total_pence,
                notes, created_at, updated_at
            ) VALUES (?1, ?2, NULL, ?3, ?4, NULL, ?5, NULL, NULL, 0, 0, 0, ?6, ?7, ?7)
            "#,
        )
        .bind(&job_id)
        .bind(&quote.customer_id)
        .bind(id)
        .bind(format!("Quote {}", quote.quote_number))
        .bind(JobStatus::Pending)
        .bind(&quote.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for item in items_on(&mut *tx, id).await? {
            sqlx::query(
                r#"
                INSERT INTO job_items (
                    id, job_id, inventory_item_id, kind, description,
                    quantity_hundredths, unit_price_pence, line_total_pence, created_at
                ) VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(new_id())
            .bind(&job_id)
            .bind(LineKind::Other)
            .bind(&item.description)
            .bind(item.quantity_hundredths)
            .bind(item.unit_price_pence)
            .bind(item.line_total_pence)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        job::recompute_totals(&mut tx, &job_id).await?;

        sqlx::query("UPDATE quotes SET job_id = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(&job_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let job = job::require(&mut *tx, &job_id).await?;
        tx.commit().await?;

        info!(quote = %quote.quote_number, job_id = %job_id, "Quote converted to job");
        Ok(job)
    }

    /// Deletes a quote that has not been converted.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;
        let quote = require(&mut *tx, id).await?;

        if quote.job_id.is_some() {
            return Err(DbError::conflict(format!(
                "quote {} has been converted to a job",
                quote.quote_number
            )));
        }

        // A job deleted after conversion leaves quote_id pointing here
        sqlx::query("UPDATE jobs SET quote_id = NULL WHERE quote_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM quotes WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(id = %id, number = %quote.quote_number, "Quote deleted");
        Ok(())
    }

    async fn detail_or_missing(&self, id: &str) -> DbResult<QuoteDetail> {
        self.get_detail(id)
            .await?
            .ok_or_else(|| DbError::not_found("Quote", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
