//! # Job Repository
//!
//! Service visits, their lines and their place on the pipeline.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_item     BEGIN → take stock (parts) → insert line                  │
//! │                     → recompute job totals → recompute balance → COMMIT │
//! │                                                                         │
//! │  remove_item  BEGIN → restore stock (parts) → delete line               │
//! │                     → recompute job totals → recompute balance → COMMIT │
//! │                                                                         │
//! │  set_status   BEGIN → pipeline::transition → completed_date             │
//! │                     → recompute balance → COMMIT                        │
//! │                                                                         │
//! │  delete       BEGIN → refuse if a non-draft invoice exists              │
//! │                     → restore stock → drop lines, statements and draft  │
//! │                       invoices → unlink quote → delete → balance        │
//! │                     → COMMIT                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any failure rolls the whole transaction back: a part line that would
//! take stock below zero leaves neither the line nor the stock change.

use chrono::{NaiveDate, Utc};
use parlour_core::pipeline::transition;
use parlour_core::totals::DocumentTotals;
use parlour_core::{
    CoreError, Job, JobDetail, JobInput, JobItem, JobItemInput, JobStatus, LineKind, Money,
    Quantity,
};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, clean, customer, engineer, inventory, new_id, settings};

const JOB_COLUMNS: &str = r#"
    id, customer_id, engineer_id, quote_id, title, description, status,
    scheduled_date, completed_date, subtotal_pence, vat_pence, total_pence,
    notes, created_at, updated_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, job_id, inventory_item_id, kind, description, quantity_hundredths,
    unit_price_pence, line_total_pence, created_at
"#;

/// Filters for [`JobRepository::list`]. Dates bound the scheduled date.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub customer_id: Option<String>,
    pub engineer_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub(crate) async fn find<'e, E>(executor: E, id: &str) -> DbResult<Option<Job>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS);
    let job = sqlx::query_as::<_, Job>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(job)
}

pub(crate) async fn require<'e, E>(executor: E, id: &str) -> DbResult<Job>
where
    E: SqliteExecutor<'e>,
{
    find(executor, id)
        .await?
        .ok_or_else(|| DbError::not_found("Job", id))
}

pub(crate) async fn items_on<'e, E>(executor: E, job_id: &str) -> DbResult<Vec<JobItem>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM job_items WHERE job_id = ?1 ORDER BY created_at, rowid",
        ITEM_COLUMNS
    );
    let items = sqlx::query_as::<_, JobItem>(&sql)
        .bind(job_id)
        .fetch_all(executor)
        .await?;
    Ok(items)
}

/// Writes a status without checking pipeline rules.
///
/// `completed_date` is stamped with today when the job first reaches
/// Completed, kept through Invoiced and cleared on any other status.
pub(crate) async fn write_status(
    conn: &mut SqliteConnection,
    job_id: &str,
    status: JobStatus,
) -> DbResult<()> {
    let today = Utc::now().date_naive();

    sqlx::query(
        r#"
        UPDATE jobs SET
            status = ?2,
            completed_date = CASE
                WHEN ?2 IN ('completed', 'invoiced') THEN COALESCE(completed_date, ?3)
                ELSE NULL
            END,
            updated_at = ?4
        WHERE id = ?1
        "#,
    )
    .bind(job_id)
    .bind(status)
    .bind(today)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    debug!(job_id = %job_id, status = %status, "Job status written");
    Ok(())
}

/// Recomputes a job's subtotal, VAT and total from its lines at the
/// current VAT rate.
pub(crate) async fn recompute_totals(
    conn: &mut SqliteConnection,
    job_id: &str,
) -> DbResult<DocumentTotals> {
    let rate = settings::load(&mut *conn).await?.vat_rate();
    let items = items_on(&mut *conn, job_id).await?;
    let totals = DocumentTotals::from_job_items(&items, rate);

    sqlx::query(
        r#"
        UPDATE jobs SET subtotal_pence = ?2, vat_pence = ?3, total_pence = ?4, updated_at = ?5
        WHERE id = ?1
        "#,
    )
    .bind(job_id)
    .bind(totals.subtotal.pence())
    .bind(totals.vat.pence())
    .bind(totals.total.pence())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(totals)
}

fn ensure_editable(job: &Job, action: &str) -> DbResult<()> {
    if job.status.is_editable() {
        Ok(())
    } else {
        Err(CoreError::document_state("Job", job.title.as_str(), job.status, action).into())
    }
}

/// Repository for job database operations.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        JobRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn list(&self, filter: &JobFilter) -> DbResult<Vec<Job>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM jobs WHERE 1 = 1", JOB_COLUMNS));

        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(customer_id) = filter.customer_id.as_deref() {
            qb.push(" AND customer_id = ").push_bind(customer_id);
        }
        if let Some(engineer_id) = filter.engineer_id.as_deref() {
            qb.push(" AND engineer_id = ").push_bind(engineer_id);
        }
        if let Some(from) = filter.from {
            qb.push(" AND scheduled_date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            qb.push(" AND scheduled_date <= ").push_bind(to);
        }
        qb.push(" ORDER BY created_at DESC");

        let jobs = qb.build_query_as::<Job>().fetch_all(&self.pool).await?;
        debug!(count = jobs.len(), "Listed jobs");
        Ok(jobs)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Job>> {
        find(&self.pool, id).await
    }

    pub async fn get_detail(&self, id: &str) -> DbResult<Option<JobDetail>> {
        let Some(job) = find(&self.pool, id).await? else {
            return Ok(None);
        };
        let items = items_on(&self.pool, id).await?;
        Ok(Some(JobDetail { job, items }))
    }

    pub async fn items(&self, job_id: &str) -> DbResult<Vec<JobItem>> {
        items_on(&self.pool, job_id).await
    }

    /// Lines for many jobs at once (reports).
    pub async fn list_items(&self, job_ids: &[String]) -> DbResult<Vec<JobItem>> {
        if job_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM job_items WHERE job_id IN (",
            ITEM_COLUMNS
        ));
        let mut ids = qb.separated(", ");
        for id in job_ids {
            ids.push_bind(id.as_str());
        }
        ids.push_unseparated(") ORDER BY created_at");

        let items = qb.build_query_as::<JobItem>().fetch_all(&self.pool).await?;
        Ok(items)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Creates a job. It starts Scheduled when a date is given, otherwise
    /// Pending.
    pub async fn create(&self, input: &JobInput) -> DbResult<Job> {
        input.validate()?;

        let mut tx = begin_write(&self.pool).await?;

        customer::require(&mut *tx, &input.customer_id).await?;
        if let Some(engineer_id) = input.engineer_id.as_deref() {
            engineer::require_active(&mut *tx, engineer_id).await?;
        }

        let id = new_id();
        let status = if input.scheduled_date.is_some() {
            JobStatus::Scheduled
        } else {
            JobStatus::Pending
        };

        debug!(id = %id, customer_id = %input.customer_id, status = %status, "Creating job");

        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, customer_id, engineer_id, quote_id, title, description, status,
                scheduled_date, completed_date, subtotal_pence, vat_pence, total_pence,
                notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6, ?7, NULL, 0, 0, 0, ?8, ?9, ?9)
            "#,
        )
        .bind(&id)
        .bind(&input.customer_id)
        .bind(&input.engineer_id)
        .bind(input.title.trim())
        .bind(clean(&input.description))
        .bind(status)
        .bind(input.scheduled_date)
        .bind(clean(&input.notes))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let job = require(&mut *tx, &id).await?;
        tx.commit().await?;

        info!(id = %id, title = %job.title, "Job created");
        Ok(job)
    }

    /// Updates a job's header fields.
    ///
    /// A Pending job given a date moves to Scheduled; a Scheduled job whose
    /// date is cleared moves back to Pending. Moving the job to another
    /// customer is refused once it has invoices, and recomputes both
    /// balances otherwise.
    pub async fn update(&self, id: &str, input: &JobInput) -> DbResult<Job> {
        input.validate()?;

        let mut tx = begin_write(&self.pool).await?;
        let job = require(&mut *tx, id).await?;

        let customer_changed = job.customer_id != input.customer_id;
        if customer_changed {
            customer::require(&mut *tx, &input.customer_id).await?;

            let invoices: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE job_id = ?1")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
            if invoices > 0 {
                return Err(DbError::conflict(
                    "cannot move a job with invoices to another customer",
                ));
            }
        }

        if input.engineer_id.is_some() && input.engineer_id != job.engineer_id {
            if let Some(engineer_id) = input.engineer_id.as_deref() {
                engineer::require_active(&mut *tx, engineer_id).await?;
            }
        }

        let status = match (job.status, input.scheduled_date) {
            (JobStatus::Pending, Some(_)) => JobStatus::Scheduled,
            (JobStatus::Scheduled, None) => JobStatus::Pending,
            (status, _) => status,
        };

        sqlx::query(
            r#"
            UPDATE jobs SET
                customer_id = ?2,
                engineer_id = ?3,
                title = ?4,
                description = ?5,
                scheduled_date = ?6,
                notes = ?7,
                status = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.customer_id)
        .bind(&input.engineer_id)
        .bind(input.title.trim())
        .bind(clean(&input.description))
        .bind(input.scheduled_date)
        .bind(clean(&input.notes))
        .bind(status)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if customer_changed {
            customer::recompute_balance(&mut tx, &job.customer_id).await?;
            customer::recompute_balance(&mut tx, &input.customer_id).await?;
        }

        let updated = require(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Adds a line to a job.
    ///
    /// A line naming an inventory item is a part line: description and price
    /// default from the part, and whole units (quantity rounded up) come out
    /// of stock.
    pub async fn add_item(&self, job_id: &str, input: &JobItemInput) -> DbResult<JobDetail> {
        input.validate()?;

        let mut tx = begin_write(&self.pool).await?;
        let job = require(&mut *tx, job_id).await?;
        ensure_editable(&job, "add items")?;

        let quantity = Quantity::from_hundredths(input.quantity_hundredths);

        let (kind, description, unit_price) = match input.inventory_item_id.as_deref() {
            Some(part_id) => {
                let part = inventory::require(&mut *tx, part_id).await?;
                inventory::take_stock(&mut tx, part_id, quantity.whole_units_ceil()).await?;
                (
                    LineKind::Part,
                    clean(&input.description).unwrap_or(part.name),
                    input.unit_price_pence.unwrap_or(part.unit_price_pence),
                )
            }
            None => (
                input.kind,
                clean(&input.description).unwrap_or_default(),
                input.unit_price_pence.unwrap_or_default(),
            ),
        };

        let line_total = Money::from_pence(unit_price).times_quantity(quantity);

        sqlx::query(
            r#"
            INSERT INTO job_items (
                id, job_id, inventory_item_id, kind, description,
                quantity_hundredths, unit_price_pence, line_total_pence, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(new_id())
        .bind(job_id)
        .bind(&input.inventory_item_id)
        .bind(kind)
        .bind(&description)
        .bind(quantity.hundredths())
        .bind(unit_price)
        .bind(line_total.pence())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        recompute_totals(&mut tx, job_id).await?;
        customer::recompute_balance(&mut tx, &job.customer_id).await?;

        let detail = JobDetail {
            job: require(&mut *tx, job_id).await?,
            items: items_on(&mut *tx, job_id).await?,
        };
        tx.commit().await?;

        debug!(job_id = %job_id, kind = kind.as_str(), total = line_total.pence(), "Job line added");
        Ok(detail)
    }

    /// Removes a line, putting part stock back.
    pub async fn remove_item(&self, job_id: &str, item_id: &str) -> DbResult<JobDetail> {
        let mut tx = begin_write(&self.pool).await?;
        let job = require(&mut *tx, job_id).await?;
        ensure_editable(&job, "remove items")?;

        let sql = format!(
            "SELECT {} FROM job_items WHERE id = ?1 AND job_id = ?2",
            ITEM_COLUMNS
        );
        let item = sqlx::query_as::<_, JobItem>(&sql)
            .bind(item_id)
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Job item", item_id))?;

        if let Some(part_id) = item.inventory_item_id.as_deref() {
            inventory::restore_stock(&mut tx, part_id, item.quantity().whole_units_ceil()).await?;
        }

        sqlx::query("DELETE FROM job_items WHERE id = ?1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        recompute_totals(&mut tx, job_id).await?;
        customer::recompute_balance(&mut tx, &job.customer_id).await?;

        let detail = JobDetail {
            job: require(&mut *tx, job_id).await?,
            items: items_on(&mut *tx, job_id).await?,
        };
        tx.commit().await?;

        debug!(job_id = %job_id, item_id = %item_id, "Job line removed");
        Ok(detail)
    }

    /// Moves a job to another pipeline column.
    ///
    /// Invoiced is only reached by raising an invoice from the job, so it
    /// is refused here.
    pub async fn set_status(&self, id: &str, status: JobStatus) -> DbResult<Job> {
        let mut tx = begin_write(&self.pool).await?;
        let job = require(&mut *tx, id).await?;

        if status == JobStatus::Invoiced && job.status != JobStatus::Invoiced {
            return Err(CoreError::InvalidJobTransition {
                from: job.status.to_string(),
                to: status.to_string(),
            }
            .into());
        }

        let next = transition(job.status, status)?;
        if next != job.status {
            write_status(&mut tx, id, next).await?;
            customer::recompute_balance(&mut tx, &job.customer_id).await?;
        }

        let updated = require(&mut *tx, id).await?;
        tx.commit().await?;

        info!(id = %id, from = %job.status, to = %next, "Job status changed");
        Ok(updated)
    }

    /// Deletes a job and everything hanging off it.
    ///
    /// Refused with `Conflict` when the job has any invoice beyond a draft.
    /// Part stock is restored; statements and draft invoices are removed;
    /// a quote converted into the job is unlinked.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;
        let job = require(&mut *tx, id).await?;

        let issued: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM invoices WHERE job_id = ?1 AND status != 'draft'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if issued > 0 {
            return Err(DbError::conflict(format!(
                "job has {} issued invoice(s); void or keep them instead",
                issued
            )));
        }

        for item in items_on(&mut *tx, id).await? {
            if let Some(part_id) = item.inventory_item_id.as_deref() {
                inventory::restore_stock(&mut tx, part_id, item.quantity().whole_units_ceil())
                    .await?;
            }
        }

        sqlx::query("DELETE FROM job_items WHERE job_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM statements WHERE job_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM invoices WHERE job_id = ?1 AND status = 'draft'")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE quotes SET job_id = NULL WHERE job_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM jobs WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        customer::recompute_balance(&mut tx, &job.customer_id).await?;
        tx.commit().await?;

        info!(id = %id, "Job deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use crate::Database;
    use parlour_core::Customer;

    async fn new_job(db: &Database, customer: &Customer) -> Job {
        db.jobs()
            .create(&JobInput {
                customer_id: customer.id.clone(),
                title: "Vacuum pump service".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    fn labour(hundredths: i64, rate: i64) -> JobItemInput {
        JobItemInput {
            kind: LineKind::Labour,
            description: Some("Labour".to_string()),
            quantity_hundredths: hundredths,
            unit_price_pence: Some(rate),
            ..Default::default()
        }
    }

    fn part_line(part_id: &str, hundredths: i64) -> JobItemInput {
        JobItemInput {
            inventory_item_id: Some(part_id.to_string()),
            quantity_hundredths: hundredths,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_sets_initial_status() {
        let db = test_support::db().await;
        let customer = test_support::customer(&db, "Hill Farm").await;

        let pending = new_job(&db, &customer).await;
        assert_eq!(pending.status, JobStatus::Pending);

        let scheduled = db
            .jobs()
            .create(&JobInput {
                customer_id: customer.id.clone(),
                title: "Annual test".to_string(),
                scheduled_date: NaiveDate::from_ymd_opt(2026, 11, 2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(scheduled.status, JobStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_create_for_missing_customer() {
        let db = test_support::db().await;
        let err = db
            .jobs()
            .create(&JobInput {
                customer_id: uuid::Uuid::new_v4().to_string(),
                title: "Orphan".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_add_items_takes_stock_and_totals() {
        let db = test_support::db().await;
        let customer = test_support::customer(&db, "Hill Farm").await;
        let part = test_support::part(&db, "CL-100", 5, 1250).await;
        let job = new_job(&db, &customer).await;

        db.jobs().add_item(&job.id, &part_line(&part.id, 200)).await.unwrap();
        let detail = db.jobs().add_item(&job.id, &labour(150, 4500)).await.unwrap();

        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.items[0].kind, LineKind::Part);
        assert_eq!(detail.items[0].description, "Part CL-100");
        assert_eq!(detail.items[0].line_total_pence, 2500);
        assert_eq!(detail.items[1].line_total_pence, 6750);

        assert_eq!(detail.job.subtotal_pence, 9250);
        assert_eq!(detail.job.vat_pence, 1850);
        assert_eq!(detail.job.total_pence, 11_100);

        let part = db.inventory().get_by_id(&part.id).await.unwrap().unwrap();
        assert_eq!(part.quantity_in_stock, 3);

        // Not completed yet, so nothing owed
        let customer = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(customer.account_balance_pence, 0);
    }

    #[tokio::test]
    async fn test_fractional_part_quantity_takes_whole_units() {
        let db = test_support::db().await;
        let customer = test_support::customer(&db, "Hill Farm").await;
        let part = test_support::part(&db, "HO-5", 4, 300).await;
        let job = new_job(&db, &customer).await;

        db.jobs().add_item(&job.id, &part_line(&part.id, 150)).await.unwrap();

        let part = db.inventory().get_by_id(&part.id).await.unwrap().unwrap();
        assert_eq!(part.quantity_in_stock, 2);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let db = test_support::db().await;
        let customer = test_support::customer(&db, "Hill Farm").await;
        let part = test_support::part(&db, "CL-100", 1, 1250).await;
        let job = new_job(&db, &customer).await;

        let err = db
            .jobs()
            .add_item(&job.id, &part_line(&part.id, 300))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock { available: 1, requested: 3, .. })
        ));

        assert!(db.jobs().items(&job.id).await.unwrap().is_empty());
        let part = db.inventory().get_by_id(&part.id).await.unwrap().unwrap();
        assert_eq!(part.quantity_in_stock, 1);
    }

    #[tokio::test]
    async fn test_remove_item_restores_stock() {
        let db = test_support::db().await;
        let customer = test_support::customer(&db, "Hill Farm").await;
        let part = test_support::part(&db, "CL-100", 5, 1250).await;
        let job = new_job(&db, &customer).await;

        let detail = db.jobs().add_item(&job.id, &part_line(&part.id, 200)).await.unwrap();
        let item_id = detail.items[0].id.clone();

        let detail = db.jobs().remove_item(&job.id, &item_id).await.unwrap();
        assert!(detail.items.is_empty());
        assert_eq!(detail.job.total_pence, 0);

        let part = db.inventory().get_by_id(&part.id).await.unwrap().unwrap();
        assert_eq!(part.quantity_in_stock, 5);
    }

    #[tokio::test]
    async fn test_status_changes_drive_balance() {
        let db = test_support::db().await;
        let customer = test_support::customer(&db, "Hill Farm").await;
        let job = new_job(&db, &customer).await;
        db.jobs().add_item(&job.id, &labour(100, 5000)).await.unwrap();

        let done = db.jobs().set_status(&job.id, JobStatus::Completed).await.unwrap();
        assert_eq!(done.completed_date, Some(Utc::now().date_naive()));
        let balance = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(balance.account_balance_pence, 6000);

        let reopened = db.jobs().set_status(&job.id, JobStatus::InProgress).await.unwrap();
        assert!(reopened.completed_date.is_none());
        let balance = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(balance.account_balance_pence, 0);
    }

    #[tokio::test]
    async fn test_illegal_transitions_rejected() {
        let db = test_support::db().await;
        let customer = test_support::customer(&db, "Hill Farm").await;
        let job = new_job(&db, &customer).await;

        let err = db.jobs().set_status(&job.id, JobStatus::Invoiced).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidJobTransition { .. })));

        db.jobs().set_status(&job.id, JobStatus::Cancelled).await.unwrap();
        let err = db
            .jobs()
            .add_item(&job.id, &labour(100, 5000))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidDocumentState { .. })));
    }

    #[tokio::test]
    async fn test_update_schedules_pending_job() {
        let db = test_support::db().await;
        let customer = test_support::customer(&db, "Hill Farm").await;
        let job = new_job(&db, &customer).await;

        let updated = db
            .jobs()
            .update(
                &job.id,
                &JobInput {
                    customer_id: customer.id.clone(),
                    title: "Vacuum pump service".to_string(),
                    scheduled_date: NaiveDate::from_ymd_opt(2026, 11, 3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, JobStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_support::db().await;
        let hill = test_support::customer(&db, "Hill Farm").await;
        let brook = test_support::customer(&db, "Brook Dairy").await;
        let job = new_job(&db, &hill).await;
        new_job(&db, &brook).await;
        db.jobs().set_status(&job.id, JobStatus::InProgress).await.unwrap();

        let all = db.jobs().list(&JobFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let in_progress = db
            .jobs()
            .list(&JobFilter {
                status: Some(JobStatus::InProgress),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].id, job.id);

        let for_brook = db
            .jobs()
            .list(&JobFilter {
                customer_id: Some(brook.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_brook.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_restores_stock_and_balance() {
        let db = test_support::db().await;
        let customer = test_support::customer(&db, "Hill Farm").await;
        let part = test_support::part(&db, "CL-100", 5, 1250).await;
        let job = new_job(&db, &customer).await;

        db.jobs().add_item(&job.id, &part_line(&part.id, 300)).await.unwrap();
        db.jobs().set_status(&job.id, JobStatus::Completed).await.unwrap();

        db.jobs().delete(&job.id).await.unwrap();

        assert!(db.jobs().get_by_id(&job.id).await.unwrap().is_none());
        let part = db.inventory().get_by_id(&part.id).await.unwrap().unwrap();
        assert_eq!(part.quantity_in_stock, 5);
        let customer = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(customer.account_balance_pence, 0);
    }
}
