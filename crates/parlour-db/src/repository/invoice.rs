//! # Invoice Repository
//!
//! Invoices, their lines and their payment state.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create / create_from_job                                              │
//! │          │                                                              │
//! │          ▼                                                              │
//! │       Draft ──── update (replace lines) ───► Draft                      │
//! │          │                      │                                       │
//! │     mark_sent                 delete                                    │
//! │          ▼                                                              │
//! │        Sent ──payment──► PartiallyPaid ──payment──► Paid                │
//! │          │                                                              │
//! │        void (only while nothing is paid)                                │
//! │          ▼                                                              │
//! │        Void                                                             │
//! │                                                                         │
//! │  Overdue is never stored. Reads report an open invoice past its due     │
//! │  date as Overdue.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Voiding or deleting the invoice raised from a job puts the job back to
//! Completed so it can be invoiced again.

use chrono::{Datelike, Days, NaiveDate, Utc};
use parlour_core::balance::{derive_invoice_status, effective_invoice_status};
use parlour_core::totals::{DocumentTotals, LineInput};
use parlour_core::{
    CoreError, DocumentKind, Invoice, InvoiceDetail, InvoiceInput, InvoiceItem, InvoiceStatus,
    JobStatus, Money, Payment, VatRate,
};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, clean, customer, job, new_id, payment, sequence, settings};

const INVOICE_COLUMNS: &str = r#"
    id, invoice_number, customer_id, job_id, status, issue_date, due_date,
    subtotal_pence, vat_pence, vat_rate_bps, total_pence, amount_paid_pence,
    notes, created_at, updated_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, invoice_id, description, quantity_hundredths, unit_price_pence,
    line_total_pence, position
"#;

/// Filters for [`InvoiceRepository::list`].
///
/// `status` matches the status users see, so `overdue` finds open
/// invoices past their due date and `sent` excludes them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<String>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
    pub issue_from: Option<NaiveDate>,
    pub issue_to: Option<NaiveDate>,
}

pub(crate) async fn find<'e, E>(executor: E, id: &str) -> DbResult<Option<Invoice>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {} FROM invoices WHERE id = ?1", INVOICE_COLUMNS);
    let invoice = sqlx::query_as::<_, Invoice>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(invoice)
}

pub(crate) async fn require<'e, E>(executor: E, id: &str) -> DbResult<Invoice>
where
    E: SqliteExecutor<'e>,
{
    find(executor, id)
        .await?
        .ok_or_else(|| DbError::not_found("Invoice", id))
}

async fn items_on<'e, E>(executor: E, invoice_id: &str) -> DbResult<Vec<InvoiceItem>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM invoice_items WHERE invoice_id = ?1 ORDER BY position",
        ITEM_COLUMNS
    );
    let items = sqlx::query_as::<_, InvoiceItem>(&sql)
        .bind(invoice_id)
        .fetch_all(executor)
        .await?;
    Ok(items)
}

async fn insert_lines(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    lines: &[LineInput],
) -> DbResult<()> {
    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO invoice_items (
                id, invoice_id, description, quantity_hundredths,
                unit_price_pence, line_total_pence, position
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(new_id())
        .bind(invoice_id)
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

/// Re-reads the payments on an invoice, stores the paid amount and moves
/// the status to match. Run on the transaction that changed a payment.
pub(crate) async fn recompute_amount_paid(
    conn: &mut SqliteConnection,
    invoice_id: &str,
) -> DbResult<Invoice> {
    let invoice = require(&mut *conn, invoice_id).await?;

    let paid: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount_pence), 0) FROM payments WHERE invoice_id = ?1",
    )
    .bind(invoice_id)
    .fetch_one(&mut *conn)
    .await?;

    let status = derive_invoice_status(invoice.total(), Money::from_pence(paid), invoice.status);

    sqlx::query(
        "UPDATE invoices SET amount_paid_pence = ?2, status = ?3, updated_at = ?4 WHERE id = ?1",
    )
    .bind(invoice_id)
    .bind(paid)
    .bind(status)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    debug!(invoice_id = %invoice_id, paid, status = %status, "Recomputed amount paid");
    require(&mut *conn, invoice_id).await
}

/// Puts an Invoiced job back to Completed once no live invoice is left
/// for it.
async fn release_job(conn: &mut SqliteConnection, job_id: &str) -> DbResult<()> {
    let live: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM invoices WHERE job_id = ?1 AND status != 'void'",
    )
    .bind(job_id)
    .fetch_one(&mut *conn)
    .await?;

    if live > 0 {
        return Ok(());
    }

    if let Some(job) = job::find(&mut *conn, job_id).await? {
        if job.status == JobStatus::Invoiced {
            job::write_status(conn, job_id, JobStatus::Completed).await?;
        }
    }
    Ok(())
}

fn invalid_state(invoice: &Invoice, action: &str) -> DbError {
    CoreError::document_state("Invoice", invoice.invoice_number.as_str(), invoice.status, action)
        .into()
}

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lists invoices, newest first, with Overdue applied for today.
    pub async fn list(&self, filter: &InvoiceFilter) -> DbResult<Vec<Invoice>> {
        let today = Utc::now().date_naive();
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM invoices WHERE 1 = 1", INVOICE_COLUMNS));

        match filter.status {
            Some(InvoiceStatus::Overdue) => {
                qb.push(" AND status IN ('sent', 'partially_paid')")
                    .push(" AND total_pence > amount_paid_pence AND due_date < ")
                    .push_bind(today);
            }
            Some(status @ (InvoiceStatus::Sent | InvoiceStatus::PartiallyPaid)) => {
                qb.push(" AND status = ")
                    .push_bind(status)
                    .push(" AND (total_pence <= amount_paid_pence OR due_date >= ")
                    .push_bind(today)
                    .push(")");
            }
            Some(status) => {
                qb.push(" AND status = ").push_bind(status);
            }
            None => {}
        }

        if let Some(customer_id) = filter.customer_id.as_deref() {
            qb.push(" AND customer_id = ").push_bind(customer_id);
        }
        if let Some(from) = filter.due_from {
            qb.push(" AND due_date >= ").push_bind(from);
        }
        if let Some(to) = filter.due_to {
            qb.push(" AND due_date <= ").push_bind(to);
        }
        if let Some(from) = filter.issue_from {
            qb.push(" AND issue_date >= ").push_bind(from);
        }
        if let Some(to) = filter.issue_to {
            qb.push(" AND issue_date <= ").push_bind(to);
        }
        qb.push(" ORDER BY issue_date DESC, invoice_number DESC");

        let mut invoices = qb.build_query_as::<Invoice>().fetch_all(&self.pool).await?;
        for invoice in &mut invoices {
            invoice.status = effective_invoice_status(invoice, today);
        }

        debug!(count = invoices.len(), "Listed invoices");
        Ok(invoices)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let today = Utc::now().date_naive();
        Ok(find(&self.pool, id).await?.map(|mut invoice| {
            invoice.status = effective_invoice_status(&invoice, today);
            invoice
        }))
    }

    pub async fn get_detail(&self, id: &str) -> DbResult<Option<InvoiceDetail>> {
        let Some(invoice) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let items = items_on(&self.pool, id).await?;
        let payments: Vec<Payment> = payment::on_invoice(&self.pool, id).await?;
        Ok(Some(InvoiceDetail {
            invoice,
            items,
            payments,
        }))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Creates a standalone draft invoice from explicit lines.
    ///
    /// The number is allocated on the same transaction. Issue date defaults
    /// to today and the due date to the issue date plus payment terms.
    ///
    /// A job's invoice is billed through the job's own total, so it can only
    /// be raised by `create_from_job`; a `job_id` here is refused with
    /// `Conflict`.
    pub async fn create(&self, input: &InvoiceInput) -> DbResult<InvoiceDetail> {
        input.validate()?;
        if input.job_id.is_some() {
            return Err(DbError::conflict(
                "invoices for a job are raised from the job (POST /api/invoices/from-job/{jobId})",
            ));
        }

        let mut tx = begin_write(&self.pool).await?;

        customer::require(&mut *tx, &input.customer_id).await?;

        let settings = settings::load(&mut *tx).await?;
        let issue_date = input.issue_date.unwrap_or_else(|| Utc::now().date_naive());
        let due_date = match input.due_date {
            Some(due) => due,
            None => due_after_terms(issue_date, settings.payment_terms_days),
        };

        let lines: Vec<LineInput> = input.items.iter().map(LineInput::from).collect();
        let rate = settings.vat_rate();
        let totals = DocumentTotals::from_lines(&lines, rate);

        let number = sequence::allocate_number(
            &mut tx,
            DocumentKind::Invoice,
            &settings.invoice_prefix,
            issue_date.year(),
        )
        .await?;

        let id = new_id();
        insert_invoice(
            &mut tx,
            &id,
            &number,
            &input.customer_id,
            None,
            issue_date,
            due_date,
            &totals,
            rate,
            clean(&input.notes),
        )
        .await?;
        insert_lines(&mut tx, &id, &lines).await?;

        customer::recompute_balance(&mut tx, &input.customer_id).await?;
        tx.commit().await?;

        info!(id = %id, number = %number, total = totals.total.pence(), "Invoice created");
        self.detail_or_missing(&id).await
    }

    /// Raises a draft invoice from a completed job and moves the job to
    /// Invoiced.
    ///
    /// Refused with `Conflict` while the job already has a live invoice.
    pub async fn create_from_job(&self, job_id: &str) -> DbResult<InvoiceDetail> {
        let mut tx = begin_write(&self.pool).await?;
        let job = job::require(&mut *tx, job_id).await?;

        let existing: Option<String> = sqlx::query_scalar(
            "SELECT invoice_number FROM invoices WHERE job_id = ?1 AND status != 'void' LIMIT 1",
        )
        .bind(job_id)
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(number) = existing {
            return Err(DbError::conflict(format!(
                "job already invoiced as {}",
                number
            )));
        }

        if job.status != JobStatus::Completed {
            return Err(CoreError::document_state(
                "Job",
                job.title.as_str(),
                job.status,
                "invoice a job that is not completed",
            )
            .into());
        }

        let items = job::items_on(&mut *tx, job_id).await?;
        if items.is_empty() {
            return Err(DbError::conflict("job has no lines to invoice"));
        }

        // Bring the job onto the current rate so the invoice and the
        // balance agree.
        let totals = job::recompute_totals(&mut tx, job_id).await?;

        let settings = settings::load(&mut *tx).await?;
        let issue_date = Utc::now().date_naive();
        let due_date = due_after_terms(issue_date, settings.payment_terms_days);
        let lines: Vec<LineInput> = items.iter().map(LineInput::from).collect();

        let number = sequence::allocate_number(
            &mut tx,
            DocumentKind::Invoice,
            &settings.invoice_prefix,
            issue_date.year(),
        )
        .await?;

        let id = new_id();
        insert_invoice(
            &mut tx,
            &id,
            &number,
            &job.customer_id,
            Some(job_id),
            issue_date,
            due_date,
            &totals,
            settings.vat_rate(),
            clean(&job.notes),
        )
        .await?;
        insert_lines(&mut tx, &id, &lines).await?;

        job::write_status(&mut tx, job_id, JobStatus::Invoiced).await?;
        customer::recompute_balance(&mut tx, &job.customer_id).await?;
        tx.commit().await?;

        info!(id = %id, number = %number, job_id = %job_id, "Invoice raised from job");
        self.detail_or_missing(&id).await
    }

    /// Replaces a draft invoice's header and lines. The job link is fixed
    /// at creation and not changed here.
    pub async fn update(&self, id: &str, input: &InvoiceInput) -> DbResult<InvoiceDetail> {
        input.validate()?;

        let mut tx = begin_write(&self.pool).await?;
        let invoice = require(&mut *tx, id).await?;
        if invoice.status != InvoiceStatus::Draft {
            return Err(invalid_state(&invoice, "edit"));
        }

        let customer_changed = invoice.customer_id != input.customer_id;
        if customer_changed {
            if invoice.job_id.is_some() {
                return Err(DbError::conflict(
                    "cannot move a job invoice to another customer",
                ));
            }
            customer::require(&mut *tx, &input.customer_id).await?;
        }

        let settings = settings::load(&mut *tx).await?;
        let rate = settings.vat_rate();
        let lines: Vec<LineInput> = input.items.iter().map(LineInput::from).collect();
        let totals = DocumentTotals::from_lines(&lines, rate);
        let issue_date = input.issue_date.unwrap_or(invoice.issue_date);
        let due_date = input.due_date.unwrap_or(invoice.due_date);
        if due_date < issue_date {
            return Err(parlour_core::ValidationError::invalid_format(
                "dueDate",
                "must not be before the issue date",
            )
            .into());
        }

        sqlx::query(
            r#"
            UPDATE invoices SET
                customer_id = ?2,
                issue_date = ?3,
                due_date = ?4,
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
        .bind(due_date)
        .bind(totals.subtotal.pence())
        .bind(totals.vat.pence())
        .bind(rate.bps())
        .bind(totals.total.pence())
        .bind(clean(&input.notes))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_lines(&mut tx, id, &lines).await?;

        customer::recompute_balance(&mut tx, &input.customer_id).await?;
        if customer_changed {
            customer::recompute_balance(&mut tx, &invoice.customer_id).await?;
        }
        tx.commit().await?;

        debug!(id = %id, total = totals.total.pence(), "Draft invoice updated");
        self.detail_or_missing(id).await
    }

    /// Issues a draft invoice.
    pub async fn mark_sent(&self, id: &str) -> DbResult<Invoice> {
        let mut tx = begin_write(&self.pool).await?;
        let invoice = require(&mut *tx, id).await?;
        if invoice.status != InvoiceStatus::Draft {
            return Err(invalid_state(&invoice, "send"));
        }

        let status =
            derive_invoice_status(invoice.total(), invoice.amount_paid(), InvoiceStatus::Sent);
        sqlx::query("UPDATE invoices SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(id = %id, number = %invoice.invoice_number, "Invoice sent");
        self.get_or_missing(id).await
    }

    /// Voids an invoice that has no payments. Voiding twice is a no-op.
    pub async fn void(&self, id: &str) -> DbResult<Invoice> {
        let mut tx = begin_write(&self.pool).await?;
        let invoice = require(&mut *tx, id).await?;

        if invoice.status == InvoiceStatus::Void {
            return Ok(invoice);
        }
        if invoice.amount_paid_pence > 0 {
            return Err(invalid_state(&invoice, "void an invoice with payments"));
        }

        sqlx::query("UPDATE invoices SET status = 'void', updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        if let Some(job_id) = invoice.job_id.as_deref() {
            release_job(&mut tx, job_id).await?;
        }
        customer::recompute_balance(&mut tx, &invoice.customer_id).await?;
        tx.commit().await?;

        info!(id = %id, number = %invoice.invoice_number, "Invoice voided");
        self.get_or_missing(id).await
    }

    /// Deletes a draft invoice.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;
        let invoice = require(&mut *tx, id).await?;
        if invoice.status != InvoiceStatus::Draft {
            return Err(invalid_state(&invoice, "delete"));
        }

        sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if let Some(job_id) = invoice.job_id.as_deref() {
            release_job(&mut tx, job_id).await?;
        }
        customer::recompute_balance(&mut tx, &invoice.customer_id).await?;
        tx.commit().await?;

        info!(id = %id, number = %invoice.invoice_number, "Invoice deleted");
        Ok(())
    }

    /// Recomputes the paid amount and status from the payment rows.
    pub async fn recompute_amount_paid(&self, id: &str) -> DbResult<Invoice> {
        let mut tx = begin_write(&self.pool).await?;
        let invoice = recompute_amount_paid(&mut tx, id).await?;
        customer::recompute_balance(&mut tx, &invoice.customer_id).await?;
        tx.commit().await?;
        Ok(invoice)
    }

    async fn get_or_missing(&self, id: &str) -> DbResult<Invoice> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))
    }

    async fn detail_or_missing(&self, id: &str) -> DbResult<InvoiceDetail> {
        self.get_detail(id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))
    }
}

fn due_after_terms(issue_date: NaiveDate, terms_days: i64) -> NaiveDate {
    issue_date
        .checked_add_days(Days::new(terms_days.max(0) as u64))
        .unwrap_or(issue_date)
}

#[allow(clippy::too_many_arguments)]
async fn insert_invoice(
    conn: &mut SqliteConnection,
    id: &str,
    number: &str,
    customer_id: &str,
    job_id: Option<&str>,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    totals: &DocumentTotals,
    rate: VatRate,
    notes: Option<String>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, invoice_number, customer_id, job_id, status, issue_date, due_date,
            subtotal_pence, vat_pence, vat_rate_bps, total_pence, amount_paid_pence,
            notes, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, 'draft', ?5, ?6, ?7, ?8, ?9, ?10, 0, ?11, ?12, ?12)
        "#,
    )
    .bind(id)
    .bind(number)
    .bind(customer_id)
    .bind(job_id)
    .bind(issue_date)
    .bind(due_date)
    .bind(totals.subtotal.pence())
    .bind(totals.vat.pence())
    .bind(rate.bps())
    .bind(totals.total.pence())
    .bind(notes)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
