//! # Account Balance
//!
//! What a customer owes, and where each invoice stands.
//!
//! ## Balance Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  balance =   Σ total of completed jobs       (Completed or Invoiced)   │
//! │            + Σ total of standalone invoices  (no job, not void)        │
//! │            − Σ amount paid on invoices       (not void)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An invoice raised from a job is not added again: the job's total already
//! carries the charge, the invoice only collects it.
//!
//! `parlour-db` evaluates the same formula as one SQL aggregate inside the
//! transaction of each write that affects it; this module is the reference
//! the SQL is tested against.

use chrono::NaiveDate;

use crate::money::Money;
use crate::types::{Invoice, InvoiceStatus, Job};

/// Computes a customer's account balance from their jobs and invoices.
///
/// Callers pass rows for one customer only.
pub fn compute_account_balance(jobs: &[Job], invoices: &[Invoice]) -> Money {
    let completed_jobs: Money = jobs
        .iter()
        .filter(|job| job.status.counts_toward_balance())
        .map(Job::total)
        .sum();

    let live_invoices = invoices
        .iter()
        .filter(|invoice| invoice.status != InvoiceStatus::Void);

    let (standalone, paid) = live_invoices.fold(
        (Money::zero(), Money::zero()),
        |(standalone, paid), invoice| {
            let standalone = if invoice.is_standalone() {
                standalone + invoice.total()
            } else {
                standalone
            };
            (standalone, paid + invoice.amount_paid())
        },
    );

    completed_jobs + standalone - paid
}

/// Amount still owed on an invoice, never negative.
pub fn amount_due(invoice: &Invoice) -> Money {
    if invoice.status == InvoiceStatus::Void {
        return Money::zero();
    }
    (invoice.total() - invoice.amount_paid()).floor_zero()
}

/// The status to store after the paid amount changes.
///
/// Draft and Void are left alone. Otherwise the status follows the money:
/// fully paid → Paid, part paid → PartiallyPaid, nothing paid → Sent.
pub fn derive_invoice_status(total: Money, paid: Money, current: InvoiceStatus) -> InvoiceStatus {
    match current {
        InvoiceStatus::Draft | InvoiceStatus::Void => current,
        _ if paid.is_positive() && paid >= total => InvoiceStatus::Paid,
        _ if paid.is_positive() => InvoiceStatus::PartiallyPaid,
        _ => InvoiceStatus::Sent,
    }
}

/// Status as shown to users on `today`.
///
/// Overdue is never stored: an open invoice past its due date reads as
/// Overdue until it is paid.
pub fn effective_invoice_status(invoice: &Invoice, today: NaiveDate) -> InvoiceStatus {
    if invoice.status.is_open() && invoice.due_date < today && amount_due(invoice).is_positive() {
        InvoiceStatus::Overdue
    } else {
        invoice.status
    }
}

/// Whole days past due on `today`; zero when not yet due.
pub fn days_overdue(due_date: NaiveDate, today: NaiveDate) -> i64 {
    (today - due_date).num_days().max(0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::JobStatus;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn job(status: JobStatus, total: i64) -> Job {
        let now = Utc::now();
        Job {
            id: uuid::Uuid::new_v4().to_string(),
            customer_id: "c1".to_string(),
            engineer_id: None,
            quote_id: None,
            title: "Service".to_string(),
            description: None,
            status,
            scheduled_date: None,
            completed_date: None,
            subtotal_pence: total,
            vat_pence: 0,
            total_pence: total,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn invoice(job_id: Option<&str>, status: InvoiceStatus, total: i64, paid: i64) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: uuid::Uuid::new_v4().to_string(),
            invoice_number: "INV-2026-0001".to_string(),
            customer_id: "c1".to_string(),
            job_id: job_id.map(str::to_string),
            status,
            issue_date: date(2026, 1, 1),
            due_date: date(2026, 1, 31),
            subtotal_pence: total,
            vat_pence: 0,
            vat_rate_bps: 0,
            total_pence: total,
            amount_paid_pence: paid,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_balance_formula() {
        let jobs = vec![
            job(JobStatus::Completed, 10_000),
            job(JobStatus::Invoiced, 5_000),
            job(JobStatus::InProgress, 99_999),
            job(JobStatus::Cancelled, 42),
        ];
        let invoices = vec![
            // from the invoiced job: only its payment counts
            invoice(Some("j2"), InvoiceStatus::PartiallyPaid, 5_000, 2_000),
            // standalone
            invoice(None, InvoiceStatus::Sent, 3_000, 0),
            // void: ignored entirely
            invoice(None, InvoiceStatus::Void, 7_000, 1_000),
        ];

        let balance = compute_account_balance(&jobs, &invoices);
        assert_eq!(balance.pence(), 10_000 + 5_000 + 3_000 - 2_000);
    }

    #[test]
    fn test_balance_in_credit() {
        let invoices = vec![invoice(None, InvoiceStatus::Paid, 1_000, 1_500)];
        assert_eq!(compute_account_balance(&[], &invoices).pence(), -500);
    }

    #[test]
    fn test_amount_due() {
        assert_eq!(amount_due(&invoice(None, InvoiceStatus::Sent, 1_000, 250)).pence(), 750);
        assert!(amount_due(&invoice(None, InvoiceStatus::Paid, 1_000, 1_200)).is_zero());
        assert!(amount_due(&invoice(None, InvoiceStatus::Void, 1_000, 0)).is_zero());
    }

    #[test]
    fn test_derive_status() {
        let total = Money::from_pence(1_000);
        assert_eq!(
            derive_invoice_status(total, Money::zero(), InvoiceStatus::Sent),
            InvoiceStatus::Sent
        );
        assert_eq!(
            derive_invoice_status(total, Money::from_pence(1), InvoiceStatus::Sent),
            InvoiceStatus::PartiallyPaid
        );
        assert_eq!(
            derive_invoice_status(total, total, InvoiceStatus::PartiallyPaid),
            InvoiceStatus::Paid
        );
        // deleting the only payment reopens the invoice
        assert_eq!(
            derive_invoice_status(total, Money::zero(), InvoiceStatus::Paid),
            InvoiceStatus::Sent
        );
        assert_eq!(
            derive_invoice_status(total, total, InvoiceStatus::Void),
            InvoiceStatus::Void
        );
    }

    #[test]
    fn test_effective_status_overdue() {
        let inv = invoice(None, InvoiceStatus::Sent, 1_000, 0);
        assert_eq!(effective_invoice_status(&inv, date(2026, 1, 31)), InvoiceStatus::Sent);
        assert_eq!(effective_invoice_status(&inv, date(2026, 2, 1)), InvoiceStatus::Overdue);

        let paid = invoice(None, InvoiceStatus::Paid, 1_000, 1_000);
        assert_eq!(effective_invoice_status(&paid, date(2026, 6, 1)), InvoiceStatus::Paid);

        let draft = invoice(None, InvoiceStatus::Draft, 1_000, 0);
        assert_eq!(effective_invoice_status(&draft, date(2026, 6, 1)), InvoiceStatus::Draft);
    }

    #[test]
    fn test_days_overdue() {
        assert_eq!(days_overdue(date(2026, 1, 31), date(2026, 2, 10)), 10);
        assert_eq!(days_overdue(date(2026, 1, 31), date(2026, 1, 1)), 0);
    }
}
