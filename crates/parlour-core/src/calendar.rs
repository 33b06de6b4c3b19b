//! # Payment Calendar
//!
//! A month grid of what falls due and who is booked in.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CalendarMonth (2026-03)                                                │
//! │  ├── days[0]   2026-03-01  due: [INV-2026-0011]  jobs: []               │
//! │  ├── days[1]   2026-03-02  due: []               jobs: [Parlour pump]   │
//! │  │   ...                                                                │
//! │  └── total_due_pence, overdue_count                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only invoices with money still owed appear. Drafts and void invoices are
//! left off.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::balance::{amount_due, effective_invoice_status};
use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Invoice, InvoiceStatus, Job};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CalendarInvoice {
    pub invoice_id: String,
    pub invoice_number: String,
    pub customer_id: String,
    pub amount_due_pence: i64,
    pub status: InvoiceStatus,
    pub overdue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CalendarJob {
    pub job_id: String,
    pub title: String,
    pub customer_id: String,
    pub engineer_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CalendarDay {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub invoices_due: Vec<CalendarInvoice>,
    pub jobs_scheduled: Vec<CalendarJob>,
    pub due_pence: i64,
    pub has_overdue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
    pub total_due_pence: i64,
    pub overdue_count: usize,
}

/// First and last day of a month.
pub fn month_bounds(year: i32, month: u32) -> CoreResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(ValidationError::OutOfRange {
        field: "month".to_string(),
        min: 1,
        max: 12,
    })?;

    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .map(|d| d - Duration::days(1))
        .ok_or(ValidationError::OutOfRange {
            field: "year".to_string(),
            min: 1,
            max: 9999,
        })?;

    Ok((first, last))
}

impl CalendarMonth {
    /// Builds the grid for `year`/`month`.
    ///
    /// Rows outside the month are ignored, so callers may pass a wider set.
    pub fn build(
        year: i32,
        month: u32,
        invoices: &[Invoice],
        jobs: &[Job],
        today: NaiveDate,
    ) -> CoreResult<Self> {
        let (first, last) = month_bounds(year, month)?;

        let mut days: Vec<CalendarDay> = first
            .iter_days()
            .take_while(|d| *d <= last)
            .map(|date| CalendarDay {
                date,
                invoices_due: Vec::new(),
                jobs_scheduled: Vec::new(),
                due_pence: 0,
                has_overdue: false,
            })
            .collect();

        let day_index = |date: NaiveDate| -> Option<usize> {
            if date < first || date > last {
                None
            } else {
                Some(date.day0() as usize)
            }
        };

        for invoice in invoices {
            if matches!(invoice.status, InvoiceStatus::Draft | InvoiceStatus::Void) {
                continue;
            }
            let due = amount_due(invoice);
            if !due.is_positive() {
                continue;
            }
            let Some(idx) = day_index(invoice.due_date) else {
                continue;
            };

            let status = effective_invoice_status(invoice, today);
            let overdue = status == InvoiceStatus::Overdue;
            let day = &mut days[idx];
            day.due_pence += due.pence();
            day.has_overdue |= overdue;
            day.invoices_due.push(CalendarInvoice {
                invoice_id: invoice.id.clone(),
                invoice_number: invoice.invoice_number.clone(),
                customer_id: invoice.customer_id.clone(),
                amount_due_pence: due.pence(),
                status,
                overdue,
            });
        }

        for job in jobs {
            let Some(idx) = job.scheduled_date.and_then(day_index) else {
                continue;
            };
            days[idx].jobs_scheduled.push(CalendarJob {
                job_id: job.id.clone(),
                title: job.title.clone(),
                customer_id: job.customer_id.clone(),
                engineer_id: job.engineer_id.clone(),
            });
        }

        for day in &mut days {
            day.invoices_due
                .sort_by(|a, b| a.invoice_number.cmp(&b.invoice_number));
            day.jobs_scheduled.sort_by(|a, b| a.title.cmp(&b.title));
        }

        let total_due: Money = days.iter().map(|d| Money::from_pence(d.due_pence)).sum();
        let overdue_count = days
            .iter()
            .flat_map(|d| d.invoices_due.iter())
            .filter(|i| i.overdue)
            .count();

        Ok(CalendarMonth {
            year,
            month,
            days,
            total_due_pence: total_due.pence(),
            overdue_count,
        })
    }

    pub fn day(&self, date: NaiveDate) -> Option<&CalendarDay> {
        self.days.iter().find(|d| d.date == date)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
