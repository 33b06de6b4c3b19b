//! # Reports
//!
//! Aggregates behind the reports page. Everything is computed in memory
//! from rows the caller has already loaded for the date range.
//!
//! ## Summary Contents
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Headline       invoiced · collected · outstanding · overdue            │
//! │  Revenue        invoiced and collected per calendar month               │
//! │  Jobs           count per status, average completed job value           │
//! │  Customers      top N by invoiced value                                 │
//! │  Parts          top N by quantity used on jobs                          │
//! │  Stock          items at or below their reorder level                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::balance::{amount_due, effective_invoice_status};
use crate::money::{Money, Quantity};
use crate::pipeline::JobStatus;
use crate::types::{Customer, InventoryItem, Invoice, InvoiceStatus, Job, JobItem, LineKind, Payment};

/// Entries kept in the "top" lists.
pub const TOP_N: usize = 5;

// =============================================================================
// Range
// =============================================================================

/// Inclusive date range a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReportRange {
    #[ts(as = "String")]
    pub from: NaiveDate,
    #[ts(as = "String")]
    pub to: NaiveDate,
}

impl ReportRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            ReportRange { from, to }
        } else {
            ReportRange { from: to, to: from }
        }
    }

    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }
}

// =============================================================================
// Summary
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MonthlyRevenue {
    /// `YYYY-MM`
    pub month: String,
    pub invoiced_pence: i64,
    pub collected_pence: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StatusCount {
    pub status: JobStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerRevenue {
    pub customer_id: String,
    pub customer_name: String,
    pub invoiced_pence: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PartUsage {
    pub inventory_item_id: String,
    pub part_number: String,
    pub name: String,
    pub quantity_hundredths: i64,
    pub revenue_pence: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LowStockItem {
    pub inventory_item_id: String,
    pub part_number: String,
    pub name: String,
    pub quantity_in_stock: i64,
    pub reorder_level: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReportSummary {
    pub range: ReportRange,
    pub total_invoiced_pence: i64,
    pub total_collected_pence: i64,
    pub outstanding_pence: i64,
    pub overdue_pence: i64,
    pub overdue_count: usize,
    pub revenue_by_month: Vec<MonthlyRevenue>,
    pub jobs_by_status: Vec<StatusCount>,
    pub average_job_value_pence: i64,
    pub top_customers: Vec<CustomerRevenue>,
    pub top_parts: Vec<PartUsage>,
    pub low_stock: Vec<LowStockItem>,
}

/// Rows a report is built from.
///
/// Invoices and jobs are filtered to the range here; `job_items` should
/// belong to the supplied jobs.
pub struct ReportInput<'a> {
    pub invoices: &'a [Invoice],
    pub payments: &'a [Payment],
    pub jobs: &'a [Job],
    pub job_items: &'a [JobItem],
    pub customers: &'a [Customer],
    pub inventory: &'a [InventoryItem],
}

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

impl ReportSummary {
    pub fn build(range: ReportRange, input: &ReportInput<'_>, today: NaiveDate) -> Self {
        let invoices: Vec<&Invoice> = input
            .invoices
            .iter()
            .filter(|i| !matches!(i.status, InvoiceStatus::Draft | InvoiceStatus::Void))
            .filter(|i| range.contains(i.issue_date))
            .collect();

        let payments: Vec<&Payment> = input
            .payments
            .iter()
            .filter(|p| range.contains(p.paid_on))
            .collect();

        // Headline figures
        let total_invoiced: Money = invoices.iter().map(|i| i.total()).sum();
        let total_collected: Money = payments.iter().map(|p| Money::from_pence(p.amount_pence)).sum();
        let outstanding: Money = invoices.iter().map(|i| amount_due(i)).sum();

        let overdue: Vec<&&Invoice> = invoices
            .iter()
            .filter(|i| effective_invoice_status(i, today) == InvoiceStatus::Overdue)
            .collect();
        let overdue_total: Money = overdue.iter().map(|i| amount_due(i)).sum();

        // Revenue by month
        let mut months: BTreeMap<String, (Money, Money)> = BTreeMap::new();
        for invoice in &invoices {
            months.entry(month_key(invoice.issue_date)).or_default().0 += invoice.total();
        }
        for payment in &payments {
            months.entry(month_key(payment.paid_on)).or_default().1 +=
                Money::from_pence(payment.amount_pence);
        }
        let revenue_by_month = months
            .into_iter()
            .map(|(month, (invoiced, collected))| MonthlyRevenue {
                month,
                invoiced_pence: invoiced.pence(),
                collected_pence: collected.pence(),
            })
            .collect();

        // Jobs in range, by creation date
        let jobs: Vec<&Job> = input
            .jobs
            .iter()
            .filter(|j| range.contains(j.created_at.date_naive()))
            .collect();

        let jobs_by_status = JobStatus::ALL
            .iter()
            .map(|status| StatusCount {
                status: *status,
                count: jobs.iter().filter(|j| j.status == *status).count(),
            })
            .collect();

        let completed: Vec<&&Job> = jobs
            .iter()
            .filter(|j| j.status.counts_toward_balance())
            .collect();
        let average_job_value = if completed.is_empty() {
            0
        } else {
            let sum: Money = completed.iter().map(|j| j.total()).sum();
            sum.pence() / completed.len() as i64
        };

        // Top customers
        let names: HashMap<&str, &str> = input
            .customers
            .iter()
            .map(|c| (c.id.as_str(), c.name.as_str()))
            .collect();
        let mut by_customer: HashMap<&str, Money> = HashMap::new();
        for invoice in &invoices {
            *by_customer.entry(invoice.customer_id.as_str()).or_default() += invoice.total();
        }
        let mut top_customers: Vec<CustomerRevenue> = by_customer
            .into_iter()
            .map(|(id, total)| CustomerRevenue {
                customer_id: id.to_string(),
                customer_name: names.get(id).copied().unwrap_or("Unknown").to_string(),
                invoiced_pence: total.pence(),
            })
            .collect();
        top_customers.sort_by(|a, b| {
            b.invoiced_pence
                .cmp(&a.invoiced_pence)
                .then_with(|| a.customer_name.cmp(&b.customer_name))
        });
        top_customers.truncate(TOP_N);

        // Top parts
        let job_ids: std::collections::HashSet<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
        let mut by_part: HashMap<&str, (Quantity, Money)> = HashMap::new();
        for item in input
            .job_items
            .iter()
            .filter(|i| i.kind == LineKind::Part && job_ids.contains(i.job_id.as_str()))
        {
            if let Some(part_id) = item.inventory_item_id.as_deref() {
                let entry = by_part
                    .entry(part_id)
                    .or_insert((Quantity::from_hundredths(0), Money::zero()));
                entry.0 = entry.0 + item.quantity();
                entry.1 += item.line_total();
            }
        }
        let parts: HashMap<&str, &InventoryItem> =
            input.inventory.iter().map(|p| (p.id.as_str(), p)).collect();
        let mut top_parts: Vec<PartUsage> = by_part
            .into_iter()
            .map(|(id, (qty, revenue))| {
                let part = parts.get(id);
                PartUsage {
                    inventory_item_id: id.to_string(),
                    part_number: part.map(|p| p.part_number.clone()).unwrap_or_default(),
                    name: part
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| "Deleted part".to_string()),
                    quantity_hundredths: qty.hundredths(),
                    revenue_pence: revenue.pence(),
                }
            })
            .collect();
        top_parts.sort_by(|a, b| {
            b.quantity_hundredths
                .cmp(&a.quantity_hundredths)
                .then_with(|| a.part_number.cmp(&b.part_number))
        });
        top_parts.truncate(TOP_N);

        // Stock
        let mut low_stock: Vec<LowStockItem> = input
            .inventory
            .iter()
            .filter(|p| p.is_low_stock())
            .map(|p| LowStockItem {
                inventory_item_id: p.id.clone(),
                part_number: p.part_number.clone(),
                name: p.name.clone(),
                quantity_in_stock: p.quantity_in_stock,
                reorder_level: p.reorder_level,
            })
            .collect();
        low_stock.sort_by(|a, b| a.part_number.cmp(&b.part_number));

        ReportSummary {
            range,
            total_invoiced_pence: total_invoiced.pence(),
            total_collected_pence: total_collected.pence(),
            outstanding_pence: outstanding.pence(),
            overdue_pence: overdue_total.pence(),
            overdue_count: overdue.len(),
            revenue_by_month,
            jobs_by_status,
            average_job_value_pence: average_job_value,
            top_customers,
            top_parts,
            low_stock,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn customer(id: &str, name: &str) -> Customer {
        let now = Utc::now();
        Customer {
            id: id.to_string(),
            name: name.to_string(),
            contact_name: None,
            email: None,
            phone: None,
            address_line1: None,
            address_line2: None,
            town: None,
            postcode: None,
            notes: None,
            account_balance_pence: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn invoice(customer: &str, issued: NaiveDate, status: InvoiceStatus, total: i64, paid: i64) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: uuid::Uuid::new_v4().to_string(),
            invoice_number: "INV".to_string(),
            customer_id: customer.to_string(),
            job_id: None,
            status,
            issue_date: issued,
            due_date: issued + chrono::Duration::days(30),
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

    fn payment(amount: i64, on: NaiveDate) -> Payment {
        Payment {
            id: uuid::Uuid::new_v4().to_string(),
            invoice_id: "x".to_string(),
            amount_pence: amount,
            method: PaymentMethod::BankTransfer,
            paid_on: on,
            reference: None,
            created_at: Utc::now(),
        }
    }

    fn job(id: &str, status: JobStatus, total: i64) -> Job {
        let created = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
        Job {
            id: id.to_string(),
            customer_id: "a".to_string(),
            engineer_id: None,
            quote_id: None,
            title: id.to_string(),
            description: None,
            status,
            scheduled_date: None,
            completed_date: None,
            subtotal_pence: total,
            vat_pence: 0,
            total_pence: total,
            notes: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn part(id: &str, number: &str, stock: i64, reorder: i64) -> InventoryItem {
        let now = Utc::now();
        InventoryItem {
            id: id.to_string(),
            part_number: number.to_string(),
            name: format!("Part {number}"),
            description: None,
            unit_price_pence: 1000,
            cost_price_pence: None,
            quantity_in_stock: stock,
            reorder_level: reorder,
            location: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn part_line(job_id: &str, part_id: &str, qty: i64) -> JobItem {
        JobItem {
            id: uuid::Uuid::new_v4().to_string(),
            job_id: job_id.to_string(),
            inventory_item_id: Some(part_id.to_string()),
            kind: LineKind::Part,
            description: "part".to_string(),
            quantity_hundredths: qty,
            unit_price_pence: 1000,
            line_total_pence: qty * 10,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_headline_and_months() {
        let range = ReportRange::new(date(2026, 1, 1), date(2026, 3, 31));
        let invoices = vec![
            invoice("a", date(2026, 1, 10), InvoiceStatus::Paid, 10_000, 10_000),
            invoice("b", date(2026, 2, 1), InvoiceStatus::Sent, 4_000, 0),
            invoice("a", date(2026, 2, 20), InvoiceStatus::PartiallyPaid, 6_000, 1_000),
            invoice("b", date(2026, 2, 21), InvoiceStatus::Draft, 99_000, 0),
            invoice("b", date(2025, 12, 31), InvoiceStatus::Sent, 50_000, 0),
        ];
        let payments = vec![
            payment(10_000, date(2026, 1, 20)),
            payment(1_000, date(2026, 3, 1)),
            payment(7_000, date(2025, 12, 1)),
        ];
        let customers = vec![customer("a", "Hill Farm"), customer("b", "Brook Dairy")];

        let input = ReportInput {
            invoices: &invoices,
            payments: &payments,
            jobs: &[],
            job_items: &[],
            customers: &customers,
            inventory: &[],
        };
        let report = ReportSummary::build(range, &input, date(2026, 3, 15));

        assert_eq!(report.total_invoiced_pence, 20_000);
        assert_eq!(report.total_collected_pence, 11_000);
        assert_eq!(report.outstanding_pence, 9_000);
        // Feb 1 invoice is due Mar 3, overdue on Mar 15; Feb 20 one is not yet
        assert_eq!(report.overdue_count, 1);
        assert_eq!(report.overdue_pence, 4_000);

        let months: Vec<&str> = report.revenue_by_month.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2026-01", "2026-02", "2026-03"]);
        assert_eq!(report.revenue_by_month[1].invoiced_pence, 10_000);
        assert_eq!(report.revenue_by_month[2].collected_pence, 1_000);

        assert_eq!(report.top_customers[0].customer_name, "Hill Farm");
        assert_eq!(report.top_customers[0].invoiced_pence, 16_000);
    }

    #[test]
    fn test_summary_jobs_parts_and_stock() {
        let range = ReportRange::new(date(2026, 1, 31), date(2026, 1, 1));
        assert_eq!(range.from, date(2026, 1, 1));

        let jobs = vec![
            job("j1", JobStatus::Completed, 10_000),
            job("j2", JobStatus::Invoiced, 20_000),
            job("j3", JobStatus::Pending, 0),
        ];
        let items = vec![
            part_line("j1", "p1", 200),
            part_line("j2", "p1", 100),
            part_line("j2", "p2", 500),
            part_line("other-job", "p1", 10_000),
        ];
        let inventory = vec![part("p1", "CL-100", 2, 5), part("p2", "VP-200", 40, 5)];

        let input = ReportInput {
            invoices: &[],
            payments: &[],
            jobs: &jobs,
            job_items: &items,
            customers: &[],
            inventory: &inventory,
        };
        let report = ReportSummary::build(range, &input, date(2026, 2, 1));

        let completed = report
            .jobs_by_status
            .iter()
            .find(|s| s.status == JobStatus::Completed)
            .unwrap();
        assert_eq!(completed.count, 1);
        assert_eq!(report.average_job_value_pence, 15_000);

        assert_eq!(report.top_parts[0].part_number, "VP-200");
        assert_eq!(report.top_parts[1].quantity_hundredths, 300);

        assert_eq!(report.low_stock.len(), 1);
        assert_eq!(report.low_stock[0].part_number, "CL-100");
    }
}
