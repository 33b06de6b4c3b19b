//! # Document Inputs
//!
//! Everything a renderer needs, assembled by the caller from already
//! loaded rows. Constructors check that the customer matches the
//! document so a PDF never prints one farm's lines under another's name.

use chrono::NaiveDate;
use parlour_core::balance::{amount_due, effective_invoice_status};
use parlour_core::{
    Customer, InvoiceDetail, InvoiceStatus, Money, QuoteDetail, Settings, StatementDetail,
};

use crate::error::{DocError, DocResult};

fn check_customer(document: &str, expected: &str, customer: &Customer) -> DocResult<()> {
    if customer.id != expected {
        return Err(DocError::Invalid(format!(
            "{document} belongs to customer {expected}, got {}",
            customer.id
        )));
    }
    Ok(())
}

// =============================================================================
// Invoice
// =============================================================================

/// An invoice ready to print.
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    pub detail: InvoiceDetail,
    pub customer: Customer,
    pub settings: Settings,
    /// Status as of the render date, so an unpaid invoice past its due
    /// date prints as overdue.
    pub status: InvoiceStatus,
}

impl InvoiceDocument {
    pub fn new(
        detail: InvoiceDetail,
        customer: Customer,
        settings: Settings,
        today: NaiveDate,
    ) -> DocResult<Self> {
        check_customer("Invoice", &detail.invoice.customer_id, &customer)?;
        let status = effective_invoice_status(&detail.invoice, today);
        Ok(InvoiceDocument {
            detail,
            customer,
            settings,
            status,
        })
    }

    pub fn amount_due(&self) -> Money {
        amount_due(&self.detail.invoice)
    }

    /// `INV-2026-0001.pdf`
    pub fn file_name(&self) -> String {
        format!("{}.pdf", self.detail.invoice.invoice_number)
    }
}

// =============================================================================
// Quote
// =============================================================================

/// A quote ready to print.
#[derive(Debug, Clone)]
pub struct QuoteDocument {
    pub detail: QuoteDetail,
    pub customer: Customer,
    pub settings: Settings,
}

impl QuoteDocument {
    pub fn new(detail: QuoteDetail, customer: Customer, settings: Settings) -> DocResult<Self> {
        check_customer("Quote", &detail.quote.customer_id, &customer)?;
        Ok(QuoteDocument {
            detail,
            customer,
            settings,
        })
    }

    pub fn file_name(&self) -> String {
        format!("{}.pdf", self.detail.quote.quote_number)
    }
}

// =============================================================================
// Statement
// =============================================================================

/// A job statement ready to print.
#[derive(Debug, Clone)]
pub struct StatementDocument {
    pub detail: StatementDetail,
    pub customer: Customer,
    pub settings: Settings,
    /// Title of the job the statement was taken from, when it still exists.
    pub job_title: Option<String>,
}

impl StatementDocument {
    pub fn new(
        detail: StatementDetail,
        customer: Customer,
        settings: Settings,
        job_title: Option<String>,
    ) -> DocResult<Self> {
        check_customer("Statement", &detail.statement.customer_id, &customer)?;
        Ok(StatementDocument {
            detail,
            customer,
            settings,
            job_title,
        })
    }

    pub fn file_name(&self) -> String {
        format!("{}.pdf", self.detail.statement.statement_number)
    }
}
