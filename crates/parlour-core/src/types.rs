//! # Domain Types
//!
//! Entities stored by Parlour and the input shapes used to create them.
//!
//! ## Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Customer ◄──── Job ◄──── JobItem ────► InventoryItem                  │
//! │     ▲  ▲         ▲  │                                                   │
//! │     │  │         │  └───► Engineer                                      │
//! │     │  │         │                                                      │
//! │     │  └──── Invoice ◄──── InvoiceItem                                 │
//! │     │         ▲                                                         │
//! │     │         └──── Payment                                            │
//! │     │                                                                   │
//! │     ├──── Quote ◄──── QuoteItem      (accepted quote ──► Job)          │
//! │     └──── Statement ◄──── StatementItem   (snapshot of a Job)          │
//! │                                                                         │
//! │  Settings (single row)          User (back-office login)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - `id`: UUID v4 string
//! - money columns end in `_pence`, quantities in `_hundredths`
//! - documents carry a business number (`invoice_number`, ...) next to `id`

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Quantity, VatRate};
use crate::pipeline::JobStatus;

// =============================================================================
// Customer
// =============================================================================

/// A farm or dairy the business services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub town: Option<String>,
    pub postcode: Option<String>,
    pub notes: Option<String>,
    /// Denormalised; see [`crate::balance`] for the formula.
    pub account_balance_pence: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    #[inline]
    pub fn account_balance(&self) -> Money {
        Money::from_pence(self.account_balance_pence)
    }

    /// Address lines that are present, in print order.
    pub fn address_lines(&self) -> Vec<String> {
        [
            &self.address_line1,
            &self.address_line2,
            &self.town,
            &self.postcode,
        ]
        .iter()
        .filter_map(|line| line.as_deref())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// A stocked part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryItem {
    pub id: String,
    /// Business identifier, unique.
    pub part_number: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_price_pence: i64,
    pub cost_price_pence: Option<i64>,
    pub quantity_in_stock: i64,
    pub reorder_level: i64,
    pub location: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_pence(self.unit_price_pence)
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity_in_stock <= self.reorder_level
    }
}

// =============================================================================
// Engineer
// =============================================================================

/// A member of the field team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Engineer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub hourly_rate_pence: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Line Kind
// =============================================================================

/// What a job or statement line is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum LineKind {
    Part,
    Labour,
    Other,
}

impl LineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineKind::Part => "part",
            LineKind::Labour => "labour",
            LineKind::Other => "other",
        }
    }
}

impl Default for LineKind {
    fn default() -> Self {
        LineKind::Other
    }
}

// =============================================================================
// Job
// =============================================================================

/// A scheduled or completed service visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Job {
    pub id: String,
    pub customer_id: String,
    pub engineer_id: Option<String>,
    /// Set when the job was created from an accepted quote.
    pub quote_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: JobStatus,
    #[ts(as = "Option<String>")]
    pub scheduled_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub completed_date: Option<NaiveDate>,
    pub subtotal_pence: i64,
    pub vat_pence: i64,
    pub total_pence: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Job {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_pence(self.total_pence)
    }
}

/// A part, labour or sundry line on a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct JobItem {
    pub id: String,
    pub job_id: String,
    pub inventory_item_id: Option<String>,
    pub kind: LineKind,
    pub description: String,
    pub quantity_hundredths: i64,
    pub unit_price_pence: i64,
    pub line_total_pence: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl JobItem {
    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_hundredths(self.quantity_hundredths)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_pence(self.line_total_pence)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    pub items: Vec<JobItem>,
}

// =============================================================================
// Invoice
// =============================================================================

/// Stored invoice status. `Overdue` is derived at read time, see
/// [`crate::balance::effective_invoice_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum InvoiceStatus {
    Draft,
    Sent,
    PartiallyPaid,
    Paid,
    Overdue,
    Void,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Void => "void",
        }
    }

    /// True when money may still be owed on the invoice.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Sent | InvoiceStatus::PartiallyPaid | InvoiceStatus::Overdue
        )
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Draft
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tax invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub customer_id: String,
    /// None for a standalone invoice.
    pub job_id: Option<String>,
    pub status: InvoiceStatus,
    #[ts(as = "String")]
    pub issue_date: NaiveDate,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub subtotal_pence: i64,
    pub vat_pence: i64,
    pub vat_rate_bps: u32,
    pub total_pence: i64,
    pub amount_paid_pence: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_pence(self.total_pence)
    }

    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_pence(self.amount_paid_pence)
    }

    #[inline]
    pub fn is_standalone(&self) -> bool {
        self.job_id.is_none()
    }
}

/// A line on an invoice or quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    pub description: String,
    pub quantity_hundredths: i64,
    pub unit_price_pence: i64,
    pub line_total_pence: i64,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
    pub payments: Vec<Payment>,
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Cheque,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Card => "card",
            PaymentMethod::Cheque => "cheque",
        }
    }
}

/// Money received against an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub invoice_id: String,
    pub amount_pence: i64,
    pub method: PaymentMethod,
    #[ts(as = "String")]
    pub paid_on: NaiveDate,
    pub reference: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Quote
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Declined,
    Expired,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "draft",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Accepted => "accepted",
            QuoteStatus::Declined => "declined",
            QuoteStatus::Expired => "expired",
        }
    }

    /// Allowed status changes for a quote.
    pub fn can_become(&self, next: QuoteStatus) -> bool {
        use QuoteStatus::*;
        match (self, next) {
            (a, b) if *a == b => true,
            (Draft, Sent) => true,
            (Draft | Sent, Accepted | Declined | Expired) => true,
            (Declined | Expired, Draft) => true,
            _ => false,
        }
    }
}

impl Default for QuoteStatus {
    fn default() -> Self {
        QuoteStatus::Draft
    }
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A priced proposal for work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Quote {
    pub id: String,
    pub quote_number: String,
    pub customer_id: String,
    pub status: QuoteStatus,
    #[ts(as = "String")]
    pub issue_date: NaiveDate,
    #[ts(as = "String")]
    pub valid_until: NaiveDate,
    pub subtotal_pence: i64,
    pub vat_pence: i64,
    pub vat_rate_bps: u32,
    pub total_pence: i64,
    pub notes: Option<String>,
    /// Set once the quote has been converted into a job.
    pub job_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QuoteItem {
    pub id: String,
    pub quote_id: String,
    pub description: String,
    pub quantity_hundredths: i64,
    pub unit_price_pence: i64,
    pub line_total_pence: i64,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QuoteDetail {
    #[serde(flatten)]
    pub quote: Quote,
    pub items: Vec<QuoteItem>,
}

// =============================================================================
// Statement
// =============================================================================

/// A parts/labour breakdown of a job. Not a tax invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Statement {
    pub id: String,
    pub statement_number: String,
    pub customer_id: String,
    pub job_id: String,
    #[ts(as = "String")]
    pub issue_date: NaiveDate,
    pub parts_total_pence: i64,
    pub labour_total_pence: i64,
    pub other_total_pence: i64,
    pub subtotal_pence: i64,
    pub vat_pence: i64,
    pub vat_rate_bps: u32,
    pub total_pence: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Snapshot of a job line at the time the statement was generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StatementItem {
    pub id: String,
    pub statement_id: String,
    pub kind: LineKind,
    pub description: String,
    pub quantity_hundredths: i64,
    pub unit_price_pence: i64,
    pub line_total_pence: i64,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StatementDetail {
    #[serde(flatten)]
    pub statement: Statement,
    pub items: Vec<StatementItem>,
}

// =============================================================================
// Settings
// =============================================================================

/// Company-wide settings. Exactly one row exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Settings {
    pub company_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub vat_number: Option<String>,
    pub vat_rate_bps: u32,
    pub default_labour_rate_pence: i64,
    pub payment_terms_days: i64,
    pub bank_name: Option<String>,
    pub sort_code: Option<String>,
    pub account_number: Option<String>,
    pub invoice_prefix: String,
    pub quote_prefix: String,
    pub statement_prefix: String,
    /// Outbound URL that receives invoice reminder payloads.
    pub reminder_webhook_url: Option<String>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Settings {
    #[inline]
    pub fn vat_rate(&self) -> VatRate {
        VatRate::from_bps(self.vat_rate_bps)
    }
}

// =============================================================================
// User
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum UserRole {
    Admin,
    Staff,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Staff => "staff",
        }
    }
}

/// A back-office login. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Inputs
// =============================================================================
// Request shapes for create/update operations. Validation lives in
// `crate::validation`.

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerInput {
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub town: Option<String>,
    pub postcode: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryItemInput {
    pub part_number: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_price_pence: i64,
    pub cost_price_pence: Option<i64>,
    #[serde(default)]
    pub quantity_in_stock: i64,
    #[serde(default)]
    pub reorder_level: i64,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EngineerInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub hourly_rate_pence: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct JobInput {
    pub customer_id: String,
    pub engineer_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    #[ts(as = "Option<String>")]
    pub scheduled_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// A line to add to a job.
///
/// When `inventory_item_id` is set, `description` and `unit_price_pence`
/// default to the part's name and price.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct JobItemInput {
    pub inventory_item_id: Option<String>,
    #[serde(default)]
    pub kind: LineKind,
    pub description: Option<String>,
    pub quantity_hundredths: i64,
    pub unit_price_pence: Option<i64>,
}

/// A priced line on an invoice or quote.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DocumentLineInput {
    pub description: String,
    pub quantity_hundredths: i64,
    pub unit_price_pence: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceInput {
    pub customer_id: String,
    pub job_id: Option<String>,
    /// Defaults to today.
    #[ts(as = "Option<String>")]
    pub issue_date: Option<NaiveDate>,
    /// Defaults to issue date + payment terms.
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub items: Vec<DocumentLineInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QuoteInput {
    pub customer_id: String,
    #[ts(as = "Option<String>")]
    pub issue_date: Option<NaiveDate>,
    /// Defaults to issue date + 30 days.
    #[ts(as = "Option<String>")]
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    pub items: Vec<DocumentLineInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentInput {
    pub amount_pence: i64,
    pub method: PaymentMethod,
    /// Defaults to today.
    #[ts(as = "Option<String>")]
    pub paid_on: Option<NaiveDate>,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SettingsInput {
    pub company_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub vat_number: Option<String>,
    pub vat_rate_bps: u32,
    pub default_labour_rate_pence: i64,
    pub payment_terms_days: i64,
    pub bank_name: Option<String>,
    pub sort_code: Option<String>,
    pub account_number: Option<String>,
    pub invoice_prefix: String,
    pub quote_prefix: String,
    pub statement_prefix: String,
    pub reminder_webhook_url: Option<String>,
}

impl From<Settings> for SettingsInput {
    fn from(s: Settings) -> Self {
        SettingsInput {
            company_name: s.company_name,
            address: s.address,
            phone: s.phone,
            email: s.email,
            vat_number: s.vat_number,
            vat_rate_bps: s.vat_rate_bps,
            default_labour_rate_pence: s.default_labour_rate_pence,
            payment_terms_days: s.payment_terms_days,
            bank_name: s.bank_name,
            sort_code: s.sort_code,
            account_number: s.account_number,
            invoice_prefix: s.invoice_prefix,
            quote_prefix: s.quote_prefix,
            statement_prefix: s.statement_prefix,
            reminder_webhook_url: s.reminder_webhook_url,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_lines_skip_blanks() {
        let now = Utc::now();
        let customer = Customer {
            id: "c1".to_string(),
            name: "Hill Farm".to_string(),
            contact_name: None,
            email: None,
            phone: None,
            address_line1: Some("Hill Farm".to_string()),
            address_line2: Some("  ".to_string()),
            town: Some("Carmarthen".to_string()),
            postcode: Some("SA31 1AA".to_string()),
            notes: None,
            account_balance_pence: 0,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(
            customer.address_lines(),
            vec!["Hill Farm", "Carmarthen", "SA31 1AA"]
        );
    }

    #[test]
    fn test_quote_status_rules() {
        assert!(QuoteStatus::Draft.can_become(QuoteStatus::Sent));
        assert!(QuoteStatus::Sent.can_become(QuoteStatus::Accepted));
        assert!(QuoteStatus::Declined.can_become(QuoteStatus::Draft));
        assert!(!QuoteStatus::Accepted.can_become(QuoteStatus::Draft));
        assert!(!QuoteStatus::Sent.can_become(QuoteStatus::Draft));
    }

    #[test]
    fn test_invoice_status_open() {
        assert!(InvoiceStatus::Sent.is_open());
        assert!(InvoiceStatus::PartiallyPaid.is_open());
        assert!(!InvoiceStatus::Draft.is_open());
        assert!(!InvoiceStatus::Paid.is_open());
        assert!(!InvoiceStatus::Void.is_open());
    }

    #[test]
    fn test_invoice_json_is_camel_case() {
        let now = Utc::now();
        let invoice = Invoice {
            id: "i1".to_string(),
            invoice_number: "INV-2026-0001".to_string(),
            customer_id: "c1".to_string(),
            job_id: None,
            status: InvoiceStatus::PartiallyPaid,
            issue_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 2, 4).unwrap(),
            subtotal_pence: 1000,
            vat_pence: 200,
            vat_rate_bps: 2000,
            total_pence: 1200,
            amount_paid_pence: 200,
            notes: None,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&invoice).unwrap();
        assert_eq!(json["invoiceNumber"], "INV-2026-0001");
        assert_eq!(json["status"], "partially_paid");
        assert_eq!(json["dueDate"], "2026-02-04");
    }
}
