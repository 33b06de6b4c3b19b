//! # parlour-core: Pure Business Logic for Parlour
//!
//! Everything the billing back office calculates lives here as pure
//! functions over already-loaded rows: line totals and VAT, document
//! numbers, customer balances, the job pipeline, the payment calendar and
//! the reports page.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Parlour Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   Browser front end (out of tree)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/server (axum)                           │   │
//! │  └──────────┬──────────────────┬───────────────────┬──────────────┘   │
//! │             │                  │                   │                   │
//! │  ┌──────────▼───────┐ ┌────────▼────────┐ ┌────────▼────────┐         │
//! │  │ ★ parlour-core ★ │ │   parlour-db    │ │  parlour-docs   │         │
//! │  │  (THIS CRATE)    │ │  SQLite / sqlx  │ │  printpdf       │         │
//! │  └──────────────────┘ └─────────────────┘ └─────────────────┘         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Customer, Job, Invoice, Quote, ...)
//! - [`money`] - Money, VAT rate and quantity types (integer arithmetic)
//! - [`totals`] - Line item, document and statement totals
//! - [`numbering`] - `INV-2026-0001` style document numbers
//! - [`balance`] - Customer account balance and invoice payment state
//! - [`pipeline`] - Job status transitions and the kanban board
//! - [`calendar`] - Payment-due calendar
//! - [`reports`] - Analytics aggregation
//! - [`reminders`] - Reminder webhook payload and mailto links
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use parlour_core::money::{Money, Quantity, VatRate};
//! use parlour_core::totals::{DocumentTotals, LineInput};
//!
//! let lines = vec![
//!     LineInput::new("Milk pump service", Quantity::from_units(1), Money::from_pence(12_000)),
//!     LineInput::new("Labour", Quantity::from_hundredths(150), Money::from_pence(4_500)),
//! ];
//!
//! let totals = DocumentTotals::from_lines(&lines, VatRate::from_bps(2000));
//! assert_eq!(totals.subtotal.pence(), 18_750);
//! assert_eq!(totals.vat.pence(), 3_750);
//! assert_eq!(totals.total.pence(), 22_500);
//! ```

pub mod balance;
pub mod calendar;
pub mod error;
pub mod money;
pub mod numbering;
pub mod pipeline;
pub mod reminders;
pub mod reports;
pub mod totals;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Quantity, VatRate};
pub use numbering::{DocumentKind, DocumentNumber};
pub use pipeline::JobStatus;
pub use types::*;

/// Default VAT rate for a fresh install (UK standard rate, 20%).
pub const DEFAULT_VAT_RATE_BPS: u32 = 2000;

/// Default payment terms for a fresh install.
pub const DEFAULT_PAYMENT_TERMS_DAYS: i64 = 30;

/// Maximum line items on a single invoice, quote or job.
pub const MAX_LINE_ITEMS: usize = 200;

/// Maximum quantity on a single line, in whole units.
pub const MAX_LINE_QUANTITY_UNITS: i64 = 10_000;
