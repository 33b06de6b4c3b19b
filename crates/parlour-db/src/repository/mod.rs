//! # Repository Module
//!
//! Database repository implementations for Parlour.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  axum handler                                                           │
//! │       │                                                                 │
//! │       │  state.db.invoices().create_from_job(&job_id)                  │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                     │
//! │  ├── BEGIN IMMEDIATE                                                   │
//! │  ├── allocate INV-2026-0042        (sequence.rs)                       │
//! │  ├── copy job lines, compute totals (parlour-core::totals)             │
//! │  ├── job → Invoiced                (parlour-core::pipeline)            │
//! │  ├── recompute customer balance    (customer.rs)                       │
//! │  └── COMMIT                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Multi-row writes happen on a single transaction. Helpers that run inside
//! a transaction take `&mut SqliteConnection` and never touch the pool: an
//! in-memory database has exactly one connection and would deadlock.
//!
//! ## Available Repositories
//!
//! - [`CustomerRepository`] - Customers and account balances
//! - [`InventoryRepository`] - Parts and stock levels
//! - [`EngineerRepository`] - Field team
//! - [`JobRepository`] - Jobs, job lines and status changes
//! - [`InvoiceRepository`] - Invoices and invoice lines
//! - [`PaymentRepository`] - Payments against invoices
//! - [`QuoteRepository`] - Quotes and conversion to jobs
//! - [`StatementRepository`] - Job statements
//! - [`SettingsRepository`] - Company settings
//! - [`UserRepository`] - Back-office logins
//! - [`SequenceRepository`] - Document number allocation

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::DbResult;

pub mod customer;
pub mod engineer;
pub mod inventory;
pub mod invoice;
pub mod job;
pub mod payment;
pub mod quote;
pub mod sequence;
pub mod settings;
pub mod statement;
pub mod user;

pub use customer::CustomerRepository;
pub use engineer::EngineerRepository;
pub use inventory::InventoryRepository;
pub use invoice::{InvoiceFilter, InvoiceRepository};
pub use job::{JobFilter, JobRepository};
pub use payment::{PaymentFilter, PaymentRepository};
pub use quote::{QuoteFilter, QuoteRepository};
pub use sequence::SequenceRepository;
pub use settings::SettingsRepository;
pub use statement::StatementRepository;
pub use user::UserRepository;

/// Trims an optional text field, mapping blank to `None`.
pub(crate) fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `%term%` for a LIKE search, with LIKE wildcards in the term escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Opens a write transaction that takes SQLite's write lock up front.
///
/// A plain `BEGIN` starts as a reader and upgrades on its first write; if
/// another connection wrote in between, the upgrade fails at once with
/// `SQLITE_BUSY` and `busy_timeout` never applies. `BEGIN IMMEDIATE` waits
/// for the lock instead, so concurrent writers queue.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Test Support
// =============================================================================
