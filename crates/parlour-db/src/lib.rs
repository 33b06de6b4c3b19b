//! # parlour-db
//!
//! SQLite storage for the Parlour back office. Every write that touches
//! more than one table (stock and job lines, invoice numbers, payments and
//! invoice status) runs in a single sqlx transaction inside its repository,
//! so handlers never hold a transaction themselves.
//!
//! ```text
//!   Database ─┬─ customers()   inventory()   engineers()
//!   (pool.rs) ├─ jobs()        invoices()    payments()
//!             ├─ quotes()      statements()  sequences()
//!             └─ settings()    users()
//! ```
//!
//! ```rust,ignore
//! use parlour_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("parlour.db")).await?;
//! let job = db.jobs().set_status(&job_id, JobStatus::Completed).await?;
//! let invoice = db.invoices().create_from_job(&job.id).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod password;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{
    CustomerRepository, EngineerRepository, InventoryRepository, InvoiceFilter,
    InvoiceRepository, JobFilter, JobRepository, PaymentFilter, PaymentRepository, QuoteFilter,
    QuoteRepository, SequenceRepository, SettingsRepository, StatementRepository, UserRepository,
};
