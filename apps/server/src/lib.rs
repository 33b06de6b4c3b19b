//! # Parlour Server
//!
//! HTTP/JSON API for the Parlour back office.
//!
//! ## Route Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Public                                                                │
//! │    GET  /health                                                        │
//! │    POST /api/auth/login            POST /api/auth/register             │
//! │                                                                         │
//! │  Bearer token required                                                 │
//! │    /api/auth/me                    /api/settings                       │
//! │    /api/customers[/{id}]           /api/engineers[/{id}]               │
//! │    /api/inventory[/{id}]           /api/jobs[/{id}[/items|/status]]    │
//! │    /api/invoices[/{id}[/pdf|/remind|/mailto|/payments]]                │
//! │    /api/payments[/{id}]            /api/quotes[/{id}[/pdf|/convert]]   │
//! │    /api/statements[/{id}[/pdf]]    /api/pipeline                       │
//! │    /api/calendar                   /api/reports                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Server configuration (TOML file + environment)
//! - [`auth`] - JWT login and the auth middleware
//! - [`notifier`] - Reminder webhook with retries
//! - [`routes`] - Handlers per resource group
//! - [`error`] - API error type and status mapping

pub mod auth;
pub mod config;
pub mod error;
pub mod notifier;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,parlour=debug,sqlx=warn,tower_http=info";
