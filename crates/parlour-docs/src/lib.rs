//! # parlour-docs: Printable Documents for Parlour
//!
//! Renders invoices, quotes and job statements as A4 PDFs using the
//! built-in Helvetica faces, so no font files ship with the server.
//!
//! ## Rendering Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET /api/invoices/{id}/pdf                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  parlour-db loads InvoiceDetail + Customer + Settings                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  InvoiceDocument::new(..)         (document.rs)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  render_invoice(&doc)             (render.rs)                           │
//! │       │   header → parties → line table → totals → bank details         │
//! │       ▼                                                                 │
//! │  PageWriter                       (layout.rs)                           │
//! │       │   cursor, page breaks, repeated table header, footer            │
//! │       ▼                                                                 │
//! │  Vec<u8> (application/pdf)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`document`] - Input values for each document kind
//! - [`render`] - Document layouts
//! - [`error`] - Error types
//!
//! Amounts print as plain decimals with the currency named in column
//! headings, since the built-in fonts carry no pound sign.

pub mod document;
pub mod error;
mod layout;
pub mod render;

pub use document::{InvoiceDocument, QuoteDocument, StatementDocument};
pub use error::{DocError, DocResult};
pub use render::{render_invoice, render_quote, render_statement};

/// MIME type of everything this crate produces.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
