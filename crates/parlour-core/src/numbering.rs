//! # Document Numbering
//!
//! Business numbers for invoices, quotes and statements.
//!
//! ## Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   INV-2026-0042                                                         │
//! │   ─┬─ ─┬── ─┬──                                                         │
//! │    │   │    └── sequence, zero padded to 4, grows past 9999             │
//! │    │   └─────── calendar year of issue                                  │
//! │    └─────────── prefix from Settings (INV / QUO / STM by default)       │
//! │                                                                         │
//! │   Sequence restarts at 0001 every year.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Allocation of the *next* number is done atomically by the database
//! (`parlour-db` sequences). [`next_document_number`] computes the same
//! value from the last issued number and backs the "next number" preview.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// Minimum digits in the sequence part.
pub const SEQUENCE_WIDTH: usize = 4;

// =============================================================================
// Document Kind
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DocumentKind {
    Invoice,
    Quote,
    Statement,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Quote => "quote",
            DocumentKind::Statement => "statement",
        }
    }

    /// Prefix used when Settings leaves it blank.
    pub fn default_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "INV",
            DocumentKind::Quote => "QUO",
            DocumentKind::Statement => "STM",
        }
    }

    /// Title printed on the document.
    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "Invoice",
            DocumentKind::Quote => "Quote",
            DocumentKind::Statement => "Statement",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Document Number
// =============================================================================

/// A parsed `PREFIX-YYYY-NNNN` number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentNumber {
    pub prefix: String,
    pub year: i32,
    pub sequence: u32,
}

impl DocumentNumber {
    pub fn new(prefix: impl Into<String>, year: i32, sequence: u32) -> Self {
        DocumentNumber {
            prefix: prefix.into(),
            year,
            sequence,
        }
    }

    /// Parses a document number.
    ///
    /// The prefix may itself contain dashes (`ACME-INV-2026-0001`); the year
    /// and sequence are always the last two segments.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let malformed = || CoreError::MalformedDocumentNumber(s.to_string());

        let mut parts = s.trim().rsplitn(3, '-');
        let sequence = parts.next().ok_or_else(malformed)?;
        let year = parts.next().ok_or_else(malformed)?;
        let prefix = parts.next().ok_or_else(malformed)?;

        if prefix.is_empty()
            || year.len() != 4
            || sequence.is_empty()
            || !year.bytes().all(|b| b.is_ascii_digit())
            || !sequence.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed());
        }

        Ok(DocumentNumber {
            prefix: prefix.to_string(),
            year: year.parse().map_err(|_| malformed())?,
            sequence: sequence.parse().map_err(|_| malformed())?,
        })
    }

    pub fn format(&self) -> String {
        format_document_number(&self.prefix, self.year, self.sequence)
    }

    /// The number that follows this one.
    pub fn next(&self) -> Self {
        DocumentNumber {
            prefix: self.prefix.clone(),
            year: self.year,
            sequence: self.sequence + 1,
        }
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for DocumentNumber {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentNumber::parse(s)
    }
}

/// Formats a number from its parts.
///
/// ```rust
/// use parlour_core::numbering::format_document_number;
///
/// assert_eq!(format_document_number("INV", 2026, 7), "INV-2026-0007");
/// assert_eq!(format_document_number("INV", 2026, 12345), "INV-2026-12345");
/// ```
pub fn format_document_number(prefix: &str, year: i32, sequence: u32) -> String {
    format!(
        "{}-{}-{:0width$}",
        prefix,
        year,
        sequence,
        width = SEQUENCE_WIDTH
    )
}

/// Computes the number after `last` for `prefix` in `year`.
///
/// Starts again at 0001 when there is no previous number, when it cannot be
/// parsed, or when it belongs to a different year or prefix.
pub fn next_document_number(prefix: &str, year: i32, last: Option<&str>) -> String {
    let next_sequence = last
        .and_then(|s| DocumentNumber::parse(s).ok())
        .filter(|n| n.year == year && n.prefix == prefix)
        .map(|n| n.sequence + 1)
        .unwrap_or(1);

    format_document_number(prefix, year, next_sequence)
}

/// Resolves the prefix for a document kind, falling back to the default
/// when the configured one is blank.
pub fn effective_prefix(configured: &str, kind: DocumentKind) -> String {
    let trimmed = configured.trim();
    if trimmed.is_empty() {
        kind.default_prefix().to_string()
    } else {
        trimmed.to_string()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
