//! # Document Sequences
//!
//! Atomic allocation of invoice, quote and statement numbers.
//!
//! ## Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INSERT INTO document_sequences (kind, year, last_value)                │
//! │  VALUES ('invoice', 2026, 1)                                            │
//! │  ON CONFLICT (kind, year) DO UPDATE SET last_value = last_value + 1     │
//! │  RETURNING last_value                                                   │
//! │                                                                         │
//! │  One statement, run on the caller's transaction: two writers can never  │
//! │  read the same last value, and a rolled-back document gives its number  │
//! │  back. The UNIQUE index on each *_number column is the backstop.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use parlour_core::numbering::{effective_prefix, format_document_number};
use parlour_core::DocumentKind;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::begin_write;

/// Allocates the next sequence value for `kind` in `year`.
///
/// Must run on the same transaction as the insert that uses the number.
pub(crate) async fn allocate(
    conn: &mut SqliteConnection,
    kind: DocumentKind,
    year: i32,
) -> DbResult<u32> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO document_sequences (kind, year, last_value)
        VALUES (?1, ?2, 1)
        ON CONFLICT (kind, year) DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(kind)
    .bind(year)
    .fetch_one(&mut *conn)
    .await?;

    debug!(kind = %kind, year, value, "Allocated document sequence");
    Ok(value as u32)
}

/// Allocates and formats a full document number.
pub(crate) async fn allocate_number(
    conn: &mut SqliteConnection,
    kind: DocumentKind,
    configured_prefix: &str,
    year: i32,
) -> DbResult<String> {
    let sequence = allocate(conn, kind, year).await?;
    let prefix = effective_prefix(configured_prefix, kind);
    Ok(format_document_number(&prefix, year, sequence))
}

/// Repository for read access to sequences (previews).
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
}

impl SequenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SequenceRepository { pool }
    }

    /// The sequence value the next allocation would return. Nothing is
    /// reserved: a concurrent writer may take it first.
    pub async fn preview(&self, kind: DocumentKind, year: i32) -> DbResult<u32> {
        let last: Option<i64> = sqlx::query_scalar(
            "SELECT last_value FROM document_sequences WHERE kind = ?1 AND year = ?2",
        )
        .bind(kind)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;

        Ok(last.unwrap_or(0) as u32 + 1)
    }

    /// Formatted preview of the next number.
    pub async fn preview_number(
        &self,
        kind: DocumentKind,
        configured_prefix: &str,
        year: i32,
    ) -> DbResult<String> {
        let sequence = self.preview(kind, year).await?;
        let prefix = effective_prefix(configured_prefix, kind);
        Ok(format_document_number(&prefix, year, sequence))
    }

    /// Allocates a number on its own transaction.
    pub async fn allocate(&self, kind: DocumentKind, year: i32) -> DbResult<u32> {
        let mut tx = begin_write(&self.pool).await?;
        let value = allocate(&mut tx, kind, year).await?;
        tx.commit().await?;
        Ok(value)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
