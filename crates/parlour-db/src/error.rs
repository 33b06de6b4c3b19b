//! # Storage Errors
//!
//! `DbError` is what every repository returns. SQLite failures are sorted
//! into a few buckets the server can turn into a status code, and
//! business-rule failures from parlour-core pass through untouched.
//!
//! ```text
//!   sqlx::Error ─────┐
//!   MigrateError ────┼──► DbError ──► ApiError (apps/server)
//!   CoreError ───────┘
//! ```

use parlour_core::{CoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row with this id. Repositories raise it themselves; a bare
    /// `RowNotFound` from sqlx ends up here too.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write: part numbers, user emails,
    /// document numbers.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A referenced row is missing, or a referencing row blocks a delete.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The write is well-formed but would break a rule that spans rows,
    /// e.g. deleting a customer with invoices or converting a quote twice.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        DbError::Conflict(message.into())
    }

    /// Sorts a constraint failure by SQLite's message text, which is stable
    /// across versions: `UNIQUE constraint failed: inventory_items.part_number`
    /// or `FOREIGN KEY constraint failed`.
    fn from_constraint(message: &str) -> Self {
        if let Some(columns) = message.strip_prefix("UNIQUE constraint failed: ") {
            // "table.column" or "table.a, table.b"; the column is what callers show
            let field = columns
                .split(", ")
                .map(|c| c.rsplit('.').next().unwrap_or(c))
                .collect::<Vec<_>>()
                .join(", ");
            return DbError::duplicate(field, "?");
        }
        if message.starts_with("FOREIGN KEY constraint failed") {
            return DbError::ForeignKeyViolation {
                message: message.to_string(),
            };
        }
        DbError::QueryFailed(message.to_string())
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Core(err.into())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "?"),
            sqlx::Error::Database(db_err) => DbError::from_constraint(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_messages_are_sorted() {
        let err = DbError::from_constraint("UNIQUE constraint failed: inventory_items.part_number");
        assert!(matches!(
            &err,
            DbError::UniqueViolation { field, .. } if field == "part_number"
        ));

        let err = DbError::from_constraint("UNIQUE constraint failed: job_items.job_id, job_items.position");
        assert!(matches!(
            &err,
            DbError::UniqueViolation { field, .. } if field == "job_id, position"
        ));

        let err = DbError::from_constraint("FOREIGN KEY constraint failed");
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let err = DbError::from_constraint("no such table: jobz");
        assert!(matches!(err, DbError::QueryFailed(_)));
    }

    #[test]
    fn validation_wraps_as_core() {
        let err: DbError = ValidationError::required("title").into();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }
}
