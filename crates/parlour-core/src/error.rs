//! # Domain Errors
//!
//! `ValidationError` says a field is wrong; `CoreError` says the request is
//! well-formed but the business does not allow it. The server answers the
//! first with 400 and the rest with 422, so the variant chosen here is the
//! status the office sees.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Not an edge on the pipeline board, e.g. Pending straight to Invoiced.
    #[error("Job cannot move from {from} to {to}")]
    InvalidJobTransition { from: String, to: String },

    /// An invoice or quote is past the point where `action` is allowed:
    /// editing a sent invoice, paying a void one, converting an unaccepted quote.
    #[error("{document} {number} is {status}, cannot {action}")]
    InvalidDocumentState {
        document: String,
        number: String,
        status: String,
        action: String,
    },

    #[error("Malformed document number: {0}")]
    MalformedDocumentNumber(String),

    /// The van stock count would go negative.
    #[error("Insufficient stock for {part_number}: available {available}, requested {requested}")]
    InsufficientStock {
        part_number: String,
        available: i64,
        requested: i64,
    },

    /// Amounts are pre-formatted (`£12.50`) so the message reads as-is.
    #[error("Payment of {amount} exceeds amount due {due}")]
    Overpayment { amount: String, due: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn document_state(
        document: impl Into<String>,
        number: impl Into<String>,
        status: impl ToString,
        action: impl Into<String>,
    ) -> Self {
        CoreError::InvalidDocumentState {
            document: document.into(),
            number: number.into(),
            status: status.to_string(),
            action: action.into(),
        }
    }
}

/// A single bad field. `field` is the camelCase name the client sent.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// The offending field, for clients that highlight it.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
