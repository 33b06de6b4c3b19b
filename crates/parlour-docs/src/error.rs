//! # Document Error Types

use thiserror::Error;

/// Errors raised while laying out or serialising a PDF.
#[derive(Debug, Error)]
pub enum DocError {
    /// printpdf refused an operation.
    ///
    /// ## When This Occurs
    /// - Registering a built-in font fails
    /// - Writing the finished document to bytes fails
    #[error("PDF rendering failed: {0}")]
    Render(String),

    /// The input document is inconsistent.
    ///
    /// ## When This Occurs
    /// - The customer passed in is not the one the document belongs to
    #[error("Invalid document: {0}")]
    Invalid(String),
}

impl DocError {
    pub(crate) fn render(err: impl std::fmt::Display) -> Self {
        DocError::Render(err.to_string())
    }
}

/// Result type for document rendering.
pub type DocResult<T> = Result<T, DocError>;
