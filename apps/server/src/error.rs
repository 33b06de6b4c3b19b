//! # API Errors
//!
//! Every handler returns [`ApiResult`]. Errors serialise as
//! `{"code": "...", "message": "..."}` with a matching HTTP status.
//!
//! ## Error Mapping
//! ```text
//! ┌──────────────────────────────────────┬──────────────────┬────────┐
//! │ Source                               │ code             │ status │
//! ├──────────────────────────────────────┼──────────────────┼────────┤
//! │ DbError::NotFound                    │ NOT_FOUND        │ 404    │
//! │ CoreError::Validation                │ VALIDATION_ERROR │ 400    │
//! │ DbError::UniqueViolation / Conflict  │ CONFLICT         │ 409    │
//! │ other CoreError (transitions, stock) │ BUSINESS_RULE    │ 422    │
//! │ missing / bad token                  │ UNAUTHORIZED     │ 401    │
//! │ staff calling an admin route         │ FORBIDDEN        │ 403    │
//! │ reminder webhook failed              │ WEBHOOK_ERROR    │ 502    │
//! │ SQLite failure                       │ DATABASE_ERROR   │ 500    │
//! │ PDF rendering, anything else         │ INTERNAL         │ 500    │
//! └──────────────────────────────────────┴──────────────────┴────────┘
//! ```
//!
//! Database and internal details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parlour_core::CoreError;
use parlour_db::DbError;
use parlour_docs::DocError;
use serde::Serialize;
use tracing::error;

use crate::notifier::NotifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    Conflict,
    BusinessRule,
    Unauthorized,
    Forbidden,
    WebhookError,
    DatabaseError,
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::BusinessRule => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::WebhookError => StatusCode::BAD_GATEWAY,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error body returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    /// The offending input field on a validation failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{entity} not found: {id}"))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn business_rule(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BusinessRule, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => ApiError {
                field: Some(e.field().to_string()),
                ..ApiError::validation(e.to_string())
            },
            other => ApiError::business_rule(other.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            DbError::UniqueViolation { .. } | DbError::Conflict(_) => {
                ApiError::new(ErrorCode::Conflict, err.to_string())
            }
            DbError::ForeignKeyViolation { .. } => {
                ApiError::new(ErrorCode::Conflict, "Referenced record does not exist or is in use")
            }
            DbError::Core(core) => core.into(),
            other => {
                error!(error = %other, "Database error");
                ApiError::new(ErrorCode::DatabaseError, "A database error occurred")
            }
        }
    }
}

impl From<DocError> for ApiError {
    fn from(err: DocError) -> Self {
        error!(error = %err, "Document rendering failed");
        ApiError::internal("Could not render the document")
    }
}

impl From<NotifyError> for ApiError {
    fn from(err: NotifyError) -> Self {
        match err {
            NotifyError::NotConfigured => ApiError::business_rule(err.to_string()),
            NotifyError::InvalidUrl(_) => ApiError::validation(err.to_string()),
            NotifyError::Client(_) => {
                error!(error = %err, "Webhook client error");
                ApiError::internal("Could not send the reminder")
            }
            NotifyError::Rejected { .. } | NotifyError::Failed { .. } => {
                ApiError::new(ErrorCode::WebhookError, err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlour_core::ValidationError;

    #[test]
    fn test_db_errors_map_to_codes() {
        let cases = [
            (DbError::not_found("Job", "j-1"), ErrorCode::NotFound, 404),
            (DbError::conflict("job has a sent invoice"), ErrorCode::Conflict, 409),
            (DbError::duplicate("part_number", "LN-1"), ErrorCode::Conflict, 409),
            (
                DbError::Core(CoreError::InvalidJobTransition {
                    from: "pending".into(),
                    to: "invoiced".into(),
                }),
                ErrorCode::BusinessRule,
                422,
            ),
            (
                DbError::from(ValidationError::Required {
                    field: "name".into(),
                }),
                ErrorCode::ValidationError,
                400,
            ),
            (DbError::PoolExhausted, ErrorCode::DatabaseError, 500),
        ];

        for (err, code, status) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.code, code);
            assert_eq!(api.code.status().as_u16(), status);
        }
    }

    #[test]
    fn test_internal_detail_hidden() {
        let api: ApiError = DbError::QueryFailed("no such table: jobz".into()).into();
        assert!(!api.message.contains("jobz"));
    }

    #[test]
    fn test_serialised_shape() {
        let json = serde_json::to_value(ApiError::forbidden("admins only")).unwrap();
        assert_eq!(json["code"], "FORBIDDEN");
        assert_eq!(json["message"], "admins only");
        assert!(json.get("field").is_none());

        let api: ApiError = CoreError::from(ValidationError::required("customerId")).into();
        let json = serde_json::to_value(api).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["field"], "customerId");
    }
}
