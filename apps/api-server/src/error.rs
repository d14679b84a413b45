//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Atlas POS                              │
//! │                                                                         │
//! │  ServiceError (atlas-db)                                               │
//! │    ├── Core(Validation | precondition)  → 400, shown verbatim to user  │
//! │    ├── Core(LedgerImbalance)            → 500, logged, never detailed  │
//! │    ├── Db(NotFound)                     → 404                          │
//! │    ├── Db(Conflict)                     → 409, caller may retry        │
//! │    └── Db(anything else)                → 500, logged                  │
//! │                                                                         │
//! │  The dashboard shows `message` verbatim for 4xx and leaves the cart    │
//! │  untouched for correction and resubmission.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use atlas_core::CoreError;
use atlas_db::{DbError, ServiceError};

/// API error returned from HTTP handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "PRECONDITION_FAILED",
///   "message": "Cash register reg-1 is not open"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,

    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Business precondition rejected the operation (400)
    PreconditionFailed,

    /// Insufficient stock (400)
    InsufficientStock,

    /// Concurrent update, retry the whole operation (409)
    Conflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error (400).
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, message)
    }

    /// Creates a not found error (404).
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, message)
    }

    /// Creates an internal error (500) with a generic message.
    pub fn internal() -> Self {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Internal,
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

/// Converts service errors to API errors.
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Core(core) => core.into(),
            ServiceError::Db(db) => db.into(),
        }
    }
}

/// Converts core errors to API errors. Rejection reasons are surfaced
/// verbatim so the dashboard can show them as-is.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::Validation(_)
            | CoreError::CashRegisterRequired
            | CoreError::ProductNotFound(_)
            | CoreError::CustomerNotFound(_)
            | CoreError::DiscountExceedsTotal { .. } => ApiError::validation(err.to_string()),

            CoreError::RegisterNotOpen { .. }
            | CoreError::RegisterAlreadyOpen { .. }
            | CoreError::RegisterInMaintenance { .. }
            | CoreError::NoClosedSession { .. }
            | CoreError::InsufficientCash { .. }
            | CoreError::Overpayment { .. } => ApiError::new(
                StatusCode::BAD_REQUEST,
                ErrorCode::PreconditionFailed,
                err.to_string(),
            ),

            CoreError::InsufficientStock { .. } => ApiError::new(
                StatusCode::BAD_REQUEST,
                ErrorCode::InsufficientStock,
                err.to_string(),
            ),

            // Internal invariant violation: log it, hide the detail.
            CoreError::LedgerImbalance { .. } => {
                tracing::error!(error = %err, "Ledger consistency violation");
                ApiError::internal()
            }
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::NotFound { .. } => ApiError::not_found(err.to_string()),

            DbError::Conflict { .. } => {
                ApiError::new(StatusCode::CONFLICT, ErrorCode::Conflict, err.to_string())
            }

            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ApiError::validation(err.to_string())
            }

            _ => {
                tracing::error!(error = %err, "Database error");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DatabaseError,
                    "Database operation failed",
                )
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_maps_to_400_with_verbatim_message() {
        let api: ApiError = CoreError::RegisterNotOpen {
            register_id: "reg-1".to_string(),
        }
        .into();

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.message, "Cash register reg-1 is not open");
    }

    #[test]
    fn test_missing_register_id_maps_to_400() {
        let api: ApiError = CoreError::CashRegisterRequired.into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.message, "Cash register ID is required for cash payments");
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let api: ApiError = DbError::conflict("CashRegister", "reg-1").into();
        assert_eq!(api.status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_imbalance_is_opaque_500() {
        let api: ApiError = CoreError::LedgerImbalance {
            debit_cents: 10,
            credit_cents: 9,
        }
        .into();

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Internal server error");
    }

    #[test]
    fn test_db_not_found_maps_to_404() {
        let api: ApiError = DbError::not_found("Sale", "s-1").into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
    }
}
