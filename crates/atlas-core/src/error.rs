//! # Error Types
//!
//! Domain-specific error types for atlas-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  atlas-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule / precondition failures          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  atlas-db errors (separate crate)                                      │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - Core + Db combined at the service layer        │
//! │                                                                         │
//! │  API errors (in server)                                                │
//! │  └── ApiError         - What the dashboard sees (serialized)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → ApiError → UI      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (sku, id, amounts)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message the UI can show verbatim

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant is either a rejected precondition (safe to surface to the
/// caller, nothing was written) or an internal consistency violation
/// (`LedgerImbalance`, `RunningBalanceMismatch`) that indicates a bug and
/// must abort the whole operation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cash was tendered but no register was identified.
    #[error("Cash register ID is required for cash payments")]
    CashRegisterRequired,

    /// A mutating register operation was attempted while the register is
    /// not open.
    #[error("Cash register {register_id} is not open")]
    RegisterNotOpen { register_id: String },

    /// Open was attempted on a register that already has an open session.
    #[error("Cash register {register_id} is already open")]
    RegisterAlreadyOpen { register_id: String },

    /// The register is in maintenance and excluded from all operations.
    #[error("Cash register {register_id} is under maintenance")]
    RegisterInMaintenance { register_id: String },

    /// A variance report was requested for a session that has not been
    /// closed yet (or the register was never opened).
    #[error("Cash register {register_id} has no closed session to report on")]
    NoClosedSession { register_id: String },

    /// Insufficient stock to complete the sale.
    ///
    /// The whole sale is rejected; there is no partial fulfillment.
    #[error("Only {available} units of {sku} available in stock, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Cash out (or adjustment decrease) would drive the drawer negative.
    #[error("Cannot remove {requested_cents} cents: register balance is {available_cents} cents")]
    InsufficientCash {
        available_cents: i64,
        requested_cents: i64,
    },

    /// Paid amount exceeds the computed total.
    #[error("Paid amount {paid_cents} exceeds sale total {total_cents}")]
    Overpayment { total_cents: i64, paid_cents: i64 },

    /// Combined discounts exceed the tax-inclusive amount.
    #[error("Discount of {discount_cents} exceeds the payable amount {amount_cents}")]
    DiscountExceedsTotal {
        amount_cents: i64,
        discount_cents: i64,
    },

    /// Product referenced by a cart line does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Customer referenced by the sale does not exist.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Journal debits and credits do not balance.
    ///
    /// This is an internal invariant violation, not a user error. It must
    /// never surface from a correctly built journal; treat as a bug.
    #[error("Ledger imbalance: debits {debit_cents} != credits {credit_cents}")]
    LedgerImbalance {
        debit_cents: i64,
        credit_cents: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for internal consistency violations that should never surface
    /// to a client as anything but a 500.
    pub fn is_internal(&self) -> bool {
        matches!(self, CoreError::LedgerImbalance { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input does not meet requirements, before any
/// business logic runs. No side effects have happened when one is raised.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, unknown enum tag).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            sku: "COKE-330".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Only 3 units of COKE-330 available in stock, requested 5"
        );

        let err = CoreError::CashRegisterRequired;
        assert_eq!(
            err.to_string(),
            "Cash register ID is required for cash payments"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "cash_register_id".to_string(),
        };
        assert_eq!(err.to_string(), "cash_register_id is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "branch_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_internal_classification() {
        let imbalance = CoreError::LedgerImbalance {
            debit_cents: 100,
            credit_cents: 90,
        };
        assert!(imbalance.is_internal());

        let precondition = CoreError::RegisterNotOpen {
            register_id: "r1".to_string(),
        };
        assert!(!precondition.is_internal());
    }
}
