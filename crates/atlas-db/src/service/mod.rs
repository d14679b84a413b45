//! # Service Layer
//!
//! Transport-agnostic orchestration over the repositories. HTTP handlers,
//! CLI tools and tests all call the same service functions; nothing here
//! knows about axum or request contexts.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Service Layer                                    │
//! │                                                                         │
//! │  settlement - the POS sale transaction: pricing, stock, ledger,        │
//! │               register posting, all-or-nothing                         │
//! │  register   - drawer lifecycle: open, close, cash in/out, adjust,      │
//! │               variance report                                           │
//! │  reports    - read-only: sale lists, detail, today summary, history    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The operator identity is an explicit parameter on every mutating call.
//! There is no ambient "current user" anywhere below the transport layer.

pub mod register;
pub mod reports;
pub mod settlement;

use thiserror::Error;

use crate::error::DbError;
use atlas_core::CoreError;

// =============================================================================
// Operator Identity
// =============================================================================

/// The authenticated operator performing an action.
///
/// Filled by the transport layer (HTTP headers, CLI flags) and threaded
/// through every service call.
#[derive(Debug, Clone)]
pub struct Operator {
    pub user_id: String,
}

impl Operator {
    pub fn new(user_id: impl Into<String>) -> Self {
        Operator {
            user_id: user_id.into(),
        }
    }
}

// =============================================================================
// Service Error
// =============================================================================

/// Error type for the service layer: business rejections from atlas-core
/// plus storage failures from this crate.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl ServiceError {
    /// Whether retrying the whole operation from scratch is safe and
    /// potentially useful (lost-update conflicts only; nothing was
    /// committed).
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Db(DbError::Conflict { .. }))
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
