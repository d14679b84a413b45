//! # atlas-core: Pure Business Logic for Atlas POS
//!
//! This crate is the **heart** of the settlement flow. It contains all
//! decision logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Atlas POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Admin Dashboard (React)                        │   │
//! │  │     Cart UI ──► Tender UI ──► Register UI ──► Reports UI       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api-server (axum)                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              atlas-db (repositories + services)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ atlas-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐ ┌──────────┐ │   │
//! │  │  │  money  │ │ pricing │ │ register │ │ ledger │ │ variance │ │   │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └────────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Sale-side domain types and shared enums
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Cart pricing: subtotal, discounts, tax, total
//! - [`register`] - Cash register state machine and posting log types
//! - [`ledger`] - Journal drafting and the debit=credit invariant
//! - [`variance`] - Session reconciliation reports
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod pricing;
pub mod register;
pub mod types;
pub mod validation;
pub mod variance;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use atlas_core::Money` instead of
// `use atlas_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{AccountTransaction, JournalDraft, SaleLedgerAccounts, TransactionEntry};
pub use money::Money;
pub use pricing::{CartLine, OrderDiscount, PriceBreakdown};
pub use register::{
    AdjustmentDirection, CashRegister, CashRegisterTransaction, CashTransactionType,
    PostingDraft, RegisterStatus,
};
pub use types::*;
pub use variance::VarianceReport;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps settlement transactions bounded.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
