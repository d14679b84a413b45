//! # Domain Types
//!
//! Sale-side domain types and the shared enums of the settlement flow.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Sale       │   │    SaleItem     │   │   SalePayment   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  invoice_number │   │  sale_id (FK)   │   │  sale_id (FK)   │       │
//! │  │  status         │   │  qty, snapshot  │   │  method         │       │
//! │  │  total_cents    │   │  line_total     │   │  amount_cents   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Enums (one tagged union per concept, shared by pricing, settlement    │
//! │  and the register state machine so match exhaustiveness catches        │
//! │  missing cases at compile time):                                       │
//! │    SaleStatus, SaleType, PaymentMethod, DiscountType,                  │
//! │    StockMovementType                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (invoice_number, sku, etc.) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 500 bps = 5.00% sales tax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for the API edge).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale transaction.
///
/// POS settlement creates `Completed` sales only; the remaining states
/// exist for the wider back-office lifecycle (refund processing, held
/// carts) and for exhaustive status handling in views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale is being assembled (items being added).
    Draft,
    /// Awaiting payment confirmation.
    Pending,
    /// Sale has been paid and finalized.
    Completed,
    /// Cart parked for later retrieval.
    Held,
    /// Fully refunded.
    Refunded,
    /// Partially refunded.
    PartialRefund,
    /// Cancelled before completion.
    Cancelled,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Draft
    }
}

// =============================================================================
// Sale Type
// =============================================================================

/// How the sale was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleType {
    /// Point-of-sale checkout (cash drawer involved for cash tender).
    Pos,
    /// Back-office sale entry.
    Regular,
}

// =============================================================================
// Payment Method
// =============================================================================

/// The tender used to settle a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash. Requires an open cash register.
    Cash,
    /// Bank transfer.
    Bank,
    /// Mobile wallet.
    Mobile,
    /// Card terminal.
    Card,
}

impl PaymentMethod {
    /// Whether this tender moves physical cash through a register drawer.
    #[inline]
    pub const fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

// =============================================================================
// Discount Type
// =============================================================================

/// Shape of an order-level discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// A fixed amount in cents.
    Fixed,
    /// A percentage of the tax-inclusive amount, in basis points.
    Percentage,
}

// =============================================================================
// Stock Movement Type
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockMovementType {
    /// Goods received into a warehouse.
    In,
    /// Goods leaving a warehouse (a sale).
    Out,
    /// Manual correction.
    Adjustment,
}

// =============================================================================
// Sale
// =============================================================================

/// A finalized sale transaction.
///
/// Created atomically by the settlement orchestrator: either the whole
/// sale with its items, payments, ledger postings and inventory updates
/// commits, or none of it does. Immutable after `Completed` except for
/// refund status transitions.
///
/// Invariant: `total = subtotal - manual_discount - group_discount + tax`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Unique, sequential per day: INV-YYYYMMDD-NNNN.
    pub invoice_number: String,
    pub branch_id: String,
    /// None for walk-in customers.
    pub customer_id: Option<String>,
    pub status: SaleStatus,
    pub sale_type: SaleType,
    pub subtotal_cents: i64,
    pub manual_discount_cents: i64,
    pub group_discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub paid_amount_cents: i64,
    /// Operator who served the customer.
    pub served_by: String,
    /// Operator who recorded the sale.
    pub created_by: String,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Outstanding amount. Positive for a credit sale, zero when settled
    /// in full. Never negative for a persisted sale (overpayment is
    /// rejected before persistence).
    #[inline]
    pub fn due_cents(&self) -> i64 {
        self.total_cents - self.paid_amount_cents
    }

    /// Total discount across manual and customer-group discounts.
    #[inline]
    pub fn total_discount_cents(&self) -> i64 {
        self.manual_discount_cents + self.group_discount_cents
    }

    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub warehouse_id: String,
    /// SKU at time of sale (frozen).
    pub sku_snapshot: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Quantity sold. Always > 0.
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen, not live price).
    pub unit_price_cents: i64,
    /// Per-line discount.
    pub discount_cents: i64,
    /// Tax attributed to this line.
    pub tax_cents: i64,
    /// quantity × unit_price − discount.
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Sale Payment
// =============================================================================

/// A payment leg of a sale.
///
/// A sale may carry multiple payments for split tender; the simplified POS
/// path creates exactly one.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalePayment {
    pub id: String,
    pub sale_id: String,
    pub method: PaymentMethod,
    /// Amount paid in cents. Always > 0.
    pub amount_cents: i64,
    /// Ledger account debited for this tender.
    pub account_code: String,
    /// External reference (card auth code, transfer id, etc.).
    pub reference: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SalePayment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// An append-only record of a stock change.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub warehouse_id: String,
    pub movement_type: StockMovementType,
    /// Moved quantity. Always > 0; direction comes from `movement_type`.
    pub quantity: i64,
    /// e.g. "sale" when the movement was caused by a settlement.
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
