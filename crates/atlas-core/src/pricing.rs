//! # Pricing Engine
//!
//! Computes subtotal, discounts, tax and the grand total for a cart.
//!
//! ## Computation Order (fixed by business rule, NOT reorderable)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Pricing Pipeline                                   │
//! │                                                                         │
//! │  1. subtotal        = Σ (quantity × unit_price − line discount)        │
//! │  2. amount_with_tax = subtotal + tax(subtotal)                         │
//! │  3. group_discount  = amount_with_tax × group_bps      (tax-inclusive) │
//! │  4. manual_discount = fixed value, or                                  │
//! │                       amount_with_tax × discount_bps   (tax-inclusive) │
//! │  5. total_discount  = group_discount + manual_discount                 │
//! │  6. total           = amount_with_tax − total_discount                 │
//! │  7. due             = total − paid      (overpayment rejected first)   │
//! │                                                                         │
//! │  NOTE: group and manual discounts are PARALLEL, both computed on the   │
//! │  tax-inclusive amount. Neither compounds on the other's remainder.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The whole engine is a pure function: identical inputs always produce an
//! identical breakdown, which is what makes receipt recomputation and
//! audit checks possible.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{DiscountType, TaxRate};
use crate::validation::{validate_amount_cents, validate_quantity};

// =============================================================================
// Inputs
// =============================================================================

/// One cart line as submitted by the checkout UI.
///
/// `unit_price_cents` is the price frozen when the product entered the
/// cart; the engine never consults the live product price.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub warehouse_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Per-line discount in cents, subtracted inside the subtotal.
    #[serde(default)]
    pub discount_cents: i64,
}

impl CartLine {
    /// Gross line amount before the line discount.
    #[inline]
    pub fn gross_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }

    /// Line total after the per-line discount.
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.gross_cents() - self.discount_cents
    }
}

/// Order-level discount.
///
/// For `Fixed` the value is cents; for `Percentage` it is basis points
/// applied to the tax-inclusive amount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDiscount {
    pub discount_type: DiscountType,
    pub value: i64,
}

// =============================================================================
// Output
// =============================================================================

/// The full pricing breakdown for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceBreakdown {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    /// subtotal + tax; the base both discounts are computed on.
    pub amount_with_tax_cents: i64,
    pub group_discount_cents: i64,
    pub manual_discount_cents: i64,
    pub total_cents: i64,
}

impl PriceBreakdown {
    /// Combined discount across both channels.
    #[inline]
    pub fn total_discount_cents(&self) -> i64 {
        self.group_discount_cents + self.manual_discount_cents
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Prices a cart.
///
/// ## Arguments
/// * `lines` - cart lines; must be non-empty, quantities > 0
/// * `order_discount` - optional manual order-level discount
/// * `tax_rate` - order tax rate
/// * `group_discount_bps` - customer group discount; 0 for walk-in
///
/// ## Errors
/// * `ValidationError` for empty cart, non-positive quantity, negative
///   prices or discount values
/// * `DiscountExceedsTotal` when the combined discounts would push the
///   grand total below zero
pub fn price_cart(
    lines: &[CartLine],
    order_discount: Option<OrderDiscount>,
    tax_rate: TaxRate,
    group_discount_bps: u32,
) -> CoreResult<PriceBreakdown> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }
    if group_discount_bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "group_discount".to_string(),
            min: 0,
            max: 10_000,
        }
        .into());
    }

    // Step 1: subtotal, with per-line discounts subtracted here.
    let mut subtotal = Money::zero();
    for line in lines {
        validate_quantity(line.quantity)?;
        validate_amount_cents("unit_price", line.unit_price_cents)?;
        validate_amount_cents("discount", line.discount_cents)?;
        if line.discount_cents > line.gross_cents() {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: line.gross_cents(),
            }
            .into());
        }
        subtotal += Money::from_cents(line.line_total_cents());
    }

    // Step 2: tax on the subtotal.
    let tax = subtotal.calculate_tax(tax_rate);
    let amount_with_tax = subtotal + tax;

    // Step 3: customer-group discount, on the tax-inclusive amount.
    // Walk-in customers carry 0 bps and fall through to zero here.
    let group_discount = amount_with_tax.percentage_of(group_discount_bps);

    // Step 4: manual discount, ALSO on the tax-inclusive amount. The two
    // discounts are parallel; neither is computed on the other's remainder.
    let manual_discount = match order_discount {
        None => Money::zero(),
        Some(discount) => {
            validate_amount_cents("discount", discount.value)?;
            match discount.discount_type {
                DiscountType::Fixed => Money::from_cents(discount.value),
                DiscountType::Percentage => {
                    if discount.value > 10_000 {
                        return Err(ValidationError::OutOfRange {
                            field: "discount".to_string(),
                            min: 0,
                            max: 10_000,
                        }
                        .into());
                    }
                    amount_with_tax.percentage_of(discount.value as u32)
                }
            }
        }
    };

    // Steps 5-6: combine and subtract.
    let total_discount = group_discount + manual_discount;
    if total_discount > amount_with_tax {
        return Err(CoreError::DiscountExceedsTotal {
            amount_cents: amount_with_tax.cents(),
            discount_cents: total_discount.cents(),
        });
    }
    let total = amount_with_tax - total_discount;

    Ok(PriceBreakdown {
        subtotal_cents: subtotal.cents(),
        tax_cents: tax.cents(),
        amount_with_tax_cents: amount_with_tax.cents(),
        group_discount_cents: group_discount.cents(),
        manual_discount_cents: manual_discount.cents(),
        total_cents: total.cents(),
    })
}

/// Step 7 guard: rejects overpayment before anything is persisted.
///
/// Paid may be any value in `0..=total`; anything under total is a credit
/// sale with a positive due.
pub fn check_paid_amount(total_cents: i64, paid_cents: i64) -> CoreResult<()> {
    validate_amount_cents("paid_amount", paid_cents)?;
    if paid_cents > total_cents {
        return Err(CoreError::Overpayment {
            total_cents,
            paid_cents,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
