//! # Variance Reporter
//!
//! Reconciles a closed register session: expected cash vs counted cash,
//! with a categorized breakdown of everything that moved the drawer.
//!
//! This is a pure read over the immutable posting log. It never mutates
//! state, and because the log is append-only the same session always
//! re-derives the same report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::register::{CashRegister, CashRegisterTransaction, CashTransactionType};

// =============================================================================
// Report Types
// =============================================================================

/// Cash that flowed INTO the drawer during the session, by category.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashInBreakdown {
    pub sales_cents: i64,
    pub cash_in_cents: i64,
    pub adjustments_cents: i64,
}

impl CashInBreakdown {
    pub fn total_cents(&self) -> i64 {
        self.sales_cents + self.cash_in_cents + self.adjustments_cents
    }
}

/// Cash that flowed OUT of the drawer during the session, by category.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashOutBreakdown {
    pub refunds_cents: i64,
    pub cash_out_cents: i64,
    pub adjustments_cents: i64,
}

impl CashOutBreakdown {
    pub fn total_cents(&self) -> i64 {
        self.refunds_cents + self.cash_out_cents + self.adjustments_cents
    }
}

/// Per-type posting summary row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionTypeSummary {
    pub tx_type: CashTransactionType,
    pub count: i64,
    pub total_cents: i64,
}

/// The reconciliation result for one closed session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VarianceReport {
    pub register_id: String,
    pub session_id: String,
    #[ts(as = "Option<String>")]
    pub opened_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    pub opening_balance_cents: i64,
    /// opening + inflows − outflows.
    pub expected_balance_cents: i64,
    /// What the operator physically counted at close.
    pub counted_balance_cents: i64,
    /// counted − expected. Zero is balanced, positive an overage,
    /// negative a shortage.
    pub variance_cents: i64,
    pub cash_in: CashInBreakdown,
    pub cash_out: CashOutBreakdown,
    pub transactions_summary: Vec<TransactionTypeSummary>,
}

impl VarianceReport {
    /// True when the count matched expectations exactly.
    #[inline]
    pub fn is_balanced(&self) -> bool {
        self.variance_cents == 0
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builds the variance report for one closed session from its posting log.
///
/// ## Arguments
/// * `register` - the register aggregate (metadata: id, session window)
/// * `transactions` - ALL postings of the session, in insert order,
///   including the opening and closing markers
///
/// ## Errors
/// * `NoClosedSession` when the log lacks an opening or closing posting,
///   i.e. the session never happened or is still open
pub fn build_variance_report(
    register: &CashRegister,
    transactions: &[CashRegisterTransaction],
) -> CoreResult<VarianceReport> {
    let session_id = register
        .session_id
        .clone()
        .ok_or_else(|| CoreError::NoClosedSession {
            register_id: register.id.clone(),
        })?;

    let mut opening: Option<i64> = None;
    let mut counted: Option<i64> = None;
    let mut cash_in = CashInBreakdown::default();
    let mut cash_out = CashOutBreakdown::default();

    for tx in transactions {
        match tx.tx_type {
            CashTransactionType::OpeningBalance => opening = Some(tx.amount_cents),
            CashTransactionType::ClosingBalance => counted = Some(tx.amount_cents),
            CashTransactionType::Sale => cash_in.sales_cents += tx.amount_cents,
            CashTransactionType::CashIn => cash_in.cash_in_cents += tx.amount_cents,
            CashTransactionType::AdjustmentIn => cash_in.adjustments_cents += tx.amount_cents,
            CashTransactionType::Refund => cash_out.refunds_cents += tx.amount_cents,
            CashTransactionType::CashOut => cash_out.cash_out_cents += tx.amount_cents,
            CashTransactionType::AdjustmentOut => cash_out.adjustments_cents += tx.amount_cents,
        }
    }

    let (opening_balance_cents, counted_balance_cents) = match (opening, counted) {
        (Some(open), Some(count)) => (open, count),
        // Still open (no closing marker) or an empty log: nothing to
        // reconcile yet.
        _ => {
            return Err(CoreError::NoClosedSession {
                register_id: register.id.clone(),
            })
        }
    };

    let expected_balance_cents =
        opening_balance_cents + cash_in.total_cents() - cash_out.total_cents();

    // Per-type summary in a stable display order.
    let mut transactions_summary = Vec::new();
    for tx_type in [
        CashTransactionType::OpeningBalance,
        CashTransactionType::Sale,
        CashTransactionType::CashIn,
        CashTransactionType::CashOut,
        CashTransactionType::Refund,
        CashTransactionType::AdjustmentIn,
        CashTransactionType::AdjustmentOut,
        CashTransactionType::ClosingBalance,
    ] {
        let matching = transactions.iter().filter(|t| t.tx_type == tx_type);
        let count = matching.clone().count() as i64;
        if count == 0 {
            continue;
        }
        transactions_summary.push(TransactionTypeSummary {
            tx_type,
            count,
            total_cents: matching.map(|t| t.amount_cents).sum(),
        });
    }

    Ok(VarianceReport {
        register_id: register.id.clone(),
        session_id,
        opened_at: register.opened_at,
        closed_at: register.closed_at,
        opening_balance_cents,
        expected_balance_cents,
        counted_balance_cents,
        variance_cents: counted_balance_cents - expected_balance_cents,
        cash_in,
        cash_out,
        transactions_summary,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
