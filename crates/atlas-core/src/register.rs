//! # Cash Register State Machine
//!
//! Governs the drawer lifecycle and the posting log that backs it.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Cash Register Lifecycle                               │
//! │                                                                         │
//! │             open(opening_balance)                                       │
//! │   ┌────────┐ ──────────────────► ┌────────┐                            │
//! │   │ CLOSED │                     │  OPEN  │──┐ cash_in / cash_out      │
//! │   └────────┘ ◄────────────────── └────────┘  │ adjust / record_sale    │
//! │        ▲      close(actual_amount)    │◄─────┘                         │
//! │        │                              │                                 │
//! │   ┌────┴────────┐                     │                                 │
//! │   │ MAINTENANCE │  (excluded from all sale operations)                  │
//! │   └─────────────┘                                                       │
//! │                                                                         │
//! │  Each open→close pair is one SESSION. Every mutation appends an        │
//! │  immutable posting carrying the running balance at that instant.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transitions here are pure: they mutate the in-memory aggregate and
//! return the posting draft to append. Persistence (row locking, the
//! version compare-and-swap, appending the posting) lives in atlas-db so
//! this module stays fully testable without a database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

// =============================================================================
// Register Status
// =============================================================================

/// Drawer lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RegisterStatus {
    /// No active session. Initial state and the state between sessions.
    Closed,
    /// Session in progress; the only state that accepts cash operations.
    Open,
    /// Taken out of service; excluded from sale operations entirely.
    Maintenance,
}

impl Default for RegisterStatus {
    fn default() -> Self {
        RegisterStatus::Closed
    }
}

// =============================================================================
// Cash Transaction Type
// =============================================================================

/// Tag of a register posting. Amounts are always positive; the direction
/// of every posting is implied by its type alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CashTransactionType {
    /// Float counted into the drawer at open.
    OpeningBalance,
    /// Cash tendered for a sale.
    Sale,
    /// Cash added outside a sale (e.g. change run).
    CashIn,
    /// Cash removed outside a sale (e.g. bank drop).
    CashOut,
    /// Cash returned to a customer.
    Refund,
    /// Manual correction adding cash.
    AdjustmentIn,
    /// Manual correction removing cash.
    AdjustmentOut,
    /// Counted amount recorded at close. Balance marker, not a flow.
    ClosingBalance,
}

impl CashTransactionType {
    /// The sign this posting type contributes to the running balance:
    /// +1 inflow, -1 outflow, 0 for the closing marker.
    pub const fn sign(&self) -> i64 {
        match self {
            CashTransactionType::OpeningBalance
            | CashTransactionType::Sale
            | CashTransactionType::CashIn
            | CashTransactionType::AdjustmentIn => 1,
            CashTransactionType::CashOut
            | CashTransactionType::Refund
            | CashTransactionType::AdjustmentOut => -1,
            CashTransactionType::ClosingBalance => 0,
        }
    }
}

/// Direction of a manual balance adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentDirection {
    Increase,
    Decrease,
}

// =============================================================================
// Cash Register
// =============================================================================

/// A physical or logical cash drawer.
///
/// Invariant: while open, `current_balance_cents` equals the opening
/// balance plus the signed sum of all postings in the current session.
/// `version` backs the optimistic lock used by the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashRegister {
    pub id: String,
    pub branch_id: String,
    pub name: String,
    pub status: RegisterStatus,
    /// Identifier of the current (or most recent) open/close session.
    pub session_id: Option<String>,
    pub opening_balance_cents: i64,
    pub current_balance_cents: i64,
    /// Computed at close, before the count is entered.
    pub expected_amount_cents: Option<i64>,
    /// Physically counted at close.
    pub actual_amount_cents: Option<i64>,
    /// actual − expected. Positive is overage, negative is shortage.
    pub variance_cents: Option<i64>,
    pub opened_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub opened_at: Option<DateTime<Utc>>,
    pub closed_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency token, bumped on every persisted mutation.
    pub version: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Posting Draft
// =============================================================================

/// A register posting produced by a transition, not yet persisted.
///
/// The persistence layer assigns the id and timestamps and appends it to
/// the immutable `cash_register_transactions` log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingDraft {
    pub tx_type: CashTransactionType,
    pub amount_cents: i64,
    /// Register balance immediately after this posting.
    pub running_balance_cents: i64,
    pub sale_id: Option<String>,
    pub description: Option<String>,
}

// =============================================================================
// Transitions
// =============================================================================

impl CashRegister {
    fn ensure_open(&self) -> CoreResult<()> {
        match self.status {
            RegisterStatus::Open => Ok(()),
            RegisterStatus::Maintenance => Err(CoreError::RegisterInMaintenance {
                register_id: self.id.clone(),
            }),
            RegisterStatus::Closed => Err(CoreError::RegisterNotOpen {
                register_id: self.id.clone(),
            }),
        }
    }

    fn ensure_positive(field: &str, amount_cents: i64) -> CoreResult<()> {
        if amount_cents <= 0 {
            return Err(ValidationError::MustBePositive {
                field: field.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Opens a new session.
    ///
    /// Valid only from `Closed`. Sets the opening and current balance to
    /// the given float, stamps the operator, clears the previous
    /// session's close artifacts, and returns the opening posting.
    pub fn open(
        &mut self,
        opening_balance_cents: i64,
        session_id: String,
        operator_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<PostingDraft> {
        match self.status {
            RegisterStatus::Open => {
                return Err(CoreError::RegisterAlreadyOpen {
                    register_id: self.id.clone(),
                })
            }
            RegisterStatus::Maintenance => {
                return Err(CoreError::RegisterInMaintenance {
                    register_id: self.id.clone(),
                })
            }
            RegisterStatus::Closed => {}
        }
        if opening_balance_cents < 0 {
            return Err(ValidationError::OutOfRange {
                field: "opening_balance".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        self.status = RegisterStatus::Open;
        self.session_id = Some(session_id);
        self.opening_balance_cents = opening_balance_cents;
        self.current_balance_cents = opening_balance_cents;
        self.expected_amount_cents = None;
        self.actual_amount_cents = None;
        self.variance_cents = None;
        self.opened_by = Some(operator_id.to_string());
        self.opened_at = Some(now);
        self.closed_by = None;
        self.closed_at = None;

        Ok(PostingDraft {
            tx_type: CashTransactionType::OpeningBalance,
            amount_cents: opening_balance_cents,
            running_balance_cents: self.current_balance_cents,
            sale_id: None,
            description: Some("Opening balance".to_string()),
        })
    }

    /// Adds cash to the drawer outside a sale.
    pub fn cash_in(
        &mut self,
        amount_cents: i64,
        description: Option<String>,
    ) -> CoreResult<PostingDraft> {
        self.ensure_open()?;
        Self::ensure_positive("amount", amount_cents)?;

        self.current_balance_cents += amount_cents;

        Ok(PostingDraft {
            tx_type: CashTransactionType::CashIn,
            amount_cents,
            running_balance_cents: self.current_balance_cents,
            sale_id: None,
            description,
        })
    }

    /// Removes cash from the drawer outside a sale.
    ///
    /// Fails if the removal would drive the balance negative.
    pub fn cash_out(
        &mut self,
        amount_cents: i64,
        description: Option<String>,
    ) -> CoreResult<PostingDraft> {
        self.ensure_open()?;
        Self::ensure_positive("amount", amount_cents)?;
        if amount_cents > self.current_balance_cents {
            return Err(CoreError::InsufficientCash {
                available_cents: self.current_balance_cents,
                requested_cents: amount_cents,
            });
        }

        self.current_balance_cents -= amount_cents;

        Ok(PostingDraft {
            tx_type: CashTransactionType::CashOut,
            amount_cents,
            running_balance_cents: self.current_balance_cents,
            sale_id: None,
            description,
        })
    }

    /// Manual balance correction, tagged separately from cash in/out so
    /// reconciliation can report it on its own line.
    ///
    /// A decrease is subject to the same non-negative-balance floor as
    /// cash out.
    pub fn adjust(
        &mut self,
        amount_cents: i64,
        direction: AdjustmentDirection,
        description: Option<String>,
    ) -> CoreResult<PostingDraft> {
        self.ensure_open()?;
        Self::ensure_positive("amount", amount_cents)?;

        let tx_type = match direction {
            AdjustmentDirection::Increase => {
                self.current_balance_cents += amount_cents;
                CashTransactionType::AdjustmentIn
            }
            AdjustmentDirection::Decrease => {
                if amount_cents > self.current_balance_cents {
                    return Err(CoreError::InsufficientCash {
                        available_cents: self.current_balance_cents,
                        requested_cents: amount_cents,
                    });
                }
                self.current_balance_cents -= amount_cents;
                CashTransactionType::AdjustmentOut
            }
        };

        Ok(PostingDraft {
            tx_type,
            amount_cents,
            running_balance_cents: self.current_balance_cents,
            sale_id: None,
            description,
        })
    }

    /// Records the cash-tendered portion of a settled sale.
    ///
    /// Called by the settlement orchestrator only, inside the settlement
    /// transaction, and only for cash tender.
    pub fn record_sale_cash(
        &mut self,
        sale_id: &str,
        cash_amount_cents: i64,
    ) -> CoreResult<PostingDraft> {
        self.ensure_open()?;
        Self::ensure_positive("amount", cash_amount_cents)?;

        self.current_balance_cents += cash_amount_cents;

        Ok(PostingDraft {
            tx_type: CashTransactionType::Sale,
            amount_cents: cash_amount_cents,
            running_balance_cents: self.current_balance_cents,
            sale_id: Some(sale_id.to_string()),
            description: None,
        })
    }

    /// Closes the session against a physical count.
    ///
    /// Computes `expected = current_balance` (pre-count), records
    /// `variance = actual − expected`, then absorbs the variance by
    /// setting the balance to what was actually counted.
    pub fn close(
        &mut self,
        actual_amount_cents: i64,
        operator_id: &str,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<PostingDraft> {
        self.ensure_open()?;
        if actual_amount_cents < 0 {
            return Err(ValidationError::OutOfRange {
                field: "actual_amount".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        let expected = self.current_balance_cents;
        self.expected_amount_cents = Some(expected);
        self.actual_amount_cents = Some(actual_amount_cents);
        self.variance_cents = Some(actual_amount_cents - expected);
        self.status = RegisterStatus::Closed;
        self.closed_by = Some(operator_id.to_string());
        self.closed_at = Some(now);
        // The drawer now holds what was counted, not what was expected.
        self.current_balance_cents = actual_amount_cents;

        Ok(PostingDraft {
            tx_type: CashTransactionType::ClosingBalance,
            amount_cents: actual_amount_cents,
            running_balance_cents: actual_amount_cents,
            sale_id: None,
            description: notes.or_else(|| Some("Closing balance".to_string())),
        })
    }
}

// =============================================================================
// Cash Register Transaction (persisted posting)
// =============================================================================

/// An immutable posting against a register. Append-only; never updated or
/// deleted. Insert order per register is significant: `running_balance`
/// is only meaningful under FIFO ordering.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashRegisterTransaction {
    pub id: String,
    pub register_id: String,
    pub session_id: String,
    pub tx_type: CashTransactionType,
    /// Always positive; direction implied by `tx_type`.
    pub amount_cents: i64,
    /// Register balance immediately after this posting.
    pub running_balance_cents: i64,
    pub sale_id: Option<String>,
    pub description: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CashRegisterTransaction {
    /// Signed contribution of this posting to the drawer balance.
    #[inline]
    pub fn signed_amount_cents(&self) -> i64 {
        self.tx_type.sign() * self.amount_cents
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_register() -> CashRegister {
        let now = Utc::now();
        CashRegister {
            id: "reg-1".to_string(),
            branch_id: "branch-1".to_string(),
            name: "Front counter".to_string(),
            status: RegisterStatus::Closed,
            session_id: None,
            opening_balance_cents: 0,
            current_balance_cents: 0,
            expected_amount_cents: None,
            actual_amount_cents: None,
            variance_cents: None,
            opened_by: None,
            opened_at: None,
            closed_by: None,
            closed_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn open_register(opening_cents: i64) -> CashRegister {
        let mut register = closed_register();
        register
            .open(opening_cents, "sess-1".to_string(), "op-1", Utc::now())
            .unwrap();
        register
    }

    #[test]
    fn test_open_from_closed() {
        let mut register = closed_register();
        let posting = register
            .open(100_000, "sess-1".to_string(), "op-1", Utc::now())
            .unwrap();

        assert_eq!(register.status, RegisterStatus::Open);
        assert_eq!(register.opening_balance_cents, 100_000);
        assert_eq!(register.current_balance_cents, 100_000);
        assert_eq!(register.opened_by.as_deref(), Some("op-1"));
        assert_eq!(posting.tx_type, CashTransactionType::OpeningBalance);
        assert_eq!(posting.amount_cents, 100_000);
        assert_eq!(posting.running_balance_cents, 100_000);
    }

    #[test]
    fn test_open_twice_rejected() {
        let mut register = open_register(0);
        let err = register
            .open(0, "sess-2".to_string(), "op-1", Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::RegisterAlreadyOpen { .. }));
    }

    #[test]
    fn test_open_in_maintenance_rejected() {
        let mut register = closed_register();
        register.status = RegisterStatus::Maintenance;
        let err = register
            .open(0, "sess-1".to_string(), "op-1", Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::RegisterInMaintenance { .. }));
    }

    #[test]
    fn test_reopen_clears_previous_close_artifacts() {
        let mut register = open_register(50_000);
        register.close(49_000, "op-1", None, Utc::now()).unwrap();
        assert_eq!(register.variance_cents, Some(-1_000));

        register
            .open(60_000, "sess-2".to_string(), "op-2", Utc::now())
            .unwrap();
        assert_eq!(register.variance_cents, None);
        assert_eq!(register.expected_amount_cents, None);
        assert_eq!(register.actual_amount_cents, None);
        assert_eq!(register.closed_by, None);
        assert_eq!(register.closed_at, None);
        assert_eq!(register.current_balance_cents, 60_000);
    }

    #[test]
    fn test_cash_in_updates_running_balance() {
        let mut register = open_register(10_000);
        let posting = register.cash_in(2_500, None).unwrap();

        assert_eq!(register.current_balance_cents, 12_500);
        assert_eq!(posting.running_balance_cents, 12_500);
        assert_eq!(posting.tx_type, CashTransactionType::CashIn);
    }

    #[test]
    fn test_cash_out_cannot_go_negative() {
        let mut register = open_register(30_000);
        let err = register.cash_out(50_000, None).unwrap_err();

        assert!(matches!(err, CoreError::InsufficientCash { .. }));
        // Balance unchanged after the rejection.
        assert_eq!(register.current_balance_cents, 30_000);
    }

    #[test]
    fn test_cash_operations_require_open_register() {
        let mut register = closed_register();
        assert!(matches!(
            register.cash_in(100, None).unwrap_err(),
            CoreError::RegisterNotOpen { .. }
        ));
        assert!(matches!(
            register.cash_out(100, None).unwrap_err(),
            CoreError::RegisterNotOpen { .. }
        ));
        assert!(matches!(
            register.record_sale_cash("s1", 100).unwrap_err(),
            CoreError::RegisterNotOpen { .. }
        ));
        assert!(matches!(
            register.close(0, "op-1", None, Utc::now()).unwrap_err(),
            CoreError::RegisterNotOpen { .. }
        ));
    }

    #[test]
    fn test_zero_amounts_rejected() {
        let mut register = open_register(10_000);
        assert!(register.cash_in(0, None).is_err());
        assert!(register.cash_out(-5, None).is_err());
        assert!(register
            .adjust(0, AdjustmentDirection::Increase, None)
            .is_err());
    }

    #[test]
    fn test_adjustment_directions() {
        let mut register = open_register(10_000);

        let up = register
            .adjust(500, AdjustmentDirection::Increase, None)
            .unwrap();
        assert_eq!(up.tx_type, CashTransactionType::AdjustmentIn);
        assert_eq!(register.current_balance_cents, 10_500);

        let down = register
            .adjust(300, AdjustmentDirection::Decrease, None)
            .unwrap();
        assert_eq!(down.tx_type, CashTransactionType::AdjustmentOut);
        assert_eq!(register.current_balance_cents, 10_200);

        let err = register
            .adjust(99_999, AdjustmentDirection::Decrease, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientCash { .. }));
    }

    #[test]
    fn test_record_sale_cash() {
        let mut register = open_register(100_000);
        let posting = register.record_sale_cash("sale-9", 15_000).unwrap();

        assert_eq!(register.current_balance_cents, 115_000);
        assert_eq!(posting.tx_type, CashTransactionType::Sale);
        assert_eq!(posting.sale_id.as_deref(), Some("sale-9"));
    }

    /// Open 1000.00, cash sale 150.00, cash out 50.00, close counting
    /// 1100.00: expected matches, variance zero.
    #[test]
    fn test_balanced_session() {
        let mut register = open_register(100_000);
        register.record_sale_cash("sale-1", 15_000).unwrap();
        register.cash_out(5_000, None).unwrap();

        let posting = register.close(110_000, "op-1", None, Utc::now()).unwrap();

        assert_eq!(register.expected_amount_cents, Some(110_000));
        assert_eq!(register.actual_amount_cents, Some(110_000));
        assert_eq!(register.variance_cents, Some(0));
        assert_eq!(register.status, RegisterStatus::Closed);
        assert_eq!(posting.tx_type, CashTransactionType::ClosingBalance);
    }

    #[test]
    fn test_close_absorbs_variance_into_balance() {
        let mut register = open_register(100_000);
        register.close(98_000, "op-1", None, Utc::now()).unwrap();

        // Shortage of 20.00, and the drawer now holds the counted amount.
        assert_eq!(register.variance_cents, Some(-2_000));
        assert_eq!(register.current_balance_cents, 98_000);
    }

    #[test]
    fn test_signed_amounts() {
        assert_eq!(CashTransactionType::OpeningBalance.sign(), 1);
        assert_eq!(CashTransactionType::Sale.sign(), 1);
        assert_eq!(CashTransactionType::CashIn.sign(), 1);
        assert_eq!(CashTransactionType::AdjustmentIn.sign(), 1);
        assert_eq!(CashTransactionType::CashOut.sign(), -1);
        assert_eq!(CashTransactionType::Refund.sign(), -1);
        assert_eq!(CashTransactionType::AdjustmentOut.sign(), -1);
        assert_eq!(CashTransactionType::ClosingBalance.sign(), 0);
    }

    /// current_balance always equals opening + signed sum of postings.
    #[test]
    fn test_running_balance_integrity() {
        let mut register = open_register(100_000);
        let mut signed_sum = 0_i64;

        signed_sum += register.record_sale_cash("s1", 12_345).unwrap().amount_cents;
        signed_sum += register.cash_in(1_000, None).unwrap().amount_cents;
        signed_sum -= register.cash_out(4_000, None).unwrap().amount_cents;
        signed_sum += register
            .adjust(250, AdjustmentDirection::Increase, None)
            .unwrap()
            .amount_cents;
        signed_sum -= register
            .adjust(100, AdjustmentDirection::Decrease, None)
            .unwrap()
            .amount_cents;

        assert_eq!(
            register.current_balance_cents,
            register.opening_balance_cents + signed_sum
        );
    }
}
