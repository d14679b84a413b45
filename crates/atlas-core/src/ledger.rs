//! # Ledger Drafting
//!
//! Journal types, the balance invariant, and the builders that turn a
//! settled sale into double-entry postings.
//!
//! Every journal is posted once per economic event and is immutable
//! afterwards; the transaction history views read it as-is. The single
//! hard invariant: for every journal, the sum of entry debits equals the
//! sum of entry credits. An unbalanced draft is a bug in the builder, not
//! caller input, so it maps to an internal error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{Sale, SalePayment};

/// Journal reference tag for a sale's revenue posting.
pub const REF_SALE: &str = "sale";
/// Journal reference tag for a sale's cost-of-goods posting.
pub const REF_SALE_COGS: &str = "sale_cogs";

// =============================================================================
// Draft Types
// =============================================================================

/// One line of a journal draft. Exactly one of debit/credit is non-zero.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EntryLine {
    pub account_code: String,
    pub debit_cents: i64,
    pub credit_cents: i64,
    pub narration: Option<String>,
}

impl EntryLine {
    /// Debit line.
    pub fn debit(account_code: &str, cents: i64, narration: &str) -> Self {
        EntryLine {
            account_code: account_code.to_string(),
            debit_cents: cents,
            credit_cents: 0,
            narration: Some(narration.to_string()),
        }
    }

    /// Credit line.
    pub fn credit(account_code: &str, cents: i64, narration: &str) -> Self {
        EntryLine {
            account_code: account_code.to_string(),
            debit_cents: 0,
            credit_cents: cents,
            narration: Some(narration.to_string()),
        }
    }
}

/// A journal not yet persisted: header plus balanced entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalDraft {
    /// What kind of event produced this journal (`sale`, `sale_cogs`).
    pub reference_type: String,
    /// Id of the referenced aggregate (the sale id).
    pub reference_id: String,
    pub narration: Option<String>,
    pub entries: Vec<EntryLine>,
}

impl JournalDraft {
    /// Sum of all debit lines.
    pub fn debit_total_cents(&self) -> i64 {
        self.entries.iter().map(|e| e.debit_cents).sum()
    }

    /// Sum of all credit lines.
    pub fn credit_total_cents(&self) -> i64 {
        self.entries.iter().map(|e| e.credit_cents).sum()
    }

    /// Enforces the double-entry invariant.
    pub fn ensure_balanced(&self) -> CoreResult<()> {
        let debit = self.debit_total_cents();
        let credit = self.credit_total_cents();
        if debit != credit {
            return Err(CoreError::LedgerImbalance {
                debit_cents: debit,
                credit_cents: credit,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Ledger account wiring
// =============================================================================

/// Chart-of-accounts codes the sale builders post against. Filled from
/// configuration; the defaults live in the persistence layer's
/// `SettlementConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLedgerAccounts {
    /// Asset account for amounts not yet collected (credit sales).
    pub receivable_code: String,
    /// Revenue account credited with the gross subtotal.
    pub revenue_code: String,
    /// Contra-revenue account carrying manual + group discounts.
    pub discounts_code: String,
    /// Liability account for collected sales tax.
    pub tax_payable_code: String,
    /// Expense account for cost of goods sold.
    pub cogs_code: String,
    /// Asset account for inventory at cost.
    pub inventory_code: String,
}

// =============================================================================
// Builders
// =============================================================================

/// Builds the revenue journal for a settled sale.
///
/// Decomposition (zero lines are omitted):
/// ```text
///   debit  tender account      paid_amount
///   debit  receivable          due             (credit sales)
///   debit  sales discounts     total discount
///   credit revenue             subtotal
///   credit tax payable         tax
/// ```
/// This balances by construction: paid + due = total, and
/// total + discounts = subtotal + tax.
pub fn sale_revenue_journal(
    sale: &Sale,
    payment: &SalePayment,
    accounts: &SaleLedgerAccounts,
) -> CoreResult<JournalDraft> {
    let mut entries = Vec::new();
    let invoice = &sale.invoice_number;

    if payment.amount_cents > 0 {
        entries.push(EntryLine::debit(
            &payment.account_code,
            payment.amount_cents,
            &format!("Payment received for {invoice}"),
        ));
    }
    let due = sale.due_cents();
    if due > 0 {
        entries.push(EntryLine::debit(
            &accounts.receivable_code,
            due,
            &format!("Amount due for {invoice}"),
        ));
    }
    let discount = sale.total_discount_cents();
    if discount > 0 {
        entries.push(EntryLine::debit(
            &accounts.discounts_code,
            discount,
            &format!("Discounts for {invoice}"),
        ));
    }
    if sale.subtotal_cents > 0 {
        entries.push(EntryLine::credit(
            &accounts.revenue_code,
            sale.subtotal_cents,
            &format!("Revenue for {invoice}"),
        ));
    }
    if sale.tax_cents > 0 {
        entries.push(EntryLine::credit(
            &accounts.tax_payable_code,
            sale.tax_cents,
            &format!("Sales tax for {invoice}"),
        ));
    }

    let draft = JournalDraft {
        reference_type: REF_SALE.to_string(),
        reference_id: sale.id.clone(),
        narration: Some(format!("POS sale {invoice}")),
        entries,
    };
    draft.ensure_balanced()?;
    Ok(draft)
}

/// Builds the cost-of-goods journal for a settled sale.
///
/// Debits COGS and credits the inventory asset at historical purchase
/// cost. Only called when cost tracking is enabled and at least one line
/// carries a known cost.
pub fn sale_cogs_journal(
    sale: &Sale,
    cogs_cents: i64,
    accounts: &SaleLedgerAccounts,
) -> CoreResult<JournalDraft> {
    let invoice = &sale.invoice_number;
    let draft = JournalDraft {
        reference_type: REF_SALE_COGS.to_string(),
        reference_id: sale.id.clone(),
        narration: Some(format!("COGS for {invoice}")),
        entries: vec![
            EntryLine::debit(
                &accounts.cogs_code,
                cogs_cents,
                &format!("Cost of goods for {invoice}"),
            ),
            EntryLine::credit(
                &accounts.inventory_code,
                cogs_cents,
                &format!("Inventory relief for {invoice}"),
            ),
        ],
    };
    draft.ensure_balanced()?;
    Ok(draft)
}

// =============================================================================
// Persisted Types
// =============================================================================

/// A posted journal header. Linked to its source by reference, not owned
/// by it; queried read-only by the transaction history views.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AccountTransaction {
    pub id: String,
    pub reference_type: String,
    pub reference_id: String,
    pub narration: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A posted journal line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionEntry {
    pub id: String,
    pub transaction_id: String,
    pub account_code: String,
    pub debit_cents: i64,
    pub credit_cents: i64,
    pub narration: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentMethod, SaleStatus, SaleType};

    fn accounts() -> SaleLedgerAccounts {
        SaleLedgerAccounts {
            receivable_code: "1100".to_string(),
            revenue_code: "4000".to_string(),
            discounts_code: "4100".to_string(),
            tax_payable_code: "2100".to_string(),
            cogs_code: "5000".to_string(),
            inventory_code: "1200".to_string(),
        }
    }

    fn sale(subtotal: i64, manual: i64, group: i64, tax: i64, paid: i64) -> Sale {
        let now = Utc::now();
        let total = subtotal - manual - group + tax;
        Sale {
            id: "sale-1".to_string(),
            invoice_number: "INV-20260807-0001".to_string(),
            branch_id: "branch-1".to_string(),
            customer_id: None,
            status: SaleStatus::Completed,
            sale_type: SaleType::Pos,
            subtotal_cents: subtotal,
            manual_discount_cents: manual,
            group_discount_cents: group,
            tax_cents: tax,
            total_cents: total,
            paid_amount_cents: paid,
            served_by: "op-1".to_string(),
            created_by: "op-1".to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn payment(amount: i64) -> SalePayment {
        SalePayment {
            id: "pay-1".to_string(),
            sale_id: "sale-1".to_string(),
            method: PaymentMethod::Cash,
            amount_cents: amount,
            account_code: "1001".to_string(),
            reference: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_balance_check() {
        let balanced = JournalDraft {
            reference_type: REF_SALE.to_string(),
            reference_id: "s".to_string(),
            narration: None,
            entries: vec![
                EntryLine::debit("1001", 100, "x"),
                EntryLine::credit("4000", 100, "x"),
            ],
        };
        balanced.ensure_balanced().unwrap();

        let unbalanced = JournalDraft {
            reference_type: REF_SALE.to_string(),
            reference_id: "s".to_string(),
            narration: None,
            entries: vec![
                EntryLine::debit("1001", 100, "x"),
                EntryLine::credit("4000", 90, "x"),
            ],
        };
        assert!(matches!(
            unbalanced.ensure_balanced().unwrap_err(),
            CoreError::LedgerImbalance { .. }
        ));
    }

    #[test]
    fn test_fully_paid_sale_journal_balances() {
        let sale = sale(20_000, 0, 0, 1_000, 21_000);
        let draft = sale_revenue_journal(&sale, &payment(21_000), &accounts()).unwrap();

        assert_eq!(draft.debit_total_cents(), draft.credit_total_cents());
        assert_eq!(draft.debit_total_cents(), 21_000);
        // Tender debit, revenue credit, tax credit; no receivable or
        // discount lines.
        assert_eq!(draft.entries.len(), 3);
    }

    #[test]
    fn test_credit_sale_posts_receivable() {
        let sale = sale(20_000, 0, 0, 1_000, 6_000);
        let draft = sale_revenue_journal(&sale, &payment(6_000), &accounts()).unwrap();

        let receivable: i64 = draft
            .entries
            .iter()
            .filter(|e| e.account_code == "1100")
            .map(|e| e.debit_cents)
            .sum();
        assert_eq!(receivable, 15_000);
        assert_eq!(draft.debit_total_cents(), draft.credit_total_cents());
    }

    #[test]
    fn test_discounted_sale_journal_balances() {
        // subtotal 20000, manual 2100, group 1050, tax 1000 → total 17850
        let sale = sale(20_000, 2_100, 1_050, 1_000, 17_850);
        let draft = sale_revenue_journal(&sale, &payment(17_850), &accounts()).unwrap();

        let discounts: i64 = draft
            .entries
            .iter()
            .filter(|e| e.account_code == "4100")
            .map(|e| e.debit_cents)
            .sum();
        assert_eq!(discounts, 3_150);
        assert_eq!(draft.debit_total_cents(), draft.credit_total_cents());
    }

    #[test]
    fn test_cogs_journal() {
        let sale = sale(20_000, 0, 0, 0, 20_000);
        let draft = sale_cogs_journal(&sale, 8_000, &accounts()).unwrap();

        assert_eq!(draft.reference_type, REF_SALE_COGS);
        assert_eq!(draft.debit_total_cents(), 8_000);
        assert_eq!(draft.credit_total_cents(), 8_000);
        assert_eq!(draft.entries.len(), 2);
    }
}
