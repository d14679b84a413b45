//! # Sale Settlement Orchestrator
//!
//! The top-level POS transaction: turns a cart into a persisted sale with
//! inventory decrement, balanced ledger postings and, for cash tender, a
//! cash register posting.
//!
//! ## Step Sequence (all inside ONE database transaction)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      createPosSale                                      │
//! │                                                                         │
//! │  1. cash tender?  → cash_register_id required, register must be open   │
//! │  2. price the cart, reject overpayment                                 │
//! │  3. check stock for EVERY line (no partial fulfillment)                │
//! │  4. allocate invoice number, insert sale + items + payment             │
//! │  5. decrement stock (atomic floor check) + movement rows               │
//! │  6. post revenue journal (+ COGS journal when cost tracking is on)     │
//! │  7. cash tender? → register sale posting (version CAS)                 │
//! │  8. COMMIT, read the receipt back                                      │
//! │                                                                         │
//! │  Any failure in 1-7 rolls everything back. A sale id never escapes     │
//! │  a failed settlement.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failures are synchronous and surfaced immediately; there is no
//! background retry. On a concurrency conflict the caller may resubmit
//! the whole request from scratch.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;
use crate::pool::Database;
use crate::service::register::materialize_posting;
use crate::service::{Operator, ServiceResult};
use atlas_core::ledger::{sale_cogs_journal, sale_revenue_journal};
use atlas_core::pricing::{check_paid_amount, price_cart};
use atlas_core::validation::{validate_bps, validate_cart_size, validate_required};
use atlas_core::{
    CartLine, CoreError, Money, OrderDiscount, PaymentMethod, PriceBreakdown, RegisterStatus,
    Sale, SaleItem, SaleLedgerAccounts, SalePayment, SaleStatus, SaleType, StockMovement,
    StockMovementType, TaxRate,
};

// =============================================================================
// Configuration
// =============================================================================

/// Business configuration for the settlement flow.
///
/// Account codes come from the chart of accounts; the defaults below
/// match what the seed data provisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Whether to post cost-of-goods journals alongside revenue.
    pub track_cogs: bool,
    /// Default tender accounts per payment method, used when the request
    /// does not name an account explicitly.
    pub cash_account_code: String,
    pub bank_account_code: String,
    pub mobile_account_code: String,
    pub card_account_code: String,
    /// Accounts the sale journals post against.
    pub ledger_accounts: SaleLedgerAccounts,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        SettlementConfig {
            track_cogs: true,
            cash_account_code: "1001".to_string(),
            bank_account_code: "1002".to_string(),
            mobile_account_code: "1003".to_string(),
            card_account_code: "1004".to_string(),
            ledger_accounts: SaleLedgerAccounts {
                receivable_code: "1100".to_string(),
                revenue_code: "4000".to_string(),
                discounts_code: "4100".to_string(),
                tax_payable_code: "2100".to_string(),
                cogs_code: "5000".to_string(),
                inventory_code: "1200".to_string(),
            },
        }
    }
}

impl SettlementConfig {
    /// The default tender account for a payment method.
    pub fn tender_account(&self, method: PaymentMethod) -> &str {
        match method {
            PaymentMethod::Cash => &self.cash_account_code,
            PaymentMethod::Bank => &self.bank_account_code,
            PaymentMethod::Mobile => &self.mobile_account_code,
            PaymentMethod::Card => &self.card_account_code,
        }
    }
}

// =============================================================================
// Request / Response
// =============================================================================

/// Input for a POS sale settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePosSaleRequest {
    pub items: Vec<CartLine>,
    pub branch_id: String,
    pub customer_id: Option<String>,
    pub discount: Option<OrderDiscount>,
    /// Order tax rate in basis points.
    pub tax_bps: u32,
    pub payment_method: PaymentMethod,
    pub paid_amount_cents: i64,
    /// Tender account override; defaults per payment method.
    pub account_code: Option<String>,
    /// Required when payment_method is cash.
    pub cash_register_id: Option<String>,
    pub notes: Option<String>,
}

/// The fully populated sale returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SaleReceipt {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub payments: Vec<SalePayment>,
    pub pricing: PriceBreakdown,
}

// =============================================================================
// Service
// =============================================================================

/// Orchestrates POS sale settlement.
#[derive(Debug, Clone)]
pub struct SettlementService {
    db: Database,
    config: SettlementConfig,
}

impl SettlementService {
    /// Creates a new settlement service.
    pub fn new(db: Database, config: SettlementConfig) -> Self {
        SettlementService { db, config }
    }

    /// Settles a POS sale. See the module docs for the step sequence.
    pub async fn create_pos_sale(
        &self,
        request: CreatePosSaleRequest,
        operator: &Operator,
    ) -> ServiceResult<SaleReceipt> {
        validate_required("branch_id", &request.branch_id).map_err(CoreError::from)?;
        validate_cart_size(request.items.len()).map_err(CoreError::from)?;
        validate_bps("tax_percentage", request.tax_bps).map_err(CoreError::from)?;

        let now = Utc::now();
        let sales = self.db.sales();
        let registers = self.db.registers();
        let products = self.db.products();
        let customers = self.db.customers();
        let inventory = self.db.inventory();
        let ledger = self.db.ledger();

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        // Step 1: cash tender requires an identified, open register.
        let register_ctx = if request.payment_method.is_cash() {
            let register_id = request
                .cash_register_id
                .as_deref()
                .ok_or(CoreError::CashRegisterRequired)?;
            let register = registers.load(&mut tx, register_id).await?;
            match register.status {
                RegisterStatus::Open => {}
                RegisterStatus::Maintenance => {
                    return Err(CoreError::RegisterInMaintenance {
                        register_id: register.id,
                    }
                    .into())
                }
                RegisterStatus::Closed => {
                    return Err(CoreError::RegisterNotOpen {
                        register_id: register.id,
                    }
                    .into())
                }
            }
            let loaded_version = register.version;
            Some((register, loaded_version))
        } else {
            None
        };

        // Step 2: price the cart and reject overpayment.
        let group_bps = match &request.customer_id {
            None => 0,
            Some(customer_id) => {
                let customer = customers
                    .get_by_id(&mut tx, customer_id)
                    .await?
                    .ok_or_else(|| CoreError::CustomerNotFound(customer_id.clone()))?;
                customer.group_discount_bps.clamp(0, 10_000) as u32
            }
        };
        let tax_rate = TaxRate::from_bps(request.tax_bps);
        let pricing = price_cart(&request.items, request.discount, tax_rate, group_bps)?;
        check_paid_amount(pricing.total_cents, request.paid_amount_cents)?;

        // Step 3: every line must be fulfillable before anything is
        // written. One short line rejects the whole sale.
        let mut line_products = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let product = products
                .get_by_id(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
            let available = inventory
                .available_quantity(&mut tx, &line.product_id, &line.warehouse_id)
                .await?;
            if available < line.quantity {
                return Err(CoreError::InsufficientStock {
                    sku: product.sku,
                    available,
                    requested: line.quantity,
                }
                .into());
            }
            line_products.push(product);
        }

        // Step 4: persist the sale aggregate.
        let invoice_number = sales.next_invoice_number(&mut tx, now).await?;
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            invoice_number,
            branch_id: request.branch_id.clone(),
            customer_id: request.customer_id.clone(),
            status: SaleStatus::Completed,
            sale_type: SaleType::Pos,
            subtotal_cents: pricing.subtotal_cents,
            manual_discount_cents: pricing.manual_discount_cents,
            group_discount_cents: pricing.group_discount_cents,
            tax_cents: pricing.tax_cents,
            total_cents: pricing.total_cents,
            paid_amount_cents: request.paid_amount_cents,
            served_by: operator.user_id.clone(),
            created_by: operator.user_id.clone(),
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        sales.insert_sale(&mut tx, &sale).await?;

        for (line, product) in request.items.iter().zip(line_products.iter()) {
            let line_total = line.line_total_cents();
            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: line.product_id.clone(),
                warehouse_id: line.warehouse_id.clone(),
                sku_snapshot: product.sku.clone(),
                name_snapshot: product.name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                discount_cents: line.discount_cents,
                tax_cents: Money::from_cents(line_total).calculate_tax(tax_rate).cents(),
                line_total_cents: line_total,
                created_at: now,
            };
            sales.insert_item(&mut tx, &item).await?;
        }

        let payment = SalePayment {
            id: Uuid::new_v4().to_string(),
            sale_id: sale.id.clone(),
            method: request.payment_method,
            amount_cents: request.paid_amount_cents,
            account_code: request
                .account_code
                .clone()
                .unwrap_or_else(|| self.config.tender_account(request.payment_method).to_string()),
            reference: None,
            created_at: now,
        };
        // A fully-credit sale (paid 0) carries no payment leg.
        if payment.amount_cents > 0 {
            sales.insert_payment(&mut tx, &payment).await?;
        }

        // Step 5: decrement stock and record OUT movements. The UPDATE
        // re-checks the floor, catching carts that raced us since step 3.
        for (line, product) in request.items.iter().zip(line_products.iter()) {
            let applied = inventory
                .try_decrement(&mut tx, &line.product_id, &line.warehouse_id, line.quantity, now)
                .await?;
            if !applied {
                let available = inventory
                    .available_quantity(&mut tx, &line.product_id, &line.warehouse_id)
                    .await?;
                return Err(CoreError::InsufficientStock {
                    sku: product.sku.clone(),
                    available,
                    requested: line.quantity,
                }
                .into());
            }
            let movement = StockMovement {
                id: Uuid::new_v4().to_string(),
                product_id: line.product_id.clone(),
                warehouse_id: line.warehouse_id.clone(),
                movement_type: StockMovementType::Out,
                quantity: line.quantity,
                reference_type: Some("sale".to_string()),
                reference_id: Some(sale.id.clone()),
                created_by: operator.user_id.clone(),
                created_at: now,
            };
            inventory.insert_movement(&mut tx, &movement).await?;
        }

        // Step 6: ledger postings.
        let revenue_journal =
            sale_revenue_journal(&sale, &payment, &self.config.ledger_accounts)?;
        if !revenue_journal.entries.is_empty() {
            ledger
                .post_journal(&mut tx, &revenue_journal, &operator.user_id, now)
                .await?;
        }

        if self.config.track_cogs {
            let cogs_cents: i64 = request
                .items
                .iter()
                .zip(line_products.iter())
                .filter_map(|(line, product)| {
                    product.cost_cents.map(|cost| cost * line.quantity)
                })
                .sum();
            // Lines without a captured cost contribute nothing; a sale of
            // only such lines posts no COGS journal at all.
            if cogs_cents > 0 {
                let cogs_journal =
                    sale_cogs_journal(&sale, cogs_cents, &self.config.ledger_accounts)?;
                ledger
                    .post_journal(&mut tx, &cogs_journal, &operator.user_id, now)
                    .await?;
            }
        }

        // Step 7: drawer posting for the cash-tendered portion.
        if let Some((mut register, loaded_version)) = register_ctx {
            if request.paid_amount_cents > 0 {
                let draft = register.record_sale_cash(&sale.id, request.paid_amount_cents)?;
                register.updated_at = now;
                registers.save_cas(&mut tx, &register, loaded_version).await?;
                let posting = materialize_posting(draft, &register, &operator.user_id, now)?;
                registers.insert_transaction(&mut tx, &posting).await?;
            }
        }

        // Step 8: commit. From here the sale exists; before here, nothing
        // does.
        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale_id = %sale.id,
            invoice = %sale.invoice_number,
            total = %sale.total_cents,
            method = ?request.payment_method,
            "POS sale settled"
        );

        let items = sales.get_items(&sale.id).await?;
        let payments = sales.get_payments(&sale.id).await?;
        let sale = sales.require(&sale.id).await?;

        Ok(SaleReceipt {
            sale,
            items,
            payments,
            pricing,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceError;
    use crate::testing::{operator, seed_customer, seed_product, seed_register, setup_db};
    use atlas_core::DiscountType;

    fn cart_line(product_id: &str, qty: i64, unit_price_cents: i64) -> CartLine {
        CartLine {
            product_id: product_id.to_string(),
            warehouse_id: "wh-1".to_string(),
            quantity: qty,
            unit_price_cents,
            discount_cents: 0,
        }
    }

    fn cash_request(product_id: &str, register_id: &str) -> CreatePosSaleRequest {
        CreatePosSaleRequest {
            items: vec![cart_line(product_id, 2, 10_000)],
            branch_id: "branch-1".to_string(),
            customer_id: None,
            discount: None,
            tax_bps: 500,
            payment_method: PaymentMethod::Cash,
            paid_amount_cents: 21_000,
            account_code: None,
            cash_register_id: Some(register_id.to_string()),
            notes: None,
        }
    }

    async fn sales_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_cash_sale_settles_end_to_end() {
        let db = setup_db().await;
        let product_id = seed_product(&db, "COKE-330", 10_000, Some(6_000), 50).await;
        let register_id = seed_register(&db, 100_000).await;

        let service = db.settlement(SettlementConfig::default());
        let receipt = service
            .create_pos_sale(cash_request(&product_id, &register_id), &operator())
            .await
            .unwrap();

        // Pricing: 2 × 100.00 + 5% tax.
        assert_eq!(receipt.sale.subtotal_cents, 20_000);
        assert_eq!(receipt.sale.tax_cents, 1_000);
        assert_eq!(receipt.sale.total_cents, 21_000);
        assert_eq!(receipt.sale.paid_amount_cents, 21_000);
        assert_eq!(receipt.sale.due_cents(), 0);
        assert_eq!(receipt.sale.status, SaleStatus::Completed);
        assert!(receipt.sale.invoice_number.starts_with("INV-"));

        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].sku_snapshot, "COKE-330");
        assert_eq!(receipt.payments.len(), 1);
        assert_eq!(receipt.payments[0].amount_cents, 21_000);

        // Inventory decremented, movement recorded.
        assert_eq!(db.inventory().stock_level(&product_id, "wh-1").await.unwrap(), 48);
        let movements = db
            .inventory()
            .movements_for_reference(&receipt.sale.id)
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].quantity, 2);

        // Register got the cash.
        let register = db.registers().get_by_id(&register_id).await.unwrap().unwrap();
        assert_eq!(register.current_balance_cents, 121_000);

        // Journals are balanced (revenue + COGS).
        let journals = db.ledger().journals_for_reference(&receipt.sale.id).await.unwrap();
        assert_eq!(journals.len(), 2);
        for journal in &journals {
            let debit: i64 = journal.entries.iter().map(|e| e.debit_cents).sum();
            let credit: i64 = journal.entries.iter().map(|e| e.credit_cents).sum();
            assert_eq!(debit, credit);
        }
        let cogs = journals
            .iter()
            .find(|j| j.transaction.reference_type == "sale_cogs")
            .unwrap();
        // 2 units at cost 60.00.
        let cogs_debit: i64 = cogs.entries.iter().map(|e| e.debit_cents).sum();
        assert_eq!(cogs_debit, 12_000);
    }

    #[tokio::test]
    async fn test_cash_without_register_id_rejected() {
        let db = setup_db().await;
        let product_id = seed_product(&db, "COKE-330", 10_000, None, 50).await;

        let mut request = cash_request(&product_id, "ignored");
        request.cash_register_id = None;

        let service = db.settlement(SettlementConfig::default());
        let err = service
            .create_pos_sale(request, &operator())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Cash register ID is required for cash payments"
        );
        // Nothing was persisted.
        assert_eq!(sales_count(&db).await, 0);
        assert_eq!(db.inventory().stock_level(&product_id, "wh-1").await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_cash_with_closed_register_rejected() {
        let db = setup_db().await;
        let product_id = seed_product(&db, "COKE-330", 10_000, None, 50).await;
        // Provisioned but never opened.
        let register_id = crate::testing::provision_register(&db).await;

        let service = db.settlement(SettlementConfig::default());
        let err = service
            .create_pos_sale(cash_request(&product_id, &register_id), &operator())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::RegisterNotOpen { .. })
        ));
        assert_eq!(sales_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rejects_whole_sale() {
        let db = setup_db().await;
        let product_id = seed_product(&db, "COKE-330", 10_000, None, 3).await;
        let register_id = seed_register(&db, 0).await;

        let mut request = cash_request(&product_id, &register_id);
        request.items = vec![cart_line(&product_id, 5, 10_000)];
        request.paid_amount_cents = 0;

        let service = db.settlement(SettlementConfig::default());
        let err = service
            .create_pos_sale(request, &operator())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Only 3 units of COKE-330 available in stock, requested 5"
        );
        // No rows anywhere, stock untouched.
        assert_eq!(sales_count(&db).await, 0);
        assert_eq!(db.inventory().stock_level(&product_id, "wh-1").await.unwrap(), 3);
        assert!(db.ledger().history(1, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overpayment_rejected() {
        let db = setup_db().await;
        let product_id = seed_product(&db, "COKE-330", 10_000, None, 50).await;
        let register_id = seed_register(&db, 0).await;

        let mut request = cash_request(&product_id, &register_id);
        request.paid_amount_cents = 21_001;

        let service = db.settlement(SettlementConfig::default());
        let err = service
            .create_pos_sale(request, &operator())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::Overpayment { .. })
        ));
        assert_eq!(sales_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_zero_quantity_line_has_no_side_effects() {
        let db = setup_db().await;
        let product_id = seed_product(&db, "COKE-330", 10_000, None, 50).await;
        let register_id = seed_register(&db, 0).await;

        let mut request = cash_request(&product_id, &register_id);
        request.items = vec![cart_line(&product_id, 0, 10_000)];
        request.paid_amount_cents = 0;

        let service = db.settlement(SettlementConfig::default());
        let err = service
            .create_pos_sale(request, &operator())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Core(CoreError::Validation(_))));
        assert_eq!(sales_count(&db).await, 0);
        assert_eq!(db.inventory().stock_level(&product_id, "wh-1").await.unwrap(), 50);
        let register = db.registers().get_by_id(&register_id).await.unwrap().unwrap();
        assert_eq!(register.current_balance_cents, 0);
    }

    #[tokio::test]
    async fn test_credit_sale_posts_receivable_and_skips_payment_row() {
        let db = setup_db().await;
        let product_id = seed_product(&db, "COKE-330", 10_000, None, 50).await;

        let request = CreatePosSaleRequest {
            items: vec![cart_line(&product_id, 1, 10_000)],
            branch_id: "branch-1".to_string(),
            customer_id: None,
            discount: None,
            tax_bps: 0,
            payment_method: PaymentMethod::Bank,
            paid_amount_cents: 0,
            account_code: None,
            cash_register_id: None,
            notes: None,
        };

        let service = db.settlement(SettlementConfig::default());
        let receipt = service.create_pos_sale(request, &operator()).await.unwrap();

        assert_eq!(receipt.sale.due_cents(), 10_000);
        assert!(receipt.payments.is_empty());

        let journals = db.ledger().journals_for_reference(&receipt.sale.id).await.unwrap();
        let revenue = journals
            .iter()
            .find(|j| j.transaction.reference_type == "sale")
            .unwrap();
        let receivable: i64 = revenue
            .entries
            .iter()
            .filter(|e| e.account_code == "1100")
            .map(|e| e.debit_cents)
            .sum();
        assert_eq!(receivable, 10_000);
    }

    #[tokio::test]
    async fn test_cogs_disabled_posts_single_journal() {
        let db = setup_db().await;
        let product_id = seed_product(&db, "COKE-330", 10_000, Some(6_000), 50).await;

        let request = CreatePosSaleRequest {
            items: vec![cart_line(&product_id, 1, 10_000)],
            branch_id: "branch-1".to_string(),
            customer_id: None,
            discount: None,
            tax_bps: 0,
            payment_method: PaymentMethod::Card,
            paid_amount_cents: 10_000,
            account_code: None,
            cash_register_id: None,
            notes: None,
        };

        let config = SettlementConfig {
            track_cogs: false,
            ..SettlementConfig::default()
        };
        let receipt = db
            .settlement(config)
            .create_pos_sale(request, &operator())
            .await
            .unwrap();

        let journals = db.ledger().journals_for_reference(&receipt.sale.id).await.unwrap();
        assert_eq!(journals.len(), 1);
        assert_eq!(journals[0].transaction.reference_type, "sale");
    }

    #[tokio::test]
    async fn test_cogs_skipped_when_no_cost_captured() {
        let db = setup_db().await;
        let product_id = seed_product(&db, "COKE-330", 10_000, None, 50).await;

        let request = CreatePosSaleRequest {
            items: vec![cart_line(&product_id, 1, 10_000)],
            branch_id: "branch-1".to_string(),
            customer_id: None,
            discount: None,
            tax_bps: 0,
            payment_method: PaymentMethod::Card,
            paid_amount_cents: 10_000,
            account_code: None,
            cash_register_id: None,
            notes: None,
        };

        let receipt = db
            .settlement(SettlementConfig::default())
            .create_pos_sale(request, &operator())
            .await
            .unwrap();

        // Cost tracking is on, but no line carries a historical cost.
        let journals = db.ledger().journals_for_reference(&receipt.sale.id).await.unwrap();
        assert_eq!(journals.len(), 1);
    }

    #[tokio::test]
    async fn test_group_discount_from_customer_lookup() {
        let db = setup_db().await;
        let product_id = seed_product(&db, "COKE-330", 10_000, None, 50).await;
        let customer_id = seed_customer(&db, "Wholesale Ltd", 500).await;

        let request = CreatePosSaleRequest {
            items: vec![cart_line(&product_id, 2, 10_000)],
            branch_id: "branch-1".to_string(),
            customer_id: Some(customer_id),
            discount: Some(OrderDiscount {
                discount_type: DiscountType::Percentage,
                value: 1_000,
            }),
            tax_bps: 500,
            payment_method: PaymentMethod::Card,
            paid_amount_cents: 0,
            account_code: None,
            cash_register_id: None,
            notes: None,
        };

        let receipt = db
            .settlement(SettlementConfig::default())
            .create_pos_sale(request, &operator())
            .await
            .unwrap();

        // Both discounts on the tax-inclusive 21000.
        assert_eq!(receipt.sale.group_discount_cents, 1_050);
        assert_eq!(receipt.sale.manual_discount_cents, 2_100);
        assert_eq!(receipt.sale.total_cents, 17_850);
    }

    #[tokio::test]
    async fn test_unknown_customer_rejected() {
        let db = setup_db().await;
        let product_id = seed_product(&db, "COKE-330", 10_000, None, 50).await;

        let request = CreatePosSaleRequest {
            items: vec![cart_line(&product_id, 1, 10_000)],
            branch_id: "branch-1".to_string(),
            customer_id: Some("missing".to_string()),
            discount: None,
            tax_bps: 0,
            payment_method: PaymentMethod::Card,
            paid_amount_cents: 0,
            account_code: None,
            cash_register_id: None,
            notes: None,
        };

        let err = db
            .settlement(SettlementConfig::default())
            .create_pos_sale(request, &operator())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::CustomerNotFound(_))
        ));
        assert_eq!(sales_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_invoice_numbers_are_sequential_per_day() {
        let db = setup_db().await;
        let product_id = seed_product(&db, "COKE-330", 10_000, None, 50).await;

        let service = db.settlement(SettlementConfig::default());
        let mut invoices = Vec::new();
        for _ in 0..3 {
            let request = CreatePosSaleRequest {
                items: vec![cart_line(&product_id, 1, 10_000)],
                branch_id: "branch-1".to_string(),
                customer_id: None,
                discount: None,
                tax_bps: 0,
                payment_method: PaymentMethod::Card,
                paid_amount_cents: 10_000,
                account_code: None,
                cash_register_id: None,
                notes: None,
            };
            let receipt = service.create_pos_sale(request, &operator()).await.unwrap();
            invoices.push(receipt.sale.invoice_number);
        }

        let day = Utc::now().format("%Y%m%d").to_string();
        assert_eq!(invoices[0], format!("INV-{day}-0001"));
        assert_eq!(invoices[1], format!("INV-{day}-0002"));
        assert_eq!(invoices[2], format!("INV-{day}-0003"));
    }

    #[tokio::test]
    async fn test_non_cash_sale_leaves_register_untouched() {
        let db = setup_db().await;
        let product_id = seed_product(&db, "COKE-330", 10_000, None, 50).await;
        let register_id = seed_register(&db, 50_000).await;

        let request = CreatePosSaleRequest {
            items: vec![cart_line(&product_id, 1, 10_000)],
            branch_id: "branch-1".to_string(),
            customer_id: None,
            discount: None,
            tax_bps: 0,
            payment_method: PaymentMethod::Card,
            paid_amount_cents: 10_000,
            // Register named but tender is card: drawer must not move.
            account_code: None,
            cash_register_id: Some(register_id.clone()),
            notes: None,
        };

        db.settlement(SettlementConfig::default())
            .create_pos_sale(request, &operator())
            .await
            .unwrap();

        let register = db.registers().get_by_id(&register_id).await.unwrap().unwrap();
        assert_eq!(register.current_balance_cents, 50_000);
    }
}
