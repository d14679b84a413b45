//! # Sale Repository
//!
//! Database operations for sales, sale items and sale payments.
//!
//! Writes are transaction-scoped: the settlement service passes its
//! transaction connection in, so a sale and its children are either all
//! persisted or none are. Reads run on the pool.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use atlas_core::{Sale, SaleItem, SalePayment};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Transaction-scoped writes
    // -------------------------------------------------------------------------

    /// Allocates the next invoice number for the given day.
    ///
    /// Numbers are sequential per day and unique: the counter row is
    /// bumped atomically inside the caller's transaction, so two
    /// concurrent settlements can never draw the same number.
    ///
    /// Format: `INV-YYYYMMDD-NNNN`.
    pub async fn next_invoice_number(
        &self,
        conn: &mut SqliteConnection,
        now: DateTime<Utc>,
    ) -> DbResult<String> {
        let day = now.format("%Y%m%d").to_string();

        let seq: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO invoice_counters (day, next_seq) VALUES (?1, 2)
            ON CONFLICT (day) DO UPDATE SET next_seq = next_seq + 1
            RETURNING next_seq - 1
            "#,
        )
        .bind(&day)
        .fetch_one(&mut *conn)
        .await?;

        Ok(format!("INV-{}-{:04}", day, seq))
    }

    /// Inserts a sale header.
    pub async fn insert_sale(&self, conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, invoice = %sale.invoice_number, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, invoice_number, branch_id, customer_id, status, sale_type,
                subtotal_cents, manual_discount_cents, group_discount_cents,
                tax_cents, total_cents, paid_amount_cents,
                served_by, created_by, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.invoice_number)
        .bind(&sale.branch_id)
        .bind(&sale.customer_id)
        .bind(sale.status)
        .bind(sale.sale_type)
        .bind(sale.subtotal_cents)
        .bind(sale.manual_discount_cents)
        .bind(sale.group_discount_cents)
        .bind(sale.tax_cents)
        .bind(sale.total_cents)
        .bind(sale.paid_amount_cents)
        .bind(&sale.served_by)
        .bind(&sale.created_by)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a sale line item.
    ///
    /// ## Snapshot Pattern
    /// Product details (sku, name, price) were copied onto the item so
    /// the sale history survives later product edits.
    pub async fn insert_item(&self, conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, warehouse_id,
                sku_snapshot, name_snapshot, quantity, unit_price_cents,
                discount_cents, tax_cents, line_total_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.warehouse_id)
        .bind(&item.sku_snapshot)
        .bind(&item.name_snapshot)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.discount_cents)
        .bind(item.tax_cents)
        .bind(item.line_total_cents)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a payment leg.
    pub async fn insert_payment(
        &self,
        conn: &mut SqliteConnection,
        payment: &SalePayment,
    ) -> DbResult<()> {
        debug!(sale_id = %payment.sale_id, amount = %payment.amount_cents, "Recording payment");

        sqlx::query(
            r#"
            INSERT INTO sale_payments (
                id, sale_id, method, amount_cents, account_code, reference, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.sale_id)
        .bind(payment.method)
        .bind(payment.amount_cents)
        .bind(&payment.account_code)
        .bind(&payment.reference)
        .bind(payment.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, invoice_number, branch_id, customer_id, status, sale_type,
                   subtotal_cents, manual_discount_cents, group_discount_cents,
                   tax_cents, total_cents, paid_amount_cents,
                   served_by, created_by, notes, created_at, updated_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale by ID or fails with NotFound.
    pub async fn require(&self, id: &str) -> DbResult<Sale> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }

    /// Gets all items for a sale, in insert order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, warehouse_id,
                   sku_snapshot, name_snapshot, quantity, unit_price_cents,
                   discount_cents, tax_cents, line_total_cents, created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets all payments for a sale.
    pub async fn get_payments(&self, sale_id: &str) -> DbResult<Vec<SalePayment>> {
        let payments = sqlx::query_as::<_, SalePayment>(
            r#"
            SELECT id, sale_id, method, amount_cents, account_code, reference, created_at
            FROM sale_payments
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Lists completed POS sales, newest first, paginated.
    pub async fn list_completed_pos(&self, page: u32, limit: u32) -> DbResult<Vec<Sale>> {
        let offset = (page.saturating_sub(1) as i64) * limit as i64;

        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, invoice_number, branch_id, customer_id, status, sale_type,
                   subtotal_cents, manual_discount_cents, group_discount_cents,
                   tax_cents, total_cents, paid_amount_cents,
                   served_by, created_by, notes, created_at, updated_at
            FROM sales
            WHERE status = 'completed' AND sale_type = 'pos'
            ORDER BY created_at DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Count of completed POS sales (for pagination metadata).
    pub async fn count_completed_pos(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sales WHERE status = 'completed' AND sale_type = 'pos'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
