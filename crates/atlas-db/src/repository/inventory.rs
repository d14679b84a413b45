//! # Inventory Repository
//!
//! Stock levels and the append-only movement audit.
//!
//! The decrement used by settlement is an atomic floor-checked UPDATE:
//! `SET quantity = quantity - ? WHERE ... AND quantity >= ?`. Two carts
//! racing for the last units cannot both win; the loser's settlement
//! transaction rolls back with an insufficient-stock rejection.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use atlas_core::{StockMovement, StockMovementType};

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Transaction-scoped operations
    // -------------------------------------------------------------------------

    /// Available quantity for a product in a warehouse. Missing rows
    /// count as zero stock.
    pub async fn available_quantity(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        warehouse_id: &str,
    ) -> DbResult<i64> {
        let quantity: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM stock_levels WHERE product_id = ?1 AND warehouse_id = ?2",
        )
        .bind(product_id)
        .bind(warehouse_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(quantity.unwrap_or(0))
    }

    /// Atomically decrements stock, refusing to go below zero.
    ///
    /// Returns `true` when the decrement was applied. `false` means the
    /// floor check failed (someone else took the stock first); the
    /// caller must abort its transaction.
    pub async fn try_decrement(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        warehouse_id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE stock_levels
            SET quantity = quantity - ?3, updated_at = ?4
            WHERE product_id = ?1 AND warehouse_id = ?2 AND quantity >= ?3
            "#,
        )
        .bind(product_id)
        .bind(warehouse_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Appends a stock movement to the audit log.
    pub async fn insert_movement(
        &self,
        conn: &mut SqliteConnection,
        movement: &StockMovement,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, product_id, warehouse_id, movement_type, quantity,
                reference_type, reference_id, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(&movement.warehouse_id)
        .bind(movement.movement_type)
        .bind(movement.quantity)
        .bind(&movement.reference_type)
        .bind(&movement.reference_id)
        .bind(&movement.created_by)
        .bind(movement.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Receiving (pool-level; used by seed, tests and goods-in flows)
    // -------------------------------------------------------------------------

    /// Receives stock into a warehouse: upserts the level and records an
    /// IN movement.
    pub async fn receive_stock(
        &self,
        product_id: &str,
        warehouse_id: &str,
        quantity: i64,
        operator_id: &str,
    ) -> DbResult<()> {
        let now = Utc::now();

        debug!(product_id, warehouse_id, quantity, "Receiving stock");

        sqlx::query(
            r#"
            INSERT INTO stock_levels (product_id, warehouse_id, quantity, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (product_id, warehouse_id)
            DO UPDATE SET quantity = quantity + ?3, updated_at = ?4
            "#,
        )
        .bind(product_id)
        .bind(warehouse_id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            warehouse_id: warehouse_id.to_string(),
            movement_type: StockMovementType::In,
            quantity,
            reference_type: None,
            reference_id: None,
            created_by: operator_id.to_string(),
            created_at: now,
        };

        let mut conn = self.pool.acquire().await?;
        self.insert_movement(&mut conn, &movement).await?;

        Ok(())
    }

    /// Pool-level read of the current stock level.
    pub async fn stock_level(&self, product_id: &str, warehouse_id: &str) -> DbResult<i64> {
        let quantity: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM stock_levels WHERE product_id = ?1 AND warehouse_id = ?2",
        )
        .bind(product_id)
        .bind(warehouse_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quantity.unwrap_or(0))
    }

    /// Movements recorded against a reference (e.g. one sale).
    pub async fn movements_for_reference(
        &self,
        reference_id: &str,
    ) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, warehouse_id, movement_type, quantity,
                   reference_type, reference_id, created_by, created_at
            FROM stock_movements
            WHERE reference_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(reference_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}
