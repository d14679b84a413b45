//! # Product Repository
//!
//! Collaborator lookup only: the settlement flow needs the selling price,
//! historical cost, and the sku/name snapshots. Product CRUD lives in a
//! different subsystem and never goes through this crate.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

/// A product row as the settlement flow sees it.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    /// Current selling price; frozen onto the sale item at settlement.
    pub price_cents: i64,
    /// Historical purchase cost. None when cost tracking never captured
    /// one; such lines are skipped in the COGS posting.
    pub cost_cents: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repository for product lookups.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Looks a product up inside a transaction (settlement path).
    pub async fn get_by_id(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, price_cents, cost_cents, is_active, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Inserts a product (seed and test fixtures).
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, price_cents, cost_cents, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
