//! # Customer Repository
//!
//! Collaborator lookup only: settlement needs the customer-group discount
//! percentage. Walk-in sales carry no customer and get 0.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;

/// A customer row as the settlement flow sees it.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Group discount in basis points; 0 when the customer has no group.
    pub group_discount_bps: i64,
    pub created_at: DateTime<Utc>,
}

/// Repository for customer lookups.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Looks a customer up inside a transaction (settlement path).
    pub async fn get_by_id(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, group_discount_bps, created_at FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(customer)
    }

    /// Inserts a customer (seed and test fixtures).
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, name, group_discount_bps, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(customer.group_discount_bps)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
