//! # Cash Register Repository
//!
//! Persistence for the register aggregate and its append-only posting log.
//!
//! ## Concurrency Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │             Lost-Update Protection on current_balance                   │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    SELECT ... FROM cash_registers WHERE id = ?        (load, version v) │
//! │    <apply pure state transition in memory>                              │
//! │    UPDATE cash_registers SET ..., version = version+1                   │
//! │      WHERE id = ? AND version = v                     (CAS)            │
//! │    rows_affected == 0  →  Conflict, ROLLBACK, caller may retry          │
//! │    INSERT INTO cash_register_transactions ...         (append posting) │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Two concurrent sales against one register cannot interleave their     │
//! │  balance read/write: the loser of the CAS sees Conflict and retries    │
//! │  with nothing committed.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use atlas_core::{CashRegister, CashRegisterTransaction};

const REGISTER_COLUMNS: &str = r#"
    id, branch_id, name, status, session_id,
    opening_balance_cents, current_balance_cents,
    expected_amount_cents, actual_amount_cents, variance_cents,
    opened_by, opened_at, closed_by, closed_at,
    version, created_at, updated_at
"#;

/// Repository for cash register database operations.
#[derive(Debug, Clone)]
pub struct RegisterRepository {
    pool: SqlitePool,
}

impl RegisterRepository {
    /// Creates a new RegisterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RegisterRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Aggregate
    // -------------------------------------------------------------------------

    /// Provisions a register. Done once per physical drawer.
    pub async fn insert(&self, register: &CashRegister) -> DbResult<()> {
        debug!(id = %register.id, name = %register.name, "Provisioning cash register");

        sqlx::query(
            r#"
            INSERT INTO cash_registers (
                id, branch_id, name, status, session_id,
                opening_balance_cents, current_balance_cents,
                expected_amount_cents, actual_amount_cents, variance_cents,
                opened_by, opened_at, closed_by, closed_at,
                version, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
        )
        .bind(&register.id)
        .bind(&register.branch_id)
        .bind(&register.name)
        .bind(register.status)
        .bind(&register.session_id)
        .bind(register.opening_balance_cents)
        .bind(register.current_balance_cents)
        .bind(register.expected_amount_cents)
        .bind(register.actual_amount_cents)
        .bind(register.variance_cents)
        .bind(&register.opened_by)
        .bind(register.opened_at)
        .bind(&register.closed_by)
        .bind(register.closed_at)
        .bind(register.version)
        .bind(register.created_at)
        .bind(register.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads a register on the pool (read paths).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashRegister>> {
        let query = format!("SELECT {REGISTER_COLUMNS} FROM cash_registers WHERE id = ?1");
        let register = sqlx::query_as::<_, CashRegister>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(register)
    }

    /// Loads a register inside a transaction (mutating paths).
    pub async fn load(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<CashRegister> {
        let query = format!("SELECT {REGISTER_COLUMNS} FROM cash_registers WHERE id = ?1");
        sqlx::query_as::<_, CashRegister>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Cash register", id))
    }

    /// Persists a mutated register aggregate with a version check.
    ///
    /// `expected_version` is the version the aggregate carried when it
    /// was loaded. A miss means another writer got there first; the
    /// caller's transaction must roll back and may retry from scratch.
    pub async fn save_cas(
        &self,
        conn: &mut SqliteConnection,
        register: &CashRegister,
        expected_version: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE cash_registers SET
                status = ?2,
                session_id = ?3,
                opening_balance_cents = ?4,
                current_balance_cents = ?5,
                expected_amount_cents = ?6,
                actual_amount_cents = ?7,
                variance_cents = ?8,
                opened_by = ?9,
                opened_at = ?10,
                closed_by = ?11,
                closed_at = ?12,
                version = version + 1,
                updated_at = ?13
            WHERE id = ?1 AND version = ?14
            "#,
        )
        .bind(&register.id)
        .bind(register.status)
        .bind(&register.session_id)
        .bind(register.opening_balance_cents)
        .bind(register.current_balance_cents)
        .bind(register.expected_amount_cents)
        .bind(register.actual_amount_cents)
        .bind(register.variance_cents)
        .bind(&register.opened_by)
        .bind(register.opened_at)
        .bind(&register.closed_by)
        .bind(register.closed_at)
        .bind(register.updated_at)
        .bind(expected_version)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("CashRegister", &register.id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Posting log
    // -------------------------------------------------------------------------

    /// Appends a posting to the immutable log.
    pub async fn insert_transaction(
        &self,
        conn: &mut SqliteConnection,
        tx: &CashRegisterTransaction,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cash_register_transactions (
                id, register_id, session_id, tx_type, amount_cents,
                running_balance_cents, sale_id, description, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.register_id)
        .bind(&tx.session_id)
        .bind(tx.tx_type)
        .bind(tx.amount_cents)
        .bind(tx.running_balance_cents)
        .bind(&tx.sale_id)
        .bind(&tx.description)
        .bind(&tx.created_by)
        .bind(tx.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// All postings of one session, in insert order.
    pub async fn session_transactions(
        &self,
        session_id: &str,
    ) -> DbResult<Vec<CashRegisterTransaction>> {
        let transactions = sqlx::query_as::<_, CashRegisterTransaction>(
            r#"
            SELECT id, register_id, session_id, tx_type, amount_cents,
                   running_balance_cents, sale_id, description, created_by, created_at
            FROM cash_register_transactions
            WHERE session_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    /// Full posting history of a register, newest first, paginated.
    pub async fn list_transactions(
        &self,
        register_id: &str,
        page: u32,
        limit: u32,
    ) -> DbResult<Vec<CashRegisterTransaction>> {
        let offset = (page.saturating_sub(1) as i64) * limit as i64;

        let transactions = sqlx::query_as::<_, CashRegisterTransaction>(
            r#"
            SELECT id, register_id, session_id, tx_type, amount_cents,
                   running_balance_cents, sale_id, description, created_by, created_at
            FROM cash_register_transactions
            WHERE register_id = ?1
            ORDER BY rowid DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(register_id)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }
}
