//! # Ledger Repository
//!
//! Persistence for journal postings. A journal is inserted once, inside
//! the settlement transaction, and never updated; history views read it
//! back as-is.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use atlas_core::{AccountTransaction, JournalDraft, TransactionEntry};

/// Repository for ledger database operations.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

/// A journal header together with its entries, as read back for views.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JournalView {
    pub transaction: AccountTransaction,
    pub entries: Vec<TransactionEntry>,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Transaction-scoped writes
    // -------------------------------------------------------------------------

    /// Persists a balanced journal draft: one header plus all entries.
    ///
    /// The caller must have verified balance already (the draft builders
    /// do); the check is repeated here so an unbalanced journal can never
    /// reach the table regardless of the code path.
    pub async fn post_journal(
        &self,
        conn: &mut SqliteConnection,
        draft: &JournalDraft,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> DbResult<AccountTransaction> {
        draft
            .ensure_balanced()
            .map_err(|e| crate::error::DbError::Internal(e.to_string()))?;

        let transaction = AccountTransaction {
            id: Uuid::new_v4().to_string(),
            reference_type: draft.reference_type.clone(),
            reference_id: draft.reference_id.clone(),
            narration: draft.narration.clone(),
            created_by: created_by.to_string(),
            created_at: now,
        };

        debug!(
            id = %transaction.id,
            reference = %format!("{}:{}", draft.reference_type, draft.reference_id),
            entries = draft.entries.len(),
            "Posting journal"
        );

        sqlx::query(
            r#"
            INSERT INTO account_transactions (
                id, reference_type, reference_id, narration, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.reference_type)
        .bind(&transaction.reference_id)
        .bind(&transaction.narration)
        .bind(&transaction.created_by)
        .bind(transaction.created_at)
        .execute(&mut *conn)
        .await?;

        for entry in &draft.entries {
            sqlx::query(
                r#"
                INSERT INTO transaction_entries (
                    id, transaction_id, account_code, debit_cents, credit_cents,
                    narration, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&transaction.id)
            .bind(&entry.account_code)
            .bind(entry.debit_cents)
            .bind(entry.credit_cents)
            .bind(&entry.narration)
            .bind(now)
            .execute(&mut *conn)
            .await?;
        }

        Ok(transaction)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Entries of one journal, in insert order.
    pub async fn entries(&self, transaction_id: &str) -> DbResult<Vec<TransactionEntry>> {
        let entries = sqlx::query_as::<_, TransactionEntry>(
            r#"
            SELECT id, transaction_id, account_code, debit_cents, credit_cents,
                   narration, created_at
            FROM transaction_entries
            WHERE transaction_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// All journals linked to one reference (e.g. a sale and its COGS
    /// posting), with entries.
    pub async fn journals_for_reference(&self, reference_id: &str) -> DbResult<Vec<JournalView>> {
        let headers = sqlx::query_as::<_, AccountTransaction>(
            r#"
            SELECT id, reference_type, reference_id, narration, created_by, created_at
            FROM account_transactions
            WHERE reference_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(reference_id)
        .fetch_all(&self.pool)
        .await?;

        let mut journals = Vec::with_capacity(headers.len());
        for transaction in headers {
            let entries = self.entries(&transaction.id).await?;
            journals.push(JournalView {
                transaction,
                entries,
            });
        }

        Ok(journals)
    }

    /// Journal history, newest first, paginated.
    pub async fn history(&self, page: u32, limit: u32) -> DbResult<Vec<JournalView>> {
        let offset = (page.saturating_sub(1) as i64) * limit as i64;

        let headers = sqlx::query_as::<_, AccountTransaction>(
            r#"
            SELECT id, reference_type, reference_id, narration, created_by, created_at
            FROM account_transactions
            ORDER BY rowid DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut journals = Vec::with_capacity(headers.len());
        for transaction in headers {
            let entries = self.entries(&transaction.id).await?;
            journals.push(JournalView {
                transaction,
                entries,
            });
        }

        Ok(journals)
    }
}
