//! # Cash Register Service
//!
//! Persisted drawer lifecycle: each transition loads the aggregate, runs
//! the pure state machine, saves with a version compare-and-swap, and
//! appends the posting, all inside one transaction. A CAS miss rolls the
//! transaction back with a retryable conflict.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;
use crate::pool::Database;
use crate::service::{Operator, ServiceResult};
use atlas_core::variance::build_variance_report;
use atlas_core::{
    AdjustmentDirection, CashRegister, CashRegisterTransaction, CoreError, PostingDraft,
    VarianceReport,
};

/// Turns a posting draft into a persistable transaction row.
///
/// The register must carry a session id (it always does while open; the
/// close transition keeps it for the report window).
pub(crate) fn materialize_posting(
    draft: PostingDraft,
    register: &CashRegister,
    created_by: &str,
    now: DateTime<Utc>,
) -> Result<CashRegisterTransaction, DbError> {
    let session_id = register
        .session_id
        .clone()
        .ok_or_else(|| DbError::Internal(format!("register {} has no session", register.id)))?;

    Ok(CashRegisterTransaction {
        id: Uuid::new_v4().to_string(),
        register_id: register.id.clone(),
        session_id,
        tx_type: draft.tx_type,
        amount_cents: draft.amount_cents,
        running_balance_cents: draft.running_balance_cents,
        sale_id: draft.sale_id,
        description: draft.description,
        created_by: created_by.to_string(),
        created_at: now,
    })
}

/// Orchestrates cash register transitions.
#[derive(Debug, Clone)]
pub struct RegisterService {
    db: Database,
}

impl RegisterService {
    /// Creates a new register service.
    pub fn new(db: Database) -> Self {
        RegisterService { db }
    }

    /// Runs one transition under load → mutate → CAS-save → append.
    async fn transition<F>(
        &self,
        register_id: &str,
        operator: &Operator,
        apply: F,
    ) -> ServiceResult<(CashRegister, CashRegisterTransaction)>
    where
        F: FnOnce(&mut CashRegister, DateTime<Utc>) -> Result<PostingDraft, CoreError>,
    {
        let now = Utc::now();
        let registers = self.db.registers();

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let mut register = registers.load(&mut tx, register_id).await?;
        let loaded_version = register.version;

        let draft = apply(&mut register, now)?;
        register.updated_at = now;

        registers.save_cas(&mut tx, &register, loaded_version).await?;
        let posting = materialize_posting(draft, &register, &operator.user_id, now)?;
        registers.insert_transaction(&mut tx, &posting).await?;

        tx.commit().await.map_err(DbError::from)?;

        // The CAS bumped the stored version.
        register.version = loaded_version + 1;

        Ok((register, posting))
    }

    /// Opens a register session with a counted float.
    pub async fn open(
        &self,
        register_id: &str,
        opening_balance_cents: i64,
        operator: &Operator,
    ) -> ServiceResult<CashRegister> {
        let session_id = Uuid::new_v4().to_string();
        let (register, _) = self
            .transition(register_id, operator, |register, now| {
                register.open(opening_balance_cents, session_id, &operator.user_id, now)
            })
            .await?;

        info!(
            register_id = %register.id,
            opening = %register.opening_balance_cents,
            opened_by = %operator.user_id,
            "Cash register opened"
        );
        Ok(register)
    }

    /// Closes the session against the physically counted amount.
    pub async fn close(
        &self,
        register_id: &str,
        actual_amount_cents: i64,
        operator: &Operator,
        notes: Option<String>,
    ) -> ServiceResult<CashRegister> {
        let (register, _) = self
            .transition(register_id, operator, |register, now| {
                register.close(actual_amount_cents, &operator.user_id, notes, now)
            })
            .await?;

        info!(
            register_id = %register.id,
            expected = ?register.expected_amount_cents,
            actual = ?register.actual_amount_cents,
            variance = ?register.variance_cents,
            "Cash register closed"
        );
        Ok(register)
    }

    /// Adds cash to an open drawer.
    pub async fn cash_in(
        &self,
        register_id: &str,
        amount_cents: i64,
        description: Option<String>,
        operator: &Operator,
    ) -> ServiceResult<CashRegisterTransaction> {
        let (_, posting) = self
            .transition(register_id, operator, |register, _| {
                register.cash_in(amount_cents, description)
            })
            .await?;
        Ok(posting)
    }

    /// Removes cash from an open drawer.
    pub async fn cash_out(
        &self,
        register_id: &str,
        amount_cents: i64,
        description: Option<String>,
        operator: &Operator,
    ) -> ServiceResult<CashRegisterTransaction> {
        let (_, posting) = self
            .transition(register_id, operator, |register, _| {
                register.cash_out(amount_cents, description)
            })
            .await?;
        Ok(posting)
    }

    /// Applies a manual balance adjustment.
    pub async fn adjust(
        &self,
        register_id: &str,
        amount_cents: i64,
        direction: AdjustmentDirection,
        description: Option<String>,
        operator: &Operator,
    ) -> ServiceResult<CashRegisterTransaction> {
        let (_, posting) = self
            .transition(register_id, operator, |register, _| {
                register.adjust(amount_cents, direction, description)
            })
            .await?;
        Ok(posting)
    }

    /// Builds the variance report for the register's most recent closed
    /// session. Pure read; no locking.
    pub async fn variance_report(&self, register_id: &str) -> ServiceResult<VarianceReport> {
        let registers = self.db.registers();
        let register = registers
            .get_by_id(register_id)
            .await?
            .ok_or_else(|| DbError::not_found("Cash register", register_id))?;

        let transactions = match &register.session_id {
            Some(session_id) => registers.session_transactions(session_id).await?,
            None => Vec::new(),
        };

        Ok(build_variance_report(&register, &transactions)?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceError;
    use crate::testing::{operator, provision_register, setup_db};
    use atlas_core::{CashTransactionType, RegisterStatus};

    #[tokio::test]
    async fn test_open_persists_register_and_posting() {
        let db = setup_db().await;
        let register_id = provision_register(&db).await;

        let service = db.register_service();
        let register = service.open(&register_id, 100_000, &operator()).await.unwrap();

        assert_eq!(register.status, RegisterStatus::Open);
        assert_eq!(register.current_balance_cents, 100_000);
        assert!(register.session_id.is_some());

        let transactions = db
            .registers()
            .session_transactions(register.session_id.as_deref().unwrap())
            .await
            .unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].tx_type, CashTransactionType::OpeningBalance);
        assert_eq!(transactions[0].running_balance_cents, 100_000);
    }

    #[tokio::test]
    async fn test_double_open_rejected() {
        let db = setup_db().await;
        let register_id = provision_register(&db).await;

        let service = db.register_service();
        service.open(&register_id, 0, &operator()).await.unwrap();

        let err = service.open(&register_id, 0, &operator()).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::RegisterAlreadyOpen { .. })
        ));
    }

    #[tokio::test]
    async fn test_cash_out_exceeding_balance_changes_nothing() {
        let db = setup_db().await;
        let register_id = provision_register(&db).await;

        let service = db.register_service();
        service.open(&register_id, 30_000, &operator()).await.unwrap();

        let err = service
            .cash_out(&register_id, 50_000, None, &operator())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InsufficientCash { .. })
        ));

        // Balance unchanged, no posting appended.
        let register = db.registers().get_by_id(&register_id).await.unwrap().unwrap();
        assert_eq!(register.current_balance_cents, 30_000);
        let transactions = db
            .registers()
            .session_transactions(register.session_id.as_deref().unwrap())
            .await
            .unwrap();
        assert_eq!(transactions.len(), 1); // just the opening posting
    }

    #[tokio::test]
    async fn test_full_session_with_variance_report() {
        let db = setup_db().await;
        let register_id = provision_register(&db).await;

        let service = db.register_service();
        service.open(&register_id, 100_000, &operator()).await.unwrap();

        // Simulate the drawer leg of a cash sale, then a bank drop.
        service
            .cash_in(&register_id, 15_000, Some("Till float top-up".to_string()), &operator())
            .await
            .unwrap();
        service
            .cash_out(&register_id, 5_000, Some("Bank drop".to_string()), &operator())
            .await
            .unwrap();

        let register = service
            .close(&register_id, 110_000, &operator(), None)
            .await
            .unwrap();
        assert_eq!(register.expected_amount_cents, Some(110_000));
        assert_eq!(register.variance_cents, Some(0));
        assert_eq!(register.status, RegisterStatus::Closed);

        let report = service.variance_report(&register_id).await.unwrap();
        assert_eq!(report.opening_balance_cents, 100_000);
        assert_eq!(report.expected_balance_cents, 110_000);
        assert_eq!(report.counted_balance_cents, 110_000);
        assert_eq!(report.variance_cents, 0);
        assert!(report.is_balanced());
        assert_eq!(report.cash_in.cash_in_cents, 15_000);
        assert_eq!(report.cash_out.cash_out_cents, 5_000);
    }

    #[tokio::test]
    async fn test_variance_report_requires_closed_session() {
        let db = setup_db().await;
        let register_id = provision_register(&db).await;
        let service = db.register_service();

        // Never opened.
        let err = service.variance_report(&register_id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::NoClosedSession { .. })
        ));

        // Open but not yet closed.
        service.open(&register_id, 10_000, &operator()).await.unwrap();
        let err = service.variance_report(&register_id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::NoClosedSession { .. })
        ));
    }

    #[tokio::test]
    async fn test_session_reopen_starts_fresh_log() {
        let db = setup_db().await;
        let register_id = provision_register(&db).await;
        let service = db.register_service();

        service.open(&register_id, 10_000, &operator()).await.unwrap();
        let first_session = db
            .registers()
            .get_by_id(&register_id)
            .await
            .unwrap()
            .unwrap()
            .session_id
            .unwrap();
        service.close(&register_id, 10_000, &operator(), None).await.unwrap();

        service.open(&register_id, 20_000, &operator()).await.unwrap();
        let register = db.registers().get_by_id(&register_id).await.unwrap().unwrap();
        let second_session = register.session_id.clone().unwrap();

        assert_ne!(first_session, second_session);
        let transactions = db
            .registers()
            .session_transactions(&second_session)
            .await
            .unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount_cents, 20_000);
    }

    #[tokio::test]
    async fn test_adjustments_direction_and_report_columns() {
        let db = setup_db().await;
        let register_id = provision_register(&db).await;
        let service = db.register_service();

        service.open(&register_id, 10_000, &operator()).await.unwrap();
        service
            .adjust(
                &register_id,
                700,
                AdjustmentDirection::Increase,
                Some("Found under drawer".to_string()),
                &operator(),
            )
            .await
            .unwrap();
        service
            .adjust(
                &register_id,
                300,
                AdjustmentDirection::Decrease,
                Some("Counting correction".to_string()),
                &operator(),
            )
            .await
            .unwrap();
        service.close(&register_id, 10_400, &operator(), None).await.unwrap();

        let report = service.variance_report(&register_id).await.unwrap();
        assert_eq!(report.cash_in.adjustments_cents, 700);
        assert_eq!(report.cash_out.adjustments_cents, 300);
        assert_eq!(report.variance_cents, 0);
    }

    /// The stored balance always matches the signed sum of the session's
    /// postings.
    #[tokio::test]
    async fn test_register_balance_matches_posting_log() {
        let db = setup_db().await;
        let register_id = provision_register(&db).await;
        let service = db.register_service();

        service.open(&register_id, 50_000, &operator()).await.unwrap();
        service.cash_in(&register_id, 3_000, None, &operator()).await.unwrap();
        service.cash_out(&register_id, 1_200, None, &operator()).await.unwrap();
        service
            .adjust(&register_id, 450, AdjustmentDirection::Increase, None, &operator())
            .await
            .unwrap();

        let register = db.registers().get_by_id(&register_id).await.unwrap().unwrap();
        let transactions = db
            .registers()
            .session_transactions(register.session_id.as_deref().unwrap())
            .await
            .unwrap();

        let signed_sum: i64 = transactions.iter().map(|t| t.signed_amount_cents()).sum();
        assert_eq!(register.current_balance_cents, signed_sum);
        assert_eq!(register.current_balance_cents, 52_250);

        // Running balances are consistent posting to posting.
        let mut running = 0_i64;
        for tx in &transactions {
            running += tx.signed_amount_cents();
            assert_eq!(tx.running_balance_cents, running);
        }
    }
}
