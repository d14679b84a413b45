//! # Reporting Service
//!
//! Read-only views over settled data: sale lists, sale detail, the
//! today-summary tile and the journal history. No locking anywhere; a
//! consistent pool snapshot is enough because everything read here is
//! immutable once committed.

use chrono::Utc;
use serde::Serialize;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::ledger::JournalView;
use crate::service::ServiceResult;
use atlas_core::{Sale, SaleItem, SalePayment};

// =============================================================================
// View Types
// =============================================================================

/// One page of results plus pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

/// A sale with its children, for the detail view.
#[derive(Debug, Clone, Serialize)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub payments: Vec<SalePayment>,
}

/// Revenue collected today, split by tender.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PaymentBreakdown {
    pub cash_cents: i64,
    pub card_cents: i64,
    pub mobile_cents: i64,
    pub bank_cents: i64,
}

/// The dashboard's today tile.
#[derive(Debug, Clone, Serialize)]
pub struct TodaySummary {
    /// ISO date the summary covers (UTC).
    pub date: String,
    pub total_sales: i64,
    pub total_revenue_cents: i64,
    pub payment_breakdown: PaymentBreakdown,
}

// =============================================================================
// Service
// =============================================================================

/// Read-only reporting over settled sales and journals.
#[derive(Debug, Clone)]
pub struct ReportsService {
    db: Database,
}

impl ReportsService {
    /// Creates a new reports service.
    pub fn new(db: Database) -> Self {
        ReportsService { db }
    }

    /// Completed POS sales, newest first.
    pub async fn list_sales(&self, page: u32, limit: u32) -> ServiceResult<Page<Sale>> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let sales = self.db.sales();
        let items = sales.list_completed_pos(page, limit).await?;
        let total = sales.count_completed_pos().await?;

        Ok(Page {
            items,
            page,
            limit,
            total,
        })
    }

    /// A sale with items and payments.
    pub async fn sale_detail(&self, sale_id: &str) -> ServiceResult<SaleDetail> {
        let sales = self.db.sales();
        let sale = sales.require(sale_id).await?;
        let items = sales.get_items(sale_id).await?;
        let payments = sales.get_payments(sale_id).await?;

        Ok(SaleDetail {
            sale,
            items,
            payments,
        })
    }

    /// The journals a sale produced (revenue, and COGS when posted).
    pub async fn sale_transactions(&self, sale_id: &str) -> ServiceResult<Vec<JournalView>> {
        // Surface a proper 404 for unknown sales rather than an empty list.
        self.db.sales().require(sale_id).await?;
        Ok(self.db.ledger().journals_for_reference(sale_id).await?)
    }

    /// Full journal history, newest first.
    pub async fn transaction_history(
        &self,
        page: u32,
        limit: u32,
    ) -> ServiceResult<Page<JournalView>> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let items = self.db.ledger().history(page, limit).await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM account_transactions")
            .fetch_one(self.db.pool())
            .await
            .map_err(DbError::from)?;

        Ok(Page {
            items,
            page,
            limit,
            total,
        })
    }

    /// Today's POS totals and tender breakdown.
    pub async fn today_summary(&self, branch_id: Option<&str>) -> ServiceResult<TodaySummary> {
        let date = Utc::now().format("%Y-%m-%d").to_string();

        let (total_sales, total_revenue_cents) = self.today_totals(&date, branch_id).await?;
        let payment_breakdown = self.today_breakdown(&date, branch_id).await?;

        Ok(TodaySummary {
            date,
            total_sales,
            total_revenue_cents,
            payment_breakdown,
        })
    }

    async fn today_totals(&self, date: &str, branch_id: Option<&str>) -> DbResult<(i64, i64)> {
        let row: (i64, i64) = match branch_id {
            Some(branch) => {
                sqlx::query_as(
                    r#"
                    SELECT COUNT(*), COALESCE(SUM(total_cents), 0)
                    FROM sales
                    WHERE status = 'completed' AND sale_type = 'pos'
                      AND date(created_at) = ?1 AND branch_id = ?2
                    "#,
                )
                .bind(date)
                .bind(branch)
                .fetch_one(self.db.pool())
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT COUNT(*), COALESCE(SUM(total_cents), 0)
                    FROM sales
                    WHERE status = 'completed' AND sale_type = 'pos'
                      AND date(created_at) = ?1
                    "#,
                )
                .bind(date)
                .fetch_one(self.db.pool())
                .await?
            }
        };

        Ok(row)
    }

    async fn today_breakdown(
        &self,
        date: &str,
        branch_id: Option<&str>,
    ) -> DbResult<PaymentBreakdown> {
        let rows: Vec<(String, i64)> = match branch_id {
            Some(branch) => {
                sqlx::query_as(
                    r#"
                    SELECT p.method, COALESCE(SUM(p.amount_cents), 0)
                    FROM sale_payments p
                    JOIN sales s ON s.id = p.sale_id
                    WHERE s.status = 'completed' AND s.sale_type = 'pos'
                      AND date(s.created_at) = ?1 AND s.branch_id = ?2
                    GROUP BY p.method
                    "#,
                )
                .bind(date)
                .bind(branch)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT p.method, COALESCE(SUM(p.amount_cents), 0)
                    FROM sale_payments p
                    JOIN sales s ON s.id = p.sale_id
                    WHERE s.status = 'completed' AND s.sale_type = 'pos'
                      AND date(s.created_at) = ?1
                    GROUP BY p.method
                    "#,
                )
                .bind(date)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        let mut breakdown = PaymentBreakdown::default();
        for (method, cents) in rows {
            match method.as_str() {
                "cash" => breakdown.cash_cents = cents,
                "card" => breakdown.card_cents = cents,
                "mobile" => breakdown.mobile_cents = cents,
                "bank" => breakdown.bank_cents = cents,
                _ => {}
            }
        }

        Ok(breakdown)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
