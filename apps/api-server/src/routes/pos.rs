//! # POS Routes
//!
//! Checkout settlement and the sale views the dashboard reads.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;
use crate::operator::CurrentOperator;
use crate::AppState;
use atlas_core::{CartLine, DiscountType, OrderDiscount, PaymentMethod, Sale, TaxRate};
use atlas_db::{
    CreatePosSaleRequest, JournalView, Page, SaleDetail, SaleReceipt, TodaySummary,
};

/// Creates the POS routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pos/sale", post(create_pos_sale))
        .route("/pos/sales", get(list_sales))
        .route("/pos/summary/today", get(today_summary))
        .route("/pos/sale/{id}", get(sale_detail))
        .route("/pos/sale/{id}/transactions", get(sale_transactions))
        .route("/pos/transactions/history", get(transaction_history))
}

// =============================================================================
// Request/Query Types
// =============================================================================

/// Request body for settling a POS sale.
///
/// Monetary amounts are integer cents; percentages are floats converted
/// to basis points at this edge (the core never sees a float).
#[derive(Debug, Deserialize)]
pub struct CreateSaleBody {
    pub items: Vec<CartLine>,
    pub branch_id: String,
    pub customer_id: Option<String>,
    pub discount_type: Option<DiscountType>,
    /// Interpreted per discount_type: cents for fixed, percent for
    /// percentage.
    pub discount: Option<f64>,
    pub tax_percentage: Option<f64>,
    pub payment_method: PaymentMethod,
    pub paid_amount_cents: i64,
    pub account_code: Option<String>,
    pub cash_register_id: Option<String>,
    pub notes: Option<String>,
}

impl CreateSaleBody {
    fn into_request(self) -> Result<CreatePosSaleRequest, ApiError> {
        let discount = match (self.discount_type, self.discount) {
            (None, _) => None,
            (Some(_), None) => {
                return Err(ApiError::validation("discount is required"));
            }
            (Some(discount_type), Some(value)) => {
                if !value.is_finite() || value < 0.0 {
                    return Err(ApiError::validation("discount must be a non-negative number"));
                }
                let value = match discount_type {
                    DiscountType::Fixed => value.round() as i64,
                    // Percent → basis points.
                    DiscountType::Percentage => (value * 100.0).round() as i64,
                };
                Some(OrderDiscount {
                    discount_type,
                    value,
                })
            }
        };

        let tax_percentage = self.tax_percentage.unwrap_or(0.0);
        if !tax_percentage.is_finite() || tax_percentage < 0.0 {
            return Err(ApiError::validation("tax_percentage must be a non-negative number"));
        }

        Ok(CreatePosSaleRequest {
            items: self.items,
            branch_id: self.branch_id,
            customer_id: self.customer_id,
            discount,
            tax_bps: TaxRate::from_percentage(tax_percentage).bps(),
            payment_method: self.payment_method,
            paid_amount_cents: self.paid_amount_cents,
            account_code: self.account_code,
            cash_register_id: self.cash_register_id,
            notes: self.notes,
        })
    }
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Query parameters for the today summary.
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub branch_id: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /pos/sale
async fn create_pos_sale(
    State(state): State<AppState>,
    CurrentOperator(operator): CurrentOperator,
    Json(body): Json<CreateSaleBody>,
) -> Result<Json<SaleReceipt>, ApiError> {
    debug!(items = body.items.len(), method = ?body.payment_method, "create_pos_sale");

    let request = body.into_request()?;
    let receipt = state
        .db
        .settlement(state.settlement_config.clone())
        .create_pos_sale(request, &operator)
        .await?;

    Ok(Json(receipt))
}

/// GET /pos/sales?page&limit
async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Sale>>, ApiError> {
    let page = state
        .db
        .reports()
        .list_sales(query.page.unwrap_or(1), query.limit.unwrap_or(20))
        .await?;

    Ok(Json(page))
}

/// GET /pos/summary/today?branch_id
async fn today_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<TodaySummary>, ApiError> {
    let summary = state
        .db
        .reports()
        .today_summary(query.branch_id.as_deref())
        .await?;

    Ok(Json(summary))
}

/// GET /pos/sale/{id}
async fn sale_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SaleDetail>, ApiError> {
    Ok(Json(state.db.reports().sale_detail(&id).await?))
}

/// GET /pos/sale/{id}/transactions
async fn sale_transactions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<JournalView>>, ApiError> {
    Ok(Json(state.db.reports().sale_transactions(&id).await?))
}

/// GET /pos/transactions/history?page&limit
async fn transaction_history(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<JournalView>>, ApiError> {
    let page = state
        .db
        .reports()
        .transaction_history(query.page.unwrap_or(1), query.limit.unwrap_or(20))
        .await?;

    Ok(Json(page))
}
