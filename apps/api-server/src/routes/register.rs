//! # Cash Register Routes
//!
//! Drawer lifecycle endpoints and the variance report.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;
use crate::operator::CurrentOperator;
use crate::AppState;
use atlas_core::{AdjustmentDirection, CashRegister, CashRegisterTransaction, VarianceReport};

/// Creates the cash register routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cash-register/open", post(open_register))
        .route("/cash-register/close", post(close_register))
        .route("/cash-register/{id}/cash-in", post(cash_in))
        .route("/cash-register/{id}/cash-out", post(cash_out))
        .route("/cash-register/{id}/adjust", post(adjust))
        .route("/cash-register/{id}/variance-report", get(variance_report))
}

// =============================================================================
// Request Types
// =============================================================================

/// Request body for opening a register session.
#[derive(Debug, Deserialize)]
pub struct OpenRegisterBody {
    pub cash_register_id: String,
    #[serde(default)]
    pub opening_balance_cents: i64,
    pub notes: Option<String>,
}

/// Request body for closing a register session.
#[derive(Debug, Deserialize)]
pub struct CloseRegisterBody {
    pub cash_register_id: String,
    pub actual_amount_cents: i64,
    pub notes: Option<String>,
}

/// Request body for cash in/out.
#[derive(Debug, Deserialize)]
pub struct CashMovementBody {
    pub amount_cents: i64,
    pub description: Option<String>,
}

/// Request body for a manual balance adjustment.
#[derive(Debug, Deserialize)]
pub struct AdjustBody {
    pub amount_cents: i64,
    pub adjustment_type: AdjustmentDirection,
    pub description: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /cash-register/open
async fn open_register(
    State(state): State<AppState>,
    CurrentOperator(operator): CurrentOperator,
    Json(body): Json<OpenRegisterBody>,
) -> Result<Json<CashRegister>, ApiError> {
    debug!(register_id = %body.cash_register_id, "open_register");

    let register = state
        .db
        .register_service()
        .open(&body.cash_register_id, body.opening_balance_cents, &operator)
        .await?;

    Ok(Json(register))
}

/// POST /cash-register/close
async fn close_register(
    State(state): State<AppState>,
    CurrentOperator(operator): CurrentOperator,
    Json(body): Json<CloseRegisterBody>,
) -> Result<Json<CashRegister>, ApiError> {
    debug!(register_id = %body.cash_register_id, "close_register");

    let register = state
        .db
        .register_service()
        .close(
            &body.cash_register_id,
            body.actual_amount_cents,
            &operator,
            body.notes,
        )
        .await?;

    Ok(Json(register))
}

/// POST /cash-register/{id}/cash-in
async fn cash_in(
    State(state): State<AppState>,
    Path(id): Path<String>,
    CurrentOperator(operator): CurrentOperator,
    Json(body): Json<CashMovementBody>,
) -> Result<Json<CashRegisterTransaction>, ApiError> {
    let posting = state
        .db
        .register_service()
        .cash_in(&id, body.amount_cents, body.description, &operator)
        .await?;

    Ok(Json(posting))
}

/// POST /cash-register/{id}/cash-out
async fn cash_out(
    State(state): State<AppState>,
    Path(id): Path<String>,
    CurrentOperator(operator): CurrentOperator,
    Json(body): Json<CashMovementBody>,
) -> Result<Json<CashRegisterTransaction>, ApiError> {
    let posting = state
        .db
        .register_service()
        .cash_out(&id, body.amount_cents, body.description, &operator)
        .await?;

    Ok(Json(posting))
}

/// POST /cash-register/{id}/adjust
async fn adjust(
    State(state): State<AppState>,
    Path(id): Path<String>,
    CurrentOperator(operator): CurrentOperator,
    Json(body): Json<AdjustBody>,
) -> Result<Json<CashRegisterTransaction>, ApiError> {
    let posting = state
        .db
        .register_service()
        .adjust(
            &id,
            body.amount_cents,
            body.adjustment_type,
            Some(body.description),
            &operator,
        )
        .await?;

    Ok(Json(posting))
}

/// GET /cash-register/{id}/variance-report
async fn variance_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VarianceReport>, ApiError> {
    Ok(Json(state.db.register_service().variance_report(&id).await?))
}
