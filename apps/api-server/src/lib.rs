//! # atlas-api: REST transport for Atlas POS
//!
//! A thin axum layer over the atlas-db service layer. Handlers
//! deserialize DTOs, extract the operator identity from headers, call a
//! service function, and map errors to HTTP statuses. Nothing here makes
//! a business decision.

pub mod config;
pub mod error;
pub mod operator;
pub mod routes;

use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use atlas_db::{Database, SettlementConfig};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub settlement_config: SettlementConfig,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::pos::routes())
        .merge(routes::register::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health
async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    let healthy = state.db.health_check().await;
    Json(serde_json::json!({ "status": if healthy { "ok" } else { "degraded" } }))
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use atlas_db::{Database, DbConfig};

    async fn test_app() -> Router {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        router(AppState {
            db,
            settlement_config: SettlementConfig::default(),
        })
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app().await;

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_sale_requires_operator_header() {
        let app = test_app().await;

        let body = serde_json::json!({
            "items": [],
            "branch_id": "branch-1",
            "payment_method": "card",
            "paid_amount_cents": 0
        });

        let response = app
            .oneshot(
                Request::post("/pos/sale")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cash_sale_without_register_is_400() {
        let app = test_app().await;

        let body = serde_json::json!({
            "items": [{
                "product_id": "p-1",
                "warehouse_id": "wh-1",
                "quantity": 1,
                "unit_price_cents": 1000
            }],
            "branch_id": "branch-1",
            "payment_method": "cash",
            "paid_amount_cents": 1000
        });

        let response = app
            .oneshot(
                Request::post("/pos/sale")
                    .header("content-type", "application/json")
                    .header("x-operator-id", "op-1")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_sale_is_404() {
        let app = test_app().await;

        let response = app
            .oneshot(Request::get("/pos/sale/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_variance_report_for_unknown_register_is_404() {
        let app = test_app().await;

        let response = app
            .oneshot(
                Request::get("/cash-register/missing/variance-report")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
