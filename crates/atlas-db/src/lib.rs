//! # atlas-db: Database Layer for Atlas POS
//!
//! SQLite persistence plus the transactional service layer of the
//! settlement flow.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Atlas POS Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /pos/sale)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     atlas-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌──────────────┐    │   │
//! │  │   │   Services    │   │  Repositories │   │  Migrations  │    │   │
//! │  │   │ settlement    │──►│ sale register │   │  (embedded)  │    │   │
//! │  │   │ register      │   │ ledger stock  │   │ 001_init.sql │    │   │
//! │  │   │ reports       │   │ product cust. │   │              │    │   │
//! │  │   └───────────────┘   └───────────────┘   └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys on)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations per aggregate
//! - [`service`] - Transactional orchestration (settlement, register, reports)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use atlas_db::{Database, DbConfig, Operator, SettlementConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/atlas.db")).await?;
//!
//! let receipt = db
//!     .settlement(SettlementConfig::default())
//!     .create_pos_sale(request, &Operator::new("cashier-1"))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::ledger::{JournalView, LedgerRepository};
pub use repository::product::ProductRepository;
pub use repository::register::RegisterRepository;
pub use repository::sale::SaleRepository;

// Service re-exports
pub use service::register::RegisterService;
pub use service::reports::{
    Page, PaymentBreakdown, ReportsService, SaleDetail, TodaySummary,
};
pub use service::settlement::{
    CreatePosSaleRequest, SaleReceipt, SettlementConfig, SettlementService,
};
pub use service::{Operator, ServiceError, ServiceResult};

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for the service tests: an in-memory database and
    //! minimal seed rows for the collaborator tables.

    use chrono::Utc;
    use uuid::Uuid;

    use crate::pool::{Database, DbConfig};
    use crate::repository::customer::Customer;
    use crate::repository::product::Product;
    use crate::service::Operator;
    use atlas_core::{CashRegister, RegisterStatus};

    pub(crate) async fn setup_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub(crate) fn operator() -> Operator {
        Operator::new("op-1")
    }

    /// Inserts a product and (optionally) receives opening stock into
    /// warehouse `wh-1`. Returns the product id.
    pub(crate) async fn seed_product(
        db: &Database,
        sku: &str,
        price_cents: i64,
        cost_cents: Option<i64>,
        stock: i64,
    ) -> String {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: sku.to_string(),
            name: format!("{sku} test product"),
            price_cents,
            cost_cents,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();

        if stock > 0 {
            db.inventory()
                .receive_stock(&product.id, "wh-1", stock, "op-1")
                .await
                .unwrap();
        }

        product.id
    }

    /// Provisions a closed register and returns its id.
    pub(crate) async fn provision_register(db: &Database) -> String {
        let now = Utc::now();
        let register = CashRegister {
            id: Uuid::new_v4().to_string(),
            branch_id: "branch-1".to_string(),
            name: "Front counter".to_string(),
            status: RegisterStatus::Closed,
            session_id: None,
            opening_balance_cents: 0,
            current_balance_cents: 0,
            expected_amount_cents: None,
            actual_amount_cents: None,
            variance_cents: None,
            opened_by: None,
            opened_at: None,
            closed_by: None,
            closed_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        db.registers().insert(&register).await.unwrap();
        register.id
    }

    /// Provisions a register and opens a session with the given float.
    pub(crate) async fn seed_register(db: &Database, opening_cents: i64) -> String {
        let register_id = provision_register(db).await;
        db.register_service()
            .open(&register_id, opening_cents, &operator())
            .await
            .unwrap();
        register_id
    }

    /// Inserts a customer with a group discount.
    pub(crate) async fn seed_customer(db: &Database, name: &str, group_bps: i64) -> String {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            group_discount_bps: group_bps,
            created_at: Utc::now(),
        };
        db.customers().insert(&customer).await.unwrap();
        customer.id
    }
}
