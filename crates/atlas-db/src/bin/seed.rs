//! # Seed Data Generator
//!
//! Populates the database with development data: a chart of accounts,
//! a handful of products with opening stock, a customer group, and one
//! cash register ready to open.
//!
//! ## Usage
//! ```bash
//! cargo run -p atlas-db --bin seed
//!
//! # Specify database path
//! cargo run -p atlas-db --bin seed -- --db ./data/atlas.db
//! ```

use chrono::Utc;
use std::env;
use uuid::Uuid;

use atlas_core::{CashRegister, RegisterStatus};
use atlas_db::repository::customer::Customer;
use atlas_db::repository::product::Product;
use atlas_db::{Database, DbConfig};

/// Chart of accounts matching the default `SettlementConfig` codes.
const ACCOUNTS: &[(&str, &str, &str)] = &[
    ("1001", "Cash on Hand", "asset"),
    ("1002", "Bank", "asset"),
    ("1003", "Mobile Wallet Clearing", "asset"),
    ("1004", "Card Clearing", "asset"),
    ("1100", "Accounts Receivable", "asset"),
    ("1200", "Inventory", "asset"),
    ("2100", "Sales Tax Payable", "liability"),
    ("4000", "Sales Revenue", "revenue"),
    ("4100", "Sales Discounts", "revenue"),
    ("5000", "Cost of Goods Sold", "expense"),
];

/// (sku, name, price cents, cost cents, opening stock)
const PRODUCTS: &[(&str, &str, i64, i64, i64)] = &[
    ("BEV-0001", "Coca-Cola 330ml", 250, 120, 240),
    ("BEV-0002", "Dasani Water 500ml", 150, 60, 360),
    ("SNK-0001", "Lays Classic 150g", 399, 210, 120),
    ("SNK-0002", "Snickers Bar", 199, 95, 200),
    ("GRO-0001", "Basmati Rice 5kg", 1899, 1320, 40),
    ("GRO-0002", "Sunflower Oil 1L", 749, 520, 60),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let db_path = parse_db_arg().unwrap_or_else(|| "./atlas.db".to_string());
    println!("Seeding database at {db_path}");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let now = Utc::now();

    // Chart of accounts.
    for (code, name, account_type) in ACCOUNTS {
        sqlx::query(
            r#"
            INSERT INTO accounts (code, name, account_type, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(code)
        .bind(name)
        .bind(account_type)
        .bind(now)
        .execute(db.pool())
        .await?;
    }
    println!("  {} accounts", ACCOUNTS.len());

    // Products with opening stock in the main warehouse.
    for (sku, name, price_cents, cost_cents, stock) in PRODUCTS {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: sku.to_string(),
            name: name.to_string(),
            price_cents: *price_cents,
            cost_cents: Some(*cost_cents),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;
        db.inventory()
            .receive_stock(&product.id, "wh-main", *stock, "seed")
            .await?;
    }
    println!("  {} products with opening stock", PRODUCTS.len());

    // A wholesale customer group with 5% discount.
    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        name: "Wholesale Walk-ins".to_string(),
        group_discount_bps: 500,
        created_at: now,
    };
    db.customers().insert(&customer).await?;
    println!("  1 customer (5% group discount)");

    // One provisioned (closed) register.
    let register = CashRegister {
        id: Uuid::new_v4().to_string(),
        branch_id: "branch-main".to_string(),
        name: "Front Counter".to_string(),
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
    db.registers().insert(&register).await?;
    println!("  1 cash register ({})", register.id);

    println!("Done.");
    Ok(())
}

fn parse_db_arg() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
}
