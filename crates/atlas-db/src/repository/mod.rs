//! # Repository Layer
//!
//! One repository per aggregate. Read paths run on the pool; write paths
//! take an explicit `&mut SqliteConnection` so the service layer can
//! compose them inside a single transaction.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Repository Responsibilities                         │
//! │                                                                         │
//! │  sale      - sales, sale_items, sale_payments, invoice counter          │
//! │  register  - cash_registers (version CAS) + posting log                 │
//! │  ledger    - account_transactions + transaction_entries                 │
//! │  inventory - stock_levels (atomic decrement) + stock_movements          │
//! │  product   - collaborator lookup: price/cost/name snapshots             │
//! │  customer  - collaborator lookup: group discount                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod customer;
pub mod inventory;
pub mod ledger;
pub mod product;
pub mod register;
pub mod sale;
