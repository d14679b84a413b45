//! # Route Modules
//!
//! One module per endpoint group, each exporting a `routes()` builder
//! merged into the app router.

pub mod pos;
pub mod register;
