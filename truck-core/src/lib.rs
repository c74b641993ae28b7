//! Ice cream truck point-of-sale core
//!
//! Purchase transaction engine for a single vendor selling inventoried
//! items to prepaid customer accounts, with an append-only sales ledger.
//!
//! # Architecture
//!
//! - **Ledger-backed**: Every completed purchase appends an immutable sale
//!   record; a truck's revenue is the sum over its records
//! - **Single Writer**: All mutations flow through one actor task, so a
//!   purchase's read-guard-commit sequence never interleaves with another
//! - **Atomic Commit**: Stock decrement, balance decrement, and sale record
//!   land in one batch; readers never observe a torn write
//! - **Exact Money**: Amounts are `Decimal` at 2 fractional digits, rounded
//!   half-up
//!
//! # Invariants
//!
//! - Stock and balances never go negative
//! - `total == unit_price * quantity` with `quantity > 0` on every record
//! - Exactly one record, one stock decrement, and one balance decrement
//!   per successful purchase; failed purchases change nothing
//! - Record timestamps never decrease

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod storage;
pub mod register;
pub mod guard;
pub mod query;
pub mod seed;
pub mod error;
pub mod actor;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Result};
pub use types::{
    Account, Item, PurchaseRequest, Receipt, SaleRecord, Truck, TruckInventory,
};
pub use register::Register;
pub use query::QueryService;
pub use storage::Storage;
pub use config::Config;
