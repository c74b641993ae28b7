//! Purchase guards
//!
//! Pure precondition checks with no side effects. The orchestrator runs the
//! inventory guard before the balance guard, so a request failing both
//! always reports `InsufficientStock`.

use crate::error::{Error, Result};
use crate::types::{Account, Item};
use rust_decimal::Decimal;

/// Inventory guard: the requested quantity must not exceed current stock
pub fn check_stock(item: &Item, quantity: u32) -> Result<()> {
    if quantity > item.stock {
        return Err(Error::InsufficientStock {
            requested: quantity,
            available: item.stock,
        });
    }
    Ok(())
}

/// Balance guard: the account balance must cover the total charge
pub fn check_balance(account: &Account, total: Decimal) -> Result<()> {
    if account.balance < total {
        return Err(Error::InsufficientBalance {
            required: total,
            available: account.balance,
        });
    }
    Ok(())
}
