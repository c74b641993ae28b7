//! Core types for the point-of-sale ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (Decimal for money, unsigned integers for stock)

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fractional digits carried by every monetary amount
pub const MONEY_SCALE: u32 = 2;

/// Largest storable money value: six digits, two of them fractional
pub fn money_ceiling() -> Decimal {
    Decimal::new(999_999, MONEY_SCALE)
}

/// Round a monetary amount to [`MONEY_SCALE`] digits, half-up
///
/// Half-up is the currency convention: 2.005 becomes 2.01, not 2.00.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Total charge for `quantity` units at `unit_price`
///
/// Fails with [`Error::TotalOverflow`] when the product cannot be
/// represented.
pub fn total_price(unit_price: Decimal, quantity: u32) -> Result<Decimal> {
    let total = unit_price
        .checked_mul(Decimal::from(quantity))
        .ok_or(Error::TotalOverflow {
            unit_price,
            quantity,
        })?;
    Ok(round_money(total))
}

/// A catalog item with unit price and live stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique item ID
    pub id: Uuid,

    /// Item name (unique across the catalog)
    pub name: String,

    /// Unit price (exact decimal, 2 fractional digits)
    pub price: Decimal,

    /// Units currently in stock (never negative)
    pub stock: u32,

    /// Flavors offered for this item
    #[serde(default)]
    pub flavors: Vec<String>,
}

impl Item {
    /// Create a new item with a fresh ID
    ///
    /// The price is normalized to 2 fractional digits, half-up.
    pub fn new(name: impl Into<String>, price: Decimal, stock: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            price: round_money(price),
            stock,
            flavors: Vec::new(),
        }
    }

    /// Attach flavors
    pub fn with_flavors<I, S>(mut self, flavors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flavors = flavors.into_iter().map(Into::into).collect();
        self
    }

    /// Creation bound: the price must sit between zero and [`money_ceiling`]
    pub fn validate(&self) -> Result<()> {
        if self.price < Decimal::ZERO || self.price > money_ceiling() {
            return Err(Error::InvalidPrice(self.price));
        }
        Ok(())
    }
}

/// A customer account holding a prepaid balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account ID
    pub id: Uuid,

    /// Account owner
    pub owner: String,

    /// Prepaid balance (exact decimal, never negative)
    pub balance: Decimal,
}

impl Account {
    /// Create a new account with a fresh ID
    pub fn new(owner: impl Into<String>, balance: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            balance: round_money(balance),
        }
    }

    /// Creation bound: the balance must sit between zero and [`money_ceiling`]
    pub fn validate(&self) -> Result<()> {
        if self.balance < Decimal::ZERO || self.balance > money_ceiling() {
            return Err(Error::InvalidBalance(self.balance));
        }
        Ok(())
    }
}

/// The selling vendor: a truck and the items it offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Truck {
    /// Unique truck ID
    pub id: Uuid,

    /// Truck name
    pub name: String,

    /// Catalog items this truck offers
    pub item_ids: Vec<Uuid>,
}

impl Truck {
    /// Create a new truck with a fresh ID and an empty catalog
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            item_ids: Vec::new(),
        }
    }
}

/// A purchase request against the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    /// Item to buy
    pub item_id: Uuid,

    /// Paying account
    pub account_id: Uuid,

    /// Truck the sale is attributed to
    pub truck_id: Uuid,

    /// Units requested (must be positive)
    pub quantity: u32,
}

/// Immutable record of one completed purchase
///
/// Sale records form the append-only audit trail: once committed they are
/// never updated or deleted. A truck's revenue is the sum of `total` over
/// its records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    /// Unique record ID (UUIDv7 for time-ordering)
    pub id: Uuid,

    /// Item that was sold
    pub item_id: Uuid,

    /// Account that paid
    pub account_id: Uuid,

    /// Truck the sale is attributed to
    pub truck_id: Uuid,

    /// Units sold (always positive)
    pub quantity: u32,

    /// Unit price at the time of sale
    pub unit_price: Decimal,

    /// Total charged: `unit_price * quantity`, rounded half-up
    pub total: Decimal,

    /// Commit timestamp, assigned by the writer (non-decreasing)
    pub created_at: DateTime<Utc>,
}

/// Result of a successful purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// The committed sale record
    pub record: SaleRecord,

    /// Item stock after the sale
    pub stock_remaining: u32,

    /// Account balance after the sale
    pub balance_remaining: Decimal,
}

/// Read-model of a truck and the items it offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckInventory {
    /// Truck ID
    pub truck_id: Uuid,

    /// Truck name
    pub name: String,

    /// Items offered, with live price and stock
    pub items: Vec<Item>,
}
