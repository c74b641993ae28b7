//! Error types for the point-of-sale core

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Result type for point-of-sale operations
pub type Result<T> = std::result::Result<T, Error>;

/// Point-of-sale errors
#[derive(Error, Debug)]
pub enum Error {
    /// Item not found
    #[error("Item not found: {0}")]
    ItemNotFound(Uuid),

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Truck not found
    #[error("Truck not found: {0}")]
    TruckNotFound(Uuid),

    /// Requested quantity is not positive
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// Item price outside the storable money range
    #[error("Invalid price: {0}")]
    InvalidPrice(Decimal),

    /// Account balance outside the storable money range
    #[error("Invalid balance: {0}")]
    InvalidBalance(Decimal),

    /// Total charge cannot be represented
    #[error("Total overflow: {unit_price} x {quantity}")]
    TotalOverflow {
        /// Unit price
        unit_price: Decimal,
        /// Units requested
        quantity: u32,
    },

    /// Inventory guard rejected the purchase
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        /// Units requested
        requested: u32,
        /// Units in stock
        available: u32,
    },

    /// Balance guard rejected the purchase
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Total charge for the purchase
        required: Decimal,
        /// Current account balance
        available: Decimal,
    },

    /// Item name already in use
    #[error("Item name already taken: {0}")]
    ItemNameTaken(String),

    /// Default data was already provisioned
    #[error("Data already added.")]
    AlreadyProvisioned,

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_guard_errors_name_both_sides() {
        let err = Error::InsufficientStock {
            requested: 5,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock: requested 5, available 2"
        );

        let err = Error::InsufficientBalance {
            required: dec!(7.50),
            available: dec!(1.00),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient balance: required 7.50, available 1.00"
        );
    }

    #[test]
    fn test_money_range_errors_carry_the_value() {
        assert_eq!(
            Error::InvalidPrice(dec!(-1.00)).to_string(),
            "Invalid price: -1.00"
        );
        assert_eq!(
            Error::InvalidBalance(dec!(10000.00)).to_string(),
            "Invalid balance: 10000.00"
        );
        assert_eq!(
            Error::TotalOverflow {
                unit_price: dec!(9999.99),
                quantity: 3,
            }
            .to_string(),
            "Total overflow: 9999.99 x 3"
        );
    }

    #[test]
    fn test_duplicate_provision_message() {
        // Exact wire body served on the second /add_default_data call
        assert_eq!(Error::AlreadyProvisioned.to_string(), "Data already added.");
    }

    #[test]
    fn test_rocksdb_errors_map_to_storage() {
        let err: Error = Error::Storage("io stall".to_string());
        assert!(matches!(err, Error::Storage(_)));
    }
}
