//! Property-based tests for purchase invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Conservation: stock and balance decrease by exactly what was sold
//! - Non-negativity: no sequence of purchases drives stock or balance below zero
//! - Atomicity: a failed purchase leaves the store untouched
//! - Revenue additivity: truck revenue equals the sum of its sale records

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tempfile::TempDir;
use truck_core::{
    types::total_price, Account, Config, Error, Item, PurchaseRequest, Register, Truck,
};
use uuid::Uuid;

/// Strategy for generating unit prices (0.01 to 99.99)
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for generating prepaid balances (0.00 to 50,000.00)
fn balance_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..5_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Create test register with temp directory
async fn create_test_register() -> (Register, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.data_dir = temp_dir.path().to_path_buf();

    let register = Register::open(config).await.unwrap();
    (register, temp_dir)
}

/// One item, one account, one truck; returns their IDs
async fn stock_the_truck(
    register: &Register,
    price: Decimal,
    stock: u32,
    balance: Decimal,
) -> (Uuid, Uuid, Uuid) {
    let item = register
        .create_item(Item::new("Ice Cream", price, stock))
        .await
        .unwrap();
    let account = register
        .create_account(Account::new("John Doe", balance))
        .await
        .unwrap();
    let mut truck = Truck::new("Krispy Kream");
    truck.item_ids.push(item.id);
    let truck = register.create_truck(truck).await.unwrap();

    (item.id, account.id, truck.id)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: a single purchase conserves stock and money
    #[test]
    fn prop_purchase_conserves_stock_and_money(
        price in price_strategy(),
        stock in 0u32..200,
        balance in balance_strategy(),
        quantity in 1u32..200,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (register, _temp) = create_test_register().await;
            let (item_id, account_id, truck_id) =
                stock_the_truck(&register, price, stock, balance).await;

            let expected_total = total_price(price, quantity).unwrap();
            let result = register
                .purchase(PurchaseRequest { item_id, account_id, truck_id, quantity })
                .await;

            let queries = register.queries();
            let item = queries.get_item(item_id).unwrap();
            let account = queries.get_account(account_id).unwrap();
            let revenue = register.total_revenue(truck_id).unwrap();

            match result {
                Ok(receipt) => {
                    prop_assert_eq!(receipt.record.total, expected_total);
                    prop_assert_eq!(receipt.record.quantity, quantity);
                    prop_assert_eq!(item.stock, stock - quantity);
                    prop_assert_eq!(account.balance, balance - expected_total);
                    prop_assert_eq!(receipt.stock_remaining, item.stock);
                    prop_assert_eq!(receipt.balance_remaining, account.balance);
                    prop_assert_eq!(revenue, expected_total);
                }
                Err(_) => {
                    // Failed purchase changes nothing
                    prop_assert_eq!(item.stock, stock);
                    prop_assert_eq!(account.balance, balance);
                    prop_assert_eq!(revenue, Decimal::ZERO);
                }
            }

            register.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: no sequence of purchases drives stock or balance negative,
    /// and the store always matches the sum of committed receipts
    #[test]
    fn prop_sequences_never_oversell_or_overspend(
        price in price_strategy(),
        quantities in prop::collection::vec(1u32..=5, 1..12),
        stock in 0u32..30,
        balance in balance_strategy(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (register, _temp) = create_test_register().await;
            let (item_id, account_id, truck_id) =
                stock_the_truck(&register, price, stock, balance).await;

            let mut sold = 0u32;
            let mut spent = Decimal::ZERO;
            let mut record_ids = HashSet::new();

            for quantity in quantities {
                let result = register
                    .purchase(PurchaseRequest { item_id, account_id, truck_id, quantity })
                    .await;

                if let Ok(receipt) = result {
                    sold += quantity;
                    spent += receipt.record.total;
                    // Exactly-once: every commit yields a fresh record
                    prop_assert!(record_ids.insert(receipt.record.id));
                }
            }

            let queries = register.queries();
            let item = queries.get_item(item_id).unwrap();
            let account = queries.get_account(account_id).unwrap();

            prop_assert!(sold <= stock);
            prop_assert_eq!(item.stock, stock - sold);
            prop_assert!(account.balance >= Decimal::ZERO);
            prop_assert_eq!(account.balance, balance - spent);

            // Revenue additivity: ledger sum equals what the account spent
            prop_assert_eq!(register.total_revenue(truck_id).unwrap(), spent);
            prop_assert_eq!(
                queries.sales_for_truck(truck_id).unwrap().len(),
                record_ids.len()
            );

            register.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: when both guards would fail, stock is reported
    #[test]
    fn prop_stock_guard_reported_first(
        price in price_strategy(),
        stock in 0u32..5,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (register, _temp) = create_test_register().await;
            // Balance of zero cannot cover any quantity at any price
            let (item_id, account_id, truck_id) =
                stock_the_truck(&register, price, stock, Decimal::ZERO).await;

            let err = register
                .purchase(PurchaseRequest {
                    item_id,
                    account_id,
                    truck_id,
                    quantity: stock + 1,
                })
                .await
                .unwrap_err();

            prop_assert!(matches!(err, Error::InsufficientStock { .. }));

            register.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: every committed record satisfies total == unit_price * quantity
    #[test]
    fn prop_record_total_is_exact(
        price in price_strategy(),
        quantity in 1u32..50,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (register, _temp) = create_test_register().await;
            // Stock and balance always sufficient
            let (item_id, account_id, truck_id) =
                stock_the_truck(&register, price, 50, Decimal::new(500_000_00, 2)).await;

            let receipt = register
                .purchase(PurchaseRequest { item_id, account_id, truck_id, quantity })
                .await
                .unwrap();

            prop_assert_eq!(
                receipt.record.total,
                receipt.record.unit_price * Decimal::from(receipt.record.quantity)
            );
            prop_assert!(receipt.record.quantity > 0);

            register.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: the total computation reports overflow, never panics
    #[test]
    fn prop_total_price_overflow_reported(
        lo in any::<u32>(),
        mid in any::<u32>(),
        hi in any::<u32>(),
        quantity in any::<u32>(),
    ) {
        let price = Decimal::from_parts(lo, mid, hi, false, 2);
        match total_price(price, quantity) {
            Ok(total) => prop_assert!(total >= Decimal::ZERO),
            Err(Error::TotalOverflow { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    /// Concurrent buyers can never oversell: with 10 units in stock and 32
    /// tasks racing, exactly 10 single-unit purchases commit.
    #[tokio::test]
    async fn test_concurrent_purchases_never_oversell() {
        let (register, _temp) = create_test_register().await;
        let (item_id, account_id, truck_id) =
            stock_the_truck(&register, dec!(2.50), 10, dec!(100.00)).await;

        let register = Arc::new(register);
        let mut tasks = Vec::new();
        for _ in 0..32 {
            let register = register.clone();
            tasks.push(tokio::spawn(async move {
                register
                    .purchase(PurchaseRequest {
                        item_id,
                        account_id,
                        truck_id,
                        quantity: 1,
                    })
                    .await
            }));
        }

        let mut committed = 0u32;
        let mut rejected = 0u32;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => committed += 1,
                Err(Error::InsufficientStock { .. }) => rejected += 1,
                Err(other) => panic!("Unexpected error: {:?}", other),
            }
        }

        assert_eq!(committed, 10);
        assert_eq!(rejected, 22);

        let queries = register.queries();
        assert_eq!(queries.get_item(item_id).unwrap().stock, 0);
        assert_eq!(queries.get_account(account_id).unwrap().balance, dec!(75.00));
        assert_eq!(register.total_revenue(truck_id).unwrap(), dec!(25.00));
        assert_eq!(queries.sales_for_truck(truck_id).unwrap().len(), 10);

        let register = Arc::try_unwrap(register).ok().expect("sole owner");
        register.shutdown().await.unwrap();
    }

    /// Concurrent buyers can never overspend a shared account.
    #[tokio::test]
    async fn test_concurrent_purchases_never_overspend() {
        let (register, _temp) = create_test_register().await;
        // Balance covers exactly 4 units; plenty of stock
        let (item_id, account_id, truck_id) =
            stock_the_truck(&register, dec!(2.50), 100, dec!(10.00)).await;

        let register = Arc::new(register);
        let mut tasks = Vec::new();
        for _ in 0..16 {
            let register = register.clone();
            tasks.push(tokio::spawn(async move {
                register
                    .purchase(PurchaseRequest {
                        item_id,
                        account_id,
                        truck_id,
                        quantity: 1,
                    })
                    .await
            }));
        }

        let mut committed = 0u32;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                committed += 1;
            }
        }

        assert_eq!(committed, 4);

        let queries = register.queries();
        assert_eq!(queries.get_account(account_id).unwrap().balance, dec!(0.00));
        assert_eq!(queries.get_item(item_id).unwrap().stock, 96);

        let register = Arc::try_unwrap(register).ok().expect("sole owner");
        register.shutdown().await.unwrap();
    }

    /// Full day at the truck: provision defaults, open accounts, sell
    /// across the catalog, reconcile revenue against the ledger.
    #[tokio::test]
    async fn test_full_day_lifecycle() {
        let (register, _temp) = create_test_register().await;

        let truck = register.provision_defaults().await.unwrap();
        let queries = register.queries();

        let ice_cream = queries.get_item_by_name("Ice Cream").unwrap().unwrap();
        let shaved_ice = queries.get_item_by_name("Shaved Ice").unwrap().unwrap();
        let snack_bar = queries.get_item_by_name("Snack Bar").unwrap().unwrap();

        let alice = register
            .create_account(Account::new("Alice", dec!(30.00)))
            .await
            .unwrap();
        let bob = register
            .create_account(Account::new("Bob", dec!(5.00)))
            .await
            .unwrap();

        // Alice: 2 ice creams + 1 shaved ice = 7.98 + 2.99 = 10.97
        register
            .purchase(PurchaseRequest {
                item_id: ice_cream.id,
                account_id: alice.id,
                truck_id: truck.id,
                quantity: 2,
            })
            .await
            .unwrap();
        register
            .purchase(PurchaseRequest {
                item_id: shaved_ice.id,
                account_id: alice.id,
                truck_id: truck.id,
                quantity: 1,
            })
            .await
            .unwrap();

        // Bob: 2 snack bars = 3.98, then a third that his balance cannot cover
        register
            .purchase(PurchaseRequest {
                item_id: snack_bar.id,
                account_id: bob.id,
                truck_id: truck.id,
                quantity: 2,
            })
            .await
            .unwrap();
        let err = register
            .purchase(PurchaseRequest {
                item_id: ice_cream.id,
                account_id: bob.id,
                truck_id: truck.id,
                quantity: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientBalance { .. }));

        // Reconcile
        assert_eq!(register.total_revenue(truck.id).unwrap(), dec!(14.95));
        assert_eq!(queries.get_account(alice.id).unwrap().balance, dec!(19.03));
        assert_eq!(queries.get_account(bob.id).unwrap().balance, dec!(1.02));
        assert_eq!(queries.get_item(ice_cream.id).unwrap().stock, 48);
        assert_eq!(queries.get_item(shaved_ice.id).unwrap().stock, 49);
        assert_eq!(queries.get_item(snack_bar.id).unwrap().stock, 48);

        let sales = queries.sales_for_truck(truck.id).unwrap();
        assert_eq!(sales.len(), 3);
        assert!(sales.windows(2).all(|w| w[0].created_at <= w[1].created_at));

        register.shutdown().await.unwrap();
    }
}
