//! Read-only queries over committed state
//!
//! The query service never mutates and never enters the write mailbox; it
//! reads whatever the last atomic commit left behind. Because every
//! purchase lands in a single `WriteBatch`, a query sees either all of a
//! purchase's effects or none of them.

use crate::storage::{Storage, StorageStats};
use crate::types::{Account, Item, SaleRecord, Truck, TruckInventory};
use crate::Result;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Read-side service over the store
#[derive(Clone)]
pub struct QueryService {
    storage: Arc<Storage>,
}

impl QueryService {
    /// Create a query service over the given store
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Total revenue for a truck: the sum of `total` over its sale records
    ///
    /// Zero when the truck has no sales. Unknown trucks are an error, not
    /// an empty sum.
    pub fn total_revenue(&self, truck_id: Uuid) -> Result<Decimal> {
        self.storage.get_truck(truck_id)?;

        let mut revenue = Decimal::ZERO;
        for record in self.storage.sales_for_truck(truck_id)? {
            revenue += record.total;
        }

        Ok(revenue)
    }

    /// A truck and the items it offers, with live price and stock
    pub fn truck_inventory(&self, truck_id: Uuid) -> Result<TruckInventory> {
        let truck = self.storage.get_truck(truck_id)?;

        let mut items = Vec::with_capacity(truck.item_ids.len());
        for item_id in &truck.item_ids {
            items.push(self.storage.get_item(*item_id)?);
        }

        Ok(TruckInventory {
            truck_id: truck.id,
            name: truck.name,
            items,
        })
    }

    /// The full audit trail for a truck, oldest sale first
    pub fn sales_for_truck(&self, truck_id: Uuid) -> Result<Vec<SaleRecord>> {
        self.storage.get_truck(truck_id)?;
        self.storage.sales_for_truck(truck_id)
    }

    /// Get item by ID
    pub fn get_item(&self, item_id: Uuid) -> Result<Item> {
        self.storage.get_item(item_id)
    }

    /// Look up an item by its unique name
    pub fn get_item_by_name(&self, name: &str) -> Result<Option<Item>> {
        self.storage.get_item_by_name(name)
    }

    /// List all catalog items, sorted by name
    pub fn list_items(&self) -> Result<Vec<Item>> {
        let mut items = self.storage.list_items()?;
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    /// Get account by ID
    pub fn get_account(&self, account_id: Uuid) -> Result<Account> {
        self.storage.get_account(account_id)
    }

    /// Get truck by ID
    pub fn get_truck(&self, truck_id: Uuid) -> Result<Truck> {
        self.storage.get_truck(truck_id)
    }

    /// Storage statistics (approximate counts)
    pub fn stats(&self) -> Result<StorageStats> {
        self.storage.get_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::total_price;
    use crate::{Config, Error};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn test_service() -> (QueryService, Arc<Storage>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();

        let storage = Arc::new(Storage::open(&config).unwrap());
        (QueryService::new(storage.clone()), storage, temp_dir)
    }

    fn commit_test_sale(storage: &Storage, item: &Item, account: &Account, truck: &Truck, quantity: u32) {
        let total = total_price(item.price, quantity).unwrap();
        let record = SaleRecord {
            id: Uuid::now_v7(),
            item_id: item.id,
            account_id: account.id,
            truck_id: truck.id,
            quantity,
            unit_price: item.price,
            total,
            created_at: Utc::now(),
        };
        storage.commit_sale(item, account, &record).unwrap();
    }

    #[test]
    fn test_revenue_sums_records() {
        let (queries, storage, _temp) = test_service();

        let item = Item::new("Ice Cream", dec!(3.99), 100);
        let account = Account::new("John Doe", dec!(500.00));
        let truck = Truck::new("Krispy Kream");
        storage.create_item(&item).unwrap();
        storage.create_account(&account).unwrap();
        storage.create_truck(&truck).unwrap();

        commit_test_sale(&storage, &item, &account, &truck, 2); // 7.98
        commit_test_sale(&storage, &item, &account, &truck, 1); // 3.99

        assert_eq!(queries.total_revenue(truck.id).unwrap(), dec!(11.97));

        // Reads are idempotent
        assert_eq!(queries.total_revenue(truck.id).unwrap(), dec!(11.97));
    }

    #[test]
    fn test_revenue_zero_for_fresh_truck() {
        let (queries, storage, _temp) = test_service();

        let truck = Truck::new("Krispy Kream");
        storage.create_truck(&truck).unwrap();

        assert_eq!(queries.total_revenue(truck.id).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_revenue_unknown_truck() {
        let (queries, _storage, _temp) = test_service();

        let unknown = Uuid::new_v4();
        let err = queries.total_revenue(unknown).unwrap_err();
        assert!(matches!(err, Error::TruckNotFound(id) if id == unknown));
    }

    #[test]
    fn test_truck_inventory() {
        let (queries, storage, _temp) = test_service();

        let ice_cream = Item::new("Ice Cream", dec!(3.99), 50);
        let snack_bar = Item::new("Snack Bar", dec!(1.99), 20);
        let mut truck = Truck::new("Krispy Kream");
        truck.item_ids = vec![ice_cream.id, snack_bar.id];

        storage.create_item(&ice_cream).unwrap();
        storage.create_item(&snack_bar).unwrap();
        storage.create_truck(&truck).unwrap();

        let inventory = queries.truck_inventory(truck.id).unwrap();
        assert_eq!(inventory.name, "Krispy Kream");
        assert_eq!(inventory.items.len(), 2);
        assert!(inventory.items.iter().any(|i| i.name == "Ice Cream"));
    }

    #[test]
    fn test_list_items_sorted_by_name() {
        let (queries, storage, _temp) = test_service();

        storage
            .create_item(&Item::new("Snack Bar", dec!(1.99), 1))
            .unwrap();
        storage
            .create_item(&Item::new("Ice Cream", dec!(3.99), 1))
            .unwrap();
        storage
            .create_item(&Item::new("Shaved Ice", dec!(2.99), 1))
            .unwrap();

        let names: Vec<String> = queries
            .list_items()
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Ice Cream", "Shaved Ice", "Snack Bar"]);
    }

    #[test]
    fn test_sales_for_truck_ordered() {
        let (queries, storage, _temp) = test_service();

        let item = Item::new("Ice Cream", dec!(3.99), 100);
        let account = Account::new("John Doe", dec!(500.00));
        let truck = Truck::new("Krispy Kream");
        storage.create_item(&item).unwrap();
        storage.create_account(&account).unwrap();
        storage.create_truck(&truck).unwrap();

        for quantity in 1..=3 {
            commit_test_sale(&storage, &item, &account, &truck, quantity);
        }

        let sales = queries.sales_for_truck(truck.id).unwrap();
        assert_eq!(sales.len(), 3);
        assert!(sales.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }
}
