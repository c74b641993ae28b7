//! Main register orchestration layer
//!
//! This module ties together storage, guards, and the actor into a
//! high-level API for purchase processing.
//!
//! # Example
//!
//! ```no_run
//! use truck_core::{Config, Register};
//!
//! #[tokio::main]
//! async fn main() -> truck_core::Result<()> {
//!     let config = Config::default();
//!     let register = Register::open(config).await?;
//!
//!     // Process a purchase
//!     // let receipt = register.purchase(request).await?;
//!
//!     Ok(())
//! }
//! ```

use crate::{
    actor::{spawn_register_actor, RegisterHandle},
    guard,
    metrics::Metrics,
    query::QueryService,
    types::{total_price, Account, Item, PurchaseRequest, Receipt, SaleRecord, Truck, TruckInventory},
    Config, Error, Result, Storage,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Execute the purchase steps against the store
///
/// Runs inside the single-writer critical section: between the reads and
/// the atomic commit no other mutation can interleave. Order is fixed so
/// failures are deterministic: resolve item, account, truck; validate the
/// quantity; compute the total; inventory guard; balance guard; commit.
pub(crate) fn execute_purchase(
    storage: &Storage,
    request: &PurchaseRequest,
    now: DateTime<Utc>,
) -> Result<Receipt> {
    // Resolve all three parties before any validation
    let mut item = storage.get_item(request.item_id)?;
    let mut account = storage.get_account(request.account_id)?;
    let truck = storage.get_truck(request.truck_id)?;

    if request.quantity == 0 {
        return Err(Error::InvalidQuantity(request.quantity));
    }

    let total = total_price(item.price, request.quantity)?;

    // Stock before balance: when both would fail, report stock
    guard::check_stock(&item, request.quantity)?;
    guard::check_balance(&account, total)?;

    item.stock -= request.quantity;
    account.balance -= total;

    let record = SaleRecord {
        id: Uuid::now_v7(),
        item_id: item.id,
        account_id: account.id,
        truck_id: truck.id,
        quantity: request.quantity,
        unit_price: item.price,
        total,
        created_at: now,
    };

    storage.commit_sale(&item, &account, &record)?;

    Ok(Receipt {
        record,
        stock_remaining: item.stock,
        balance_remaining: account.balance,
    })
}

/// Main register interface
pub struct Register {
    /// Actor handle for mutating operations
    handle: RegisterHandle,

    /// Read-only query service (bypasses the actor)
    query: QueryService,

    /// Prometheus metrics
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl Register {
    /// Open register with configuration
    pub async fn open(config: Config) -> Result<Self> {
        // Open storage
        let storage = Arc::new(Storage::open(&config)?);

        // Spawn actor
        let handle = spawn_register_actor(storage.clone(), config.mailbox.capacity);

        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("Failed to register metrics: {}", e)))?;

        Ok(Self {
            handle,
            query: QueryService::new(storage),
            metrics,
            config,
        })
    }

    /// Process a purchase request
    ///
    /// On success the stock decrement, balance decrement, and sale record
    /// have all been committed. On failure nothing has changed.
    pub async fn purchase(&self, request: PurchaseRequest) -> Result<Receipt> {
        let start = Instant::now();
        let result = self.handle.purchase(request).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(receipt) => {
                self.metrics.record_purchase(elapsed);
                tracing::info!(
                    sale_id = %receipt.record.id,
                    item_id = %request.item_id,
                    account_id = %request.account_id,
                    truck_id = %request.truck_id,
                    quantity = request.quantity,
                    total = %receipt.record.total,
                    "Purchase committed"
                );
            }
            Err(err) => {
                self.metrics.record_rejection(elapsed);
                tracing::warn!(
                    item_id = %request.item_id,
                    account_id = %request.account_id,
                    truck_id = %request.truck_id,
                    quantity = request.quantity,
                    error = %err,
                    "Purchase rejected"
                );
            }
        }

        result
    }

    /// Create a catalog item (unique name enforced)
    pub async fn create_item(&self, item: Item) -> Result<Item> {
        self.handle.create_item(item).await
    }

    /// Create a customer account
    pub async fn create_account(&self, account: Account) -> Result<Account> {
        self.handle.create_account(account).await
    }

    /// Create a truck
    pub async fn create_truck(&self, truck: Truck) -> Result<Truck> {
        self.handle.create_truck(truck).await
    }

    /// Provision the default truck and catalog
    ///
    /// Idempotence: a second call fails with `AlreadyProvisioned` and
    /// writes nothing.
    pub async fn provision_defaults(&self) -> Result<Truck> {
        let (truck, items) = crate::seed::default_catalog(self.config.seed.default_stock);
        self.handle.provision(truck, items).await
    }

    /// Total revenue for a truck (zero when it has no sales)
    pub fn total_revenue(&self, truck_id: Uuid) -> Result<Decimal> {
        self.query.total_revenue(truck_id)
    }

    /// A truck and the items it offers
    pub fn truck_inventory(&self, truck_id: Uuid) -> Result<TruckInventory> {
        self.query.truck_inventory(truck_id)
    }

    /// Independent reader over committed state
    pub fn queries(&self) -> QueryService {
        self.query.clone()
    }

    /// Metrics collector (for the gateway /metrics endpoint)
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Configuration this register was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shutdown register
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}
