//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `items` - Catalog items (key: item_id)
//! - `accounts` - Customer accounts (key: account_id)
//! - `trucks` - Vendor trucks (key: truck_id)
//! - `sales` - Append-only sale records (key: sale_id)
//! - `indices` - Secondary indices for fast lookups
//! - `meta` - Single-key markers (provisioning)
//!
//! All multi-record mutations go through a single `WriteBatch`, so a reader
//! never observes a partially applied purchase or seed.

use crate::{
    error::{Error, Result},
    types::{Account, Item, SaleRecord, Truck},
    Config,
};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB,
};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_ITEMS: &str = "items";
const CF_ACCOUNTS: &str = "accounts";
const CF_TRUCKS: &str = "trucks";
const CF_SALES: &str = "sales";
const CF_INDICES: &str = "indices";
const CF_META: &str = "meta";

/// Marker key: default data has been provisioned
const META_SEEDED: &[u8] = b"seeded";

/// Index tag: item name -> item_id
const IDX_NAME_TAG: &[u8] = b"n|";
/// Index tag: truck_id || sale_id -> empty
const IDX_TRUCK_SALE_TAG: &[u8] = b"t|";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
    // Column family handles are stored in DB, accessed by name
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        // Database options
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        // Enable statistics
        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        // Column family descriptors
        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ITEMS, Self::cf_options_entities()),
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Self::cf_options_entities()),
            ColumnFamilyDescriptor::new(CF_TRUCKS, Self::cf_options_entities()),
            ColumnFamilyDescriptor::new(CF_SALES, Self::cf_options_sales()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
            ColumnFamilyDescriptor::new(CF_META, Self::cf_options_entities()),
        ];

        // Open database
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_entities() -> Options {
        let mut opts = Options::default();
        // Entities are frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_sales() -> Options {
        let mut opts = Options::default();
        // Append-only archive, favor compression ratio
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        // Indices benefit from bloom filters
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false); // 10 bits per key
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    // Helper: get column family handle

    fn cf_handle(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Item operations

    /// Insert a new item, enforcing name uniqueness
    pub fn create_item(&self, item: &Item) -> Result<()> {
        let cf_indices = self.cf_handle(CF_INDICES)?;
        let name_key = Self::index_key_name(&item.name);

        if self.db.get_cf(&cf_indices, &name_key)?.is_some() {
            return Err(Error::ItemNameTaken(item.name.clone()));
        }

        let cf_items = self.cf_handle(CF_ITEMS)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_items, item.id.as_bytes(), bincode::serialize(item)?);
        batch.put_cf(&cf_indices, &name_key, item.id.as_bytes());

        self.db.write(batch)?;

        tracing::debug!(item_id = %item.id, name = %item.name, "Item created");

        Ok(())
    }

    /// Get item by ID
    pub fn get_item(&self, item_id: Uuid) -> Result<Item> {
        let cf = self.cf_handle(CF_ITEMS)?;

        let value = self
            .db
            .get_cf(&cf, item_id.as_bytes())?
            .ok_or(Error::ItemNotFound(item_id))?;

        let item: Item = bincode::deserialize(&value)?;
        Ok(item)
    }

    /// Look up an item by its unique name (via index)
    pub fn get_item_by_name(&self, name: &str) -> Result<Option<Item>> {
        let cf_indices = self.cf_handle(CF_INDICES)?;

        match self.db.get_cf(&cf_indices, Self::index_key_name(name))? {
            Some(id_bytes) => {
                let item_id = Uuid::from_slice(&id_bytes)
                    .map_err(|e| Error::Storage(format!("Corrupt name index: {}", e)))?;
                Ok(Some(self.get_item(item_id)?))
            }
            None => Ok(None),
        }
    }

    /// List all catalog items
    pub fn list_items(&self) -> Result<Vec<Item>> {
        let cf = self.cf_handle(CF_ITEMS)?;

        let mut items = Vec::new();
        for entry in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = entry?;
            items.push(bincode::deserialize(&value)?);
        }

        Ok(items)
    }

    // Account operations

    /// Insert a new account
    pub fn create_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        self.db
            .put_cf(&cf, account.id.as_bytes(), bincode::serialize(account)?)?;

        tracing::debug!(account_id = %account.id, owner = %account.owner, "Account created");

        Ok(())
    }

    /// Get account by ID
    pub fn get_account(&self, account_id: Uuid) -> Result<Account> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;

        let value = self
            .db
            .get_cf(&cf, account_id.as_bytes())?
            .ok_or(Error::AccountNotFound(account_id))?;

        let account: Account = bincode::deserialize(&value)?;
        Ok(account)
    }

    // Truck operations

    /// Insert a new truck
    pub fn create_truck(&self, truck: &Truck) -> Result<()> {
        let cf = self.cf_handle(CF_TRUCKS)?;
        self.db
            .put_cf(&cf, truck.id.as_bytes(), bincode::serialize(truck)?)?;

        tracing::debug!(truck_id = %truck.id, name = %truck.name, "Truck created");

        Ok(())
    }

    /// Get truck by ID
    pub fn get_truck(&self, truck_id: Uuid) -> Result<Truck> {
        let cf = self.cf_handle(CF_TRUCKS)?;

        let value = self
            .db
            .get_cf(&cf, truck_id.as_bytes())?
            .ok_or(Error::TruckNotFound(truck_id))?;

        let truck: Truck = bincode::deserialize(&value)?;
        Ok(truck)
    }

    // Sale operations

    /// Get sale record by ID
    fn get_sale(&self, sale_id: Uuid) -> Result<SaleRecord> {
        let cf = self.cf_handle(CF_SALES)?;

        let value = self
            .db
            .get_cf(&cf, sale_id.as_bytes())?
            .ok_or_else(|| Error::Storage(format!("Sale record missing: {}", sale_id)))?;

        let record: SaleRecord = bincode::deserialize(&value)?;
        Ok(record)
    }

    /// Get all sale records for a truck (via index), oldest first
    pub fn sales_for_truck(&self, truck_id: Uuid) -> Result<Vec<SaleRecord>> {
        let cf_indices = self.cf_handle(CF_INDICES)?;

        // Scan index: tag || truck_id || sale_id
        let prefix = Self::index_key_truck_sale(truck_id, None);
        let iter = self.db.iterator_cf(
            &cf_indices,
            IteratorMode::From(prefix.as_slice(), Direction::Forward),
        );

        let mut records = Vec::new();
        for entry in iter {
            let (key, _) = entry?;
            if !key.starts_with(&prefix) {
                break;
            }

            // Extract sale_id from key (bytes 18..34)
            if key.len() >= 34 {
                let sale_id_bytes: [u8; 16] = key[18..34].try_into().unwrap();
                let sale_id = Uuid::from_bytes(sale_id_bytes);

                records.push(self.get_sale(sale_id)?);
            }
        }

        // UUIDv7 keys are time-ordered, but commit order is authoritative
        records.sort_by_key(|r| r.created_at);

        Ok(records)
    }

    // Batch operations (atomic)

    /// Commit a completed purchase atomically
    ///
    /// The decremented item, the decremented account, the new sale record,
    /// and its truck index entry land in one write. Readers observe either
    /// all four or none.
    pub fn commit_sale(&self, item: &Item, account: &Account, record: &SaleRecord) -> Result<()> {
        let mut batch = WriteBatch::default();

        // 1. Item with decremented stock
        let cf_items = self.cf_handle(CF_ITEMS)?;
        batch.put_cf(&cf_items, item.id.as_bytes(), bincode::serialize(item)?);

        // 2. Account with decremented balance
        let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
        batch.put_cf(
            &cf_accounts,
            account.id.as_bytes(),
            bincode::serialize(account)?,
        );

        // 3. Sale record
        let cf_sales = self.cf_handle(CF_SALES)?;
        batch.put_cf(&cf_sales, record.id.as_bytes(), bincode::serialize(record)?);

        // 4. Index: truck_id || sale_id -> empty
        let cf_indices = self.cf_handle(CF_INDICES)?;
        let idx_truck_sale = Self::index_key_truck_sale(record.truck_id, Some(record.id));
        batch.put_cf(&cf_indices, &idx_truck_sale, b"");

        // Atomic commit
        self.db.write(batch)?;

        tracing::debug!(
            sale_id = %record.id,
            item_id = %item.id,
            account_id = %account.id,
            total = %record.total,
            "Sale committed"
        );

        Ok(())
    }

    /// Whether default data has been provisioned
    pub fn is_seeded(&self) -> Result<bool> {
        let cf = self.cf_handle(CF_META)?;
        Ok(self.db.get_cf(&cf, META_SEEDED)?.is_some())
    }

    /// Provision the default truck and catalog atomically
    ///
    /// The truck, all items, their name index entries, and the seeded marker
    /// land in one write. A second attempt fails with `AlreadyProvisioned`
    /// and writes nothing.
    pub fn provision(&self, truck: &Truck, items: &[Item]) -> Result<()> {
        if self.is_seeded()? {
            return Err(Error::AlreadyProvisioned);
        }

        let cf_trucks = self.cf_handle(CF_TRUCKS)?;
        let cf_items = self.cf_handle(CF_ITEMS)?;
        let cf_indices = self.cf_handle(CF_INDICES)?;
        let cf_meta = self.cf_handle(CF_META)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_trucks, truck.id.as_bytes(), bincode::serialize(truck)?);

        for item in items {
            let name_key = Self::index_key_name(&item.name);
            if self.db.get_cf(&cf_indices, &name_key)?.is_some() {
                return Err(Error::ItemNameTaken(item.name.clone()));
            }
            batch.put_cf(&cf_items, item.id.as_bytes(), bincode::serialize(item)?);
            batch.put_cf(&cf_indices, &name_key, item.id.as_bytes());
        }

        batch.put_cf(&cf_meta, META_SEEDED, b"");

        self.db.write(batch)?;

        tracing::info!(
            truck_id = %truck.id,
            truck_name = %truck.name,
            items = items.len(),
            "Default data provisioned"
        );

        Ok(())
    }

    // Index key helpers

    fn index_key_name(name: &str) -> Vec<u8> {
        let mut key = IDX_NAME_TAG.to_vec();
        key.extend_from_slice(name.as_bytes());
        key
    }

    fn index_key_truck_sale(truck_id: Uuid, sale_id: Option<Uuid>) -> Vec<u8> {
        let mut key = IDX_TRUCK_SALE_TAG.to_vec();
        key.extend_from_slice(truck_id.as_bytes());
        if let Some(sid) = sale_id {
            key.extend_from_slice(sid.as_bytes());
        }
        key
    }

    // Statistics

    /// Get storage statistics
    pub fn get_stats(&self) -> Result<StorageStats> {
        let cf_items = self.cf_handle(CF_ITEMS)?;
        let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
        let cf_trucks = self.cf_handle(CF_TRUCKS)?;
        let cf_sales = self.cf_handle(CF_SALES)?;

        // Count trucks exactly (tiny CF)
        let mut truck_count = 0u64;
        let iter = self.db.iterator_cf(&cf_trucks, IteratorMode::Start);
        for _ in iter {
            truck_count += 1;
        }

        Ok(StorageStats {
            total_items: self.approximate_count(&cf_items)?,
            total_accounts: self.approximate_count(&cf_accounts)?,
            total_trucks: truck_count,
            total_sales: self.approximate_count(&cf_sales)?,
        })
    }

    fn approximate_count(&self, cf: &Arc<BoundColumnFamily<'_>>) -> Result<u64> {
        // RocksDB property for approximate count
        let prop = self
            .db
            .property_int_value_cf(cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);

        Ok(prop)
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Catalog items
    pub total_items: u64,
    /// Customer accounts
    pub total_accounts: u64,
    /// Trucks
    pub total_trucks: u64,
    /// Sale records
    pub total_sales: u64,
}
