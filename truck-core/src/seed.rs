//! Default catalog provisioning
//!
//! One truck, three items, each with its flavors. The catalog is built
//! fresh on every call (new IDs); the storage layer's seeded marker is
//! what makes provisioning one-shot.

use crate::types::{Item, Truck};
use rust_decimal::Decimal;

/// Stock given to each catalog item when the config does not override it
pub const DEFAULT_SEED_STOCK: u32 = 50;

/// The default truck and its catalog, every item carrying `stock` units
pub fn default_catalog(stock: u32) -> (Truck, Vec<Item>) {
    let items = vec![
        Item::new("Ice Cream", Decimal::new(399, 2), stock)
            .with_flavors(["Chocolate", "Pistachio", "Strawberry", "Mint"]),
        Item::new("Shaved Ice", Decimal::new(299, 2), stock)
            .with_flavors(["Blueberry", "Orange", "Strawberry"]),
        Item::new("Snack Bar", Decimal::new(199, 2), stock)
            .with_flavors(["Klondike", "Magnum", "Twister"]),
    ];

    let mut truck = Truck::new("Krispy Kream");
    truck.item_ids = items.iter().map(|item| item.id).collect();

    (truck, items)
}
