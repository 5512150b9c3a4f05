//! In-memory inventory store.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use cartwright_core::ProductId;

use crate::store::{InventoryError, InventoryStore, ProductRecord};

/// In-memory stock ledger with per-product locking.
///
/// The outer `RwLock` guards the product map (taken for write only when
/// seeding/administering products); each product carries its own `Mutex`, so
/// reservations against the same product serialize while reservations against
/// different products proceed in parallel.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    products: RwLock<HashMap<ProductId, Mutex<ProductRecord>>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product record (seeding/administration).
    pub fn upsert_product(&self, record: ProductRecord) -> Result<(), InventoryError> {
        let mut products = self
            .products
            .write()
            .map_err(|_| InventoryError::Unavailable("product map lock poisoned".to_string()))?;
        products.insert(record.id, Mutex::new(record));
        Ok(())
    }

    fn with_record<T>(
        &self,
        product_id: ProductId,
        f: impl FnOnce(&mut ProductRecord) -> T,
    ) -> Result<T, InventoryError> {
        let products = self
            .products
            .read()
            .map_err(|_| InventoryError::Unavailable("product map lock poisoned".to_string()))?;

        let slot = products
            .get(&product_id)
            .ok_or(InventoryError::ProductNotFound)?;

        let mut record = slot
            .lock()
            .map_err(|_| InventoryError::Unavailable("product lock poisoned".to_string()))?;

        Ok(f(&mut record))
    }
}

impl InventoryStore for InMemoryInventory {
    fn try_reserve(&self, product_id: ProductId, requested: u32) -> Result<u32, InventoryError> {
        self.with_record(product_id, |record| {
            let fulfilled = requested.min(record.stock);
            record.stock -= fulfilled;
            if fulfilled < requested {
                tracing::debug!(%product_id, requested, fulfilled, "reservation clamped to stock");
            }
            fulfilled
        })
    }

    fn current_price(&self, product_id: ProductId) -> Result<u64, InventoryError> {
        self.with_record(product_id, |record| record.price)
    }

    fn release(&self, product_id: ProductId, quantity: u32) -> Result<(), InventoryError> {
        self.with_record(product_id, |record| {
            record.stock = record.stock.saturating_add(quantity);
        })
    }

    fn stock_on_hand(&self, product_id: ProductId) -> Result<u32, InventoryError> {
        self.with_record(product_id, |record| record.stock)
    }
}
