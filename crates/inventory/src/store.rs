//! Inventory store contract.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use cartwright_core::ProductId;

/// A product as the inventory store sees it: price snapshot and stock level.
///
/// Catalog concerns (description, images, search) live elsewhere; the store
/// only needs what reservation and display require.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
    pub stock: u32,
}

/// Inventory store operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// The product id does not exist. Fatal for the affected cart line only:
    /// the line is dropped, not retried.
    #[error("product not found")]
    ProductNotFound,

    /// The store could not be reached or is in a broken state (e.g. poisoned
    /// lock). Fatal for the whole checkout.
    #[error("inventory store unavailable: {0}")]
    Unavailable(String),
}

/// Authoritative stock ledger.
///
/// ## Reservation semantics
///
/// `try_reserve` atomically reads current stock, computes
/// `fulfilled = min(requested, stock)`, decrements by `fulfilled`, and
/// returns it. `fulfilled` may be `0` (out of stock) or less than
/// `requested` (partial fulfillment) — both are normal outcomes communicated
/// to the caller for display/clamping, never errors.
///
/// ## Implementation requirements
///
/// - **Per-product mutual exclusion**: concurrent `try_reserve` calls against
///   the same product serialize; the sum of `fulfilled` across concurrent
///   callers never exceeds the stock available at the start of the
///   contention window.
/// - **Independence**: calls against different product ids must not block
///   each other.
/// - **No negative stock**: ever.
pub trait InventoryStore: Send + Sync {
    /// Atomically reserve up to `requested` units, returning how many were
    /// actually secured. A `0` return is a no-op on stock, not a failed
    /// partial decrement.
    fn try_reserve(&self, product_id: ProductId, requested: u32) -> Result<u32, InventoryError>;

    /// Current price snapshot in smallest currency unit.
    fn current_price(&self, product_id: ProductId) -> Result<u64, InventoryError>;

    /// Return previously reserved units to stock (compensation/restock).
    fn release(&self, product_id: ProductId, quantity: u32) -> Result<(), InventoryError>;

    /// Read-only stock level for display/administration.
    fn stock_on_hand(&self, product_id: ProductId) -> Result<u32, InventoryError>;
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn try_reserve(&self, product_id: ProductId, requested: u32) -> Result<u32, InventoryError> {
        (**self).try_reserve(product_id, requested)
    }

    fn current_price(&self, product_id: ProductId) -> Result<u64, InventoryError> {
        (**self).current_price(product_id)
    }

    fn release(&self, product_id: ProductId, quantity: u32) -> Result<(), InventoryError> {
        (**self).release(product_id, quantity)
    }

    fn stock_on_hand(&self, product_id: ProductId) -> Result<u32, InventoryError> {
        (**self).stock_on_hand(product_id)
    }
}
