//! Cart store: how checkout reaches a customer's cart.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

use cartwright_core::{CustomerId, ProductId};

use crate::cart::Cart;

/// Cart store operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartStoreError {
    /// The store could not be reached or is in a broken state.
    #[error("cart store unavailable: {0}")]
    Unavailable(String),
}

/// Per-customer cart storage (1:1, optional — a customer without a cart has
/// simply never added anything).
pub trait CartStore: Send + Sync {
    /// The customer's current cart, if one exists.
    fn cart(&self, customer_id: CustomerId) -> Result<Option<Cart>, CartStoreError>;

    /// Store (create or replace) a customer's cart.
    fn put(&self, cart: Cart) -> Result<(), CartStoreError>;

    /// Empty the customer's cart. A missing cart is already empty.
    fn clear(&self, customer_id: CustomerId) -> Result<(), CartStoreError>;
}

impl<S> CartStore for Arc<S>
where
    S: CartStore + ?Sized,
{
    fn cart(&self, customer_id: CustomerId) -> Result<Option<Cart>, CartStoreError> {
        (**self).cart(customer_id)
    }

    fn put(&self, cart: Cart) -> Result<(), CartStoreError> {
        (**self).put(cart)
    }

    fn clear(&self, customer_id: CustomerId) -> Result<(), CartStoreError> {
        (**self).clear(customer_id)
    }
}

/// In-memory cart store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    carts: RwLock<HashMap<CustomerId, Cart>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add units of a product to a customer's cart, creating the cart lazily
    /// on first add.
    pub fn add_to_cart(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CartStoreError> {
        let mut carts = self
            .carts
            .write()
            .map_err(|_| CartStoreError::Unavailable("cart map lock poisoned".to_string()))?;
        carts
            .entry(customer_id)
            .or_insert_with(|| Cart::new(customer_id))
            .add_line(product_id, quantity);
        Ok(())
    }
}

impl CartStore for InMemoryCartStore {
    fn cart(&self, customer_id: CustomerId) -> Result<Option<Cart>, CartStoreError> {
        let carts = self
            .carts
            .read()
            .map_err(|_| CartStoreError::Unavailable("cart map lock poisoned".to_string()))?;
        Ok(carts.get(&customer_id).cloned())
    }

    fn put(&self, cart: Cart) -> Result<(), CartStoreError> {
        let mut carts = self
            .carts
            .write()
            .map_err(|_| CartStoreError::Unavailable("cart map lock poisoned".to_string()))?;
        carts.insert(cart.customer_id(), cart);
        Ok(())
    }

    fn clear(&self, customer_id: CustomerId) -> Result<(), CartStoreError> {
        let mut carts = self
            .carts
            .write()
            .map_err(|_| CartStoreError::Unavailable("cart map lock poisoned".to_string()))?;
        if let Some(cart) = carts.get_mut(&customer_id) {
            cart.clear();
        }
        Ok(())
    }
}
