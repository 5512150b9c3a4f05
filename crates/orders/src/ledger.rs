//! Append-only order ledger.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use thiserror::Error;

use cartwright_core::{CustomerId, OrderId};

use crate::order::{Order, ResolvedLine};

/// Order ledger operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("order not found")]
    OrderNotFound,

    /// An `update` attempted to change a frozen field.
    #[error("immutable field: {0}")]
    ImmutableField(String),

    /// The ledger could not be reached or is in a broken state.
    #[error("order ledger unavailable: {0}")]
    Unavailable(String),
}

/// Append-only store of committed orders.
///
/// `commit` assigns identity (UUIDv7, time-ordered and collision-free),
/// stamps `created_at`, computes the total from the lines, and appends. The
/// only mutation path afterwards is `update`, restricted to toggling
/// `complete` or correcting `total_price`/`lines` by an administrative
/// caller; `id`, `customer_id`, and `created_at` are frozen.
///
/// `delete` removes an order and hands it back; removing the order id from
/// the customer's order list is the caller's cascading responsibility.
pub trait OrderLedger: Send + Sync {
    /// Commit resolved lines as a fresh order.
    fn commit(
        &self,
        customer_id: CustomerId,
        lines: Vec<ResolvedLine>,
    ) -> Result<Order, LedgerError>;

    /// Fetch one order.
    fn get(&self, order_id: OrderId) -> Result<Order, LedgerError>;

    /// All orders in commit order.
    fn list(&self) -> Result<Vec<Order>, LedgerError>;

    /// Administrative correction. Frozen fields must match the stored order.
    fn update(&self, order: Order) -> Result<Order, LedgerError>;

    /// Administrative removal; returns the removed order for cascading.
    fn delete(&self, order_id: OrderId) -> Result<Order, LedgerError>;
}

impl<L> OrderLedger for Arc<L>
where
    L: OrderLedger + ?Sized,
{
    fn commit(
        &self,
        customer_id: CustomerId,
        lines: Vec<ResolvedLine>,
    ) -> Result<Order, LedgerError> {
        (**self).commit(customer_id, lines)
    }

    fn get(&self, order_id: OrderId) -> Result<Order, LedgerError> {
        (**self).get(order_id)
    }

    fn list(&self) -> Result<Vec<Order>, LedgerError> {
        (**self).list()
    }

    fn update(&self, order: Order) -> Result<Order, LedgerError> {
        (**self).update(order)
    }

    fn delete(&self, order_id: OrderId) -> Result<Order, LedgerError> {
        (**self).delete(order_id)
    }
}

/// In-memory order ledger.
///
/// Intended for tests/dev. Not optimized for performance. Durable backends
/// implement the same trait and are expected to survive process restarts.
#[derive(Debug, Default)]
pub struct InMemoryOrderLedger {
    orders: RwLock<Vec<Order>>,
}

impl InMemoryOrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_err() -> LedgerError {
        LedgerError::Unavailable("order list lock poisoned".to_string())
    }
}

impl OrderLedger for InMemoryOrderLedger {
    fn commit(
        &self,
        customer_id: CustomerId,
        lines: Vec<ResolvedLine>,
    ) -> Result<Order, LedgerError> {
        let order = Order {
            id: OrderId::new(),
            customer_id,
            total_price: Order::total_of(&lines),
            lines,
            created_at: Utc::now(),
            complete: false,
        };

        let mut orders = self.orders.write().map_err(|_| Self::lock_err())?;
        orders.push(order.clone());
        Ok(order)
    }

    fn get(&self, order_id: OrderId) -> Result<Order, LedgerError> {
        let orders = self.orders.read().map_err(|_| Self::lock_err())?;
        orders
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
            .ok_or(LedgerError::OrderNotFound)
    }

    fn list(&self) -> Result<Vec<Order>, LedgerError> {
        let orders = self.orders.read().map_err(|_| Self::lock_err())?;
        Ok(orders.clone())
    }

    fn update(&self, order: Order) -> Result<Order, LedgerError> {
        let mut orders = self.orders.write().map_err(|_| Self::lock_err())?;
        let stored = orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or(LedgerError::OrderNotFound)?;

        if order.customer_id != stored.customer_id {
            return Err(LedgerError::ImmutableField("customer_id".to_string()));
        }
        if order.created_at != stored.created_at {
            return Err(LedgerError::ImmutableField("created_at".to_string()));
        }

        *stored = order.clone();
        Ok(order)
    }

    fn delete(&self, order_id: OrderId) -> Result<Order, LedgerError> {
        let mut orders = self.orders.write().map_err(|_| Self::lock_err())?;
        let idx = orders
            .iter()
            .position(|o| o.id == order_id)
            .ok_or(LedgerError::OrderNotFound)?;
        Ok(orders.remove(idx))
    }
}
