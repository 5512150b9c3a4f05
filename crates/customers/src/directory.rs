//! Customer record and directory contract.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cartwright_core::{CustomerId, OrderId, ProductId};

/// A customer as the checkout engine sees them.
///
/// Credentials and the admin flag belong to the authentication collaborator;
/// only identity and purchase history matter here. `purchased_product_ids`
/// is set-like (no duplicates) and gates reviews downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub username: String,
    pub name: String,
    pub order_ids: Vec<OrderId>,
    pub purchased_product_ids: Vec<ProductId>,
}

impl Customer {
    pub fn new(id: CustomerId, username: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            name: name.into(),
            order_ids: Vec::new(),
            purchased_product_ids: Vec::new(),
        }
    }
}

/// Customer directory operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("customer not found")]
    CustomerNotFound,

    /// The directory could not be reached or is in a broken state.
    #[error("customer directory unavailable: {0}")]
    Unavailable(String),
}

/// Customer directory: lookup plus targeted append operations.
pub trait CustomerDirectory: Send + Sync {
    /// Fetch a customer record.
    fn customer(&self, customer_id: CustomerId) -> Result<Customer, DirectoryError>;

    /// Append an order id to the customer's order history (append-only).
    fn append_order_id(
        &self,
        customer_id: CustomerId,
        order_id: OrderId,
    ) -> Result<(), DirectoryError>;

    /// Append a product id to the customer's purchased set.
    ///
    /// Idempotent: appending an id already present is a no-op, never a
    /// duplicate.
    fn append_purchased_id(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> Result<(), DirectoryError>;
}

impl<D> CustomerDirectory for Arc<D>
where
    D: CustomerDirectory + ?Sized,
{
    fn customer(&self, customer_id: CustomerId) -> Result<Customer, DirectoryError> {
        (**self).customer(customer_id)
    }

    fn append_order_id(
        &self,
        customer_id: CustomerId,
        order_id: OrderId,
    ) -> Result<(), DirectoryError> {
        (**self).append_order_id(customer_id, order_id)
    }

    fn append_purchased_id(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> Result<(), DirectoryError> {
        (**self).append_purchased_id(customer_id, product_id)
    }
}

/// In-memory customer directory.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryCustomerDirectory {
    customers: RwLock<HashMap<CustomerId, Customer>>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a customer (seeding/administration).
    pub fn insert(&self, customer: Customer) -> Result<(), DirectoryError> {
        let mut customers = self
            .customers
            .write()
            .map_err(|_| DirectoryError::Unavailable("customer map lock poisoned".to_string()))?;
        customers.insert(customer.id, customer);
        Ok(())
    }

    fn with_customer<T>(
        &self,
        customer_id: CustomerId,
        f: impl FnOnce(&mut Customer) -> T,
    ) -> Result<T, DirectoryError> {
        let mut customers = self
            .customers
            .write()
            .map_err(|_| DirectoryError::Unavailable("customer map lock poisoned".to_string()))?;
        let customer = customers
            .get_mut(&customer_id)
            .ok_or(DirectoryError::CustomerNotFound)?;
        Ok(f(customer))
    }
}

impl CustomerDirectory for InMemoryCustomerDirectory {
    fn customer(&self, customer_id: CustomerId) -> Result<Customer, DirectoryError> {
        let customers = self
            .customers
            .read()
            .map_err(|_| DirectoryError::Unavailable("customer map lock poisoned".to_string()))?;
        customers
            .get(&customer_id)
            .cloned()
            .ok_or(DirectoryError::CustomerNotFound)
    }

    fn append_order_id(
        &self,
        customer_id: CustomerId,
        order_id: OrderId,
    ) -> Result<(), DirectoryError> {
        self.with_customer(customer_id, |customer| {
            customer.order_ids.push(order_id);
        })
    }

    fn append_purchased_id(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> Result<(), DirectoryError> {
        self.with_customer(customer_id, |customer| {
            if !customer.purchased_product_ids.contains(&product_id) {
                customer.purchased_product_ids.push(product_id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (InMemoryCustomerDirectory, CustomerId) {
        let directory = InMemoryCustomerDirectory::new();
        let id = CustomerId::new();
        directory
            .insert(Customer::new(id, "mlondon", "Matt London"))
            .unwrap();
        (directory, id)
    }

    #[test]
    fn lookup_returns_the_record() {
        let (directory, id) = seeded();
        let customer = directory.customer(id).unwrap();
        assert_eq!(customer.username, "mlondon");
        assert!(customer.order_ids.is_empty());
    }

    #[test]
    fn unknown_customer_is_reported() {
        let (directory, _) = seeded();
        let err = directory.customer(CustomerId::new()).unwrap_err();
        assert_eq!(err, DirectoryError::CustomerNotFound);
    }

    #[test]
    fn order_ids_append_in_sequence() {
        let (directory, id) = seeded();
        let first = OrderId::new();
        let second = OrderId::new();
        directory.append_order_id(id, first).unwrap();
        directory.append_order_id(id, second).unwrap();
        assert_eq!(directory.customer(id).unwrap().order_ids, vec![first, second]);
    }

    #[test]
    fn purchased_ids_are_idempotent() {
        let (directory, id) = seeded();
        let product = ProductId::new();
        directory.append_purchased_id(id, product).unwrap();
        directory.append_purchased_id(id, product).unwrap();
        assert_eq!(
            directory.customer(id).unwrap().purchased_product_ids,
            vec![product]
        );
    }

    #[test]
    fn appends_against_unknown_customers_fail() {
        let (directory, _) = seeded();
        let err = directory
            .append_order_id(CustomerId::new(), OrderId::new())
            .unwrap_err();
        assert_eq!(err, DirectoryError::CustomerNotFound);
    }
}
