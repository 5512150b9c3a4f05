//! Checkout error taxonomy.
//!
//! Per-line conditions (`ProductNotFound`, `OutOfStock`, partial
//! fulfillment) are collected into the outcome report, never raised as
//! errors — see [`crate::resolver`]. Only two conditions abort a checkout:
//! a missing customer, and an unreachable collaborator.

use thiserror::Error;

use cartwright_cart::CartStoreError;
use cartwright_customers::DirectoryError;
use cartwright_orders::LedgerError;

/// Fatal checkout failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// The customer id is unknown to the directory. Detected before any
    /// state is mutated.
    #[error("customer not found")]
    CustomerNotFound,

    /// A collaborator (inventory store, order ledger, customer directory,
    /// cart store) could not be reached. The whole checkout aborts; reserved
    /// stock is released and the cart is left unmodified.
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),
}

impl From<CartStoreError> for CheckoutError {
    fn from(value: CartStoreError) -> Self {
        match value {
            CartStoreError::Unavailable(msg) => CheckoutError::CollaboratorUnavailable(msg),
        }
    }
}

impl From<DirectoryError> for CheckoutError {
    fn from(value: DirectoryError) -> Self {
        match value {
            DirectoryError::CustomerNotFound => CheckoutError::CustomerNotFound,
            DirectoryError::Unavailable(msg) => CheckoutError::CollaboratorUnavailable(msg),
        }
    }
}

impl From<LedgerError> for CheckoutError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::Unavailable(msg) => CheckoutError::CollaboratorUnavailable(msg),
            // A ledger that rejects a fresh commit is as unusable as an
            // unreachable one from checkout's point of view.
            other => CheckoutError::CollaboratorUnavailable(other.to_string()),
        }
    }
}
