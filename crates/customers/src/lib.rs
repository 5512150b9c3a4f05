//! Customer directory collaborator.
//!
//! Checkout only needs targeted operations against the customer record:
//! append an order id, append a purchased product id (idempotently). The
//! directory owns the record; nothing here requires round-tripping the whole
//! customer through the caller.

pub mod directory;

pub use directory::{Customer, CustomerDirectory, DirectoryError, InMemoryCustomerDirectory};
