//! Inventory store: the authoritative stock ledger.
//!
//! Exposes atomic per-product read/reserve/release operations. The reserve
//! contract is the heart of checkout correctness: two concurrent reservations
//! against the same product must never together decrement below zero or
//! double-spend the same units.

pub mod in_memory;
pub mod store;

pub use in_memory::InMemoryInventory;
pub use store::{InventoryError, InventoryStore, ProductRecord};
