//! Shopping cart: a per-customer working set of desired purchase lines.
//!
//! The cart is a pure local data structure — no network or inventory
//! awareness lives here. Upper-bound enforcement against stock is the
//! resolver's job at checkout.

pub mod cart;
pub mod store;

pub use cart::{Cart, CartLine};
pub use store::{CartStore, CartStoreError, InMemoryCartStore};
