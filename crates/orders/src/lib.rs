//! Orders: immutable checkout records and the append-only order ledger.

pub mod ledger;
pub mod order;

pub use ledger::{InMemoryOrderLedger, LedgerError, OrderLedger};
pub use order::{Order, ResolvedLine};
