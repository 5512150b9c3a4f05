//! Order records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cartwright_core::{CustomerId, OrderId, ProductId};

/// What was actually fulfilled for one cart line at checkout time.
///
/// A snapshot: price and quantity are frozen at resolution time, immune to
/// later price or stock changes. References the product by id only — no live
/// pointer into the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLine {
    pub product_id: ProductId,
    pub fulfilled_quantity: u32,
    /// Price in smallest currency unit (e.g., cents), as of checkout.
    pub unit_price: u64,
}

impl ResolvedLine {
    /// Line subtotal in smallest currency unit.
    pub fn subtotal(&self) -> u64 {
        u64::from(self.fulfilled_quantity) * self.unit_price
    }
}

/// The immutable, committed record of a checkout outcome.
///
/// Created atomically by the ledger at commit time; never mutated afterwards
/// except the `complete` flag (and administrative corrections through
/// `OrderLedger::update`), never deleted except by explicit administrative
/// action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub lines: Vec<ResolvedLine>,
    /// Sum of line subtotals in smallest currency unit.
    pub total_price: u64,
    pub created_at: DateTime<Utc>,
    /// Set only by a separate fulfillment workflow, not by checkout.
    pub complete: bool,
}

impl Order {
    /// Total of a set of resolved lines.
    pub fn total_of(lines: &[ResolvedLine]) -> u64 {
        lines.iter().map(ResolvedLine::subtotal).sum()
    }
}
