//! Cart value type.

use serde::{Deserialize, Serialize};

use cartwright_core::{CustomerId, ProductId};

/// One desired purchase: product and requested quantity (always positive
/// while the line exists — a quantity reduced to zero removes the line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Per-customer mutable cart.
///
/// Lines are kept in insertion order: resolution at checkout walks the
/// snapshot in this order, so first-listed lines get first claim on stock.
/// Owned exclusively by one customer; no cross-thread synchronization lives
/// here (that is the cart store's concern).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    customer_id: CustomerId,
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart for a customer.
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            lines: Vec::new(),
        }
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    /// Add `quantity` units of a product, merging with an existing line by
    /// summing. Zero quantity is a no-op. No upper bound is enforced here.
    pub fn add_line(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(CartLine {
                product_id,
                quantity,
            });
        }
    }

    /// Replace a line's quantity. Zero removes the line; setting a quantity
    /// for an absent product inserts a new line at the end.
    pub fn set_line_quantity(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove_line(product_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity;
        } else {
            self.lines.push(CartLine {
                product_id,
                quantity,
            });
        }
    }

    pub fn remove_line(&mut self, product_id: ProductId) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    /// Stable, insertion-ordered snapshot of the cart's lines.
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.clone()
    }

    pub fn quantity_of(&self, product_id: ProductId) -> Option<u32> {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map(|l| l.quantity)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}
