//! Checkout orchestration.
//!
//! One engine instance serves all customers; `checkout` itself carries no
//! shared mutable state, so concurrent checkouts by different customers
//! proceed fully in parallel except where they contend on the same product's
//! inventory counter.
//!
//! ## Phases
//!
//! ```text
//! Idle ──► Resolving ──► Committing ──► Finalizing ──► Done
//!   │
//!   └──► Done(EmptyCart)   (short-circuit, no collaborator calls)
//! ```
//!
//! 1. **Idle**: load the cart; missing or empty ends the checkout with an
//!    `EmptyCart` outcome before any other collaborator is touched. The
//!    customer is then verified to exist, so `CustomerNotFound` never needs
//!    compensation.
//! 2. **Resolving**: run the [`ReservationResolver`] against the snapshot.
//! 3. **Committing**: commit resolved lines to the ledger; with nothing
//!    resolved, skip straight to Finalizing with a `NothingFulfilled`
//!    outcome.
//! 4. **Finalizing**: append the order id to the customer's order list and
//!    each resolved product id to the purchased set (idempotent), then clear
//!    the cart — last, so an aborted checkout never loses it.
//!
//! ## Failure contract
//!
//! A collaborator failure after reservation compensates before aborting:
//! reserved units are released, and a committed order is deleted again. The
//! one residue that cannot be unwound through the collaborator contracts is
//! a history append that succeeded before the directory went down (the
//! order-id list is append-only); that case is logged at `error`. Rejected
//! and partial lines are always carried into the outcome — `Done` never
//! silently drops them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use cartwright_cart::CartStore;
use cartwright_core::CustomerId;
use cartwright_customers::CustomerDirectory;
use cartwright_inventory::InventoryStore;
use cartwright_orders::{Order, OrderLedger, ResolvedLine};

use crate::error::CheckoutError;
use crate::resolver::{PartialFulfillment, RejectedLine, ReservationResolver, Resolution};

/// How a checkout ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    /// An order was committed (possibly with rejected or partial lines).
    Completed,
    /// The cart was non-empty but nothing could be fulfilled. No order.
    NothingFulfilled,
    /// The customer had no cart, or an empty one. Nothing to do.
    EmptyCart,
}

/// The full report of a checkout: what was committed, what was clamped, and
/// what was rejected. Rendered distinctly by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutOutcome {
    pub status: CheckoutStatus,
    pub order: Option<Order>,
    pub resolved_lines: Vec<ResolvedLine>,
    pub rejected_lines: Vec<RejectedLine>,
    pub partial_fulfillments: Vec<PartialFulfillment>,
}

impl CheckoutOutcome {
    fn empty_cart() -> Self {
        Self {
            status: CheckoutStatus::EmptyCart,
            order: None,
            resolved_lines: Vec::new(),
            rejected_lines: Vec::new(),
            partial_fulfillments: Vec::new(),
        }
    }

    fn nothing_fulfilled(resolution: Resolution) -> Self {
        Self {
            status: CheckoutStatus::NothingFulfilled,
            order: None,
            resolved_lines: Vec::new(),
            rejected_lines: resolution.rejected,
            partial_fulfillments: resolution.partials,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutConfig {
    /// Upper bound on the Resolving phase, checked between inventory calls.
    pub resolve_budget: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            resolve_budget: Duration::from_secs(5),
        }
    }
}

/// Sequences resolver → ledger → customer history → cart clear over the four
/// collaborator traits.
///
/// Generic over the collaborators so tests can inject in-memory or failing
/// doubles and production can wire durable backends, without changing the
/// orchestration itself.
#[derive(Debug)]
pub struct CheckoutEngine<I, L, D, S> {
    inventory: I,
    ledger: L,
    directory: D,
    carts: S,
    config: CheckoutConfig,
}

impl<I, L, D, S> CheckoutEngine<I, L, D, S> {
    pub fn new(inventory: I, ledger: L, directory: D, carts: S) -> Self {
        Self::with_config(inventory, ledger, directory, carts, CheckoutConfig::default())
    }

    pub fn with_config(
        inventory: I,
        ledger: L,
        directory: D,
        carts: S,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            inventory,
            ledger,
            directory,
            carts,
            config,
        }
    }
}

impl<I, L, D, S> CheckoutEngine<I, L, D, S>
where
    I: InventoryStore,
    L: OrderLedger,
    D: CustomerDirectory,
    S: CartStore,
{
    /// Convert the customer's cart into a committed order, best-effort per
    /// line. The single operation exposed to the UI layer.
    pub fn checkout(&self, customer_id: CustomerId) -> Result<CheckoutOutcome, CheckoutError> {
        // Idle: nothing to do without a cart, and nothing else is touched.
        let Some(cart) = self.carts.cart(customer_id)? else {
            tracing::debug!(%customer_id, "checkout with no cart");
            return Ok(CheckoutOutcome::empty_cart());
        };
        if cart.is_empty() {
            tracing::debug!(%customer_id, "checkout with an empty cart");
            return Ok(CheckoutOutcome::empty_cart());
        }
        self.directory.customer(customer_id)?;

        // Resolving.
        tracing::debug!(%customer_id, lines = cart.len(), "resolving cart");
        let resolver = ReservationResolver::new(&self.inventory, self.config.resolve_budget);
        let resolution = resolver.resolve(&cart.snapshot())?;

        // Committing.
        if resolution.lines.is_empty() {
            tracing::info!(
                %customer_id,
                rejected = resolution.rejected.len(),
                "checkout fulfilled nothing"
            );
            self.carts.clear(customer_id)?;
            return Ok(CheckoutOutcome::nothing_fulfilled(resolution));
        }

        let order = match self.ledger.commit(customer_id, resolution.lines.clone()) {
            Ok(order) => order,
            Err(err) => {
                tracing::warn!(%customer_id, %err, "order commit failed, releasing stock");
                self.release_lines(&resolution.lines);
                return Err(err.into());
            }
        };

        // Finalizing: history first, cart clear last.
        if let Err(err) = self.record_history(customer_id, &order) {
            self.compensate_commit(&order, &resolution.lines);
            return Err(err);
        }
        if let Err(err) = self.carts.clear(customer_id) {
            tracing::warn!(%customer_id, %err, "cart clear failed, rolling back order");
            self.compensate_commit(&order, &resolution.lines);
            return Err(err.into());
        }

        tracing::info!(
            %customer_id,
            order_id = %order.id,
            resolved = order.lines.len(),
            rejected = resolution.rejected.len(),
            partial = resolution.partials.len(),
            total_price = order.total_price,
            "checkout committed"
        );

        Ok(CheckoutOutcome {
            status: CheckoutStatus::Completed,
            order: Some(order),
            resolved_lines: resolution.lines,
            rejected_lines: resolution.rejected,
            partial_fulfillments: resolution.partials,
        })
    }

    fn record_history(&self, customer_id: CustomerId, order: &Order) -> Result<(), CheckoutError> {
        self.directory.append_order_id(customer_id, order.id)?;
        for line in &order.lines {
            self.directory
                .append_purchased_id(customer_id, line.product_id)?;
        }
        Ok(())
    }

    /// Undo a committed order after a downstream failure: delete it from the
    /// ledger and return the reserved units to stock. Appends that already
    /// reached the directory cannot be unwound (append-only contract) and are
    /// logged instead.
    fn compensate_commit(&self, order: &Order, lines: &[ResolvedLine]) {
        if let Err(err) = self.ledger.delete(order.id) {
            tracing::error!(order_id = %order.id, %err, "failed to roll back committed order");
        }
        self.release_lines(lines);
    }

    fn release_lines(&self, lines: &[ResolvedLine]) {
        for line in lines {
            if let Err(err) = self
                .inventory
                .release(line.product_id, line.fulfilled_quantity)
            {
                tracing::error!(
                    product_id = %line.product_id,
                    quantity = line.fulfilled_quantity,
                    %err,
                    "failed to release reserved units during rollback"
                );
            }
        }
    }
}
