//! Reservation resolver: the core checkout algorithm.
//!
//! Given a cart snapshot and a handle to the inventory store, the resolver
//! walks the lines **in snapshot order** (first-listed lines get first claim
//! on stock) and, per line:
//!
//! 1. Looks up the product's current price.
//! 2. Calls `try_reserve(product_id, requested)`.
//! 3. Unknown product → rejection (`ProductNotFound`), continue.
//! 4. `fulfilled == 0` → rejection (`OutOfStock`), stock untouched, continue.
//! 5. `0 < fulfilled < requested` → resolved line plus a non-fatal
//!    partial-fulfillment notice.
//! 6. `fulfilled == requested` → full resolved line.
//!
//! Reservation happens inline per line, not as a multi-product transaction:
//! inventory is modeled as independently lockable per-product counters, so
//! checkout is **best-effort per line**, never atomic across the cart. Two
//! carts sharing overlapping products in different orders cannot deadlock,
//! and a customer can receive a partially fulfilled order if stock ran out
//! mid-checkout.
//!
//! No line failure aborts the resolution; an empty `lines` result from a
//! non-empty snapshot is a valid, reportable outcome. The only fatal
//! condition is an unreachable store, after which every unit reserved so far
//! is released again.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use cartwright_cart::CartLine;
use cartwright_core::ProductId;
use cartwright_inventory::{InventoryError, InventoryStore};
use cartwright_orders::ResolvedLine;

use crate::error::CheckoutError;

/// Why a cart line produced no resolved line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    ProductNotFound,
    OutOfStock,
}

/// A cart line that could not be fulfilled at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedLine {
    pub product_id: ProductId,
    pub reason: RejectReason,
}

/// Informational notice: fewer units were secured than requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialFulfillment {
    pub product_id: ProductId,
    pub requested: u32,
    pub fulfilled: u32,
}

/// Everything a resolution pass produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub lines: Vec<ResolvedLine>,
    pub rejected: Vec<RejectedLine>,
    pub partials: Vec<PartialFulfillment>,
    /// Sum of `fulfilled × unit_price` across resolved lines.
    pub total_price: u64,
}

/// Resolves a cart snapshot against the inventory store.
///
/// Carries a time budget for the whole pass: the deadline is checked between
/// collaborator calls, so a degraded store cannot hang a checkout
/// indefinitely. Budget exhaustion is treated like an unreachable store —
/// reserved units are released and the checkout aborts.
#[derive(Debug)]
pub struct ReservationResolver<'a, I> {
    inventory: &'a I,
    budget: Duration,
}

impl<'a, I> ReservationResolver<'a, I>
where
    I: InventoryStore,
{
    pub fn new(inventory: &'a I, budget: Duration) -> Self {
        Self { inventory, budget }
    }

    /// Resolve the snapshot, mutating inventory as lines are reserved.
    pub fn resolve(&self, snapshot: &[CartLine]) -> Result<Resolution, CheckoutError> {
        let started = Instant::now();
        let mut resolution = Resolution::default();

        for line in snapshot {
            if started.elapsed() > self.budget {
                self.release_all(&resolution.lines);
                return Err(CheckoutError::CollaboratorUnavailable(
                    "inventory store exceeded the resolve budget".to_string(),
                ));
            }

            let unit_price = match self.inventory.current_price(line.product_id) {
                Ok(price) => price,
                Err(InventoryError::ProductNotFound) => {
                    resolution.rejected.push(RejectedLine {
                        product_id: line.product_id,
                        reason: RejectReason::ProductNotFound,
                    });
                    continue;
                }
                Err(InventoryError::Unavailable(msg)) => {
                    self.release_all(&resolution.lines);
                    return Err(CheckoutError::CollaboratorUnavailable(msg));
                }
            };

            let fulfilled = match self.inventory.try_reserve(line.product_id, line.quantity) {
                Ok(fulfilled) => fulfilled,
                Err(InventoryError::ProductNotFound) => {
                    resolution.rejected.push(RejectedLine {
                        product_id: line.product_id,
                        reason: RejectReason::ProductNotFound,
                    });
                    continue;
                }
                Err(InventoryError::Unavailable(msg)) => {
                    self.release_all(&resolution.lines);
                    return Err(CheckoutError::CollaboratorUnavailable(msg));
                }
            };

            if fulfilled == 0 {
                resolution.rejected.push(RejectedLine {
                    product_id: line.product_id,
                    reason: RejectReason::OutOfStock,
                });
                continue;
            }

            if fulfilled < line.quantity {
                tracing::debug!(
                    product_id = %line.product_id,
                    requested = line.quantity,
                    fulfilled,
                    "partial fulfillment"
                );
                resolution.partials.push(PartialFulfillment {
                    product_id: line.product_id,
                    requested: line.quantity,
                    fulfilled,
                });
            }

            resolution.total_price += u64::from(fulfilled) * unit_price;
            resolution.lines.push(ResolvedLine {
                product_id: line.product_id,
                fulfilled_quantity: fulfilled,
                unit_price,
            });
        }

        Ok(resolution)
    }

    /// Best-effort compensation: return every reserved unit to stock.
    fn release_all(&self, lines: &[ResolvedLine]) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use cartwright_inventory::{InMemoryInventory, ProductRecord};
    use std::sync::atomic::{AtomicU32, Ordering};

    const BUDGET: Duration = Duration::from_secs(5);

    fn store_with(products: &[(ProductId, u64, u32)]) -> InMemoryInventory {
        let store = InMemoryInventory::new();
        for (id, price, stock) in products {
            store
                .upsert_product(ProductRecord {
                    id: *id,
                    name: "product".to_string(),
                    price: *price,
                    stock: *stock,
                })
                .unwrap();
        }
        store
    }

    fn line(product_id: ProductId, quantity: u32) -> CartLine {
        CartLine {
            product_id,
            quantity,
        }
    }

    #[test]
    fn fully_stocked_cart_resolves_every_line() {
        let a = ProductId::new();
        let b = ProductId::new();
        let store = store_with(&[(a, 200, 10), (b, 100, 10)]);

        let resolution = ReservationResolver::new(&store, BUDGET)
            .resolve(&[line(a, 3), line(b, 5)])
            .unwrap();

        assert_eq!(resolution.lines.len(), 2);
        assert!(resolution.rejected.is_empty());
        assert!(resolution.partials.is_empty());
        assert_eq!(resolution.total_price, 3 * 200 + 5 * 100);
        assert_eq!(store.stock_on_hand(a).unwrap(), 7);
        assert_eq!(store.stock_on_hand(b).unwrap(), 5);
    }

    #[test]
    fn oversubscribed_line_clamps_to_stock() {
        let a = ProductId::new();
        let b = ProductId::new();
        // Cart {a: 3, b: 5}; stock a=10 @200, b=2 @100.
        let store = store_with(&[(a, 200, 10), (b, 100, 2)]);

        let resolution = ReservationResolver::new(&store, BUDGET)
            .resolve(&[line(a, 3), line(b, 5)])
            .unwrap();

        assert_eq!(
            resolution.lines,
            vec![
                ResolvedLine {
                    product_id: a,
                    fulfilled_quantity: 3,
                    unit_price: 200,
                },
                ResolvedLine {
                    product_id: b,
                    fulfilled_quantity: 2,
                    unit_price: 100,
                },
            ]
        );
        assert_eq!(
            resolution.partials,
            vec![PartialFulfillment {
                product_id: b,
                requested: 5,
                fulfilled: 2,
            }]
        );
        assert!(resolution.rejected.is_empty());
        assert_eq!(resolution.total_price, 3 * 200 + 2 * 100);
        assert_eq!(store.stock_on_hand(a).unwrap(), 7);
        assert_eq!(store.stock_on_hand(b).unwrap(), 0);
    }

    #[test]
    fn out_of_stock_line_is_rejected_without_touching_stock() {
        let a = ProductId::new();
        let store = store_with(&[(a, 100, 0)]);

        let resolution = ReservationResolver::new(&store, BUDGET)
            .resolve(&[line(a, 4)])
            .unwrap();

        assert!(resolution.lines.is_empty());
        assert_eq!(
            resolution.rejected,
            vec![RejectedLine {
                product_id: a,
                reason: RejectReason::OutOfStock,
            }]
        );
        assert_eq!(store.stock_on_hand(a).unwrap(), 0);
    }

    #[test]
    fn unknown_product_is_rejected_and_the_rest_resolves() {
        let known = ProductId::new();
        let unknown = ProductId::new();
        let store = store_with(&[(known, 150, 5)]);

        let resolution = ReservationResolver::new(&store, BUDGET)
            .resolve(&[line(unknown, 1), line(known, 2)])
            .unwrap();

        assert_eq!(resolution.lines.len(), 1);
        assert_eq!(resolution.lines[0].product_id, known);
        assert_eq!(
            resolution.rejected,
            vec![RejectedLine {
                product_id: unknown,
                reason: RejectReason::ProductNotFound,
            }]
        );
        assert_eq!(resolution.total_price, 300);
    }

    #[test]
    fn nothing_fulfillable_is_a_valid_outcome() {
        let a = ProductId::new();
        let b = ProductId::new();
        let store = store_with(&[(a, 100, 0), (b, 100, 0)]);

        let resolution = ReservationResolver::new(&store, BUDGET)
            .resolve(&[line(a, 1), line(b, 1)])
            .unwrap();

        assert!(resolution.lines.is_empty());
        assert_eq!(resolution.rejected.len(), 2);
        assert_eq!(resolution.total_price, 0);
    }

    #[test]
    fn earlier_lines_get_first_claim_on_shared_stock() {
        let a = ProductId::new();
        let store = store_with(&[(a, 100, 4)]);

        // Same product twice would be merged by the cart; model contention via
        // two carts resolving back to back instead.
        let resolver = ReservationResolver::new(&store, BUDGET);
        let first = resolver.resolve(&[line(a, 3)]).unwrap();
        let second = resolver.resolve(&[line(a, 3)]).unwrap();

        assert_eq!(first.lines[0].fulfilled_quantity, 3);
        assert_eq!(second.lines[0].fulfilled_quantity, 1);
        assert_eq!(second.partials.len(), 1);
        assert_eq!(store.stock_on_hand(a).unwrap(), 0);
    }

    /// Store double that turns unavailable after a fixed number of calls.
    struct FlakyInventory {
        inner: InMemoryInventory,
        calls_before_failure: AtomicU32,
    }

    impl FlakyInventory {
        fn new(inner: InMemoryInventory, calls_before_failure: u32) -> Self {
            Self {
                inner,
                calls_before_failure: AtomicU32::new(calls_before_failure),
            }
        }

        fn tick(&self) -> Result<(), InventoryError> {
            let remaining = self.calls_before_failure.load(Ordering::SeqCst);
            if remaining == 0 {
                return Err(InventoryError::Unavailable("store went down".to_string()));
            }
            self.calls_before_failure.store(remaining - 1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl InventoryStore for FlakyInventory {
        fn try_reserve(&self, product_id: ProductId, requested: u32) -> Result<u32, InventoryError> {
            self.tick()?;
            self.inner.try_reserve(product_id, requested)
        }

        fn current_price(&self, product_id: ProductId) -> Result<u64, InventoryError> {
            self.tick()?;
            self.inner.current_price(product_id)
        }

        fn release(&self, product_id: ProductId, quantity: u32) -> Result<(), InventoryError> {
            // Rollback must keep working while the forward path is down.
            self.inner.release(product_id, quantity)
        }

        fn stock_on_hand(&self, product_id: ProductId) -> Result<u32, InventoryError> {
            self.inner.stock_on_hand(product_id)
        }
    }

    #[test]
    fn store_outage_mid_resolve_releases_reserved_units() {
        let a = ProductId::new();
        let b = ProductId::new();
        let inner = store_with(&[(a, 100, 10), (b, 100, 10)]);
        // First line takes 2 calls (price + reserve); fail on the third.
        let store = FlakyInventory::new(inner, 2);

        let err = ReservationResolver::new(&store, BUDGET)
            .resolve(&[line(a, 3), line(b, 3)])
            .unwrap_err();

        assert!(matches!(err, CheckoutError::CollaboratorUnavailable(_)));
        assert_eq!(store.stock_on_hand(a).unwrap(), 10);
        assert_eq!(store.stock_on_hand(b).unwrap(), 10);
    }

    /// Store double that stalls on every price lookup.
    struct SlowInventory {
        inner: InMemoryInventory,
        delay: Duration,
    }

    impl InventoryStore for SlowInventory {
        fn try_reserve(&self, product_id: ProductId, requested: u32) -> Result<u32, InventoryError> {
            self.inner.try_reserve(product_id, requested)
        }

        fn current_price(&self, product_id: ProductId) -> Result<u64, InventoryError> {
            std::thread::sleep(self.delay);
            self.inner.current_price(product_id)
        }

        fn release(&self, product_id: ProductId, quantity: u32) -> Result<(), InventoryError> {
            self.inner.release(product_id, quantity)
        }

        fn stock_on_hand(&self, product_id: ProductId) -> Result<u32, InventoryError> {
            self.inner.stock_on_hand(product_id)
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// For any cart against any stock levels, fulfillment never
            /// exceeds what was requested or what was in stock, the reported
            /// total matches the resolved lines, and stock decreases by
            /// exactly what was fulfilled.
            #[test]
            fn resolution_conserves_units_and_money(
                entries in proptest::collection::vec(
                    (1u32..50, 0u32..50, 1u64..1000),
                    1..10,
                ),
            ) {
                let store = InMemoryInventory::new();
                let snapshot: Vec<CartLine> = entries
                    .iter()
                    .map(|(requested, stock, price)| {
                        let id = ProductId::new();
                        store
                            .upsert_product(ProductRecord {
                                id,
                                name: "product".to_string(),
                                price: *price,
                                stock: *stock,
                            })
                            .unwrap();
                        CartLine {
                            product_id: id,
                            quantity: *requested,
                        }
                    })
                    .collect();

                let resolution = ReservationResolver::new(&store, BUDGET)
                    .resolve(&snapshot)
                    .unwrap();

                let expected_total: u64 = resolution
                    .lines
                    .iter()
                    .map(|l| u64::from(l.fulfilled_quantity) * l.unit_price)
                    .sum();
                prop_assert_eq!(resolution.total_price, expected_total);

                for (line, (requested, stock, _)) in snapshot.iter().zip(&entries) {
                    let fulfilled = resolution
                        .lines
                        .iter()
                        .find(|l| l.product_id == line.product_id)
                        .map(|l| l.fulfilled_quantity)
                        .unwrap_or(0);
                    prop_assert!(fulfilled <= *requested);
                    prop_assert!(fulfilled <= *stock);
                    prop_assert_eq!(
                        store.stock_on_hand(line.product_id).unwrap(),
                        stock - fulfilled
                    );
                }

                // Every input line is accounted for exactly once.
                prop_assert_eq!(
                    resolution.lines.len() + resolution.rejected.len(),
                    snapshot.len()
                );
            }
        }
    }

    #[test]
    fn exhausted_budget_aborts_and_releases() {
        let a = ProductId::new();
        let b = ProductId::new();
        let store = SlowInventory {
            inner: store_with(&[(a, 100, 10), (b, 100, 10)]),
            delay: Duration::from_millis(50),
        };

        let err = ReservationResolver::new(&store, Duration::from_millis(5))
            .resolve(&[line(a, 2), line(b, 2)])
            .unwrap_err();

        assert!(matches!(err, CheckoutError::CollaboratorUnavailable(_)));
        // The first line resolved before the deadline hit; its units must be
        // back in stock.
        assert_eq!(store.stock_on_hand(a).unwrap(), 10);
        assert_eq!(store.stock_on_hand(b).unwrap(), 10);
    }
}
