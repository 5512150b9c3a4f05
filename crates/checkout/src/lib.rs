//! Checkout: reservation resolution and orchestration.
//!
//! This crate is the engine's entry point. The resolver walks a cart
//! snapshot and converts requested quantities into atomic per-product
//! reservations; the orchestrator sequences resolver → ledger → customer
//! history → cart clear and owns the failure/rollback contract.

pub mod error;
pub mod orchestrator;
pub mod resolver;

pub use error::CheckoutError;
pub use orchestrator::{CheckoutConfig, CheckoutEngine, CheckoutOutcome, CheckoutStatus};
pub use resolver::{
    PartialFulfillment, RejectReason, RejectedLine, ReservationResolver, Resolution,
};
