//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `booking` - Booking monetary rollup aggregate owned by the payment core
//! - `payment` - Payment ledger entries, state machine, and signatures

pub mod booking;
pub mod foundation;
pub mod payment;
