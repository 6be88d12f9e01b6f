//! Foundation module - Shared domain primitives.
//!
//! Contains the value objects, identifiers, and error types that form the
//! vocabulary of the payment core.

mod ids;
mod timestamp;
mod errors;

pub use ids::{BookingId, PaymentRecordId};
pub use timestamp::Timestamp;
pub use errors::{DomainError, ErrorCode};
