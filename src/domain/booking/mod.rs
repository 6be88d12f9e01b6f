//! Booking monetary rollup owned by the payment core.

mod aggregate;
mod status;

pub use aggregate::{Booking, BookingKind, BookingRef};
pub use status::BookingPaymentStatus;
