//! PostgreSQL persistence adapters.

mod booking_store;
mod payment_store;

pub use booking_store::PostgresBookingStore;
pub use payment_store::PostgresPaymentStore;
