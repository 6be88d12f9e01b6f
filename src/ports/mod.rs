//! Ports (driven-side interfaces).
//!
//! Traits the application layer depends on; adapters implement them.

pub mod booking_store;
pub mod notifier;
pub mod payment_gateway;
pub mod payment_store;

pub use booking_store::BookingStore;
pub use notifier::PaymentNotifier;
pub use payment_gateway::{
    GatewayError, GatewayRefund, PaymentGateway, PaymentOrder, Verification, VerificationData,
};
pub use payment_store::{CompletionOutcome, PaymentStore, RefundOutcome};
