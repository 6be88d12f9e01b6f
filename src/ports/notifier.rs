//! Payment notification port.
//!
//! Notifications are fire-and-forget side effects. Handlers spawn them
//! after the transaction commits; a notification failure never rolls back
//! or fails a payment operation.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::booking::BookingRef;
use crate::domain::payment::Payment;

/// Port for outbound payment notifications.
#[async_trait]
pub trait PaymentNotifier: Send + Sync {
    /// A payment was verified and credited to a booking.
    async fn notify_payment_success(&self, payment: &Payment, booking: &BookingRef);

    /// A refund was processed against a payment.
    async fn notify_refund(&self, refund: &Payment, booking: &BookingRef, amount: Decimal);
}
