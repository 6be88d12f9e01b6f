//! Log-only notifier.
//!
//! Used when outbound email is not configured. Every notification still
//! leaves a structured trace so operations can reconstruct what was sent.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::booking::BookingRef;
use crate::domain::payment::Payment;
use crate::ports::PaymentNotifier;

#[derive(Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentNotifier for TracingNotifier {
    async fn notify_payment_success(&self, payment: &Payment, booking: &BookingRef) {
        tracing::info!(
            order_id = %payment.order_id,
            booking = %booking,
            amount = %payment.amount,
            "Payment confirmed (email disabled)"
        );
    }

    async fn notify_refund(&self, refund: &Payment, booking: &BookingRef, amount: Decimal) {
        tracing::info!(
            refund_id = %refund.order_id,
            booking = %booking,
            %amount,
            "Refund processed (email disabled)"
        );
    }
}
