//! ProcessRefundHandler - Command handler for refunding a completed payment.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::booking::Booking;
use crate::domain::foundation::PaymentRecordId;
use crate::domain::payment::{Payment, PaymentFlowError, PaymentState};
use crate::ports::{BookingStore, PaymentGateway, PaymentNotifier, PaymentStore};

use super::map_gateway_error;

/// Command to refund part or all of a payment.
#[derive(Debug, Clone)]
pub struct ProcessRefundCommand {
    /// Ledger id of the payment being refunded.
    pub payment_id: PaymentRecordId,

    /// Refund amount. Defaults to the full refundable remainder.
    pub amount: Option<Decimal>,

    /// Operator-supplied reason, recorded in the refund row's notes.
    pub reason: Option<String>,
}

/// Result of a processed refund.
#[derive(Debug, Clone)]
pub struct ProcessRefundResult {
    /// The negative ledger row that was appended.
    pub refund: Payment,

    /// Whether the original payment is now fully refunded.
    pub original_refunded: bool,

    /// The booking rollup after the debit.
    pub booking: Booking,
}

/// Handler for processing refunds.
///
/// The refundable remainder is checked twice: once here for a fast
/// rejection, and again inside the store under the row lock, so concurrent
/// refunds can never jointly exceed the original amount.
pub struct ProcessRefundHandler {
    bookings: Arc<dyn BookingStore>,
    store: Arc<dyn PaymentStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn PaymentNotifier>,
}

impl ProcessRefundHandler {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        store: Arc<dyn PaymentStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn PaymentNotifier>,
    ) -> Self {
        Self {
            bookings,
            store,
            gateway,
            notifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessRefundCommand,
    ) -> Result<ProcessRefundResult, PaymentFlowError> {
        // 1. Resolve the payment being refunded
        let payment = self
            .store
            .find_by_id(cmd.payment_id)
            .await?
            .ok_or_else(|| PaymentFlowError::payment_not_found(cmd.payment_id.to_string()))?;

        // 2. Only successful charge rows can be refunded
        if payment.is_refund() {
            return Err(PaymentFlowError::not_refundable(
                "refund entries cannot themselves be refunded",
            ));
        }
        if payment.status != PaymentState::Success {
            return Err(PaymentFlowError::not_refundable(format!(
                "payment is in state {}",
                payment.status
            )));
        }

        // 3. Bound the amount by what remains refundable
        let refunded = self.store.refunded_total(payment.id).await?;
        let remainder = payment.amount - refunded;
        if remainder <= Decimal::ZERO {
            return Err(PaymentFlowError::not_refundable(
                "payment is already fully refunded",
            ));
        }

        let amount = cmd.amount.unwrap_or(remainder);
        if amount <= Decimal::ZERO {
            return Err(PaymentFlowError::AmountNotPositive(amount));
        }
        if amount > remainder {
            return Err(PaymentFlowError::RefundExceedsRemainder {
                requested: amount,
                remainder,
            });
        }

        // 4. Execute the refund with the provider
        let gateway_refund = self
            .gateway
            .refund(&payment, amount)
            .await
            .map_err(map_gateway_error)?;

        // 5. Append the refund row atomically; the store re-checks the
        //    remainder under the lock
        let refund_row = Payment::refund_of(
            &payment,
            &gateway_refund.refund_id,
            amount,
            Some(gateway_refund.raw_response),
            cmd.reason,
        );
        let outcome = match self.store.record_refund(payment.id, &refund_row).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // The provider already moved the money; leave a trail for
                // manual reconciliation of the orphaned refund.
                tracing::error!(
                    provider_refund_id = %gateway_refund.refund_id,
                    order_id = %payment.order_id,
                    %amount,
                    error = %e,
                    "Provider refund succeeded but the ledger append was rejected"
                );
                return Err(e.into());
            }
        };

        tracing::info!(
            refund_id = %outcome.refund.order_id,
            order_id = %payment.order_id,
            booking = %payment.booking_ref,
            %amount,
            fully_refunded = outcome.original_refunded,
            "Refund processed"
        );

        // 6. Notify after commit
        let notifier = self.notifier.clone();
        let notified = outcome.refund.clone();
        tokio::spawn(async move {
            notifier
                .notify_refund(&notified, &notified.booking_ref, amount)
                .await;
        });

        // 7. Return the post-debit rollup alongside the refund row
        let booking = self
            .bookings
            .find(&payment.booking_ref)
            .await?
            .ok_or_else(|| PaymentFlowError::booking_not_found(payment.booking_ref))?;

        Ok(ProcessRefundResult {
            refund: outcome.refund,
            original_refunded: outcome.original_refunded,
            booking,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::gateway::MockGateway;
    use crate::adapters::memory::InMemoryStore;
    use crate::adapters::notify::TracingNotifier;
    use crate::domain::booking::{Booking, BookingKind, BookingPaymentStatus};
    use crate::domain::foundation::BookingId;
    use crate::ports::BookingStore;
    use rust_decimal_macros::dec;

    struct Fixture {
        store: Arc<InMemoryStore>,
        handler: ProcessRefundHandler,
        booking: Booking,
        order_id: String,
        payment_id: PaymentRecordId,
    }

    /// One completed 600.00 payment on a 1000.00 booking.
    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let booking = Booking::new(BookingId::new(), BookingKind::Party, dec!(1000.00));
        store.insert_booking(booking.clone());

        let gateway = Arc::new(MockGateway::new(store.clone(), "INR"));
        let order = gateway.create_order(&booking, dec!(600.00)).await.unwrap();
        store
            .complete_payment(&order.order_id, "MOCK_PAY_1_CCCC3333", serde_json::json!({}))
            .await
            .unwrap();

        let handler = ProcessRefundHandler::new(
            store.clone(),
            store.clone(),
            gateway,
            Arc::new(TracingNotifier::new()),
        );
        Fixture {
            store,
            handler,
            booking,
            order_id: order.order_id,
            payment_id: order.payment_record_id,
        }
    }

    fn refund_cmd(payment_id: PaymentRecordId, amount: Option<Decimal>) -> ProcessRefundCommand {
        ProcessRefundCommand {
            payment_id,
            amount,
            reason: None,
        }
    }

    #[tokio::test]
    async fn full_refund_by_default() {
        let fx = fixture().await;

        let result = fx
            .handler
            .handle(refund_cmd(fx.payment_id, None))
            .await
            .unwrap();

        assert!(result.original_refunded);
        assert_eq!(result.refund.amount, dec!(-600.00));
        assert!(result.refund.is_refund());

        let rollup = fx
            .store
            .find(&fx.booking.booking_ref())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rollup.paid_amount, Decimal::ZERO);
        assert_eq!(rollup.payment_status, BookingPaymentStatus::Refunded);

        let original = fx
            .store
            .find_by_order_id(&fx.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(original.status, PaymentState::Refunded);
    }

    #[tokio::test]
    async fn partial_refund_keeps_original_success() {
        let fx = fixture().await;

        let result = fx
            .handler
            .handle(refund_cmd(fx.payment_id, Some(dec!(200.00))))
            .await
            .unwrap();

        assert!(!result.original_refunded);
        assert_eq!(result.refund.amount, dec!(-200.00));

        // The result carries the post-debit rollup.
        assert_eq!(result.booking.paid_amount, dec!(400.00));
        assert_eq!(result.booking.payment_status, BookingPaymentStatus::Partial);

        let original = fx
            .store
            .find_by_order_id(&fx.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(original.status, PaymentState::Success);

        let rollup = fx
            .store
            .find(&fx.booking.booking_ref())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rollup.paid_amount, dec!(400.00));
        assert_eq!(rollup.payment_status, BookingPaymentStatus::Partial);
    }

    #[tokio::test]
    async fn sequential_partials_exhaust_then_flip_original() {
        let fx = fixture().await;

        fx.handler
            .handle(refund_cmd(fx.payment_id, Some(dec!(250.00))))
            .await
            .unwrap();
        let second = fx
            .handler
            .handle(refund_cmd(fx.payment_id, Some(dec!(350.00))))
            .await
            .unwrap();

        assert!(second.original_refunded);
        assert_eq!(
            fx.store
                .refunded_total(second.refund.refund_of.unwrap())
                .await
                .unwrap(),
            dec!(600.00)
        );
    }

    #[tokio::test]
    async fn over_refund_is_rejected() {
        let fx = fixture().await;

        let err = fx
            .handler
            .handle(refund_cmd(fx.payment_id, Some(dec!(600.01))))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PaymentFlowError::RefundExceedsRemainder { .. }
        ));
    }

    #[tokio::test]
    async fn cumulative_over_refund_is_rejected() {
        let fx = fixture().await;

        fx.handler
            .handle(refund_cmd(fx.payment_id, Some(dec!(400.00))))
            .await
            .unwrap();
        let err = fx
            .handler
            .handle(refund_cmd(fx.payment_id, Some(dec!(300.00))))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PaymentFlowError::RefundExceedsRemainder { .. }
        ));
    }

    #[tokio::test]
    async fn refunding_a_refund_row_is_rejected() {
        let fx = fixture().await;

        let result = fx
            .handler
            .handle(refund_cmd(fx.payment_id, Some(dec!(100.00))))
            .await
            .unwrap();

        let err = fx
            .handler
            .handle(refund_cmd(result.refund.id, None))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentFlowError::NotRefundable { .. }));
    }

    #[tokio::test]
    async fn created_payment_is_not_refundable() {
        let fx = fixture().await;
        let gateway = MockGateway::new(fx.store.clone(), "INR");
        let pending = gateway
            .create_order(&fx.booking, dec!(100.00))
            .await
            .unwrap();

        let err = fx
            .handler
            .handle(refund_cmd(pending.payment_record_id, None))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentFlowError::NotRefundable { .. }));
    }

    #[tokio::test]
    async fn fully_refunded_payment_rejects_further_refunds() {
        let fx = fixture().await;

        fx.handler
            .handle(refund_cmd(fx.payment_id, None))
            .await
            .unwrap();
        let err = fx
            .handler
            .handle(refund_cmd(fx.payment_id, Some(dec!(1.00))))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentFlowError::NotRefundable { .. }));
    }

    #[tokio::test]
    async fn refund_reason_lands_in_notes() {
        let fx = fixture().await;

        let result = fx
            .handler
            .handle(ProcessRefundCommand {
                payment_id: fx.payment_id,
                amount: Some(dec!(100.00)),
                reason: Some("double charge".to_string()),
            })
            .await
            .unwrap();

        assert!(result.refund.notes.as_deref().unwrap().contains("double charge"));
    }

    #[tokio::test]
    async fn unknown_payment_id_is_not_found() {
        let fx = fixture().await;

        let err = fx
            .handler
            .handle(refund_cmd(PaymentRecordId::new(), None))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentFlowError::PaymentNotFound(_)));
    }
}
