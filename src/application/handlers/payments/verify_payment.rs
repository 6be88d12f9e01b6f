//! VerifyPaymentHandler - Command handler for verifying and completing a payment.

use std::sync::Arc;

use crate::domain::booking::{Booking, BookingRef};
use crate::domain::payment::{Payment, PaymentFlowError, PaymentState};
use crate::ports::{BookingStore, PaymentGateway, PaymentNotifier, PaymentStore, VerificationData};

use super::map_gateway_error;

/// Command carrying the provider's checkout callback payload.
#[derive(Debug, Clone)]
pub struct VerifyPaymentCommand {
    pub data: VerificationData,
}

/// Result of a verification attempt.
#[derive(Debug, Clone)]
pub struct VerifyPaymentResult {
    pub payment: Payment,

    /// Whether the provider confirmed the payment. A `false` here means the
    /// ledger row was marked FAILED.
    pub verified: bool,

    /// Whether this call performed the credit. False for replays of an
    /// already-completed payment.
    pub newly_completed: bool,

    /// Failure reason when not verified.
    pub failure_reason: Option<String>,

    /// The booking rollup after this attempt.
    pub booking: Booking,
}

/// Handler for verifying payments.
///
/// Idempotent: replaying the callback for an already-completed payment
/// returns success without crediting the booking again. Under concurrent
/// callbacks the store's compare-and-set picks exactly one winner.
pub struct VerifyPaymentHandler {
    bookings: Arc<dyn BookingStore>,
    store: Arc<dyn PaymentStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn PaymentNotifier>,
}

impl VerifyPaymentHandler {
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

    async fn rollup(&self, booking_ref: &BookingRef) -> Result<Booking, PaymentFlowError> {
        self.bookings
            .find(booking_ref)
            .await?
            .ok_or_else(|| PaymentFlowError::booking_not_found(*booking_ref))
    }

    pub async fn handle(
        &self,
        cmd: VerifyPaymentCommand,
    ) -> Result<VerifyPaymentResult, PaymentFlowError> {
        // 1. The order must exist in the ledger
        let payment = self
            .store
            .find_by_order_id(&cmd.data.order_id)
            .await?
            .ok_or_else(|| PaymentFlowError::payment_not_found(cmd.data.order_id.clone()))?;

        // 2. Replay of a completed payment short-circuits before the provider
        if payment.status == PaymentState::Success {
            tracing::info!(
                order_id = %payment.order_id,
                "Verification replay for completed payment"
            );
            let booking = self.rollup(&payment.booking_ref).await?;
            return Ok(VerifyPaymentResult {
                payment,
                verified: true,
                newly_completed: false,
                failure_reason: None,
                booking,
            });
        }

        // 3. Ask the provider; signature checks happen in the gateway
        let verification = self
            .gateway
            .verify_payment(&cmd.data)
            .await
            .map_err(map_gateway_error)?;

        if !verification.verified {
            let reason = verification
                .failure_reason
                .unwrap_or_else(|| "verification rejected".to_string());
            self.store.fail_payment(&payment.order_id, &reason).await?;

            tracing::warn!(
                order_id = %payment.order_id,
                %reason,
                "Payment verification failed"
            );
            let payment = self
                .store
                .find_by_order_id(&payment.order_id)
                .await?
                .ok_or_else(|| PaymentFlowError::payment_not_found(payment.order_id.clone()))?;
            let booking = self.rollup(&payment.booking_ref).await?;
            return Ok(VerifyPaymentResult {
                payment,
                verified: false,
                newly_completed: false,
                failure_reason: Some(reason),
                booking,
            });
        }

        let provider_payment_id = verification
            .provider_payment_id
            .ok_or(PaymentFlowError::MissingField("provider_payment_id"))?;

        // 4. Atomic CREATED -> SUCCESS plus booking credit; losers of the
        //    race get the already-completed outcome
        let outcome = self
            .store
            .complete_payment(
                &payment.order_id,
                &provider_payment_id,
                verification.raw_response,
            )
            .await?;
        let newly_completed = outcome.newly_completed();
        let payment = outcome.payment().clone();

        // 5. Notify after commit, never inside it
        if newly_completed {
            tracing::info!(
                order_id = %payment.order_id,
                booking = %payment.booking_ref,
                amount = %payment.amount,
                "Payment verified and credited"
            );
            let notifier = self.notifier.clone();
            let notified = payment.clone();
            tokio::spawn(async move {
                notifier
                    .notify_payment_success(&notified, &notified.booking_ref)
                    .await;
            });
        }

        let booking = self.rollup(&payment.booking_ref).await?;
        Ok(VerifyPaymentResult {
            payment,
            verified: true,
            newly_completed,
            failure_reason: None,
            booking,
        })
    }
}
