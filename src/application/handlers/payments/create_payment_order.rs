//! CreatePaymentOrderHandler - Command handler for placing a payment order.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::FeatureFlags;
use crate::domain::booking::BookingRef;
use crate::domain::payment::PaymentFlowError;
use crate::ports::{BookingStore, PaymentGateway, PaymentOrder};

use super::map_gateway_error;

/// Slack allowed above the remaining balance to absorb checkout rounding.
pub const ROUNDING_TOLERANCE: Decimal = dec!(0.50);

/// Command to place a payment order against a booking.
#[derive(Debug, Clone)]
pub struct CreatePaymentOrderCommand {
    pub booking_ref: BookingRef,

    /// Amount to charge. Defaults to the full remaining balance.
    pub amount: Option<Decimal>,
}

/// Handler for placing payment orders.
///
/// Validates the amount against the booking's remaining balance and the
/// deposit policy, then asks the gateway to create the provider order and
/// its CREATED ledger row.
pub struct CreatePaymentOrderHandler {
    bookings: Arc<dyn BookingStore>,
    gateway: Arc<dyn PaymentGateway>,
    features: FeatureFlags,
}

impl CreatePaymentOrderHandler {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        gateway: Arc<dyn PaymentGateway>,
        features: FeatureFlags,
    ) -> Self {
        Self {
            bookings,
            gateway,
            features,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePaymentOrderCommand,
    ) -> Result<PaymentOrder, PaymentFlowError> {
        // 1. Resolve the booking
        let booking = self
            .bookings
            .find(&cmd.booking_ref)
            .await?
            .ok_or(PaymentFlowError::BookingNotFound(cmd.booking_ref))?;

        // 2. Default to the remaining balance, reject paid-off bookings
        let remaining = booking.remaining_balance();
        let amount = cmd.amount.unwrap_or(remaining);
        if amount <= Decimal::ZERO {
            return Err(PaymentFlowError::AmountNotPositive(amount));
        }
        if remaining == Decimal::ZERO {
            return Err(PaymentFlowError::ExceedsRemainingBalance {
                requested: amount,
                remaining,
            });
        }

        // 3. Never charge past the balance (plus rounding slack)
        if amount > remaining + ROUNDING_TOLERANCE {
            return Err(PaymentFlowError::ExceedsRemainingBalance {
                requested: amount,
                remaining,
            });
        }

        // 4. Deposit policy for partial amounts
        if amount < remaining {
            if !self.features.allow_partial_payments {
                return Err(PaymentFlowError::DepositBelowMinimum {
                    requested: amount,
                    minimum: remaining,
                    percentage: dec!(100),
                });
            }
            // Only the first installment is held to the deposit floor.
            if booking.paid_amount == Decimal::ZERO {
                let percentage = Decimal::from(self.features.minimum_deposit_percentage);
                let minimum = (booking.amount * percentage / dec!(100)).round_dp(2);
                if amount < minimum {
                    return Err(PaymentFlowError::DepositBelowMinimum {
                        requested: amount,
                        minimum,
                        percentage,
                    });
                }
            }
        }

        // 5. Create the provider order and its CREATED ledger row
        let order = self
            .gateway
            .create_order(&booking, amount)
            .await
            .map_err(map_gateway_error)?;

        tracing::info!(
            order_id = %order.order_id,
            booking = %order.booking_ref,
            amount = %order.amount,
            "Payment order placed"
        );
        Ok(order)
    }
}
