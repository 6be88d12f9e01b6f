//! Mock payment gateway.
//!
//! Drop-in stand-in for the production provider. Manufactures `MOCK_`
//! prefixed ids, verifies every payment unless the request carries the
//! `force_fail` hook, and persists real ledger rows so the rest of the
//! flow behaves exactly as it does in production.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::domain::booking::Booking;
use crate::domain::foundation::Timestamp;
use crate::domain::payment::{Payment, PaymentProvider};
use crate::ports::{
    GatewayError, GatewayRefund, PaymentGateway, PaymentOrder, PaymentStore, Verification,
    VerificationData,
};

/// Mock gateway backed by the real payment ledger.
pub struct MockGateway {
    store: Arc<dyn PaymentStore>,
    currency: String,
}

impl MockGateway {
    pub fn new(store: Arc<dyn PaymentStore>, currency: impl Into<String>) -> Self {
        Self {
            store,
            currency: currency.into(),
        }
    }

    /// Ids look like `MOCK_ORDER_1700000000_1A2B3C4D`.
    fn mock_id(prefix: &str) -> String {
        let ts = Timestamp::now().unix_seconds();
        let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
        format!("{}_{}_{}", prefix, ts, suffix)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Mock
    }

    async fn create_order(
        &self,
        booking: &Booking,
        amount: Decimal,
    ) -> Result<PaymentOrder, GatewayError> {
        if amount <= Decimal::ZERO {
            return Err(GatewayError::InvalidAmount(format!(
                "order amount must be positive, got {}",
                amount
            )));
        }

        let order_id = Self::mock_id("MOCK_ORDER");
        let raw = json!({
            "id": order_id,
            "amount": amount,
            "currency": self.currency,
            "status": "created",
            "mock": true,
        });

        let booking_ref = booking.booking_ref();
        let payment = Payment::create_order(
            booking_ref,
            PaymentProvider::Mock,
            &order_id,
            amount,
            &self.currency,
            Some(raw),
        );
        self.store.insert(&payment).await?;

        tracing::info!(
            order_id = %order_id,
            booking = %booking_ref,
            %amount,
            "Mock payment order created"
        );

        Ok(PaymentOrder {
            order_id,
            payment_record_id: payment.id,
            booking_ref,
            amount,
            currency: self.currency.clone(),
            provider: PaymentProvider::Mock,
            checkout_key: None,
        })
    }

    async fn verify_payment(
        &self,
        data: &VerificationData,
    ) -> Result<Verification, GatewayError> {
        let payment = self
            .store
            .find_by_order_id(&data.order_id)
            .await?
            .ok_or_else(|| GatewayError::OrderNotFound(data.order_id.clone()))?;

        if data.force_fail {
            tracing::info!(order_id = %payment.order_id, "Mock verification forced to fail");
            return Ok(Verification::rejected(
                "forced failure requested",
                json!({"order_id": payment.order_id, "mock": true, "forced": true}),
            ));
        }

        let provider_payment_id = data
            .provider_payment_id
            .clone()
            .unwrap_or_else(|| Self::mock_id("MOCK_PAY"));

        Ok(Verification::verified(
            provider_payment_id.clone(),
            json!({
                "order_id": payment.order_id,
                "payment_id": provider_payment_id,
                "status": "captured",
                "mock": true,
            }),
        ))
    }

    async fn refund(
        &self,
        payment: &Payment,
        amount: Decimal,
    ) -> Result<GatewayRefund, GatewayError> {
        if amount <= Decimal::ZERO || amount > payment.amount {
            return Err(GatewayError::InvalidAmount(format!(
                "refund amount {} out of range for payment of {}",
                amount, payment.amount
            )));
        }

        let refund_id = Self::mock_id("MOCK_REFUND");
        tracing::info!(
            refund_id = %refund_id,
            order_id = %payment.order_id,
            %amount,
            "Mock refund processed"
        );

        Ok(GatewayRefund {
            refund_id: refund_id.clone(),
            amount,
            status: "processed".to_string(),
            raw_response: json!({
                "id": refund_id,
                "payment_id": payment.provider_payment_id,
                "amount": amount,
                "status": "processed",
                "mock": true,
            }),
        })
    }
}
