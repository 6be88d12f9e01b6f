//! Razorpay payment gateway adapter.
//!
//! Production gateway for the Razorpay orders API. Amounts cross the wire
//! in paise (hundredths of a rupee); the checkout signature is verified
//! server-side with HMAC-SHA256 before any payment is trusted.
//!
//! # Security
//!
//! - Constant-time signature comparison via the domain verifier
//! - API key secret handled via `secrecy::SecretString`
//! - Client-reported success is never trusted without a matching signature

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::domain::booking::Booking;
use crate::domain::payment::{Payment, PaymentProvider, PaymentSignatureVerifier};
use crate::ports::{
    GatewayError, GatewayRefund, PaymentGateway, PaymentOrder, PaymentStore, Verification,
    VerificationData,
};

/// Razorpay API configuration.
#[derive(Clone)]
pub struct RazorpayConfig {
    /// Public key id (rzp_test_... or rzp_live_...). Shipped to the
    /// frontend checkout widget.
    key_id: String,

    /// API key secret, also the HMAC signing key.
    key_secret: SecretString,

    /// Base URL for the Razorpay API (default: https://api.razorpay.com).
    api_base_url: String,

    currency: String,
}

impl RazorpayConfig {
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: SecretString::new(key_secret.into()),
            api_base_url: "https://api.razorpay.com".to_string(),
            currency: "INR".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}

/// Razorpay gateway adapter.
pub struct RazorpayGateway {
    config: RazorpayConfig,
    store: Arc<dyn PaymentStore>,
    verifier: PaymentSignatureVerifier,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RazorpayOrderResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RazorpayRefundResponse {
    id: String,
    status: String,
}

/// Converts a rupee amount to integer paise, as the API expects.
fn to_paise(amount: Decimal) -> Result<i64, GatewayError> {
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| GatewayError::InvalidAmount(format!("amount {} out of range", amount)))
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig, store: Arc<dyn PaymentStore>) -> Self {
        let verifier = PaymentSignatureVerifier::new(config.key_secret.expose_secret());
        Self {
            config,
            store,
            verifier,
            http_client: reqwest::Client::new(),
        }
    }

    async fn post_json(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, GatewayError> {
        let response = self
            .http_client
            .post(url)
            .basic_auth(
                &self.config.key_id,
                Some(self.config.key_secret.expose_secret()),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Provider(format!("network error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(%status, error = %error_text, %url, "Razorpay API call failed");
            return Err(GatewayError::Provider(format!(
                "Razorpay API error ({}): {}",
                status, error_text
            )));
        }
        Ok(response)
    }

    /// Fetch the authoritative payment object from the provider. A payment
    /// is only trusted once both the signature checks out and this record
    /// confirms it exists.
    async fn fetch_payment(
        &self,
        provider_payment_id: &str,
    ) -> Result<serde_json::Value, GatewayError> {
        let url = format!(
            "{}/v1/payments/{}",
            self.config.api_base_url, provider_payment_id
        );

        let response = self
            .http_client
            .get(&url)
            .basic_auth(
                &self.config.key_id,
                Some(self.config.key_secret.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| GatewayError::Provider(format!("network error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GatewayError::Provider(format!(
                "payment fetch failed ({})",
                status
            )));
        }
        response
            .json()
            .await
            .map_err(|e| GatewayError::Provider(format!("invalid payment response: {}", e)))
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Razorpay
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

        let booking_ref = booking.booking_ref();
        let url = format!("{}/v1/orders", self.config.api_base_url);
        let body = json!({
            "amount": to_paise(amount)?,
            "currency": self.config.currency,
            "receipt": format!("{}_{}", booking_ref.kind, booking_ref.id),
            "notes": {
                "booking_type": booking_ref.kind.as_str(),
                "booking_id": booking_ref.id.to_string(),
            },
        });

        let response = self.post_json(&url, body).await?;
        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Provider(format!("invalid order response: {}", e)))?;
        let order: RazorpayOrderResponse = serde_json::from_value(raw.clone())
            .map_err(|e| GatewayError::Provider(format!("invalid order response: {}", e)))?;

        let payment = Payment::create_order(
            booking_ref,
            PaymentProvider::Razorpay,
            &order.id,
            amount,
            &self.config.currency,
            Some(raw),
        );
        self.store.insert(&payment).await?;

        tracing::info!(
            order_id = %order.id,
            booking = %booking_ref,
            %amount,
            "Razorpay order created"
        );

        Ok(PaymentOrder {
            order_id: order.id,
            payment_record_id: payment.id,
            booking_ref,
            amount,
            currency: self.config.currency.clone(),
            provider: PaymentProvider::Razorpay,
            checkout_key: Some(self.config.key_id.clone()),
        })
    }

    async fn verify_payment(
        &self,
        data: &VerificationData,
    ) -> Result<Verification, GatewayError> {
        let provider_payment_id = data
            .provider_payment_id
            .as_deref()
            .ok_or(GatewayError::MissingField("razorpay_payment_id"))?;
        let signature = data
            .signature
            .as_deref()
            .ok_or(GatewayError::MissingField("razorpay_signature"))?;

        self.store
            .find_by_order_id(&data.order_id)
            .await?
            .ok_or_else(|| GatewayError::OrderNotFound(data.order_id.clone()))?;

        if let Err(e) = self
            .verifier
            .verify(&data.order_id, provider_payment_id, signature)
        {
            tracing::warn!(
                order_id = %data.order_id,
                payment_id = %provider_payment_id,
                error = %e,
                "Payment signature rejected"
            );
            return Ok(Verification::rejected(
                format!("signature verification failed: {}", e),
                json!({"order_id": data.order_id, "payment_id": provider_payment_id}),
            ));
        }

        match self.fetch_payment(provider_payment_id).await {
            Ok(raw) => Ok(Verification::verified(provider_payment_id, raw)),
            Err(e) => {
                tracing::warn!(
                    order_id = %data.order_id,
                    payment_id = %provider_payment_id,
                    error = %e,
                    "Could not confirm payment with provider"
                );
                Ok(Verification::rejected(
                    format!("could not confirm payment with provider: {}", e),
                    json!({"order_id": data.order_id, "payment_id": provider_payment_id}),
                ))
            }
        }
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
        let provider_payment_id = payment.provider_payment_id.as_deref().ok_or_else(|| {
            GatewayError::Provider(format!(
                "payment {} has no provider payment id",
                payment.order_id
            ))
        })?;

        let url = format!(
            "{}/v1/payments/{}/refund",
            self.config.api_base_url, provider_payment_id
        );
        let body = json!({
            "amount": to_paise(amount)?,
            "notes": {
                "order_id": payment.order_id,
            },
        });

        let response = self.post_json(&url, body).await?;
        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Provider(format!("invalid refund response: {}", e)))?;
        let refund: RazorpayRefundResponse = serde_json::from_value(raw.clone())
            .map_err(|e| GatewayError::Provider(format!("invalid refund response: {}", e)))?;

        tracing::info!(
            refund_id = %refund.id,
            order_id = %payment.order_id,
            %amount,
            "Razorpay refund processed"
        );

        Ok(GatewayRefund {
            refund_id: refund.id,
            amount,
            status: refund.status,
            raw_response: raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::booking::BookingKind;
    use crate::domain::foundation::BookingId;
    use crate::domain::payment::{sign_for_test, PaymentState};
    use rust_decimal_macros::dec;

    const TEST_SECRET: &str = "test_secret_abc123";

    fn gateway_with_store() -> (RazorpayGateway, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let config = RazorpayConfig::new("rzp_test_k3y1d", TEST_SECRET);
        (RazorpayGateway::new(config, store.clone()), store)
    }

    fn seeded_order(store: &InMemoryStore, order_id: &str) -> Payment {
        let booking = Booking::new(BookingId::new(), BookingKind::Session, dec!(1000.00));
        store.insert_booking(booking.clone());
        Payment::create_order(
            booking.booking_ref(),
            PaymentProvider::Razorpay,
            order_id,
            dec!(500.00),
            "INR",
            None,
        )
    }

    #[test]
    fn to_paise_converts_rupees() {
        assert_eq!(to_paise(dec!(500.00)).unwrap(), 50000);
        assert_eq!(to_paise(dec!(0.50)).unwrap(), 50);
        assert_eq!(to_paise(dec!(1234.56)).unwrap(), 123456);
    }

    #[test]
    fn config_defaults_to_production_api() {
        let config = RazorpayConfig::new("rzp_test_abc", "secret");
        assert_eq!(config.api_base_url, "https://api.razorpay.com");
        assert_eq!(config.currency, "INR");
    }

    #[tokio::test]
    async fn verify_payment_requires_payment_id_and_signature() {
        let (gateway, _) = gateway_with_store();

        let err = gateway
            .verify_payment(&VerificationData {
                order_id: "order_x".into(),
                signature: Some("aa".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::MissingField("razorpay_payment_id")
        ));

        let err = gateway
            .verify_payment(&VerificationData {
                order_id: "order_x".into(),
                provider_payment_id: Some("pay_x".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::MissingField("razorpay_signature")
        ));
    }

    #[tokio::test]
    async fn verify_payment_unknown_order_is_not_found() {
        let (gateway, _) = gateway_with_store();

        let err = gateway
            .verify_payment(&VerificationData {
                order_id: "order_missing".into(),
                provider_payment_id: Some("pay_x".into()),
                signature: Some("aabb".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn verify_payment_rejects_bad_signature() {
        let (gateway, store) = gateway_with_store();
        let payment = seeded_order(&store, "order_1");
        store.insert(&payment).await.unwrap();
        assert_eq!(payment.status, PaymentState::Created);

        let wrong = sign_for_test("some_other_secret", "order_1", "pay_1");
        let verification = gateway
            .verify_payment(&VerificationData {
                order_id: "order_1".into(),
                provider_payment_id: Some("pay_1".into()),
                signature: Some(wrong),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(!verification.verified);
        assert!(verification
            .failure_reason
            .unwrap()
            .contains("signature verification failed"));
    }

    #[tokio::test]
    async fn verify_payment_rejects_signature_for_different_order() {
        let (gateway, store) = gateway_with_store();
        let payment = seeded_order(&store, "order_1");
        store.insert(&payment).await.unwrap();

        // Valid signature, but computed over a different order id.
        let stolen = sign_for_test(TEST_SECRET, "order_2", "pay_1");
        let verification = gateway
            .verify_payment(&VerificationData {
                order_id: "order_1".into(),
                provider_payment_id: Some("pay_1".into()),
                signature: Some(stolen),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(!verification.verified);
    }

    #[tokio::test]
    async fn verify_payment_rejects_when_provider_fetch_fails() {
        let store = Arc::new(InMemoryStore::new());
        // Nothing listens on port 1; the authoritative fetch cannot succeed.
        let config = RazorpayConfig::new("rzp_test_k3y1d", TEST_SECRET)
            .with_base_url("http://127.0.0.1:1");
        let gateway = RazorpayGateway::new(config, store.clone());

        let payment = seeded_order(&store, "order_1");
        store.insert(&payment).await.unwrap();

        let signature = sign_for_test(TEST_SECRET, "order_1", "pay_1");
        let verification = gateway
            .verify_payment(&VerificationData {
                order_id: "order_1".into(),
                provider_payment_id: Some("pay_1".into()),
                signature: Some(signature),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(!verification.verified);
        assert!(verification
            .failure_reason
            .unwrap()
            .contains("could not confirm payment with provider"));
    }

    #[tokio::test]
    async fn refund_rejects_amount_out_of_range() {
        let (gateway, store) = gateway_with_store();
        let mut payment = seeded_order(&store, "order_1");
        payment
            .mark_success("pay_1", Some(serde_json::json!({})))
            .unwrap();

        let err = gateway.refund(&payment, dec!(0)).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidAmount(_)));

        let err = gateway.refund(&payment, dec!(600.00)).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidAmount(_)));
    }
}
