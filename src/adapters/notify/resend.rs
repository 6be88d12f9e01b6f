//! Resend email notifier.
//!
//! Sends payment and refund notices to the operations inbox through the
//! Resend HTTP API. Failures are logged and swallowed; a notification must
//! never fail a committed payment operation.

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::config::EmailConfig;
use crate::domain::booking::BookingRef;
use crate::domain::payment::Payment;
use crate::ports::PaymentNotifier;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

pub struct ResendNotifier {
    api_key: SecretString,
    from: String,
    ops_email: String,
    http_client: reqwest::Client,
}

impl ResendNotifier {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            api_key: SecretString::new(config.resend_api_key.clone()),
            from: config.from_header(),
            ops_email: config.ops_email.clone(),
            http_client: reqwest::Client::new(),
        }
    }

    async fn send(&self, subject: String, html: String) {
        let body = json!({
            "from": self.from,
            "to": [self.ops_email],
            "subject": subject,
            "html": html,
        });

        let result = self
            .http_client
            .post(RESEND_API_URL)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                tracing::warn!(%status, error = %error_text, "Resend API rejected notification");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not reach Resend API");
            }
        }
    }
}

#[async_trait]
impl PaymentNotifier for ResendNotifier {
    async fn notify_payment_success(&self, payment: &Payment, booking: &BookingRef) {
        let subject = format!("Payment received for {}", booking);
        let html = format!(
            "<p>Payment of {} {} confirmed for {}.</p>\
             <p>Order: <code>{}</code><br>Provider payment: <code>{}</code></p>",
            payment.amount,
            payment.currency,
            booking,
            payment.order_id,
            payment.provider_payment_id.as_deref().unwrap_or("n/a"),
        );
        self.send(subject, html).await;
    }

    async fn notify_refund(&self, refund: &Payment, booking: &BookingRef, amount: Decimal) {
        let subject = format!("Refund processed for {}", booking);
        let html = format!(
            "<p>Refund of {} {} processed for {}.</p>\
             <p>Refund id: <code>{}</code></p>",
            amount, refund.currency, booking, refund.order_id,
        );
        self.send(subject, html).await;
    }
}
