//! Payment gateway port.
//!
//! Defines the contract every payment provider implementation satisfies
//! (mock or production). Expected business failures are explicit results,
//! never panics; gateways persist their CREATED ledger rows through the
//! [`PaymentStore`](crate::ports::PaymentStore) so the orchestration layer
//! stays provider-agnostic.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::booking::{Booking, BookingRef};
use crate::domain::foundation::{DomainError, ErrorCode, PaymentRecordId};
use crate::domain::payment::PaymentProvider;

/// Port for payment gateway integrations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// The provider this gateway talks to.
    fn provider(&self) -> PaymentProvider;

    /// Create a provider-side order and its CREATED ledger row.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is not strictly positive
    /// - `Provider` if the provider API call fails
    async fn create_order(
        &self,
        booking: &Booking,
        amount: Decimal,
    ) -> Result<PaymentOrder, GatewayError>;

    /// Verify a payment attempt against the provider.
    ///
    /// Signature mismatches and provider-side declines are expected business
    /// failures and come back as `verified: false`; only transport-level
    /// problems surface as errors.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if the order id is unknown to the ledger
    /// - `MissingField` if the verification payload is incomplete
    /// - `Provider` on network failure
    async fn verify_payment(
        &self,
        data: &VerificationData,
    ) -> Result<Verification, GatewayError>;

    /// Execute a refund with the provider.
    ///
    /// The caller has already validated the refundable remainder; the
    /// gateway re-checks the basic bound against the payment it is handed.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is outside (0, payment amount]
    /// - `Provider` if the provider refund call fails
    async fn refund(
        &self,
        payment: &crate::domain::payment::Payment,
        amount: Decimal,
    ) -> Result<GatewayRefund, GatewayError>;
}

/// Order descriptor returned by `create_order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrder {
    /// Provider-facing order id, globally unique.
    pub order_id: String,

    /// Ledger row created for this order.
    pub payment_record_id: PaymentRecordId,

    /// Booking the order settles against.
    pub booking_ref: BookingRef,

    pub amount: Decimal,
    pub currency: String,
    pub provider: PaymentProvider,

    /// Public key id the frontend checkout widget needs (production only).
    pub checkout_key: Option<String>,
}

/// Provider-specific verification input, normalized from the request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationData {
    /// The order id being verified.
    pub order_id: String,

    /// Provider-assigned payment id (required by the production gateway).
    pub provider_payment_id: Option<String>,

    /// Checkout signature over (order id, payment id).
    pub signature: Option<String>,

    /// Testing hook honored only by the mock gateway.
    pub force_fail: bool,
}

/// Outcome of a gateway verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    /// Whether the provider confirmed the payment.
    pub verified: bool,

    /// Provider payment id, set when verified.
    pub provider_payment_id: Option<String>,

    /// Raw provider payload for audit.
    pub raw_response: serde_json::Value,

    /// Failure reason when not verified.
    pub failure_reason: Option<String>,
}

impl Verification {
    /// A successful verification.
    pub fn verified(provider_payment_id: impl Into<String>, raw: serde_json::Value) -> Self {
        Self {
            verified: true,
            provider_payment_id: Some(provider_payment_id.into()),
            raw_response: raw,
            failure_reason: None,
        }
    }

    /// A rejected verification with a reason.
    pub fn rejected(reason: impl Into<String>, raw: serde_json::Value) -> Self {
        Self {
            verified: false,
            provider_payment_id: None,
            raw_response: raw,
            failure_reason: Some(reason.into()),
        }
    }
}

/// Refund descriptor returned by `refund`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRefund {
    /// Provider-assigned refund id.
    pub refund_id: String,

    pub amount: Decimal,

    /// Provider-reported refund status (e.g. "processed").
    pub status: String,

    /// Raw provider payload for audit.
    pub raw_response: serde_json::Value,
}

/// Errors from gateway operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("order {0} not found")]
    OrderNotFound(String),

    #[error("missing field '{0}' in verification payload")]
    MissingField(&'static str),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<DomainError> for GatewayError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::DuplicateOrderId => GatewayError::Storage(err.message),
            _ => GatewayError::Storage(err.to_string()),
        }
    }
}
