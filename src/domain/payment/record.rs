//! Payment ledger entry and its state machine.
//!
//! The ledger is append-only: refunds are separate negative-amount rows, and
//! an existing row's `amount` is never edited. The only mutations a row ever
//! sees are the status transitions below plus the provider ids and response
//! captured alongside them.
//!
//! State machine:
//!
//! ```text
//! CREATED --verify(success)--> SUCCESS --fully refunded--> REFUNDED
//! CREATED --verify(failure)--> FAILED
//! ```
//!
//! FAILED and REFUNDED are terminal. Partial refunds leave the original row
//! in SUCCESS.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::booking::BookingRef;
use crate::domain::foundation::{DomainError, ErrorCode, PaymentRecordId, Timestamp};

/// Payment gateway provider that produced a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentProvider {
    Mock,
    Razorpay,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Mock => "MOCK",
            PaymentProvider::Razorpay => "RAZORPAY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MOCK" => Some(PaymentProvider::Mock),
            "RAZORPAY" => Some(PaymentProvider::Razorpay),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a single ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    /// Order created, awaiting verification.
    Created,
    /// Verified and settled. Refund rows are born in this state.
    Success,
    /// Verification failed. Terminal.
    Failed,
    /// Fully refunded. Terminal.
    Refunded,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Created => "CREATED",
            PaymentState::Success => "SUCCESS",
            PaymentState::Failed => "FAILED",
            PaymentState::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(PaymentState::Created),
            "SUCCESS" => Some(PaymentState::Success),
            "FAILED" => Some(PaymentState::Failed),
            "REFUNDED" => Some(PaymentState::Refunded),
            _ => None,
        }
    }

    /// Whether no further transition out of this state exists.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentState::Failed | PaymentState::Refunded)
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single entry in the append-only payment ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentRecordId,
    /// The booking this row settles against (exactly one kind).
    pub booking_ref: BookingRef,
    pub provider: PaymentProvider,
    /// Provider-facing order id. Globally unique, never reused.
    pub order_id: String,
    /// Provider-assigned payment id, set when the row reaches SUCCESS.
    pub provider_payment_id: Option<String>,
    /// Signed amount. Negative means this row is a refund; the sign is
    /// fixed at creation.
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentState,
    /// Raw provider payload kept for audit.
    pub provider_response: Option<serde_json::Value>,
    /// Internal notes (failure reasons, refund reasons).
    pub notes: Option<String>,
    /// For refund rows, the ledger row being refunded.
    pub refund_of: Option<PaymentRecordId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Payment {
    /// Creates a CREATED row for a freshly placed order.
    pub fn create_order(
        booking_ref: BookingRef,
        provider: PaymentProvider,
        order_id: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
        provider_response: Option<serde_json::Value>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: PaymentRecordId::new(),
            booking_ref,
            provider,
            order_id: order_id.into(),
            provider_payment_id: None,
            amount,
            currency: currency.into(),
            status: PaymentState::Created,
            provider_response,
            notes: None,
            refund_of: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a refund row for `original`. Born directly in SUCCESS with a
    /// negative amount, as the provider has already settled the refund.
    pub fn refund_of(
        original: &Payment,
        refund_id: impl Into<String>,
        amount: Decimal,
        provider_response: Option<serde_json::Value>,
        reason: Option<String>,
    ) -> Self {
        let refund_id = refund_id.into();
        let notes = match reason {
            Some(r) => format!("Refund for payment {}: {}", original.order_id, r),
            None => format!("Refund for payment {}", original.order_id),
        };
        let now = Timestamp::now();
        Self {
            id: PaymentRecordId::new(),
            booking_ref: original.booking_ref,
            provider: original.provider,
            order_id: refund_id.clone(),
            provider_payment_id: Some(refund_id),
            amount: -amount,
            currency: original.currency.clone(),
            status: PaymentState::Success,
            provider_response,
            notes: Some(notes),
            refund_of: Some(original.id),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this row is a refund entry.
    pub fn is_refund(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Transition CREATED -> SUCCESS, capturing the provider payment id and
    /// the authoritative provider payload.
    pub fn mark_success(
        &mut self,
        provider_payment_id: impl Into<String>,
        provider_response: Option<serde_json::Value>,
    ) -> Result<(), DomainError> {
        self.require_state(PaymentState::Created, "mark success")?;
        self.status = PaymentState::Success;
        self.provider_payment_id = Some(provider_payment_id.into());
        if provider_response.is_some() {
            self.provider_response = provider_response;
        }
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Transition CREATED -> FAILED.
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        self.require_state(PaymentState::Created, "mark failed")?;
        self.status = PaymentState::Failed;
        self.notes = Some(reason.into());
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Transition SUCCESS -> REFUNDED, once cumulative refunds reach the
    /// original amount. Refund rows themselves are never refunded.
    pub fn mark_refunded(&mut self) -> Result<(), DomainError> {
        if self.is_refund() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "a refund row cannot be marked refunded",
            ));
        }
        self.require_state(PaymentState::Success, "mark refunded")?;
        self.status = PaymentState::Refunded;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    fn require_state(&self, expected: PaymentState, attempted: &str) -> Result<(), DomainError> {
        if self.status != expected {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "cannot {} payment {} in state {}",
                    attempted, self.order_id, self.status
                ),
            ));
        }
        Ok(())
    }
}
