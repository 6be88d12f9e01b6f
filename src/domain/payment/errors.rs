//! Payment flow error types.
//!
//! Errors surfaced by the payment service operations. Validation-class
//! errors are rejected before any mutation; consistency-class errors are
//! rejected atomically with no partial state change; provider errors
//! surface as failed verifications.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | BookingNotFound | 404 |
//! | PaymentNotFound | 404 |
//! | InvalidBookingKind | 400 |
//! | MissingField | 400 |
//! | AmountNotPositive | 400 |
//! | ExceedsRemainingBalance | 400 |
//! | DepositBelowMinimum | 400 |
//! | NotRefundable | 400 |
//! | RefundExceedsRemainder | 400 |
//! | DuplicateOrder | 409 |
//! | InvalidState | 409 |
//! | Provider | 502 |
//! | Infrastructure | 500 |

use rust_decimal::Decimal;

use crate::domain::booking::BookingRef;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors produced by the payment service operations.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentFlowError {
    /// The referenced booking does not exist.
    BookingNotFound(BookingRef),

    /// No ledger row matches the given order or payment id.
    PaymentNotFound(String),

    /// Booking type was not `session` or `party`.
    InvalidBookingKind(String),

    /// A required request field was absent.
    MissingField(&'static str),

    /// Amount must be strictly positive.
    AmountNotPositive(Decimal),

    /// Amount exceeds the remaining balance plus rounding tolerance.
    ExceedsRemainingBalance {
        requested: Decimal,
        remaining: Decimal,
    },

    /// First partial payment is below the configured minimum deposit.
    DepositBelowMinimum {
        requested: Decimal,
        minimum: Decimal,
        percentage: Decimal,
    },

    /// Refund target is not in a refundable state.
    NotRefundable { reason: String },

    /// Refund amount exceeds the refundable remainder.
    RefundExceedsRemainder {
        requested: Decimal,
        remainder: Decimal,
    },

    /// An order id collided with an existing ledger row.
    DuplicateOrder(String),

    /// The row changed state underneath the operation (lost compare-and-set).
    InvalidState { current: String, attempted: String },

    /// The payment provider failed (network, API error).
    Provider { reason: String },

    /// Storage or other infrastructure failure.
    Infrastructure(String),
}

impl PaymentFlowError {
    pub fn booking_not_found(booking: BookingRef) -> Self {
        PaymentFlowError::BookingNotFound(booking)
    }

    pub fn payment_not_found(reference: impl Into<String>) -> Self {
        PaymentFlowError::PaymentNotFound(reference.into())
    }

    pub fn invalid_booking_kind(kind: impl Into<String>) -> Self {
        PaymentFlowError::InvalidBookingKind(kind.into())
    }

    pub fn not_refundable(reason: impl Into<String>) -> Self {
        PaymentFlowError::NotRefundable {
            reason: reason.into(),
        }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        PaymentFlowError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn provider(reason: impl Into<String>) -> Self {
        PaymentFlowError::Provider {
            reason: reason.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        PaymentFlowError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PaymentFlowError::BookingNotFound(_) => ErrorCode::BookingNotFound,
            PaymentFlowError::PaymentNotFound(_) => ErrorCode::PaymentNotFound,
            PaymentFlowError::InvalidBookingKind(_) => ErrorCode::ValidationFailed,
            PaymentFlowError::MissingField(_) => ErrorCode::ValidationFailed,
            PaymentFlowError::AmountNotPositive(_) => ErrorCode::InvalidAmount,
            PaymentFlowError::ExceedsRemainingBalance { .. } => ErrorCode::InvalidAmount,
            PaymentFlowError::DepositBelowMinimum { .. } => ErrorCode::InvalidAmount,
            PaymentFlowError::NotRefundable { .. } => ErrorCode::ValidationFailed,
            PaymentFlowError::RefundExceedsRemainder { .. } => ErrorCode::RefundExceedsRemainder,
            PaymentFlowError::DuplicateOrder(_) => ErrorCode::DuplicateOrderId,
            PaymentFlowError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            PaymentFlowError::Provider { .. } => ErrorCode::ProviderError,
            PaymentFlowError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Human-readable message for callers.
    pub fn message(&self) -> String {
        match self {
            PaymentFlowError::BookingNotFound(booking) => {
                format!("{} not found", booking)
            }
            PaymentFlowError::PaymentNotFound(reference) => {
                format!("Payment {} not found", reference)
            }
            PaymentFlowError::InvalidBookingKind(kind) => {
                format!("Booking type must be 'session' or 'party', got '{}'", kind)
            }
            PaymentFlowError::MissingField(field) => {
                format!("Missing required field '{}'", field)
            }
            PaymentFlowError::AmountNotPositive(amount) => {
                format!("Payment amount must be positive, got {}", amount)
            }
            PaymentFlowError::ExceedsRemainingBalance {
                requested,
                remaining,
            } => format!(
                "Payment amount ({}) exceeds remaining balance ({})",
                requested, remaining
            ),
            PaymentFlowError::DepositBelowMinimum {
                requested,
                minimum,
                percentage,
            } => format!(
                "Minimum deposit of {} ({}%) required, got {}",
                minimum, percentage, requested
            ),
            PaymentFlowError::NotRefundable { reason } => {
                format!("Payment cannot be refunded: {}", reason)
            }
            PaymentFlowError::RefundExceedsRemainder {
                requested,
                remainder,
            } => format!(
                "Refund amount ({}) exceeds refundable remainder ({})",
                requested, remainder
            ),
            PaymentFlowError::DuplicateOrder(order_id) => {
                format!("Order id {} already exists", order_id)
            }
            PaymentFlowError::InvalidState { current, attempted } => {
                format!("Cannot {} a payment in state {}", attempted, current)
            }
            PaymentFlowError::Provider { reason } => {
                format!("Payment provider error: {}", reason)
            }
            PaymentFlowError::Infrastructure(message) => message.clone(),
        }
    }
}

impl std::fmt::Display for PaymentFlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

impl std::error::Error for PaymentFlowError {}

impl From<DomainError> for PaymentFlowError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::PaymentNotFound => PaymentFlowError::PaymentNotFound(err.message),
            ErrorCode::DuplicateOrderId => PaymentFlowError::DuplicateOrder(err.message),
            ErrorCode::InvalidStateTransition => PaymentFlowError::InvalidState {
                current: err
                    .details
                    .get("current")
                    .cloned()
                    .unwrap_or_else(|| err.message.clone()),
                attempted: err
                    .details
                    .get("attempted")
                    .cloned()
                    .unwrap_or_else(|| "transition".to_string()),
            },
            ErrorCode::RefundExceedsRemainder => PaymentFlowError::NotRefundable {
                reason: err.message,
            },
            _ => PaymentFlowError::Infrastructure(err.message),
        }
    }
}
