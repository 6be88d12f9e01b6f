//! HTTP DTOs (Data Transfer Objects) for payment endpoints.
//!
//! These types define the JSON request/response structure for the payment
//! API. They serve as the boundary between HTTP and the application layer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::handlers::payments::BookingPaymentStatusReport;
use crate::domain::booking::BookingPaymentStatus;
use crate::domain::foundation::PaymentRecordId;
use crate::domain::payment::{Payment, PaymentState};
use crate::ports::PaymentOrder;

// Request DTOs

/// Request to create a payment order against a booking.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    /// Booking kind, `session` or `party`.
    pub booking_type: String,
    /// Id of the booking being paid for.
    pub booking_id: Uuid,
    /// Amount to charge. Defaults to the remaining balance.
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Request to verify a completed checkout.
///
/// The field names follow the checkout widget's callback payload, so the
/// frontend can forward it unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentRequest {
    /// Provider order id. The checkout widget sends it as
    /// `razorpay_order_id`; both spellings are accepted.
    #[serde(alias = "razorpay_order_id")]
    pub order_id: String,
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    #[serde(default)]
    pub razorpay_signature: Option<String>,
    /// Testing hook honored only by the mock gateway.
    #[serde(default)]
    pub force_fail: bool,
}

/// Request to refund a payment.
#[derive(Debug, Clone, Deserialize)]
pub struct RefundRequest {
    /// Ledger id of the payment being refunded.
    pub payment_id: PaymentRecordId,
    /// Refund amount. Defaults to the full refundable remainder.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Reason recorded on the refund row.
    #[serde(default)]
    pub reason: Option<String>,
}

// Response DTOs

/// Response for a freshly created payment order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub payment_record_id: String,
    pub booking_type: String,
    pub booking_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub provider: String,
    /// Public key id for the frontend checkout widget (production only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_key: Option<String>,
}

impl From<PaymentOrder> for OrderResponse {
    fn from(order: PaymentOrder) -> Self {
        Self {
            order_id: order.order_id,
            payment_record_id: order.payment_record_id.to_string(),
            booking_type: order.booking_ref.kind.to_string(),
            booking_id: order.booking_ref.id.to_string(),
            amount: order.amount,
            currency: order.currency,
            provider: order.provider.to_string(),
            checkout_key: order.checkout_key,
        }
    }
}

/// A single ledger entry in API form.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub booking_type: String,
    pub booking_id: String,
    pub provider: String,
    pub order_id: String,
    pub provider_payment_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentState,
    pub notes: Option<String>,
    /// For refund entries, the id of the ledger row being refunded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_of: Option<String>,
    /// When the row was created (ISO 8601).
    pub created_at: String,
    /// Last status transition (ISO 8601).
    pub updated_at: String,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id.to_string(),
            booking_type: payment.booking_ref.kind.to_string(),
            booking_id: payment.booking_ref.id.to_string(),
            provider: payment.provider.to_string(),
            order_id: payment.order_id,
            provider_payment_id: payment.provider_payment_id,
            amount: payment.amount,
            currency: payment.currency,
            status: payment.status,
            notes: payment.notes,
            refund_of: payment.refund_of.map(|id| id.to_string()),
            created_at: payment.created_at.as_datetime().to_rfc3339(),
            updated_at: payment.updated_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Response for a verification attempt.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyPaymentResponse {
    pub verified: bool,
    /// False when this verification replayed an already completed payment.
    pub newly_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub payment: PaymentResponse,
    /// Booking rollup after this attempt.
    pub payment_status: BookingPaymentStatus,
    pub paid_amount: Decimal,
    pub remaining_balance: Decimal,
}

/// Response for a processed refund.
#[derive(Debug, Clone, Serialize)]
pub struct RefundResponse {
    pub refund: PaymentResponse,
    /// Whether the original payment is now fully refunded.
    pub original_refunded: bool,
    /// Booking rollup after the debit.
    pub payment_status: BookingPaymentStatus,
    pub paid_amount: Decimal,
}

/// Response for a booking's payment status.
#[derive(Debug, Clone, Serialize)]
pub struct BookingStatusResponse {
    pub booking_type: String,
    pub booking_id: String,
    pub payment_status: BookingPaymentStatus,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub remaining_balance: Decimal,
    /// Every ledger row for the booking, most recent first.
    pub payments: Vec<PaymentResponse>,
}

impl From<BookingPaymentStatusReport> for BookingStatusResponse {
    fn from(report: BookingPaymentStatusReport) -> Self {
        Self {
            booking_type: report.booking_ref.kind.to_string(),
            booking_id: report.booking_ref.id.to_string(),
            payment_status: report.payment_status,
            amount: report.amount,
            paid_amount: report.paid_amount,
            remaining_balance: report.remaining_balance,
            payments: report.payments.into_iter().map(PaymentResponse::from).collect(),
        }
    }
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}
