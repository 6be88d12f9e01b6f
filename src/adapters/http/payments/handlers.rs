//! HTTP handlers for payment endpoints.
//!
//! These handlers connect Axum routes to application layer command/query
//! handlers.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::handlers::payments::{
    CreatePaymentOrderCommand, CreatePaymentOrderHandler, GetPaymentStatusHandler,
    GetPaymentStatusQuery, ProcessRefundCommand, ProcessRefundHandler, VerifyPaymentCommand,
    VerifyPaymentHandler,
};
use crate::config::FeatureFlags;
use crate::domain::booking::{BookingKind, BookingRef};
use crate::domain::foundation::BookingId;
use crate::domain::payment::PaymentFlowError;
use crate::ports::{BookingStore, PaymentGateway, PaymentNotifier, PaymentStore, VerificationData};

use super::dto::{
    BookingStatusResponse, CreateOrderRequest, ErrorResponse, OrderResponse, RefundRequest,
    RefundResponse, VerifyPaymentRequest, VerifyPaymentResponse,
};

/// Shared application state containing all payment dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped
/// dependencies for efficient sharing across handlers.
#[derive(Clone)]
pub struct PaymentsAppState {
    pub bookings: Arc<dyn BookingStore>,
    pub store: Arc<dyn PaymentStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn PaymentNotifier>,
    pub features: FeatureFlags,
}

impl PaymentsAppState {
    /// Create handlers on demand from the shared state.
    pub fn create_order_handler(&self) -> CreatePaymentOrderHandler {
        CreatePaymentOrderHandler::new(
            self.bookings.clone(),
            self.gateway.clone(),
            self.features.clone(),
        )
    }

    pub fn verify_handler(&self) -> VerifyPaymentHandler {
        VerifyPaymentHandler::new(
            self.bookings.clone(),
            self.store.clone(),
            self.gateway.clone(),
            self.notifier.clone(),
        )
    }

    pub fn refund_handler(&self) -> ProcessRefundHandler {
        ProcessRefundHandler::new(
            self.bookings.clone(),
            self.store.clone(),
            self.gateway.clone(),
            self.notifier.clone(),
        )
    }

    pub fn status_handler(&self) -> GetPaymentStatusHandler {
        GetPaymentStatusHandler::new(self.bookings.clone(), self.store.clone())
    }
}

fn parse_booking_ref(booking_type: &str, booking_id: Uuid) -> Result<BookingRef, PaymentsApiError> {
    let kind = BookingKind::parse(booking_type)
        .ok_or_else(|| PaymentFlowError::invalid_booking_kind(booking_type))?;
    Ok(BookingRef {
        kind,
        id: BookingId::from_uuid(booking_id),
    })
}

/// POST /api/payments/orders - Create a payment order for a booking
pub async fn create_order(
    State(state): State<PaymentsAppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, PaymentsApiError> {
    let booking_ref = parse_booking_ref(&request.booking_type, request.booking_id)?;

    let handler = state.create_order_handler();
    let cmd = CreatePaymentOrderCommand {
        booking_ref,
        amount: request.amount,
    };

    let order = handler.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}

/// POST /api/payments/verify - Verify a completed checkout
pub async fn verify_payment(
    State(state): State<PaymentsAppState>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, PaymentsApiError> {
    let handler = state.verify_handler();
    let cmd = VerifyPaymentCommand {
        data: VerificationData {
            order_id: request.order_id,
            provider_payment_id: request.razorpay_payment_id,
            signature: request.razorpay_signature,
            force_fail: request.force_fail,
        },
    };

    let result = handler.handle(cmd).await?;

    let response = VerifyPaymentResponse {
        verified: result.verified,
        newly_completed: result.newly_completed,
        failure_reason: result.failure_reason,
        payment: result.payment.into(),
        payment_status: result.booking.payment_status,
        paid_amount: result.booking.paid_amount,
        remaining_balance: result.booking.remaining_balance(),
    };

    Ok(Json(response))
}

/// POST /api/payments/refund - Refund part or all of a payment
pub async fn process_refund(
    State(state): State<PaymentsAppState>,
    Json(request): Json<RefundRequest>,
) -> Result<impl IntoResponse, PaymentsApiError> {
    let handler = state.refund_handler();
    let cmd = ProcessRefundCommand {
        payment_id: request.payment_id,
        amount: request.amount,
        reason: request.reason,
    };

    let result = handler.handle(cmd).await?;

    let response = RefundResponse {
        refund: result.refund.into(),
        original_refunded: result.original_refunded,
        payment_status: result.booking.payment_status,
        paid_amount: result.booking.paid_amount,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/payments/bookings/{booking_type}/{booking_id}/status
pub async fn get_booking_status(
    State(state): State<PaymentsAppState>,
    Path((booking_type, booking_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, PaymentsApiError> {
    let booking_ref = parse_booking_ref(&booking_type, booking_id)?;

    let handler = state.status_handler();
    let report = handler.handle(GetPaymentStatusQuery { booking_ref }).await?;

    Ok(Json(BookingStatusResponse::from(report)))
}

/// API error type that converts payment flow errors to HTTP responses.
pub struct PaymentsApiError(PaymentFlowError);

impl From<PaymentFlowError> for PaymentsApiError {
    fn from(err: PaymentFlowError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PaymentsApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            PaymentFlowError::BookingNotFound(_) | PaymentFlowError::PaymentNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            PaymentFlowError::InvalidBookingKind(_)
            | PaymentFlowError::MissingField(_)
            | PaymentFlowError::AmountNotPositive(_)
            | PaymentFlowError::ExceedsRemainingBalance { .. }
            | PaymentFlowError::DepositBelowMinimum { .. }
            | PaymentFlowError::NotRefundable { .. }
            | PaymentFlowError::RefundExceedsRemainder { .. } => StatusCode::BAD_REQUEST,
            PaymentFlowError::DuplicateOrder(_) | PaymentFlowError::InvalidState { .. } => {
                StatusCode::CONFLICT
            }
            PaymentFlowError::Provider { .. } => StatusCode::BAD_GATEWAY,
            PaymentFlowError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0.message(), "payment request failed");
        }

        let body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        (status, Json(body)).into_response()
    }
}
