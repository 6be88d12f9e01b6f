//! Axum router configuration for payment endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    create_order, get_booking_status, process_refund, verify_payment, PaymentsAppState,
};

/// Create the payment API router.
///
/// # Routes
///
/// - `POST /orders` - Create a payment order for a booking
/// - `POST /verify` - Verify a completed checkout
/// - `POST /refund` - Refund part or all of a payment
/// - `GET /bookings/{booking_type}/{booking_id}/status` - Payment status of a booking
///
/// Suitable for mounting at `/api/payments`.
pub fn payment_routes() -> Router<PaymentsAppState> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/verify", post(verify_payment))
        .route("/refund", post(process_refund))
        .route(
            "/bookings/:booking_type/:booking_id/status",
            get(get_booking_status),
        )
}
