//! HTTP adapter for payment endpoints.
//!
//! Exposes the payment core via REST API:
//! - `POST /api/payments/orders` - Create a payment order for a booking
//! - `POST /api/payments/verify` - Verify a completed checkout
//! - `POST /api/payments/refund` - Refund part or all of a payment
//! - `GET /api/payments/bookings/{booking_type}/{booking_id}/status` - Booking payment status

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::PaymentsAppState;
pub use routes::payment_routes;
