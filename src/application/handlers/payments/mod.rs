//! Payment command and query handlers.
//!
//! One handler per service operation. Handlers validate, call the gateway,
//! and drive all state changes through the atomic store operations; they
//! never mutate the ledger or the booking rollup directly.

mod create_payment_order;
mod get_payment_status;
mod process_refund;
mod verify_payment;

pub use create_payment_order::{
    CreatePaymentOrderCommand, CreatePaymentOrderHandler, ROUNDING_TOLERANCE,
};
pub use get_payment_status::{
    BookingPaymentStatusReport, GetPaymentStatusHandler, GetPaymentStatusQuery,
};
pub use process_refund::{ProcessRefundCommand, ProcessRefundHandler, ProcessRefundResult};
pub use verify_payment::{VerifyPaymentCommand, VerifyPaymentHandler, VerifyPaymentResult};

use crate::domain::payment::PaymentFlowError;
use crate::ports::GatewayError;

/// Maps gateway failures onto flow errors.
fn map_gateway_error(err: GatewayError) -> PaymentFlowError {
    match err {
        GatewayError::OrderNotFound(order_id) => PaymentFlowError::payment_not_found(order_id),
        GatewayError::MissingField(field) => PaymentFlowError::MissingField(field),
        GatewayError::Provider(reason) => PaymentFlowError::provider(reason),
        GatewayError::InvalidAmount(message) | GatewayError::Storage(message) => {
            PaymentFlowError::infrastructure(message)
        }
    }
}
