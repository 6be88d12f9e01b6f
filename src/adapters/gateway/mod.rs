//! Payment gateway adapters.
//!
//! One mock gateway for development and tests, one Razorpay gateway for
//! production, and a factory that picks between them from configuration.

mod factory;
mod mock;
mod razorpay;

pub use factory::GatewayFactory;
pub use mock::MockGateway;
pub use razorpay::{RazorpayConfig, RazorpayGateway};
