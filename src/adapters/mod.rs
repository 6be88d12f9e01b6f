//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the payment core to external systems:
//! - `gateway` - Payment provider integrations (mock, Razorpay)
//! - `postgres` - Persistent storage for the ledger and booking rollups
//! - `memory` - In-memory store for tests and local development
//! - `notify` - Notification delivery (tracing, Resend)
//! - `http` - REST API surface

pub mod gateway;
pub mod http;
pub mod memory;
pub mod notify;
pub mod postgres;
