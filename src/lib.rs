//! ParkPay - Payment core for the NinjaPark booking platform.
//!
//! This crate owns the payment ledger, booking monetary rollups, and the
//! provider-agnostic gateway layer used to charge and refund session and
//! party bookings.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
