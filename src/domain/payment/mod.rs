//! Payment ledger domain: ledger entries, state machine, signature
//! verification, and flow errors.

mod errors;
mod record;
mod signature;

pub use errors::PaymentFlowError;
pub use record::{Payment, PaymentProvider, PaymentState};
pub use signature::{PaymentSignatureVerifier, SignatureError};

#[cfg(test)]
pub use signature::sign_for_test;
