//! Booking lookup port.
//!
//! Read-only access to the two booking tables. Rollup mutations happen
//! inside [`PaymentStore`](crate::ports::PaymentStore) transactions so the
//! ledger and the rollup can never drift apart.

use async_trait::async_trait;

use crate::domain::booking::{Booking, BookingRef};
use crate::domain::foundation::DomainError;

/// Port for booking reads.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Fetch a booking by its typed reference.
    async fn find(&self, booking: &BookingRef) -> Result<Option<Booking>, DomainError>;
}
