//! Payment ledger persistence port.
//!
//! The store owns the atomic transitions that keep the ledger and the
//! booking rollup consistent. Each mutating operation commits the payment
//! row change and the booking amount update together, or not at all;
//! concurrent callers racing on the same payment see exactly one winner.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::booking::BookingRef;
use crate::domain::foundation::{DomainError, PaymentRecordId};
use crate::domain::payment::Payment;

/// Outcome of a completion attempt.
///
/// `AlreadyCompleted` is the idempotent path: some other call already moved
/// the payment to SUCCESS and credited the booking, so this caller must not
/// credit again.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// This call performed the CREATED -> SUCCESS transition.
    Completed(Payment),

    /// The payment was already SUCCESS; no state was changed.
    AlreadyCompleted(Payment),
}

impl CompletionOutcome {
    pub fn payment(&self) -> &Payment {
        match self {
            CompletionOutcome::Completed(p) | CompletionOutcome::AlreadyCompleted(p) => p,
        }
    }

    pub fn newly_completed(&self) -> bool {
        matches!(self, CompletionOutcome::Completed(_))
    }
}

/// Outcome of an atomic refund append.
#[derive(Debug, Clone, PartialEq)]
pub struct RefundOutcome {
    /// The negative ledger row that was appended.
    pub refund: Payment,

    /// Whether the original payment was flipped to REFUNDED (fully refunded).
    pub original_refunded: bool,
}

/// Port for the append-only payment ledger.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Append a new ledger row (a CREATED order).
    ///
    /// # Errors
    ///
    /// Returns `DuplicateOrderId` if a row with the same order id exists.
    async fn insert(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Fetch a payment by its provider order id.
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, DomainError>;

    /// Fetch a payment by its ledger id.
    async fn find_by_id(&self, id: PaymentRecordId) -> Result<Option<Payment>, DomainError>;

    /// All ledger rows for a booking, most recent first. Includes refunds.
    async fn list_for_booking(&self, booking: &BookingRef) -> Result<Vec<Payment>, DomainError>;

    /// Atomically move a CREATED payment to SUCCESS and credit the booking
    /// rollup by the payment amount.
    ///
    /// The row is locked, its status re-checked, and the transition plus the
    /// booking update commit together. A payment already in SUCCESS returns
    /// `AlreadyCompleted` without touching the rollup.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` if the order id is unknown
    /// - `InvalidStateTransition` if the payment is FAILED or REFUNDED
    async fn complete_payment(
        &self,
        order_id: &str,
        provider_payment_id: &str,
        provider_response: serde_json::Value,
    ) -> Result<CompletionOutcome, DomainError>;

    /// Move a CREATED payment to FAILED with a reason.
    ///
    /// A payment no longer in CREATED is left untouched; failure marking is
    /// best-effort and never overwrites a completed transition.
    async fn fail_payment(&self, order_id: &str, reason: &str) -> Result<(), DomainError>;

    /// Atomically append a refund row, debit the booking rollup, and flip
    /// the original payment to REFUNDED when its remainder reaches zero.
    ///
    /// The original row is locked and the refundable remainder re-checked
    /// under the lock, so concurrent refunds against the same payment cannot
    /// jointly exceed the original amount.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` if the original payment is unknown
    /// - `InvalidStateTransition` if the original is not SUCCESS
    /// - `RefundExceedsRemainder` if `refund.amount.abs()` exceeds what
    ///   remains refundable on the original
    async fn record_refund(
        &self,
        original_id: PaymentRecordId,
        refund: &Payment,
    ) -> Result<RefundOutcome, DomainError>;

    /// Cumulative refunded amount (absolute value) against a payment.
    async fn refunded_total(&self, original_id: PaymentRecordId) -> Result<Decimal, DomainError>;
}
