//! In-memory payment ledger and booking store.
//!
//! A single mutex guards both tables, so every mutating operation is
//! naturally atomic across the ledger row and the booking rollup. This
//! mirrors the transactional guarantees of the Postgres adapter closely
//! enough to drive the concurrency tests against real handler code.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::booking::{Booking, BookingRef};
use crate::domain::foundation::{DomainError, ErrorCode, PaymentRecordId};
use crate::domain::payment::{Payment, PaymentState};
use crate::ports::{BookingStore, CompletionOutcome, PaymentStore, RefundOutcome};

#[derive(Default)]
struct Tables {
    bookings: HashMap<BookingRef, Booking>,
    /// Ledger rows in insertion order. Append-only outside of status flips.
    payments: Vec<Payment>,
}

impl Tables {
    fn payment_by_order_id(&self, order_id: &str) -> Option<usize> {
        self.payments.iter().position(|p| p.order_id == order_id)
    }

    fn payment_by_id(&self, id: PaymentRecordId) -> Option<usize> {
        self.payments.iter().position(|p| p.id == id)
    }

    fn refunded_total(&self, original_id: PaymentRecordId) -> Decimal {
        self.payments
            .iter()
            .filter(|p| p.refund_of == Some(original_id))
            .map(|p| p.amount.abs())
            .sum()
    }
}

/// Mutex-backed store implementing both persistence ports.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a booking row. Test and local-dev helper.
    pub fn insert_booking(&self, booking: Booking) {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        tables.bookings.insert(booking.booking_ref(), booking);
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn find(&self, booking: &BookingRef) -> Result<Option<Booking>, DomainError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables.bookings.get(booking).cloned())
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn insert(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        if tables.payment_by_order_id(&payment.order_id).is_some() {
            return Err(DomainError::new(
                ErrorCode::DuplicateOrderId,
                format!("order id {} already exists", payment.order_id),
            ));
        }
        tables.payments.push(payment.clone());
        Ok(())
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, DomainError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables
            .payment_by_order_id(order_id)
            .map(|i| tables.payments[i].clone()))
    }

    async fn find_by_id(&self, id: PaymentRecordId) -> Result<Option<Payment>, DomainError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables.payment_by_id(id).map(|i| tables.payments[i].clone()))
    }

    async fn list_for_booking(&self, booking: &BookingRef) -> Result<Vec<Payment>, DomainError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        // Newest first, matching the Postgres ORDER BY created_at DESC.
        Ok(tables
            .payments
            .iter()
            .rev()
            .filter(|p| &p.booking_ref == booking)
            .cloned()
            .collect())
    }

    async fn complete_payment(
        &self,
        order_id: &str,
        provider_payment_id: &str,
        provider_response: serde_json::Value,
    ) -> Result<CompletionOutcome, DomainError> {
        let mut tables = self.tables.lock().expect("store mutex poisoned");

        let idx = tables.payment_by_order_id(order_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("no payment with order id {}", order_id),
            )
        })?;

        match tables.payments[idx].status {
            PaymentState::Created => {}
            PaymentState::Success => {
                return Ok(CompletionOutcome::AlreadyCompleted(
                    tables.payments[idx].clone(),
                ));
            }
            other => {
                return Err(DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    format!("cannot complete payment in state {}", other),
                ));
            }
        }

        let booking_ref = tables.payments[idx].booking_ref;
        let amount = tables.payments[idx].amount;

        let booking = tables.bookings.get_mut(&booking_ref).ok_or_else(|| {
            DomainError::new(
                ErrorCode::BookingNotFound,
                format!("no booking for {}", booking_ref),
            )
        })?;
        booking.record_payment(amount)?;

        tables.payments[idx].mark_success(provider_payment_id, Some(provider_response))?;
        Ok(CompletionOutcome::Completed(tables.payments[idx].clone()))
    }

    async fn fail_payment(&self, order_id: &str, reason: &str) -> Result<(), DomainError> {
        let mut tables = self.tables.lock().expect("store mutex poisoned");

        let idx = tables.payment_by_order_id(order_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("no payment with order id {}", order_id),
            )
        })?;

        // Failure marking never overwrites a finished transition.
        if tables.payments[idx].status != PaymentState::Created {
            return Ok(());
        }
        tables.payments[idx].mark_failed(reason)
    }

    async fn record_refund(
        &self,
        original_id: PaymentRecordId,
        refund: &Payment,
    ) -> Result<RefundOutcome, DomainError> {
        let mut tables = self.tables.lock().expect("store mutex poisoned");

        let idx = tables.payment_by_id(original_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("no payment with id {}", original_id),
            )
        })?;

        let original = &tables.payments[idx];
        if original.status != PaymentState::Success {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("cannot refund payment in state {}", original.status),
            ));
        }

        let refund_amount = refund.amount.abs();
        let remainder = original.amount - tables.refunded_total(original_id);
        if refund_amount > remainder {
            return Err(DomainError::new(
                ErrorCode::RefundExceedsRemainder,
                format!(
                    "refund of {} exceeds refundable remainder {}",
                    refund_amount, remainder
                ),
            ));
        }

        let booking_ref = tables.payments[idx].booking_ref;
        let booking = tables.bookings.get_mut(&booking_ref).ok_or_else(|| {
            DomainError::new(
                ErrorCode::BookingNotFound,
                format!("no booking for {}", booking_ref),
            )
        })?;
        booking.record_refund(refund_amount)?;

        tables.payments.push(refund.clone());

        let original_refunded = refund_amount == remainder;
        if original_refunded {
            let idx = tables
                .payment_by_id(original_id)
                .expect("original row still present");
            tables.payments[idx].mark_refunded()?;
        }

        Ok(RefundOutcome {
            refund: refund.clone(),
            original_refunded,
        })
    }

    async fn refunded_total(&self, original_id: PaymentRecordId) -> Result<Decimal, DomainError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables.refunded_total(original_id))
    }
}
