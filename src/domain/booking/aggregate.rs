//! Booking monetary rollup aggregate.
//!
//! The payment core owns only the monetary fields of a booking: the total
//! `amount`, the cumulative `paid_amount`, and the derived `payment_status`.
//! Scheduling, customer, and waiver fields belong to the bookings
//! collaborator and are never touched here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{BookingId, DomainError, ErrorCode};

use super::status::BookingPaymentStatus;

/// The two booking kinds the core settles payments for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingKind {
    /// Individual open-play session booking.
    Session,
    /// Group party booking.
    Party,
}

impl BookingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingKind::Session => "session",
            BookingKind::Party => "party",
        }
    }

    /// Parses the wire/database form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "session" => Some(BookingKind::Session),
            "party" => Some(BookingKind::Party),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference to a booking: exactly one kind and its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingRef {
    pub kind: BookingKind,
    pub id: BookingId,
}

impl BookingRef {
    pub fn session(id: BookingId) -> Self {
        Self {
            kind: BookingKind::Session,
            id,
        }
    }

    pub fn party(id: BookingId) -> Self {
        Self {
            kind: BookingKind::Party,
            id,
        }
    }
}

impl std::fmt::Display for BookingRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} booking {}", self.kind.as_str(), self.id)
    }
}

/// Monetary rollup of a booking.
///
/// `amount` is immutable after creation. `paid_amount` and `payment_status`
/// are mutated exclusively through [`record_payment`](Booking::record_payment)
/// and [`record_refund`](Booking::record_refund), always inside the same
/// transaction as the triggering ledger write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub kind: BookingKind,
    /// Total due for the booking. Never changes here.
    pub amount: Decimal,
    /// Sum of all successful payments minus refunds.
    pub paid_amount: Decimal,
    pub payment_status: BookingPaymentStatus,
}

impl Booking {
    /// Creates a fresh, unpaid booking rollup.
    pub fn new(id: BookingId, kind: BookingKind, amount: Decimal) -> Self {
        Self {
            id,
            kind,
            amount,
            paid_amount: Decimal::ZERO,
            payment_status: BookingPaymentStatus::Pending,
        }
    }

    /// The reference for this booking.
    pub fn booking_ref(&self) -> BookingRef {
        BookingRef {
            kind: self.kind,
            id: self.id,
        }
    }

    /// Outstanding balance, floored at zero.
    pub fn remaining_balance(&self) -> Decimal {
        let remaining = self.amount - self.paid_amount;
        if remaining < Decimal::ZERO {
            Decimal::ZERO
        } else {
            remaining
        }
    }

    /// Credits a successful payment and recomputes the status.
    ///
    /// # Errors
    ///
    /// Rejects non-positive amounts; the ledger fixes a row's sign at
    /// creation, so a credit must always be positive.
    pub fn record_payment(&mut self, amount: Decimal) -> Result<(), DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::new(
                ErrorCode::InvalidAmount,
                format!("payment credit must be positive, got {}", amount),
            ));
        }

        self.paid_amount += amount;
        self.payment_status = if self.paid_amount >= self.amount {
            BookingPaymentStatus::Paid
        } else {
            BookingPaymentStatus::Partial
        };
        Ok(())
    }

    /// Debits a refund and recomputes the status.
    ///
    /// `paid_amount` is never allowed to go negative: a refund larger than
    /// the amount actually paid is rejected outright rather than clamped.
    pub fn record_refund(&mut self, amount: Decimal) -> Result<(), DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::new(
                ErrorCode::InvalidAmount,
                format!("refund debit must be positive, got {}", amount),
            ));
        }
        if amount > self.paid_amount {
            return Err(DomainError::new(
                ErrorCode::RefundExceedsRemainder,
                format!(
                    "refund of {} exceeds paid amount {}",
                    amount, self.paid_amount
                ),
            ));
        }

        self.paid_amount -= amount;
        self.payment_status = if self.paid_amount == Decimal::ZERO {
            BookingPaymentStatus::Refunded
        } else if self.paid_amount < self.amount {
            BookingPaymentStatus::Partial
        } else {
            BookingPaymentStatus::Paid
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn booking(amount: Decimal) -> Booking {
        Booking::new(BookingId::new(), BookingKind::Session, amount)
    }

    #[test]
    fn new_booking_is_pending_with_full_balance() {
        let b = booking(dec!(1000));
        assert_eq!(b.payment_status, BookingPaymentStatus::Pending);
        assert_eq!(b.paid_amount, Decimal::ZERO);
        assert_eq!(b.remaining_balance(), dec!(1000));
    }

    #[test]
    fn partial_payment_moves_to_partial() {
        let mut b = booking(dec!(1000));
        b.record_payment(dec!(500)).unwrap();
        assert_eq!(b.payment_status, BookingPaymentStatus::Partial);
        assert_eq!(b.paid_amount, dec!(500));
        assert_eq!(b.remaining_balance(), dec!(500));
    }

    #[test]
    fn full_payment_moves_to_paid() {
        let mut b = booking(dec!(1000));
        b.record_payment(dec!(500)).unwrap();
        b.record_payment(dec!(500)).unwrap();
        assert_eq!(b.payment_status, BookingPaymentStatus::Paid);
        assert_eq!(b.remaining_balance(), Decimal::ZERO);
    }

    #[test]
    fn overpayment_is_paid_with_zero_balance() {
        let mut b = booking(dec!(1000));
        b.record_payment(dec!(1000.50)).unwrap();
        assert_eq!(b.payment_status, BookingPaymentStatus::Paid);
        assert_eq!(b.remaining_balance(), Decimal::ZERO);
    }

    #[test]
    fn partial_refund_moves_back_to_partial() {
        let mut b = booking(dec!(1000));
        b.record_payment(dec!(500)).unwrap();
        b.record_refund(dec!(200)).unwrap();
        assert_eq!(b.paid_amount, dec!(300));
        assert_eq!(b.payment_status, BookingPaymentStatus::Partial);
    }

    #[test]
    fn full_refund_moves_to_refunded() {
        let mut b = booking(dec!(1000));
        b.record_payment(dec!(500)).unwrap();
        b.record_refund(dec!(500)).unwrap();
        assert_eq!(b.paid_amount, Decimal::ZERO);
        assert_eq!(b.payment_status, BookingPaymentStatus::Refunded);
    }

    #[test]
    fn refund_beyond_paid_amount_is_rejected_and_mutates_nothing() {
        let mut b = booking(dec!(1000));
        b.record_payment(dec!(500)).unwrap();
        let before = b.clone();

        let err = b.record_refund(dec!(600)).unwrap_err();
        assert_eq!(err.code, ErrorCode::RefundExceedsRemainder);
        assert_eq!(b, before);
    }

    #[test]
    fn non_positive_credit_is_rejected() {
        let mut b = booking(dec!(1000));
        assert!(b.record_payment(Decimal::ZERO).is_err());
        assert!(b.record_payment(dec!(-10)).is_err());
    }

    #[test]
    fn booking_kind_parses_wire_form() {
        assert_eq!(BookingKind::parse("session"), Some(BookingKind::Session));
        assert_eq!(BookingKind::parse("party"), Some(BookingKind::Party));
        assert_eq!(BookingKind::parse("manual"), None);
    }
}
