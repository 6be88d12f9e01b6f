//! GetPaymentStatusHandler - Query handler for a booking's payment position.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::booking::{Booking, BookingPaymentStatus, BookingRef};
use crate::domain::payment::{Payment, PaymentFlowError};
use crate::ports::{BookingStore, PaymentStore};

/// Query for the payment status of one booking.
#[derive(Debug, Clone, Copy)]
pub struct GetPaymentStatusQuery {
    pub booking_ref: BookingRef,
}

/// The booking rollup together with its full ledger history.
#[derive(Debug, Clone)]
pub struct BookingPaymentStatusReport {
    pub booking_ref: BookingRef,
    pub payment_status: BookingPaymentStatus,
    /// Total due for the booking.
    pub amount: Decimal,
    /// Net amount settled so far.
    pub paid_amount: Decimal,
    /// Outstanding balance, floored at zero.
    pub remaining_balance: Decimal,
    /// Every ledger row for the booking, most recent first. Includes
    /// CREATED, FAILED, and refund rows.
    pub payments: Vec<Payment>,
}

impl BookingPaymentStatusReport {
    fn from_parts(booking: &Booking, payments: Vec<Payment>) -> Self {
        Self {
            booking_ref: booking.booking_ref(),
            payment_status: booking.payment_status,
            amount: booking.amount,
            paid_amount: booking.paid_amount,
            remaining_balance: booking.remaining_balance(),
            payments,
        }
    }
}

/// Read-only handler; never mutates the ledger or the rollup.
pub struct GetPaymentStatusHandler {
    bookings: Arc<dyn BookingStore>,
    store: Arc<dyn PaymentStore>,
}

impl GetPaymentStatusHandler {
    pub fn new(bookings: Arc<dyn BookingStore>, store: Arc<dyn PaymentStore>) -> Self {
        Self { bookings, store }
    }

    pub async fn handle(
        &self,
        query: GetPaymentStatusQuery,
    ) -> Result<BookingPaymentStatusReport, PaymentFlowError> {
        let booking = self
            .bookings
            .find(&query.booking_ref)
            .await?
            .ok_or_else(|| PaymentFlowError::booking_not_found(query.booking_ref))?;

        let payments = self.store.list_for_booking(&query.booking_ref).await?;

        Ok(BookingPaymentStatusReport::from_parts(&booking, payments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::gateway::MockGateway;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::booking::BookingKind;
    use crate::domain::foundation::BookingId;
    use crate::domain::payment::PaymentState;
    use crate::ports::PaymentGateway;
    use rust_decimal_macros::dec;

    fn fixture() -> (Arc<InMemoryStore>, GetPaymentStatusHandler, Booking) {
        let store = Arc::new(InMemoryStore::new());
        let booking = Booking::new(BookingId::new(), BookingKind::Session, dec!(800.00));
        store.insert_booking(booking.clone());
        let handler = GetPaymentStatusHandler::new(store.clone(), store.clone());
        (store, handler, booking)
    }

    #[tokio::test]
    async fn fresh_booking_reports_pending_with_empty_ledger() {
        let (_store, handler, booking) = fixture();

        let report = handler
            .handle(GetPaymentStatusQuery {
                booking_ref: booking.booking_ref(),
            })
            .await
            .unwrap();

        assert_eq!(report.payment_status, BookingPaymentStatus::Pending);
        assert_eq!(report.amount, dec!(800.00));
        assert_eq!(report.paid_amount, Decimal::ZERO);
        assert_eq!(report.remaining_balance, dec!(800.00));
        assert!(report.payments.is_empty());
    }

    #[tokio::test]
    async fn report_includes_every_ledger_row() {
        let (store, handler, booking) = fixture();
        let gateway = MockGateway::new(store.clone(), "INR");

        let first = gateway.create_order(&booking, dec!(300.00)).await.unwrap();
        store
            .complete_payment(&first.order_id, "MOCK_PAY_1_AAAA1111", serde_json::json!({}))
            .await
            .unwrap();

        let second = gateway.create_order(&booking, dec!(200.00)).await.unwrap();
        store
            .fail_payment(&second.order_id, "card declined")
            .await
            .unwrap();

        let report = handler
            .handle(GetPaymentStatusQuery {
                booking_ref: booking.booking_ref(),
            })
            .await
            .unwrap();

        assert_eq!(report.payment_status, BookingPaymentStatus::Partial);
        assert_eq!(report.paid_amount, dec!(300.00));
        assert_eq!(report.remaining_balance, dec!(500.00));
        assert_eq!(report.payments.len(), 2);
        assert_eq!(report.payments[0].status, PaymentState::Failed);
        assert_eq!(report.payments[1].status, PaymentState::Success);
    }

    #[tokio::test]
    async fn ledger_is_ordered_most_recent_first() {
        let (store, handler, booking) = fixture();
        let gateway = MockGateway::new(store.clone(), "INR");

        let first = gateway.create_order(&booking, dec!(100.00)).await.unwrap();
        let second = gateway.create_order(&booking, dec!(200.00)).await.unwrap();

        let report = handler
            .handle(GetPaymentStatusQuery {
                booking_ref: booking.booking_ref(),
            })
            .await
            .unwrap();

        let order_ids: Vec<_> = report.payments.iter().map(|p| p.order_id.as_str()).collect();
        assert_eq!(order_ids, vec![second.order_id.as_str(), first.order_id.as_str()]);
    }

    #[tokio::test]
    async fn unknown_booking_is_not_found() {
        let (_store, handler, _booking) = fixture();

        let err = handler
            .handle(GetPaymentStatusQuery {
                booking_ref: BookingRef::party(BookingId::new()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentFlowError::BookingNotFound(_)));
    }

    #[tokio::test]
    async fn other_bookings_rows_are_excluded() {
        let (store, handler, booking) = fixture();
        let other = Booking::new(BookingId::new(), BookingKind::Party, dec!(500.00));
        store.insert_booking(other.clone());

        let gateway = MockGateway::new(store.clone(), "INR");
        gateway.create_order(&booking, dec!(100.00)).await.unwrap();
        gateway.create_order(&other, dec!(100.00)).await.unwrap();

        let report = handler
            .handle(GetPaymentStatusQuery {
                booking_ref: booking.booking_ref(),
            })
            .await
            .unwrap();
        assert_eq!(report.payments.len(), 1);
    }
}
