//! End-to-end payment flow tests.
//!
//! These exercise the full order -> verify -> refund pipeline through the
//! application handlers, against the in-memory store and the mock gateway.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use parkpay::adapters::gateway::MockGateway;
use parkpay::adapters::memory::InMemoryStore;
use parkpay::adapters::notify::TracingNotifier;
use parkpay::application::handlers::payments::{
    CreatePaymentOrderCommand, CreatePaymentOrderHandler, GetPaymentStatusHandler,
    GetPaymentStatusQuery, ProcessRefundCommand, ProcessRefundHandler, VerifyPaymentCommand,
    VerifyPaymentHandler,
};
use parkpay::config::FeatureFlags;
use parkpay::domain::booking::{Booking, BookingKind, BookingPaymentStatus};
use parkpay::domain::foundation::BookingId;
use parkpay::domain::payment::{PaymentFlowError, PaymentState};
use parkpay::ports::{PaymentStore, VerificationData};

struct Harness {
    store: Arc<InMemoryStore>,
    create: CreatePaymentOrderHandler,
    // Arc so concurrency tests can clone handlers into spawned tasks.
    verify: Arc<VerifyPaymentHandler>,
    refund: Arc<ProcessRefundHandler>,
    status: GetPaymentStatusHandler,
    booking: Booking,
}

fn harness(kind: BookingKind, amount: Decimal) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let booking = Booking::new(BookingId::new(), kind, amount);
    store.insert_booking(booking.clone());

    let gateway = Arc::new(MockGateway::new(store.clone(), "INR"));
    let notifier = Arc::new(TracingNotifier::new());

    Harness {
        create: CreatePaymentOrderHandler::new(
            store.clone(),
            gateway.clone(),
            FeatureFlags::default(),
        ),
        verify: Arc::new(VerifyPaymentHandler::new(
            store.clone(),
            store.clone(),
            gateway.clone(),
            notifier.clone(),
        )),
        refund: Arc::new(ProcessRefundHandler::new(
            store.clone(),
            store.clone(),
            gateway,
            notifier,
        )),
        status: GetPaymentStatusHandler::new(store.clone(), store.clone()),
        store,
        booking,
    }
}

fn verify_cmd(order_id: &str) -> VerifyPaymentCommand {
    VerifyPaymentCommand {
        data: VerificationData {
            order_id: order_id.to_string(),
            ..Default::default()
        },
    }
}

async fn status_of(h: &Harness) -> (BookingPaymentStatus, Decimal, Decimal) {
    let report = h
        .status
        .handle(GetPaymentStatusQuery {
            booking_ref: h.booking.booking_ref(),
        })
        .await
        .unwrap();
    (
        report.payment_status,
        report.paid_amount,
        report.remaining_balance,
    )
}

#[tokio::test]
async fn full_payment_in_one_installment() {
    let h = harness(BookingKind::Session, dec!(800.00));

    let order = h
        .create
        .handle(CreatePaymentOrderCommand {
            booking_ref: h.booking.booking_ref(),
            amount: None,
        })
        .await
        .unwrap();
    assert_eq!(order.amount, dec!(800.00));
    assert!(order.order_id.starts_with("MOCK_ORDER_"));

    let result = h.verify.handle(verify_cmd(&order.order_id)).await.unwrap();
    assert!(result.verified);
    assert!(result.newly_completed);
    assert_eq!(result.payment.status, PaymentState::Success);
    assert_eq!(result.booking.payment_status, BookingPaymentStatus::Paid);
    assert_eq!(result.booking.remaining_balance(), Decimal::ZERO);

    let (status, paid, remaining) = status_of(&h).await;
    assert_eq!(status, BookingPaymentStatus::Paid);
    assert_eq!(paid, dec!(800.00));
    assert_eq!(remaining, Decimal::ZERO);
}

#[tokio::test]
async fn two_installments_settle_the_booking() {
    let h = harness(BookingKind::Party, dec!(1000.00));

    let first = h
        .create
        .handle(CreatePaymentOrderCommand {
            booking_ref: h.booking.booking_ref(),
            amount: Some(dec!(400.00)),
        })
        .await
        .unwrap();
    h.verify.handle(verify_cmd(&first.order_id)).await.unwrap();

    let (status, _, remaining) = status_of(&h).await;
    assert_eq!(status, BookingPaymentStatus::Partial);
    assert_eq!(remaining, dec!(600.00));

    // Second installment defaults to the remaining balance and has no
    // deposit floor.
    let second = h
        .create
        .handle(CreatePaymentOrderCommand {
            booking_ref: h.booking.booking_ref(),
            amount: None,
        })
        .await
        .unwrap();
    assert_eq!(second.amount, dec!(600.00));
    h.verify.handle(verify_cmd(&second.order_id)).await.unwrap();

    let (status, paid, remaining) = status_of(&h).await;
    assert_eq!(status, BookingPaymentStatus::Paid);
    assert_eq!(paid, dec!(1000.00));
    assert_eq!(remaining, Decimal::ZERO);
}

#[tokio::test]
async fn failed_verification_marks_the_row_and_leaves_the_rollup() {
    let h = harness(BookingKind::Session, dec!(500.00));

    let order = h
        .create
        .handle(CreatePaymentOrderCommand {
            booking_ref: h.booking.booking_ref(),
            amount: None,
        })
        .await
        .unwrap();

    let result = h
        .verify
        .handle(VerifyPaymentCommand {
            data: VerificationData {
                order_id: order.order_id.clone(),
                force_fail: true,
                ..Default::default()
            },
        })
        .await
        .unwrap();
    assert!(!result.verified);
    assert_eq!(result.payment.status, PaymentState::Failed);

    let (status, paid, _) = status_of(&h).await;
    assert_eq!(status, BookingPaymentStatus::Pending);
    assert_eq!(paid, Decimal::ZERO);

    // The booking can still be paid with a fresh order.
    let retry = h
        .create
        .handle(CreatePaymentOrderCommand {
            booking_ref: h.booking.booking_ref(),
            amount: None,
        })
        .await
        .unwrap();
    h.verify.handle(verify_cmd(&retry.order_id)).await.unwrap();

    let (status, paid, _) = status_of(&h).await;
    assert_eq!(status, BookingPaymentStatus::Paid);
    assert_eq!(paid, dec!(500.00));
}

#[tokio::test]
async fn replayed_callback_credits_only_once() {
    let h = harness(BookingKind::Session, dec!(300.00));

    let order = h
        .create
        .handle(CreatePaymentOrderCommand {
            booking_ref: h.booking.booking_ref(),
            amount: None,
        })
        .await
        .unwrap();

    let first = h.verify.handle(verify_cmd(&order.order_id)).await.unwrap();
    let second = h.verify.handle(verify_cmd(&order.order_id)).await.unwrap();
    assert!(first.newly_completed);
    assert!(second.verified);
    assert!(!second.newly_completed);

    let (_, paid, _) = status_of(&h).await;
    assert_eq!(paid, dec!(300.00));
}

#[tokio::test]
async fn concurrent_callbacks_pick_exactly_one_winner() {
    let h = harness(BookingKind::Party, dec!(1000.00));

    let order = h
        .create
        .handle(CreatePaymentOrderCommand {
            booking_ref: h.booking.booking_ref(),
            amount: None,
        })
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let verify = h.verify.clone();
        let order_id = order.order_id.clone();
        handles.push(tokio::spawn(async move {
            verify.handle(verify_cmd(&order_id)).await.unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.verified);
        if result.newly_completed {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    let report = h
        .status
        .handle(GetPaymentStatusQuery {
            booking_ref: h.booking.booking_ref(),
        })
        .await
        .unwrap();
    assert_eq!(report.paid_amount, dec!(1000.00));
    assert_eq!(report.payments.len(), 1);
}

#[tokio::test]
async fn refund_cycle_ends_in_refunded_status() {
    let h = harness(BookingKind::Party, dec!(1000.00));

    let order = h
        .create
        .handle(CreatePaymentOrderCommand {
            booking_ref: h.booking.booking_ref(),
            amount: None,
        })
        .await
        .unwrap();
    h.verify.handle(verify_cmd(&order.order_id)).await.unwrap();

    let partial = h
        .refund
        .handle(ProcessRefundCommand {
            payment_id: order.payment_record_id,
            amount: Some(dec!(300.00)),
            reason: Some("one guest cancelled".to_string()),
        })
        .await
        .unwrap();
    assert!(!partial.original_refunded);
    assert_eq!(partial.booking.paid_amount, dec!(700.00));

    let (status, paid, _) = status_of(&h).await;
    assert_eq!(status, BookingPaymentStatus::Partial);
    assert_eq!(paid, dec!(700.00));

    let rest = h
        .refund
        .handle(ProcessRefundCommand {
            payment_id: order.payment_record_id,
            amount: None,
            reason: None,
        })
        .await
        .unwrap();
    assert!(rest.original_refunded);
    assert_eq!(rest.refund.amount, dec!(-700.00));
    assert_eq!(rest.booking.payment_status, BookingPaymentStatus::Refunded);

    let (status, paid, _) = status_of(&h).await;
    assert_eq!(status, BookingPaymentStatus::Refunded);
    assert_eq!(paid, Decimal::ZERO);

    let original = h
        .store
        .find_by_order_id(&order.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(original.status, PaymentState::Refunded);
}

#[tokio::test]
async fn concurrent_refunds_never_exceed_the_original() {
    let h = harness(BookingKind::Session, dec!(600.00));

    let order = h
        .create
        .handle(CreatePaymentOrderCommand {
            booking_ref: h.booking.booking_ref(),
            amount: None,
        })
        .await
        .unwrap();
    h.verify.handle(verify_cmd(&order.order_id)).await.unwrap();

    // Six concurrent refunds of 200 against a 600 payment; at most three
    // can land.
    let mut handles = Vec::new();
    for _ in 0..6 {
        let refund = h.refund.clone();
        let payment_id = order.payment_record_id;
        handles.push(tokio::spawn(async move {
            refund
                .handle(ProcessRefundCommand {
                    payment_id,
                    amount: Some(dec!(200.00)),
                    reason: None,
                })
                .await
        }));
    }

    let mut landed = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            landed += 1;
        }
    }
    assert_eq!(landed, 3);

    let original = h
        .store
        .find_by_order_id(&order.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        h.store.refunded_total(original.id).await.unwrap(),
        dec!(600.00)
    );

    let (status, paid, _) = status_of(&h).await;
    assert_eq!(status, BookingPaymentStatus::Refunded);
    assert_eq!(paid, Decimal::ZERO);
}

#[tokio::test]
async fn overpayment_within_tolerance_is_accepted() {
    let h = harness(BookingKind::Session, dec!(499.60));

    let order = h
        .create
        .handle(CreatePaymentOrderCommand {
            booking_ref: h.booking.booking_ref(),
            amount: Some(dec!(500.00)),
        })
        .await
        .unwrap();
    h.verify.handle(verify_cmd(&order.order_id)).await.unwrap();

    let (status, _, remaining) = status_of(&h).await;
    assert_eq!(status, BookingPaymentStatus::Paid);
    assert_eq!(remaining, Decimal::ZERO);
}

#[tokio::test]
async fn fully_paid_booking_rejects_new_orders() {
    let h = harness(BookingKind::Session, dec!(200.00));

    let order = h
        .create
        .handle(CreatePaymentOrderCommand {
            booking_ref: h.booking.booking_ref(),
            amount: None,
        })
        .await
        .unwrap();
    h.verify.handle(verify_cmd(&order.order_id)).await.unwrap();

    let err = h
        .create
        .handle(CreatePaymentOrderCommand {
            booking_ref: h.booking.booking_ref(),
            amount: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PaymentFlowError::ExceedsRemainingBalance { .. }
    ));
}
