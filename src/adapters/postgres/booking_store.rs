//! PostgreSQL implementation of the BookingStore port.
//!
//! Session and party bookings live in separate tables with an identical
//! monetary column set, so the kind picks the table and everything else is
//! shared. Table names are compile-time constants, never user input.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::booking::{Booking, BookingKind, BookingPaymentStatus, BookingRef};
use crate::domain::foundation::{BookingId, DomainError, ErrorCode};
use crate::ports::BookingStore;

/// PostgreSQL implementation of the BookingStore port.
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Creates a new PostgresBookingStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Monetary columns of a booking row. Scheduling and customer columns are
/// owned by the bookings collaborator and never read here.
#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    amount: Decimal,
    paid_amount: Decimal,
    payment_status: String,
}

fn row_into_booking(row: BookingRow, kind: BookingKind) -> Result<Booking, DomainError> {
    let payment_status = BookingPaymentStatus::parse(&row.payment_status).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid payment_status value: {}", row.payment_status),
        )
    })?;

    Ok(Booking {
        id: BookingId::from_uuid(row.id),
        kind,
        amount: row.amount,
        paid_amount: row.paid_amount,
        payment_status,
    })
}

pub(super) fn rollup_table(kind: BookingKind) -> &'static str {
    match kind {
        BookingKind::Session => "session_bookings",
        BookingKind::Party => "party_bookings",
    }
}

/// Locks a booking's monetary row inside the transaction.
pub(super) async fn fetch_booking_for_update(
    tx: &mut Transaction<'_, Postgres>,
    booking: &BookingRef,
) -> Result<Booking, DomainError> {
    let row: Option<BookingRow> = sqlx::query_as(&format!(
        "SELECT id, amount, paid_amount, payment_status FROM {} WHERE id = $1 FOR UPDATE",
        rollup_table(booking.kind)
    ))
    .bind(booking.id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| {
        DomainError::new(ErrorCode::DatabaseError, format!("Failed to lock booking: {}", e))
    })?;

    row.map(|r| row_into_booking(r, booking.kind))
        .transpose()?
        .ok_or_else(|| {
            DomainError::new(
                ErrorCode::BookingNotFound,
                format!("no booking for {}", booking),
            )
        })
}

/// Writes back the rollup after a credit or debit.
pub(super) async fn update_rollup(
    tx: &mut Transaction<'_, Postgres>,
    booking: &Booking,
) -> Result<(), DomainError> {
    let result = sqlx::query(&format!(
        "UPDATE {} SET paid_amount = $2, payment_status = $3, updated_at = $4 WHERE id = $1",
        rollup_table(booking.kind)
    ))
    .bind(booking.id.as_uuid())
    .bind(booking.paid_amount)
    .bind(booking.payment_status.as_str())
    .bind(Utc::now())
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        DomainError::new(ErrorCode::DatabaseError, format!("Failed to update booking: {}", e))
    })?;

    if result.rows_affected() == 0 {
        return Err(DomainError::new(
            ErrorCode::BookingNotFound,
            format!("no booking for {}", booking.booking_ref()),
        ));
    }

    Ok(())
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    async fn find(&self, booking: &BookingRef) -> Result<Option<Booking>, DomainError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT id, amount, paid_amount, payment_status FROM {} WHERE id = $1",
            rollup_table(booking.kind)
        ))
        .bind(booking.id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find booking: {}", e))
        })?;

        row.map(|r| row_into_booking(r, booking.kind)).transpose()
    }
}
