//! PostgreSQL implementation of the PaymentStore port.
//!
//! The ledger is append-only: rows are inserted once and only their status
//! (plus the provider payload captured at completion) is ever updated. All
//! multi-row operations run in a transaction with the affected rows locked
//! via SELECT ... FOR UPDATE.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::booking::{Booking, BookingKind, BookingRef};
use crate::domain::foundation::{DomainError, ErrorCode, PaymentRecordId, Timestamp};
use crate::domain::payment::{Payment, PaymentProvider, PaymentState};
use crate::ports::{CompletionOutcome, PaymentStore, RefundOutcome};

use super::booking_store::{fetch_booking_for_update, update_rollup};

/// PostgreSQL implementation of the PaymentStore port.
pub struct PostgresPaymentStore {
    pool: PgPool,
}

impl PostgresPaymentStore {
    /// Creates a new PostgresPaymentStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a ledger entry.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_type: String,
    booking_id: Uuid,
    provider: String,
    order_id: String,
    provider_payment_id: Option<String>,
    amount: Decimal,
    currency: String,
    status: String,
    provider_response: Option<serde_json::Value>,
    notes: Option<String>,
    refund_of: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let kind = BookingKind::parse(&row.booking_type).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid booking_type value: {}", row.booking_type),
            )
        })?;
        let provider = PaymentProvider::parse(&row.provider).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid provider value: {}", row.provider),
            )
        })?;
        let status = PaymentState::parse(&row.status).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid status value: {}", row.status),
            )
        })?;

        Ok(Payment {
            id: PaymentRecordId::from_uuid(row.id),
            booking_ref: BookingRef {
                kind,
                id: crate::domain::foundation::BookingId::from_uuid(row.booking_id),
            },
            provider,
            order_id: row.order_id,
            provider_payment_id: row.provider_payment_id,
            amount: row.amount,
            currency: row.currency,
            status,
            provider_response: row.provider_response,
            notes: row.notes,
            refund_of: row.refund_of.map(PaymentRecordId::from_uuid),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_COLUMNS: &str = "id, booking_type, booking_id, provider, order_id, \
     provider_payment_id, amount, currency, status, provider_response, notes, \
     refund_of, created_at, updated_at";

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

async fn insert_row(
    tx: &mut Transaction<'_, Postgres>,
    payment: &Payment,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO payments (
            id, booking_type, booking_id, provider, order_id, provider_payment_id,
            amount, currency, status, provider_response, notes, refund_of,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(payment.id.as_uuid())
    .bind(payment.booking_ref.kind.as_str())
    .bind(payment.booking_ref.id.as_uuid())
    .bind(payment.provider.as_str())
    .bind(&payment.order_id)
    .bind(&payment.provider_payment_id)
    .bind(payment.amount)
    .bind(&payment.currency)
    .bind(payment.status.as_str())
    .bind(&payment.provider_response)
    .bind(&payment.notes)
    .bind(payment.refund_of.map(|id| *id.as_uuid()))
    .bind(payment.created_at.as_datetime())
    .bind(payment.updated_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.constraint() == Some("payments_order_id_key") {
                return DomainError::new(
                    ErrorCode::DuplicateOrderId,
                    format!("order id {} already exists", payment.order_id),
                );
            }
        }
        db_error("Failed to insert payment", e)
    })?;

    Ok(())
}

/// Locks a ledger row by order id inside the transaction.
async fn fetch_by_order_id_for_update(
    tx: &mut Transaction<'_, Postgres>,
    order_id: &str,
) -> Result<Payment, DomainError> {
    let row: Option<PaymentRow> = sqlx::query_as(&format!(
        "SELECT {} FROM payments WHERE order_id = $1 FOR UPDATE",
        SELECT_COLUMNS
    ))
    .bind(order_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to lock payment", e))?;

    row.map(Payment::try_from).transpose()?.ok_or_else(|| {
        DomainError::new(
            ErrorCode::PaymentNotFound,
            format!("no payment with order id {}", order_id),
        )
    })
}

async fn fetch_by_id_for_update(
    tx: &mut Transaction<'_, Postgres>,
    id: PaymentRecordId,
) -> Result<Payment, DomainError> {
    let row: Option<PaymentRow> = sqlx::query_as(&format!(
        "SELECT {} FROM payments WHERE id = $1 FOR UPDATE",
        SELECT_COLUMNS
    ))
    .bind(id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to lock payment", e))?;

    row.map(Payment::try_from).transpose()?.ok_or_else(|| {
        DomainError::new(
            ErrorCode::PaymentNotFound,
            format!("no payment with id {}", id),
        )
    })
}

/// Persists a status flip, together with the fields the transition touched.
async fn update_status(
    tx: &mut Transaction<'_, Postgres>,
    payment: &Payment,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        UPDATE payments SET
            status = $2,
            provider_payment_id = $3,
            provider_response = $4,
            notes = $5,
            updated_at = $6
        WHERE id = $1
        "#,
    )
    .bind(payment.id.as_uuid())
    .bind(payment.status.as_str())
    .bind(&payment.provider_payment_id)
    .bind(&payment.provider_response)
    .bind(&payment.notes)
    .bind(payment.updated_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to update payment", e))?;

    Ok(())
}

async fn refunded_total_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    original_id: PaymentRecordId,
) -> Result<Decimal, DomainError> {
    let (total,): (Decimal,) =
        sqlx::query_as("SELECT COALESCE(SUM(-amount), 0) FROM payments WHERE refund_of = $1")
            .bind(original_id.as_uuid())
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| db_error("Failed to sum refunds", e))?;

    Ok(total)
}

#[async_trait]
impl PaymentStore for PostgresPaymentStore {
    async fn insert(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;
        insert_row(&mut tx, payment).await?;
        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit", e))?;
        Ok(())
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE order_id = $1",
            SELECT_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find payment", e))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_id(&self, id: PaymentRecordId) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find payment", e))?;

        row.map(Payment::try_from).transpose()
    }

    async fn list_for_booking(&self, booking: &BookingRef) -> Result<Vec<Payment>, DomainError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments \
             WHERE booking_type = $1 AND booking_id = $2 \
             ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(booking.kind.as_str())
        .bind(booking.id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list payments", e))?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn complete_payment(
        &self,
        order_id: &str,
        provider_payment_id: &str,
        provider_response: serde_json::Value,
    ) -> Result<CompletionOutcome, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let mut payment = fetch_by_order_id_for_update(&mut tx, order_id).await?;

        match payment.status {
            PaymentState::Created => {}
            PaymentState::Success => {
                // A concurrent verification already won the row lock race.
                tx.rollback()
                    .await
                    .map_err(|e| db_error("Failed to rollback", e))?;
                return Ok(CompletionOutcome::AlreadyCompleted(payment));
            }
            other => {
                return Err(DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    format!("cannot complete payment in state {}", other),
                ));
            }
        }

        let mut booking: Booking =
            fetch_booking_for_update(&mut tx, &payment.booking_ref).await?;
        booking.record_payment(payment.amount)?;
        update_rollup(&mut tx, &booking).await?;

        payment.mark_success(provider_payment_id, Some(provider_response))?;
        update_status(&mut tx, &payment).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit", e))?;

        Ok(CompletionOutcome::Completed(payment))
    }

    async fn fail_payment(&self, order_id: &str, reason: &str) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let mut payment = fetch_by_order_id_for_update(&mut tx, order_id).await?;

        // Failure marking never overwrites a finished transition.
        if payment.status != PaymentState::Created {
            tx.rollback()
                .await
                .map_err(|e| db_error("Failed to rollback", e))?;
            return Ok(());
        }

        payment.mark_failed(reason)?;
        update_status(&mut tx, &payment).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit", e))?;
        Ok(())
    }

    async fn record_refund(
        &self,
        original_id: PaymentRecordId,
        refund: &Payment,
    ) -> Result<RefundOutcome, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let mut original = fetch_by_id_for_update(&mut tx, original_id).await?;

        if original.status != PaymentState::Success {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("cannot refund payment in state {}", original.status),
            ));
        }

        // Re-check the remainder under the row lock. The handler checked it
        // already, but a concurrent refund may have landed in between.
        let refund_amount = refund.amount.abs();
        let remainder = original.amount - refunded_total_in_tx(&mut tx, original_id).await?;
        if refund_amount > remainder {
            return Err(DomainError::new(
                ErrorCode::RefundExceedsRemainder,
                format!(
                    "refund of {} exceeds refundable remainder {}",
                    refund_amount, remainder
                ),
            ));
        }

        let mut booking: Booking =
            fetch_booking_for_update(&mut tx, &original.booking_ref).await?;
        booking.record_refund(refund_amount)?;
        update_rollup(&mut tx, &booking).await?;

        insert_row(&mut tx, refund).await?;

        let original_refunded = refund_amount == remainder;
        if original_refunded {
            original.mark_refunded()?;
            update_status(&mut tx, &original).await?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit", e))?;

        Ok(RefundOutcome {
            refund: refund.clone(),
            original_refunded,
        })
    }

    async fn refunded_total(&self, original_id: PaymentRecordId) -> Result<Decimal, DomainError> {
        let (total,): (Decimal,) =
            sqlx::query_as("SELECT COALESCE(SUM(-amount), 0) FROM payments WHERE refund_of = $1")
                .bind(original_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| db_error("Failed to sum refunds", e))?;

        Ok(total)
    }
}
