// src/db/payment_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::payment::Payment};

#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

const PAYMENT_COLUMNS: &str = "id, booking_id, estimated_amount, final_amount, actual_hours_used, \
     payment_method, transaction_id, status, created_at, updated_at";

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Created pending in the same transaction as its booking.
    pub async fn insert_pending<'e, E>(
        &self,
        executor: E,
        booking_id: Uuid,
        estimated_amount: Decimal,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "INSERT INTO payments (booking_id, estimated_amount)
             VALUES ($1, $2)
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(booking_id)
        .bind(estimated_amount)
        .fetch_one(executor)
        .await?;
        Ok(payment)
    }

    pub async fn find_by_booking(&self, booking_id: Uuid) -> Result<Option<Payment>, AppError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE booking_id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(payment)
    }

    // Exit settlement: writes the final figures inside the exit transaction.
    pub async fn settle<'e, E>(
        &self,
        executor: E,
        booking_id: Uuid,
        final_amount: Decimal,
        actual_hours_used: Decimal,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments
             SET final_amount = $2, actual_hours_used = $3,
                 status = 'completed', updated_at = now()
             WHERE booking_id = $1
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(booking_id)
        .bind(final_amount)
        .bind(actual_hours_used)
        .fetch_one(executor)
        .await?;
        Ok(payment)
    }

    // Payment confirmation from the client; stamps method and a synthetic
    // transaction id.
    pub async fn confirm(
        &self,
        booking_id: Uuid,
        payment_method: &str,
        transaction_id: &str,
    ) -> Result<Option<Payment>, AppError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments
             SET payment_method = $2, transaction_id = $3,
                 status = 'completed', updated_at = now()
             WHERE booking_id = $1
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(booking_id)
        .bind(payment_method)
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(payment)
    }
}
