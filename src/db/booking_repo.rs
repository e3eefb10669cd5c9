// src/db/booking_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        booking::{Booking, BookingWithDriver},
        space::SlotType,
    },
};

#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

const BOOKING_COLUMNS: &str = "id, driver_id, space_id, slot_id, start_time, end_time, \
     actual_entry_time, actual_exit_time, estimated_amount, final_amount, status, \
     otp_entry, otp_exit, otp_entry_verified, otp_exit_verified, otp_expires_at, \
     created_at, updated_at";

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert<'e, E>(
        &self,
        executor: E,
        driver_id: Uuid,
        space_id: Uuid,
        slot_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        estimated_amount: Decimal,
        otp_entry: &str,
        otp_exit: &str,
        otp_expires_at: DateTime<Utc>,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "INSERT INTO bookings
                 (driver_id, space_id, slot_id, start_time, end_time,
                  estimated_amount, otp_entry, otp_exit, otp_expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(driver_id)
        .bind(space_id)
        .bind(slot_id)
        .bind(start_time)
        .bind(end_time)
        .bind(estimated_amount)
        .bind(otp_entry)
        .bind(otp_exit)
        .bind(otp_expires_at)
        .fetch_one(executor)
        .await?;
        Ok(booking)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(booking)
    }

    // Transition reads lock the booking row so two concurrent verifications
    // serialize instead of double-applying.
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(booking)
    }

    pub async fn list(
        &self,
        driver_id: Option<Uuid>,
        space_id: Option<Uuid>,
    ) -> Result<Vec<BookingWithDriver>, AppError> {
        let bookings = sqlx::query_as::<_, BookingWithDriver>(
            "SELECT b.id, b.driver_id, b.space_id, b.slot_id, b.start_time, b.end_time,
                    b.actual_entry_time, b.actual_exit_time, b.estimated_amount,
                    b.final_amount, b.status, b.otp_entry, b.otp_exit,
                    b.otp_entry_verified, b.otp_exit_verified, b.otp_expires_at,
                    b.created_at, b.updated_at,
                    u.full_name AS driver_name, u.email AS driver_email
             FROM bookings b
             JOIN users u ON u.id = b.driver_id
             WHERE ($1::uuid IS NULL OR b.driver_id = $1)
               AND ($2::uuid IS NULL OR b.space_id = $2)
             ORDER BY b.created_at DESC",
        )
        .bind(driver_id)
        .bind(space_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    pub async fn apply_entry<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        entry_time: DateTime<Utc>,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "UPDATE bookings
             SET status = 'active', otp_entry_verified = TRUE,
                 actual_entry_time = $2, updated_at = now()
             WHERE id = $1
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .bind(entry_time)
        .fetch_one(executor)
        .await?;
        Ok(booking)
    }

    pub async fn apply_exit<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        exit_time: DateTime<Utc>,
        final_amount: Decimal,
        otp_verified: bool,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "UPDATE bookings
             SET status = 'completed', otp_exit_verified = $4,
                 actual_exit_time = $2, final_amount = $3, updated_at = now()
             WHERE id = $1
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .bind(exit_time)
        .bind(final_amount)
        .bind(otp_verified)
        .fetch_one(executor)
        .await?;
        Ok(booking)
    }

    pub async fn apply_cancel<'e, E>(&self, executor: E, id: Uuid) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "UPDATE bookings
             SET status = 'cancelled', updated_at = now()
             WHERE id = $1
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(booking)
    }

    // Earliest scheduled end among bookings still holding a slot, used to
    // predict when the next slot frees up.
    pub async fn earliest_busy_end(
        &self,
        space_id: Uuid,
        slot_type: Option<SlotType>,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
            "SELECT MIN(b.end_time)
             FROM bookings b
             JOIN slot_groups sg ON sg.id = b.slot_id
             WHERE b.space_id = $1
               AND b.status IN ('pending', 'active')
               AND ($2::slot_type IS NULL OR sg.slot_type = $2)
             HAVING MIN(b.end_time) IS NOT NULL",
        )
        .bind(space_id)
        .bind(slot_type)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(t,)| t))
    }
}
