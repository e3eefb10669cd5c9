// src/services/booking.rs
//
// Drives a booking through pending -> active -> completed (or cancelled).
// Every transition runs in one transaction that also moves the slot
// group's availability counter, so a crash or a concurrent request can
// never leave a booking and its slot out of step.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, Rng};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        BookingRepository, ManagerRepository, PaymentRepository, SlotRepository, SpaceRepository,
        UserRepository,
    },
    models::{
        auth::{User, UserRole},
        booking::{Booking, BookingStatus, BookingWithDriver, Settlement, TransitionKind},
        payment::Payment,
        space::SlotType,
    },
    services::{allocation, pricing},
};

const DEFAULT_BOOKING_HOURS: i64 = 2;

// Entry OTP stays valid for a grace period past the booked window; the exit
// OTP never expires (the vehicle must always be able to leave).
const OTP_GRACE_HOURS: i64 = 1;

// Buffer added after the earliest booked exit when predicting the next
// free slot.
const NEXT_SLOT_BUFFER_MINUTES: i64 = 15;

#[derive(Clone)]
pub struct BookingService {
    booking_repo: BookingRepository,
    slot_repo: SlotRepository,
    space_repo: SpaceRepository,
    payment_repo: PaymentRepository,
    user_repo: UserRepository,
    manager_repo: ManagerRepository,
    pool: sqlx::PgPool,
}

impl BookingService {
    pub fn new(
        booking_repo: BookingRepository,
        slot_repo: SlotRepository,
        space_repo: SpaceRepository,
        payment_repo: PaymentRepository,
        user_repo: UserRepository,
        manager_repo: ManagerRepository,
        pool: sqlx::PgPool,
    ) -> Self {
        Self {
            booking_repo,
            slot_repo,
            space_repo,
            payment_repo,
            user_repo,
            manager_repo,
            pool,
        }
    }

    // Creates a pending booking: allocates a slot, decrements its
    // availability and opens the linked payment, all in one transaction.
    pub async fn create_booking(
        &self,
        driver_id: Uuid,
        space_id: Uuid,
        slot_id: Option<Uuid>,
        slot_type: Option<SlotType>,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    ) -> Result<(Booking, Payment), AppError> {
        let profile = self
            .user_repo
            .find_profile_by_user(driver_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Driver profile".into()))?;
        if !profile.can_book {
            return Err(AppError::Forbidden(
                "Complete your driver profile before booking.".into(),
            ));
        }

        let space = self
            .space_repo
            .find_by_id(space_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Parking space".into()))?;
        if !space.is_active {
            return Err(AppError::Conflict("This parking space is not active.".into()));
        }

        let start = start_time.unwrap_or_else(Utc::now);
        let end = end_time.unwrap_or(start + Duration::hours(DEFAULT_BOOKING_HOURS));
        if end <= start {
            return Err(AppError::InvalidState(
                "Booking end time must be after its start time.".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        // Lock the slot row(s) first; the decrement below then cannot race
        // another booking for the last free slot.
        let slot = match slot_id {
            Some(id) => {
                let slot = self
                    .slot_repo
                    .find_by_id_for_update(&mut *tx, id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Slot group".into()))?;
                if slot.space_id != space_id {
                    return Err(AppError::Conflict(
                        "Slot group does not belong to this space.".into(),
                    ));
                }
                if !slot.is_available || slot.available_count == 0 {
                    return Err(AppError::Conflict("This slot group has no free slots.".into()));
                }
                slot
            }
            None => {
                let candidates = self
                    .slot_repo
                    .list_candidates_for_update(&mut *tx, space_id, slot_type)
                    .await?;
                allocation::choose_slot(&candidates, slot_type)?
            }
        };

        let estimated_amount = pricing::estimate(slot.hourly_rate, start, end);
        let otp_entry = generate_otp();
        let otp_exit = generate_otp();

        let booking = self
            .booking_repo
            .insert(
                &mut *tx,
                driver_id,
                space_id,
                slot.id,
                start,
                end,
                estimated_amount,
                &otp_entry,
                &otp_exit,
                end + Duration::hours(OTP_GRACE_HOURS),
            )
            .await?;

        self.slot_repo.set_available(&mut *tx, slot.id, slot.available_count - 1).await?;

        let payment = self
            .payment_repo
            .insert_pending(&mut *tx, booking.id, estimated_amount)
            .await?;

        tx.commit().await?;

        tracing::info!(booking_id = %booking.id, slot_id = %slot.id, "booking created");
        Ok((booking, payment))
    }

    // Single tagged-transition entry point for both lifecycle gates.
    pub async fn transition(
        &self,
        user: &User,
        booking_id: Uuid,
        kind: TransitionKind,
        otp: Option<&str>,
    ) -> Result<(Booking, Option<Settlement>), AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Row lock: concurrent verifications of the same booking serialize
        // here, and the loser sees the already-applied status.
        let booking = self
            .booking_repo
            .find_by_id_for_update(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking".into()))?;

        self.authorize_operator(user, &booking).await?;

        match kind {
            TransitionKind::Entry => {
                let otp =
                    otp.ok_or_else(|| AppError::ValidationError(required_field_error("otp")))?;
                check_entry(&booking, otp, now)?;

                let updated = self.booking_repo.apply_entry(&mut *tx, booking.id, now).await?;
                tx.commit().await?;
                Ok((updated, None))
            }
            TransitionKind::Exit => {
                check_exit(&booking, otp)?;

                // Settlement uses the slot group's current rate; lock it
                // because we hand the slot back below.
                let slot = self
                    .slot_repo
                    .find_by_id_for_update(&mut *tx, booking.slot_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Slot group".into()))?;

                let settlement = pricing::settle_final(
                    slot.hourly_rate,
                    booking.start_time,
                    booking.end_time,
                    booking.actual_entry_time,
                    now,
                )?;

                let updated = self
                    .booking_repo
                    .apply_exit(&mut *tx, booking.id, now, settlement.final_amount, otp.is_some())
                    .await?;
                self.payment_repo
                    .settle(&mut *tx, booking.id, settlement.final_amount, settlement.actual_hours)
                    .await?;
                self.slot_repo
                    .set_available(
                        &mut *tx,
                        booking.slot_id,
                        released_count(slot.available_count, slot.total_count),
                    )
                    .await?;

                tx.commit().await?;
                tracing::info!(
                    booking_id = %booking.id,
                    final_amount = %settlement.final_amount,
                    overtime_hours = %settlement.overtime_hours,
                    "booking settled"
                );
                Ok((updated, Some(settlement)))
            }
        }
    }

    // Drivers may drop a booking they never entered; the slot goes back to
    // the pool in the same transaction.
    pub async fn cancel(&self, driver_id: Uuid, booking_id: Uuid) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;

        let booking = self
            .booking_repo
            .find_by_id_for_update(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking".into()))?;
        if booking.driver_id != driver_id {
            return Err(AppError::Forbidden("This booking belongs to another driver.".into()));
        }
        if booking.status != BookingStatus::Pending {
            return Err(AppError::InvalidState(
                "Only a pending booking can be cancelled.".into(),
            ));
        }

        let slot = self
            .slot_repo
            .find_by_id_for_update(&mut *tx, booking.slot_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Slot group".into()))?;

        let cancelled = self.booking_repo.apply_cancel(&mut *tx, booking.id).await?;
        self.slot_repo
            .set_available(&mut *tx, booking.slot_id, released_count(slot.available_count, slot.total_count))
            .await?;
        tx.commit().await?;
        Ok(cancelled)
    }

    pub async fn list(
        &self,
        driver_id: Option<Uuid>,
        space_id: Option<Uuid>,
    ) -> Result<Vec<BookingWithDriver>, AppError> {
        self.booking_repo.list(driver_id, space_id).await
    }

    // When the next slot of this type frees up: now if one is free, else
    // the earliest booked exit plus a fixed buffer.
    pub async fn next_available(
        &self,
        space_id: Uuid,
        slot_type: Option<SlotType>,
    ) -> Result<DateTime<Utc>, AppError> {
        let groups = self.slot_repo.list_by_space(space_id).await?;
        let relevant: Vec<_> = groups
            .iter()
            .filter(|g| slot_type.map_or(true, |t| g.slot_type == t))
            .collect();
        if relevant.is_empty() {
            return Err(AppError::NotFound("Slot group".into()));
        }
        if relevant.iter().any(|g| g.is_available && g.available_count > 0) {
            return Ok(Utc::now());
        }

        match self.booking_repo.earliest_busy_end(space_id, slot_type).await? {
            Some(end) => Ok(end + Duration::minutes(NEXT_SLOT_BUFFER_MINUTES)),
            None => Err(AppError::Conflict(
                "No slot of this type is currently offered.".into(),
            )),
        }
    }

    // The driver who owns the booking, the owner of its space, or an
    // accepted manager of that space may drive a transition.
    async fn authorize_operator(&self, user: &User, booking: &Booking) -> Result<(), AppError> {
        if user.id == booking.driver_id {
            return Ok(());
        }
        match user.role {
            UserRole::Owner => {
                let space = self
                    .space_repo
                    .find_by_id(booking.space_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Parking space".into()))?;
                if space.owner_id == user.id {
                    return Ok(());
                }
            }
            UserRole::Manager => {
                if self.manager_repo.manages_space(user.id, booking.space_id).await? {
                    return Ok(());
                }
            }
            UserRole::Driver => {}
        }
        Err(AppError::Forbidden(
            "You are not allowed to operate this booking.".into(),
        ))
    }
}

// Precondition checks for the two gates, kept pure so the state machine is
// testable without a database.

fn check_entry(booking: &Booking, otp: &str, now: DateTime<Utc>) -> Result<(), AppError> {
    if booking.status != BookingStatus::Pending {
        return Err(AppError::InvalidState(format!(
            "Cannot verify entry for a booking in status {:?}.",
            booking.status
        )));
    }
    if now > booking.otp_expires_at {
        return Err(AppError::InvalidOtp);
    }
    if otp != booking.otp_entry {
        return Err(AppError::InvalidOtp);
    }
    Ok(())
}

// Exit is permissive: the OTP is optional, but when provided it must match.
fn check_exit(booking: &Booking, otp: Option<&str>) -> Result<(), AppError> {
    if booking.status != BookingStatus::Active {
        return Err(AppError::InvalidState(format!(
            "Cannot verify exit for a booking in status {:?}.",
            booking.status
        )));
    }
    if booking.actual_entry_time.is_none() {
        return Err(AppError::InvalidState(
            "Cannot settle a booking that was never entered.".into(),
        ));
    }
    if let Some(code) = otp {
        if code != booking.otp_exit {
            return Err(AppError::InvalidOtp);
        }
    }
    Ok(())
}

// Counter value after a slot is handed back. Clamped at capacity: an
// operator may have raised the counter by hand while the booking was out,
// and releasing must never block an exit or cancellation over it.
fn released_count(available: i32, total: i32) -> i32 {
    (available + 1).min(total)
}

// 6-digit code from the OS RNG, leading zeros kept.
fn generate_otp() -> String {
    format!("{:06}", OsRng.gen_range(0..1_000_000u32))
}

fn required_field_error(field: &'static str) -> validator::ValidationErrors {
    let mut errors = validator::ValidationErrors::new();
    let mut err = validator::ValidationError::new("required");
    err.message = Some(format!("The field '{}' is required.", field).into());
    errors.add(field, err);
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    fn booking(status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            space_id: Uuid::new_v4(),
            slot_id: Uuid::new_v4(),
            start_time: at(14),
            end_time: at(16),
            actual_entry_time: None,
            actual_exit_time: None,
            estimated_amount: Decimal::from(120),
            final_amount: None,
            status,
            otp_entry: "123456".into(),
            otp_exit: "654321".into(),
            otp_entry_verified: false,
            otp_exit_verified: false,
            otp_expires_at: at(17),
            created_at: at(13),
            updated_at: at(13),
        }
    }

    #[test]
    fn entry_with_correct_otp_passes() {
        let b = booking(BookingStatus::Pending);
        assert!(check_entry(&b, "123456", at(14)).is_ok());
    }

    #[test]
    fn entry_with_wrong_otp_never_transitions() {
        let b = booking(BookingStatus::Pending);
        assert!(matches!(check_entry(&b, "000000", at(14)), Err(AppError::InvalidOtp)));
    }

    #[test]
    fn entry_with_expired_otp_is_rejected() {
        let b = booking(BookingStatus::Pending);
        assert!(matches!(check_entry(&b, "123456", at(18)), Err(AppError::InvalidOtp)));
    }

    #[test]
    fn reverifying_an_active_booking_is_rejected() {
        let b = booking(BookingStatus::Active);
        assert!(matches!(
            check_entry(&b, "123456", at(14)),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn exit_requires_active_status() {
        let b = booking(BookingStatus::Pending);
        assert!(matches!(check_exit(&b, None), Err(AppError::InvalidState(_))));

        let done = booking(BookingStatus::Completed);
        assert!(matches!(check_exit(&done, None), Err(AppError::InvalidState(_))));
    }

    #[test]
    fn exit_without_entry_time_is_invalid_state() {
        // Active status but no entry stamp: refuse to settle.
        let b = booking(BookingStatus::Active);
        assert!(matches!(check_exit(&b, None), Err(AppError::InvalidState(_))));
    }

    #[test]
    fn exit_is_permissive_without_otp() {
        let mut b = booking(BookingStatus::Active);
        b.actual_entry_time = Some(at(14));
        assert!(check_exit(&b, None).is_ok());
    }

    #[test]
    fn exit_with_wrong_otp_is_rejected() {
        let mut b = booking(BookingStatus::Active);
        b.actual_entry_time = Some(at(14));
        assert!(matches!(check_exit(&b, Some("999999")), Err(AppError::InvalidOtp)));
        assert!(check_exit(&b, Some("654321")).is_ok());
    }

    #[test]
    fn releasing_a_slot_increments_the_counter() {
        assert_eq!(released_count(2, 10), 3);
        assert_eq!(released_count(0, 1), 1);
    }

    #[test]
    fn release_is_clamped_when_the_counter_was_raised_by_hand() {
        // A slot group patched to full capacity while a booking was active
        // must still let that booking exit.
        assert_eq!(released_count(10, 10), 10);
    }

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..32 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
