// src/services/pricing.rs
//
// Pure money math for the booking lifecycle. Everything here is Decimal
// arithmetic; rounding happens once, at 2 decimal places, on the amounts
// that reach the wire.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{common::error::AppError, models::booking::Settlement};

// Bills at least a quarter hour, so malformed or instantaneous ranges never
// produce a zero or negative charge.
const MIN_BILLABLE_HOURS: Decimal = Decimal::from_parts(25, 0, 0, false, 2); // 0.25

// Overtime is billed at 1.5x the hourly rate.
const OVERTIME_MULTIPLIER: Decimal = Decimal::from_parts(15, 0, 0, false, 1); // 1.5

const SECONDS_PER_HOUR: Decimal = Decimal::from_parts(3600, 0, 0, false, 0);

// Duration in fractional hours, clamped at zero (clock skew must never
// yield a negative charge).
fn duration_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    let secs = (end - start).num_seconds().max(0);
    Decimal::from(secs) / SECONDS_PER_HOUR
}

// Estimated charge for a scheduled window.
pub fn estimate(hourly_rate: Decimal, start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    let hours = duration_hours(start, end).max(MIN_BILLABLE_HOURS);
    (hours * hourly_rate).round_dp(2)
}

// Final settlement at exit. Base charge covers the booked window; time used
// beyond it is overtime at the fixed multiplier.
pub fn settle_final(
    hourly_rate: Decimal,
    scheduled_start: DateTime<Utc>,
    scheduled_end: DateTime<Utc>,
    actual_entry: Option<DateTime<Utc>>,
    actual_exit: DateTime<Utc>,
) -> Result<Settlement, AppError> {
    let entry = actual_entry.ok_or_else(|| {
        AppError::InvalidState("Cannot settle a booking that was never entered.".into())
    })?;

    let booked_hours = duration_hours(scheduled_start, scheduled_end);
    let actual_hours = duration_hours(entry, actual_exit);
    let overtime_hours = (actual_hours - booked_hours).max(Decimal::ZERO);

    let base_amount = booked_hours * hourly_rate;
    let overtime_amount = overtime_hours * hourly_rate * OVERTIME_MULTIPLIER;

    Ok(Settlement {
        base_amount: base_amount.round_dp(2),
        overtime_hours: overtime_hours.round_dp(2),
        overtime_amount: overtime_amount.round_dp(2),
        final_amount: (base_amount + overtime_amount).round_dp(2),
        actual_hours: actual_hours.round_dp(2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, min, 0).unwrap()
    }

    fn rupees(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn estimate_two_hours_at_60() {
        let amount = estimate(rupees(60), at(14, 0), at(16, 0));
        assert_eq!(amount, Decimal::new(12000, 2)); // 120.00
    }

    #[test]
    fn estimate_floors_at_quarter_hour() {
        // Instantaneous window still bills 0.25h.
        let amount = estimate(rupees(60), at(14, 0), at(14, 0));
        assert_eq!(amount, Decimal::new(1500, 2)); // 15.00
    }

    #[test]
    fn estimate_clamps_negative_windows() {
        // end < start clamps to zero hours, then the floor applies.
        let amount = estimate(rupees(100), at(16, 0), at(14, 0));
        assert_eq!(amount, Decimal::new(2500, 2)); // 25.00
    }

    #[test]
    fn settle_with_one_hour_overtime() {
        // Booked 14:00-16:00, entered 14:00, left 17:00, rate 60.
        let s = settle_final(rupees(60), at(14, 0), at(16, 0), Some(at(14, 0)), at(17, 0)).unwrap();
        assert_eq!(s.base_amount, Decimal::new(12000, 2)); // 120.00
        assert_eq!(s.overtime_hours, Decimal::ONE);
        assert_eq!(s.overtime_amount, Decimal::new(9000, 2)); // 90.00
        assert_eq!(s.final_amount, Decimal::new(21000, 2)); // 210.00
        assert_eq!(s.actual_hours, Decimal::from(3));
    }

    #[test]
    fn settle_early_exit_still_pays_booked_window() {
        let s = settle_final(rupees(60), at(14, 0), at(16, 0), Some(at(14, 0)), at(15, 0)).unwrap();
        assert_eq!(s.overtime_hours, Decimal::ZERO);
        assert_eq!(s.overtime_amount, Decimal::ZERO);
        assert_eq!(s.final_amount, Decimal::new(12000, 2));
    }

    #[test]
    fn settle_without_entry_is_invalid_state() {
        let err = settle_final(rupees(60), at(14, 0), at(16, 0), None, at(17, 0)).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[test]
    fn overtime_never_negative_under_clock_skew() {
        // Exit timestamp earlier than entry: actual hours clamp to zero.
        let s = settle_final(rupees(60), at(14, 0), at(16, 0), Some(at(15, 0)), at(14, 0)).unwrap();
        assert_eq!(s.actual_hours, Decimal::ZERO);
        assert_eq!(s.overtime_amount, Decimal::ZERO);
        assert_eq!(s.final_amount, Decimal::new(12000, 2));
    }

    #[test]
    fn fractional_windows_round_to_two_places() {
        // 1h40m at 55/hr = 91.666... -> 91.67
        let amount = estimate(rupees(55), at(14, 0), at(15, 40));
        assert_eq!(amount, Decimal::new(9167, 2));
    }
}
