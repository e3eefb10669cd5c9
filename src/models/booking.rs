// src/models/booking.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{payment::Payment, space::SlotType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

// A driver's reservation against a slot group for a time window.
// OTP codes gate the entry/exit transitions; they leave the server only
// inside the creation response, never in listings or later reads.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub space_id: Uuid,
    pub slot_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub actual_entry_time: Option<DateTime<Utc>>,
    pub actual_exit_time: Option<DateTime<Utc>>,
    pub estimated_amount: Decimal,
    pub final_amount: Option<Decimal>,
    pub status: BookingStatus,
    #[serde(skip_serializing)]
    pub otp_entry: String,
    #[serde(skip_serializing)]
    pub otp_exit: String,
    pub otp_entry_verified: bool,
    pub otp_exit_verified: bool,
    pub otp_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Booking joined with the driver's name/email, as the listing endpoint
// returns it for owner/manager dashboards.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingWithDriver {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub booking: Booking,
    pub driver_name: String,
    pub driver_email: String,
}

// Which lifecycle gate an OTP verification targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Entry,
    Exit,
}

// Times default server-side: start to now, end to start plus the default
// window. A specific slot group may be requested by id, or just by type.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_booking_window))]
pub struct CreateBookingPayload {
    pub space_id: Uuid,
    pub slot_id: Option<Uuid>,
    pub slot_type: Option<SlotType>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

fn validate_booking_window(payload: &CreateBookingPayload) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (payload.start_time, payload.end_time) {
        if end <= start {
            return Err(ValidationError::new("window")
                .with_message("endTime must be after startTime.".into()));
        }
    }
    Ok(())
}

// The one response that carries the OTP codes, for the booking driver.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingCreatedResponse {
    pub booking: Booking,
    pub payment: Payment,
    pub otp_entry: String,
    pub otp_exit: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyBookingPayload {
    pub booking_id: Uuid,
    pub kind: TransitionKind,
    #[validate(length(equal = 6, message = "OTP codes are exactly 6 digits."))]
    pub otp: Option<String>,
}

// Verification result; the settlement is present on exit only.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyBookingResponse {
    pub booking: Booking,
    pub settlement: Option<Settlement>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NextAvailableResponse {
    pub next_available_at: DateTime<Utc>,
}

// Exit settlement breakdown, echoed back alongside the completed booking.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub base_amount: Decimal,
    pub overtime_hours: Decimal,
    pub overtime_amount: Decimal,
    pub final_amount: Decimal,
    pub actual_hours: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn booking() -> Booking {
        let t = Utc.with_ymd_and_hms(2025, 6, 1, 14, 0, 0).unwrap();
        Booking {
            id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            space_id: Uuid::new_v4(),
            slot_id: Uuid::new_v4(),
            start_time: t,
            end_time: t,
            actual_entry_time: None,
            actual_exit_time: None,
            estimated_amount: Decimal::from(120),
            final_amount: None,
            status: BookingStatus::Pending,
            otp_entry: "123456".into(),
            otp_exit: "654321".into(),
            otp_entry_verified: false,
            otp_exit_verified: false,
            otp_expires_at: t,
            created_at: t,
            updated_at: t,
        }
    }

    #[test]
    fn otp_codes_never_serialize_on_the_booking_itself() {
        let json = serde_json::to_value(booking()).unwrap();
        assert!(json.get("otpEntry").is_none());
        assert!(json.get("otpExit").is_none());
        assert!(json.get("status").is_some());
    }

    #[test]
    fn listing_rows_do_not_leak_otp_codes() {
        let row = BookingWithDriver {
            booking: booking(),
            driver_name: "Asha".into(),
            driver_email: "asha@example.com".into(),
        };
        let json = serde_json::to_value(row).unwrap();
        assert!(json.get("otpEntry").is_none());
        assert!(json.get("otpExit").is_none());
        assert_eq!(json["driverName"], "Asha");
    }

    #[test]
    fn creation_response_is_the_only_carrier_of_the_codes() {
        let b = booking();
        let response = BookingCreatedResponse {
            otp_entry: b.otp_entry.clone(),
            otp_exit: b.otp_exit.clone(),
            booking: b,
            payment: Payment {
                id: Uuid::new_v4(),
                booking_id: Uuid::new_v4(),
                estimated_amount: Decimal::from(120),
                final_amount: None,
                actual_hours_used: None,
                payment_method: None,
                transaction_id: None,
                status: crate::models::payment::PaymentStatus::Pending,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        };
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["otpEntry"], "123456");
        assert_eq!(json["otpExit"], "654321");
    }
}
