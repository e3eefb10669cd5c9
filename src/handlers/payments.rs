// src/handlers/payments.rs

use axum::{extract::State, Json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{DriverOnly, RequireRole},
    },
    models::payment::{ConfirmPaymentPayload, Payment},
};

// Records the driver's payment for a booking. There is no gateway behind
// this; the transaction id is minted here.
pub async fn confirm_payment(
    State(app_state): State<AppState>,
    _role: RequireRole<DriverOnly>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<ConfirmPaymentPayload>,
) -> Result<Json<Payment>, AppError> {
    payload.validate()?;

    let booking = app_state
        .booking_repo
        .find_by_id(payload.booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking".into()))?;
    if booking.driver_id != user.id {
        return Err(AppError::Forbidden("This booking belongs to another driver.".into()));
    }

    let transaction_id = format!("TXN-{}", Uuid::new_v4().simple());
    let payment = app_state
        .payment_repo
        .confirm(payload.booking_id, &payload.payment_method, &transaction_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment".into()))?;

    tracing::info!(booking_id = %booking.id, transaction_id = %transaction_id, "payment recorded");
    Ok(Json(payment))
}
