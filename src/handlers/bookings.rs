// src/handlers/bookings.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{DriverOnly, RequireRole},
    },
    models::{
        auth::UserRole,
        booking::{
            Booking, BookingCreatedResponse, BookingWithDriver, CreateBookingPayload,
            NextAvailableResponse, VerifyBookingPayload, VerifyBookingResponse,
        },
        space::SlotType,
    },
};

#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingPayload,
    responses(
        (status = 201, description = "Booking created with its pending payment", body = BookingCreatedResponse),
        (status = 403, description = "Driver profile incomplete"),
        (status = 409, description = "No free slot of the requested type"),
    ),
    security(("api_jwt" = [])),
    tag = "bookings"
)]
pub async fn create_booking(
    State(app_state): State<AppState>,
    _role: RequireRole<DriverOnly>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateBookingPayload>,
) -> Result<(StatusCode, Json<BookingCreatedResponse>), AppError> {
    payload.validate()?;

    let (booking, payment) = app_state
        .booking_service
        .create_booking(
            user.id,
            payload.space_id,
            payload.slot_id,
            payload.slot_type,
            payload.start_time,
            payload.end_time,
        )
        .await?;

    // The codes are not serialized on Booking itself; hand them out here.
    let response = BookingCreatedResponse {
        otp_entry: booking.otp_entry.clone(),
        otp_exit: booking.otp_exit.clone(),
        booking,
        payment,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BookingListQuery {
    pub space_id: Option<Uuid>,
}

// Drivers always see their own bookings; owners and managers see a space
// they operate. The filter is never taken from the client as-is.
pub async fn list_bookings(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Vec<BookingWithDriver>>, AppError> {
    let (driver_id, space_id) = match user.role {
        UserRole::Driver => (Some(user.id), query.space_id),
        UserRole::Owner => {
            let space_id = query.space_id.ok_or_else(|| {
                AppError::Forbidden("Owners must name a space to list its bookings.".into())
            })?;
            let space = app_state
                .space_repo
                .find_by_id(space_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Parking space".into()))?;
            if space.owner_id != user.id {
                return Err(AppError::Forbidden("This space belongs to another owner.".into()));
            }
            (None, Some(space_id))
        }
        UserRole::Manager => {
            let space_id = query.space_id.ok_or_else(|| {
                AppError::Forbidden("Managers must name a space to list its bookings.".into())
            })?;
            if !app_state.manager_repo.manages_space(user.id, space_id).await? {
                return Err(AppError::Forbidden("You do not manage this space.".into()));
            }
            (None, Some(space_id))
        }
    };

    let bookings = app_state.booking_service.list(driver_id, space_id).await?;
    Ok(Json(bookings))
}

#[utoipa::path(
    post,
    path = "/api/bookings/verify",
    request_body = VerifyBookingPayload,
    responses(
        (status = 200, description = "Transition applied; settlement present on exit", body = VerifyBookingResponse),
        (status = 401, description = "Wrong or expired OTP"),
        (status = 409, description = "Booking is not in a state that admits this transition"),
    ),
    security(("api_jwt" = [])),
    tag = "bookings"
)]
pub async fn verify_booking(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<VerifyBookingPayload>,
) -> Result<Json<VerifyBookingResponse>, AppError> {
    payload.validate()?;

    let (booking, settlement) = app_state
        .booking_service
        .transition(&user, payload.booking_id, payload.kind, payload.otp.as_deref())
        .await?;

    Ok(Json(VerifyBookingResponse { booking, settlement }))
}

pub async fn cancel_booking(
    State(app_state): State<AppState>,
    _role: RequireRole<DriverOnly>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let cancelled = app_state.booking_service.cancel(user.id, booking_id).await?;
    Ok(Json(cancelled))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct NextAvailableQuery {
    pub space_id: Uuid,
    pub slot_type: Option<SlotType>,
}

#[utoipa::path(
    get,
    path = "/api/bookings/next-available",
    params(NextAvailableQuery),
    responses(
        (status = 200, description = "Estimated time the next slot frees up", body = NextAvailableResponse),
        (status = 404, description = "Space offers no slot group of this type"),
    ),
    security(("api_jwt" = [])),
    tag = "bookings"
)]
pub async fn next_available(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<NextAvailableQuery>,
) -> Result<Json<NextAvailableResponse>, AppError> {
    let next_available_at = app_state
        .booking_service
        .next_available(query.space_id, query.slot_type)
        .await?;
    Ok(Json(NextAvailableResponse { next_available_at }))
}
