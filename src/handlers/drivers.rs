// src/handlers/drivers.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{DriverOnly, RequireRole},
    },
    models::auth::{DriverProfilePayload, ProfileResponse},
    services::profile::ProfileSubmission,
};

pub async fn submit_profile(
    State(app_state): State<AppState>,
    _role: RequireRole<DriverOnly>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<DriverProfilePayload>,
) -> Result<Json<ProfileResponse>, AppError> {
    payload.validate()?;

    let outcome = app_state
        .profile_service
        .submit(
            user.id,
            ProfileSubmission {
                license_number: payload.license_number.as_deref(),
                vehicle_plate: payload.vehicle_plate.as_deref(),
                pan_number: payload.pan_number.as_deref(),
                license_image_url: payload.license_image_url.as_deref(),
                plate_image_url: payload.plate_image_url.as_deref(),
            },
        )
        .await?;

    Ok(Json(ProfileResponse {
        profile: outcome.profile,
        warnings: outcome.warnings,
    }))
}
