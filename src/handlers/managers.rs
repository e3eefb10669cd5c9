// src/handlers/managers.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{ManagerOnly, RequireRole},
    },
    models::manager::{AcceptInvitePayload, SpaceManager},
};

pub async fn accept_invite(
    State(app_state): State<AppState>,
    _role: RequireRole<ManagerOnly>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<AcceptInvitePayload>,
) -> Result<Json<SpaceManager>, AppError> {
    payload.validate()?;

    let assignment = app_state.manager_service.accept(&user, &payload.token).await?;
    tracing::info!(space_id = %assignment.space_id, manager_id = %user.id, "manager invite accepted");
    Ok(Json(assignment))
}
