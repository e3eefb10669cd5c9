// src/handlers/spaces.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{OwnerOnly, RequireRole},
    },
    models::{
        manager::{InviteManagerPayload, ManagerInvite, SpaceManager},
        space::{CreateSpacePayload, ParkingSpace, SpaceWithSlots},
    },
};

// Creates a space together with its slot groups; either everything lands
// or nothing does.
pub async fn create_space(
    State(app_state): State<AppState>,
    _role: RequireRole<OwnerOnly>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateSpacePayload>,
) -> Result<(StatusCode, Json<SpaceWithSlots>), AppError> {
    payload.validate()?;

    let total_slots: i32 = payload.slot_groups.iter().map(|g| g.total_count).sum();

    let mut tx = app_state.db_pool.begin().await?;

    let space = app_state
        .space_repo
        .create_space(
            &mut *tx,
            user.id,
            &payload.name,
            &payload.address,
            payload.latitude,
            payload.longitude,
            total_slots,
            payload.base_hourly_rate,
        )
        .await?;

    let mut slot_groups = Vec::with_capacity(payload.slot_groups.len());
    for group in &payload.slot_groups {
        let created = app_state
            .slot_repo
            .create_slot_group(&mut *tx, space.id, group.slot_type, group.hourly_rate, group.total_count)
            .await?;
        slot_groups.push(created);
    }

    tx.commit().await?;

    tracing::info!(space_id = %space.id, owner_id = %user.id, "parking space created");
    Ok((StatusCode::CREATED, Json(SpaceWithSlots { space, slot_groups })))
}

pub async fn list_my_spaces(
    State(app_state): State<AppState>,
    _role: RequireRole<OwnerOnly>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<ParkingSpace>>, AppError> {
    let spaces = app_state.space_repo.list_by_owner(user.id).await?;
    Ok(Json(spaces))
}

pub async fn invite_manager(
    State(app_state): State<AppState>,
    _role: RequireRole<OwnerOnly>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(space_id): Path<Uuid>,
    Json(payload): Json<InviteManagerPayload>,
) -> Result<(StatusCode, Json<ManagerInvite>), AppError> {
    payload.validate()?;

    let invite = app_state
        .manager_service
        .invite(&user, space_id, &payload.email)
        .await?;
    Ok((StatusCode::CREATED, Json(invite)))
}

pub async fn list_managers(
    State(app_state): State<AppState>,
    _role: RequireRole<OwnerOnly>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(space_id): Path<Uuid>,
) -> Result<Json<Vec<SpaceManager>>, AppError> {
    let managers = app_state.manager_service.list_for_space(&user, space_id).await?;
    Ok(Json(managers))
}
