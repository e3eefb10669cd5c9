// src/handlers/slots.rs

use axum::{
    extract::{Query, State},
    response::sse::{KeepAlive, KeepAliveStream, Sse},
    Json,
};
use serde::Deserialize;
use std::convert::Infallible;
use tokio_stream::wrappers::ReceiverStream;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        auth::{User, UserRole},
        space::{AvailabilitySnapshot, SlotGroup, UpdateSlotGroupPayload},
    },
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SlotQuery {
    pub space_id: Uuid,
}

pub async fn list_slot_groups(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Vec<SlotGroup>>, AppError> {
    let groups = app_state.slot_repo.list_by_space(query.space_id).await?;
    Ok(Json(groups))
}

// Owners and accepted managers may retune a slot group's rate and counts.
pub async fn update_slot_group(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<UpdateSlotGroupPayload>,
) -> Result<Json<SlotGroup>, AppError> {
    payload.validate()?;

    let group = app_state
        .slot_repo
        .find_by_id(payload.slot_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Slot group".into()))?;
    authorize_space_operator(&app_state, &user, group.space_id).await?;

    let updated = app_state
        .slot_repo
        .update_slot_group(
            payload.slot_id,
            payload.hourly_rate,
            payload.total_count,
            payload.available_count,
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Slot group".into()))?;
    Ok(Json(updated))
}

#[utoipa::path(
    get,
    path = "/api/slots/stream",
    params(SlotQuery),
    responses(
        (status = 200, description = "SSE feed of availability snapshots", body = AvailabilitySnapshot),
        (status = 404, description = "Space has no slot groups"),
    ),
    security(("api_jwt" = [])),
    tag = "slots"
)]
pub async fn stream_availability(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<SlotQuery>,
) -> Result<Sse<KeepAliveStream<ReceiverStream<Result<axum::response::sse::Event, Infallible>>>>, AppError> {
    // Reject unknown spaces up front; later poll failures only log.
    app_state.availability_service.project(query.space_id).await?;

    let stream = app_state.availability_service.stream(query.space_id);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn authorize_space_operator(
    app_state: &AppState,
    user: &User,
    space_id: Uuid,
) -> Result<(), AppError> {
    match user.role {
        UserRole::Owner => {
            let space = app_state
                .space_repo
                .find_by_id(space_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Parking space".into()))?;
            if space.owner_id == user.id {
                return Ok(());
            }
        }
        UserRole::Manager => {
            if app_state.manager_repo.manages_space(user.id, space_id).await? {
                return Ok(());
            }
        }
        UserRole::Driver => {}
    }
    Err(AppError::Forbidden(
        "Only the space owner or an accepted manager can update slots.".into(),
    ))
}
