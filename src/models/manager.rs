// src/models/manager.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invite_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    Pending,
    Accepted,
}

// Delegated management rights over one space. A space may have any number
// of managers; reassignment inserts a new row, there is no removal.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SpaceManager {
    pub id: Uuid,
    pub space_id: Uuid,
    pub manager_id: Option<Uuid>,
    pub assigned_by: Uuid,
    pub invite_email: String,
    #[serde(skip_serializing)] // shared out-of-band with the invitee
    pub invite_token: String,
    pub invite_status: InviteStatus,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InviteManagerPayload {
    #[validate(email(message = "The e-mail provided is invalid."))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AcceptInvitePayload {
    #[validate(length(min = 1, message = "Invite token is required."))]
    pub token: String,
}

// Owner-facing view of an invite, token included once at creation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerInvite {
    pub id: Uuid,
    pub space_id: Uuid,
    pub invite_email: String,
    pub invite_token: String,
    pub invite_status: InviteStatus,
    pub assigned_at: DateTime<Utc>,
}
