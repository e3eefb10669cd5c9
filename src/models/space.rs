// src/models/space.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// The fixed set of slot categories a space can offer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "slot_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    Standard,
    Premium,
    Compact,
    Disabled,
    EvCharging,
    NearGate,
    WomenOnly,
}

// A parking facility owned by an owner account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParkingSpace {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub total_slots: i32,
    pub base_hourly_rate: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// A pool of interchangeable slots of one type within a space, tracked by
// count. Invariant: 0 <= available_count <= total_count (also a DB CHECK).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotGroup {
    pub id: Uuid,
    pub space_id: Uuid,
    pub slot_type: SlotType,
    pub hourly_rate: Decimal,
    pub total_count: i32,
    pub available_count: i32,
    pub is_available: bool,
    pub updated_at: DateTime<Utc>,
}

// One entry of the per-space availability projection.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub slot_type: SlotType,
    pub hourly_rate: Decimal,
    pub available_count: i32,
    pub total_count: i32,
}

// Snapshot sent to polling/streaming consumers.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySnapshot {
    pub timestamp: DateTime<Utc>,
    pub slots: Vec<SlotAvailability>,
}

// Space together with its slot groups, as the creation endpoint returns it.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpaceWithSlots {
    #[serde(flatten)]
    pub space: ParkingSpace,
    pub slot_groups: Vec<SlotGroup>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotGroupPayload {
    pub slot_type: SlotType,
    #[validate(custom(function = validate_positive_rate))]
    pub hourly_rate: Decimal,
    #[validate(range(min = 1, message = "A slot group needs at least one slot."))]
    pub total_count: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpacePayload {
    #[validate(length(min = 1, message = "Space name is required."))]
    pub name: String,
    #[validate(length(min = 1, message = "Address is required."))]
    pub address: String,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be within [-90, 90]."))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be within [-180, 180]."))]
    pub longitude: f64,
    #[validate(custom(function = validate_positive_rate))]
    pub base_hourly_rate: Decimal,
    #[validate(length(min = 1, message = "A space needs at least one slot group."), nested)]
    pub slot_groups: Vec<CreateSlotGroupPayload>,
}

// Partial update; absent fields keep their stored value.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSlotGroupPayload {
    pub slot_id: Uuid,
    #[validate(custom(function = validate_positive_rate))]
    pub hourly_rate: Option<Decimal>,
    #[validate(range(min = 1, message = "total_count must be at least 1."))]
    pub total_count: Option<i32>,
    #[validate(range(min = 0, message = "available_count cannot be negative."))]
    pub available_count: Option<i32>,
}

fn validate_positive_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if *rate <= Decimal::ZERO {
        return Err(ValidationError::new("rate_not_positive")
            .with_message("Hourly rate must be positive.".into()));
    }
    Ok(())
}

// A search hit: a space within the query radius plus its cheapest
// qualifying slot group.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpaceSearchResult {
    #[serde(flatten)]
    pub space: ParkingSpace,
    pub distance_m: f64,
    pub cheapest_slot: SlotAvailability,
}
