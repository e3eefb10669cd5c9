// src/db/slot_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::space::{SlotGroup, SlotType},
};

// Slot groups carry the shared mutable availability counters, so every
// write that is part of a booking transition goes through a generic
// executor and is locked with FOR UPDATE by the caller's transaction.
#[derive(Clone)]
pub struct SlotRepository {
    pool: PgPool,
}

const SLOT_COLUMNS: &str =
    "id, space_id, slot_type, hourly_rate, total_count, available_count, is_available, updated_at";

impl SlotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_slot_group<'e, E>(
        &self,
        executor: E,
        space_id: Uuid,
        slot_type: SlotType,
        hourly_rate: Decimal,
        total_count: i32,
    ) -> Result<SlotGroup, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let group = sqlx::query_as::<_, SlotGroup>(&format!(
            "INSERT INTO slot_groups (space_id, slot_type, hourly_rate, total_count, available_count)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING {SLOT_COLUMNS}"
        ))
        .bind(space_id)
        .bind(slot_type)
        .bind(hourly_rate)
        .bind(total_count)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(
                        "This space already has a slot group of that type.".into(),
                    );
                }
            }
            e.into()
        })?;
        Ok(group)
    }

    pub async fn list_by_space(&self, space_id: Uuid) -> Result<Vec<SlotGroup>, AppError> {
        let groups = sqlx::query_as::<_, SlotGroup>(&format!(
            "SELECT {SLOT_COLUMNS} FROM slot_groups
             WHERE space_id = $1
             ORDER BY slot_type"
        ))
        .bind(space_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    // Batched lookup for search: one round-trip for the whole space set
    // instead of a query per space.
    pub async fn list_available_by_spaces(
        &self,
        space_ids: &[Uuid],
    ) -> Result<Vec<SlotGroup>, AppError> {
        let groups = sqlx::query_as::<_, SlotGroup>(&format!(
            "SELECT {SLOT_COLUMNS} FROM slot_groups
             WHERE space_id = ANY($1) AND is_available = TRUE AND available_count > 0"
        ))
        .bind(space_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<SlotGroup>, AppError> {
        let group = sqlx::query_as::<_, SlotGroup>(&format!(
            "SELECT {SLOT_COLUMNS} FROM slot_groups WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    // Locks one slot group row for the duration of the caller's transaction.
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<SlotGroup>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let group = sqlx::query_as::<_, SlotGroup>(&format!(
            "SELECT {SLOT_COLUMNS} FROM slot_groups WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(group)
    }

    // Locks the allocation candidates for a space. Deterministic order:
    // lowest rate first, then id, so selection is reproducible.
    pub async fn list_candidates_for_update<'e, E>(
        &self,
        executor: E,
        space_id: Uuid,
        slot_type: Option<SlotType>,
    ) -> Result<Vec<SlotGroup>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let groups = sqlx::query_as::<_, SlotGroup>(&format!(
            "SELECT {SLOT_COLUMNS} FROM slot_groups
             WHERE space_id = $1
               AND is_available = TRUE
               AND available_count > 0
               AND ($2::slot_type IS NULL OR slot_type = $2)
             ORDER BY hourly_rate, id
             FOR UPDATE"
        ))
        .bind(space_id)
        .bind(slot_type)
        .fetch_all(executor)
        .await?;
        Ok(groups)
    }

    // Writes the counter computed by the caller, who holds the row lock,
    // keeping is_available in step with it. The CHECK constraint is the
    // backstop against any out-of-bounds value slipping through.
    pub async fn set_available<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        available_count: i32,
    ) -> Result<SlotGroup, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let group = sqlx::query_as::<_, SlotGroup>(&format!(
            "UPDATE slot_groups
             SET available_count = $2,
                 is_available = $2 > 0,
                 updated_at = now()
             WHERE id = $1
             RETURNING {SLOT_COLUMNS}"
        ))
        .bind(id)
        .bind(available_count)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_check_violation() {
                    return AppError::Conflict("Slot availability is out of bounds.".into());
                }
            }
            e.into()
        })?;
        Ok(group)
    }

    // Partial update used by the PATCH endpoint; absent fields keep their
    // current value.
    pub async fn update_slot_group(
        &self,
        id: Uuid,
        hourly_rate: Option<Decimal>,
        total_count: Option<i32>,
        available_count: Option<i32>,
    ) -> Result<Option<SlotGroup>, AppError> {
        let group = sqlx::query_as::<_, SlotGroup>(&format!(
            "UPDATE slot_groups
             SET hourly_rate = COALESCE($2, hourly_rate),
                 total_count = COALESCE($3, total_count),
                 available_count = COALESCE($4, available_count),
                 is_available = COALESCE($4, available_count) > 0,
                 updated_at = now()
             WHERE id = $1
             RETURNING {SLOT_COLUMNS}"
        ))
        .bind(id)
        .bind(hourly_rate)
        .bind(total_count)
        .bind(available_count)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_check_violation() {
                    return AppError::Conflict(
                        "available_count must stay between 0 and total_count.".into(),
                    );
                }
            }
            e.into()
        })?;
        Ok(group)
    }
}
