// src/db/space_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::space::ParkingSpace};

// Linear scans over spaces stay bounded; search never ranks more than this.
pub const MAX_SEARCH_SPACES: i64 = 500;

#[derive(Clone)]
pub struct SpaceRepository {
    pool: PgPool,
}

const SPACE_COLUMNS: &str = "id, owner_id, name, address, latitude, longitude, total_slots, \
     base_hourly_rate, is_active, created_at, updated_at";

impl SpaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_space<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        name: &str,
        address: &str,
        latitude: f64,
        longitude: f64,
        total_slots: i32,
        base_hourly_rate: Decimal,
    ) -> Result<ParkingSpace, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let space = sqlx::query_as::<_, ParkingSpace>(&format!(
            "INSERT INTO parking_spaces
                 (owner_id, name, address, latitude, longitude, total_slots, base_hourly_rate)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {SPACE_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(name)
        .bind(address)
        .bind(latitude)
        .bind(longitude)
        .bind(total_slots)
        .bind(base_hourly_rate)
        .fetch_one(executor)
        .await?;
        Ok(space)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ParkingSpace>, AppError> {
        let space = sqlx::query_as::<_, ParkingSpace>(&format!(
            "SELECT {SPACE_COLUMNS} FROM parking_spaces WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(space)
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<ParkingSpace>, AppError> {
        let spaces = sqlx::query_as::<_, ParkingSpace>(&format!(
            "SELECT {SPACE_COLUMNS} FROM parking_spaces
             WHERE owner_id = $1
             ORDER BY created_at"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(spaces)
    }

    // Candidate set for proximity search. Filtering by radius happens in
    // memory; this only bounds the scan.
    pub async fn list_active(&self) -> Result<Vec<ParkingSpace>, AppError> {
        let spaces = sqlx::query_as::<_, ParkingSpace>(&format!(
            "SELECT {SPACE_COLUMNS} FROM parking_spaces
             WHERE is_active = TRUE
             ORDER BY created_at
             LIMIT $1"
        ))
        .bind(MAX_SEARCH_SPACES)
        .fetch_all(&self.pool)
        .await?;
        Ok(spaces)
    }
}
