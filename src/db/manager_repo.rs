// src/db/manager_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::manager::SpaceManager};

#[derive(Clone)]
pub struct ManagerRepository {
    pool: PgPool,
}

const MANAGER_COLUMNS: &str = "id, space_id, manager_id, assigned_by, invite_email, invite_token, \
     invite_status, assigned_at";

impl ManagerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_invite(
        &self,
        space_id: Uuid,
        assigned_by: Uuid,
        invite_email: &str,
        invite_token: &str,
    ) -> Result<SpaceManager, AppError> {
        let row = sqlx::query_as::<_, SpaceManager>(&format!(
            "INSERT INTO space_managers (space_id, assigned_by, invite_email, invite_token)
             VALUES ($1, $2, $3, $4)
             RETURNING {MANAGER_COLUMNS}"
        ))
        .bind(space_id)
        .bind(assigned_by)
        .bind(invite_email)
        .bind(invite_token)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<SpaceManager>, AppError> {
        let row = sqlx::query_as::<_, SpaceManager>(&format!(
            "SELECT {MANAGER_COLUMNS} FROM space_managers WHERE invite_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn accept_invite(
        &self,
        id: Uuid,
        manager_id: Uuid,
    ) -> Result<SpaceManager, AppError> {
        let row = sqlx::query_as::<_, SpaceManager>(&format!(
            "UPDATE space_managers
             SET manager_id = $2, invite_status = 'accepted', assigned_at = now()
             WHERE id = $1
             RETURNING {MANAGER_COLUMNS}"
        ))
        .bind(id)
        .bind(manager_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_by_space(&self, space_id: Uuid) -> Result<Vec<SpaceManager>, AppError> {
        let rows = sqlx::query_as::<_, SpaceManager>(&format!(
            "SELECT {MANAGER_COLUMNS} FROM space_managers
             WHERE space_id = $1
             ORDER BY assigned_at DESC"
        ))
        .bind(space_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // Managers see and operate a space only after accepting an invite.
    pub async fn manages_space(&self, manager_id: Uuid, space_id: Uuid) -> Result<bool, AppError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1::bigint FROM space_managers
             WHERE space_id = $1 AND manager_id = $2 AND invite_status = 'accepted'
             LIMIT 1",
        )
        .bind(space_id)
        .bind(manager_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }
}
