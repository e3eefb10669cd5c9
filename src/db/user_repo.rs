// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::auth::{DriverProfile, User, UserRole},
};

// All interaction with the 'users' and 'driver_profiles' tables.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, phone, role, is_active, created_at, updated_at";

const PROFILE_COLUMNS: &str = "id, user_id, license_number, vehicle_plate, pan_number, \
     license_image_url, plate_image_url, verification, completion_percentage, can_book, \
     created_at, updated_at";

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    pub async fn find_by_id(&self, id: uuid::Uuid) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    // Creates a user. Takes a generic executor so registration can run
    // inside a transaction together with the driver profile insert.
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        email: &str,
        password_hash: &str,
        full_name: &str,
        phone: Option<&str>,
        role: UserRole,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, full_name, phone, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(password_hash)
        .bind(full_name)
        .bind(phone)
        .bind(role)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::EmailAlreadyExists;
                }
            }
            e.into()
        })?;

        Ok(user)
    }

    pub async fn create_empty_profile<'e, E>(
        &self,
        executor: E,
        user_id: uuid::Uuid,
    ) -> Result<DriverProfile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let profile = sqlx::query_as::<_, DriverProfile>(&format!(
            "INSERT INTO driver_profiles (user_id) VALUES ($1) RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(profile)
    }

    pub async fn find_profile_by_user(
        &self,
        user_id: uuid::Uuid,
    ) -> Result<Option<DriverProfile>, AppError> {
        let profile = sqlx::query_as::<_, DriverProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM driver_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_profile<'e, E>(
        &self,
        executor: E,
        user_id: uuid::Uuid,
        license_number: Option<&str>,
        vehicle_plate: Option<&str>,
        pan_number: Option<&str>,
        completion_percentage: i32,
        can_book: bool,
    ) -> Result<DriverProfile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let profile = sqlx::query_as::<_, DriverProfile>(&format!(
            "INSERT INTO driver_profiles
                 (user_id, license_number, vehicle_plate, pan_number,
                  completion_percentage, can_book)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (user_id) DO UPDATE SET
                 license_number = EXCLUDED.license_number,
                 vehicle_plate = EXCLUDED.vehicle_plate,
                 pan_number = EXCLUDED.pan_number,
                 completion_percentage = EXCLUDED.completion_percentage,
                 can_book = EXCLUDED.can_book,
                 updated_at = now()
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(license_number)
        .bind(vehicle_plate)
        .bind(pan_number)
        .bind(completion_percentage)
        .bind(can_book)
        .fetch_one(executor)
        .await?;
        Ok(profile)
    }

    // Best-effort write of a document image reference. Callers treat a
    // failure here as a warning, not an error (see ProfileService).
    pub async fn set_profile_image(
        &self,
        user_id: uuid::Uuid,
        column: ProfileImage,
        url: &str,
    ) -> Result<(), AppError> {
        let sql = match column {
            ProfileImage::License => {
                "UPDATE driver_profiles SET license_image_url = $2, updated_at = now() WHERE user_id = $1"
            }
            ProfileImage::Plate => {
                "UPDATE driver_profiles SET plate_image_url = $2, updated_at = now() WHERE user_id = $1"
            }
        };
        sqlx::query(sql).bind(user_id).bind(url).execute(&self.pool).await?;
        Ok(())
    }

}

#[derive(Debug, Clone, Copy)]
pub enum ProfileImage {
    License,
    Plate,
}
