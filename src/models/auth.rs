// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// Role of a user account. Stored as the `user_role` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Driver,
    Owner,
    Manager,
}

// A user row coming from the database.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,

    #[serde(skip_serializing)] // never leaks to the wire
    pub password_hash: String,

    pub full_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "verification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

// 1:1 profile attached to driver accounts. `completion_percentage` and
// `can_book` are recomputed on every upsert, never set by the client.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DriverProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub license_number: Option<String>,
    pub vehicle_plate: Option<String>,
    pub pan_number: Option<String>,
    pub license_image_url: Option<String>,
    pub plate_image_url: Option<String>,
    pub verification: VerificationStatus,
    pub completion_percentage: i32,
    pub can_book: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(email(message = "The e-mail provided is invalid."))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub password: String,
    #[validate(length(min = 1, message = "Full name is required."))]
    pub full_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginUserPayload {
    #[validate(email(message = "The e-mail provided is invalid."))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub password: String,
}

// Full profile submission; fields left out are stored as NULL and lower
// the completion percentage.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DriverProfilePayload {
    #[validate(length(min = 1, message = "License number cannot be empty."))]
    pub license_number: Option<String>,
    #[validate(length(min = 1, message = "Vehicle plate cannot be empty."))]
    pub vehicle_plate: Option<String>,
    #[validate(length(min = 1, message = "PAN number cannot be empty."))]
    pub pan_number: Option<String>,
    #[validate(url(message = "License image must be a valid URL."))]
    pub license_image_url: Option<String>,
    #[validate(url(message = "Plate image must be a valid URL."))]
    pub plate_image_url: Option<String>,
}

// Profile plus warnings for side effects that failed without blocking
// the submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub profile: DriverProfile,
    pub warnings: Vec<String>,
}

// Token plus the public view of the user, returned by register/login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// Claims inside the JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,      // user id
    pub role: UserRole, // role at issue time
    pub exp: usize,
    pub iat: usize,
}
