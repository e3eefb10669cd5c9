// src/services/profile.rs
//
// Driver profile upsert. Completion percentage and the can_book flag are
// derived server-side from which fields are filled in. Document image
// references are best-effort side writes: a failure there does not fail
// the submission, it surfaces as a warning in the response.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::user_repo::{ProfileImage, UserRepository},
    models::auth::DriverProfile,
};

// Fields that count towards completion, weighted equally.
const COMPLETION_FIELDS: i32 = 5;

// A driver may book once the identifying fields (license, plate, PAN) are
// all present; images can trail behind.
const CAN_BOOK_THRESHOLD: i32 = 60;

#[derive(Clone)]
pub struct ProfileService {
    user_repo: UserRepository,
    pool: PgPool,
}

pub struct ProfileSubmission<'a> {
    pub license_number: Option<&'a str>,
    pub vehicle_plate: Option<&'a str>,
    pub pan_number: Option<&'a str>,
    pub license_image_url: Option<&'a str>,
    pub plate_image_url: Option<&'a str>,
}

pub struct ProfileOutcome {
    pub profile: DriverProfile,
    pub warnings: Vec<String>,
}

impl ProfileService {
    pub fn new(user_repo: UserRepository, pool: PgPool) -> Self {
        Self { user_repo, pool }
    }

    pub async fn submit(
        &self,
        user_id: Uuid,
        submission: ProfileSubmission<'_>,
    ) -> Result<ProfileOutcome, AppError> {
        let completion = completion_percentage(&submission);
        let can_book = completion >= CAN_BOOK_THRESHOLD;

        let mut profile = self
            .user_repo
            .upsert_profile(
                &self.pool,
                user_id,
                submission.license_number,
                submission.vehicle_plate,
                submission.pan_number,
                completion,
                can_book,
            )
            .await?;

        // Image references are written after the primary upsert; failures
        // are reported, not fatal.
        let mut warnings = Vec::new();
        for (column, url, label) in [
            (ProfileImage::License, submission.license_image_url, "license image"),
            (ProfileImage::Plate, submission.plate_image_url, "plate image"),
        ] {
            let Some(url) = url else { continue };
            match self.user_repo.set_profile_image(user_id, column, url).await {
                Ok(()) => match column {
                    ProfileImage::License => profile.license_image_url = Some(url.to_string()),
                    ProfileImage::Plate => profile.plate_image_url = Some(url.to_string()),
                },
                Err(e) => {
                    tracing::warn!(user_id = %user_id, "failed to store {}: {}", label, e);
                    warnings.push(format!("Could not store the {}; please retry.", label));
                }
            }
        }

        Ok(ProfileOutcome { profile, warnings })
    }
}

fn completion_percentage(s: &ProfileSubmission<'_>) -> i32 {
    let filled = [
        s.license_number.is_some(),
        s.vehicle_plate.is_some(),
        s.pan_number.is_some(),
        s.license_image_url.is_some(),
        s.plate_image_url.is_some(),
    ]
    .iter()
    .filter(|&&f| f)
    .count() as i32;
    filled * 100 / COMPLETION_FIELDS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(filled: usize) -> ProfileSubmission<'static> {
        let v = |i| if filled > i { Some("x") } else { None };
        ProfileSubmission {
            license_number: v(0),
            vehicle_plate: v(1),
            pan_number: v(2),
            license_image_url: v(3),
            plate_image_url: v(4),
        }
    }

    #[test]
    fn completion_scales_with_filled_fields() {
        assert_eq!(completion_percentage(&submission(0)), 0);
        assert_eq!(completion_percentage(&submission(3)), 60);
        assert_eq!(completion_percentage(&submission(5)), 100);
    }

    #[test]
    fn booking_unlocks_at_the_identity_fields() {
        assert!(completion_percentage(&submission(3)) >= CAN_BOOK_THRESHOLD);
        assert!(completion_percentage(&submission(2)) < CAN_BOOK_THRESHOLD);
    }
}
