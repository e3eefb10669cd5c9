// src/handlers/search.rs

use axum::{
    extract::{Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::space::{SlotType, SpaceSearchResult},
    services::search::SearchQuery,
};

// Radius used when the client does not send one.
const DEFAULT_RADIUS_M: f64 = 5_000.0;

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct SearchParams {
    #[validate(range(min = -90.0, max = 90.0, message = "lat must be within [-90, 90]."))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "lng must be within [-180, 180]."))]
    pub lng: f64,
    /// Search radius in meters; defaults to 5 km.
    #[validate(range(min = 1.0, message = "radius must be positive."))]
    pub radius: Option<f64>,
    pub slot_type: Option<SlotType>,
    pub min_rate: Option<Decimal>,
    pub max_rate: Option<Decimal>,
}

#[utoipa::path(
    get,
    path = "/api/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Spaces within the radius, nearest first", body = [SpaceSearchResult]),
        (status = 400, description = "Out-of-range coordinates or radius"),
    ),
    security(("api_jwt" = [])),
    tag = "search"
)]
pub async fn search_spaces(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SpaceSearchResult>>, AppError> {
    params.validate()?;

    let results = app_state
        .search_service
        .search(SearchQuery {
            latitude: params.lat,
            longitude: params.lng,
            radius_m: params.radius.unwrap_or(DEFAULT_RADIUS_M),
            slot_type: params.slot_type,
            min_rate: params.min_rate,
            max_rate: params.max_rate,
        })
        .await?;
    Ok(Json(results))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_is_optional_and_falls_back_to_the_default() {
        let params: SearchParams =
            serde_json::from_str(r#"{"lat": 40.7128, "lng": -74.0060}"#).unwrap();
        assert!(params.validate().is_ok());
        assert_eq!(params.radius.unwrap_or(DEFAULT_RADIUS_M), 5_000.0);
    }

    #[test]
    fn query_params_are_snake_case() {
        let params: SearchParams = serde_json::from_str(
            r#"{"lat": 40.0, "lng": -74.0, "radius": 500.0, "slot_type": "ev_charging", "min_rate": 10}"#,
        )
        .unwrap();
        assert_eq!(params.slot_type, Some(SlotType::EvCharging));
        assert_eq!(params.radius, Some(500.0));
    }
}
