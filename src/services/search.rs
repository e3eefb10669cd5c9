// src/services/search.rs
//
// Proximity search over active spaces: haversine distance filter, cheapest
// qualifying slot per space, ranked by distance. The slot lookup is one
// batched query over the whole candidate set rather than a query per space.

use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{SlotRepository, SpaceRepository},
    models::space::{ParkingSpace, SlotAvailability, SlotGroup, SlotType, SpaceSearchResult},
    services::allocation,
};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy)]
pub struct SearchQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
    pub slot_type: Option<SlotType>,
    pub min_rate: Option<Decimal>,
    pub max_rate: Option<Decimal>,
}

#[derive(Clone)]
pub struct SearchService {
    space_repo: SpaceRepository,
    slot_repo: SlotRepository,
}

impl SearchService {
    pub fn new(space_repo: SpaceRepository, slot_repo: SlotRepository) -> Self {
        Self { space_repo, slot_repo }
    }

    pub async fn search(&self, query: SearchQuery) -> Result<Vec<SpaceSearchResult>, AppError> {
        let spaces = self.space_repo.list_active().await?;

        let in_radius: Vec<ParkingSpace> = spaces
            .into_iter()
            .filter(|s| {
                haversine_m(query.latitude, query.longitude, s.latitude, s.longitude)
                    <= query.radius_m
            })
            .collect();
        if in_radius.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = in_radius.iter().map(|s| s.id).collect();
        let groups = self.slot_repo.list_available_by_spaces(&ids).await?;
        let mut by_space: HashMap<Uuid, Vec<SlotGroup>> = HashMap::new();
        for group in groups {
            by_space.entry(group.space_id).or_default().push(group);
        }

        Ok(rank(&query, in_radius, &by_space))
    }
}

// Great-circle distance in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

// Pure ranking step: attach the cheapest qualifying slot to each space,
// drop spaces with none, sort ascending by distance (ties by space id).
fn rank(
    query: &SearchQuery,
    spaces: Vec<ParkingSpace>,
    by_space: &HashMap<Uuid, Vec<SlotGroup>>,
) -> Vec<SpaceSearchResult> {
    let mut results: Vec<SpaceSearchResult> = spaces
        .into_iter()
        .filter_map(|space| {
            let groups = by_space.get(&space.id)?;
            let cheapest = allocation::pick(groups, query.slot_type)?;

            // Rate bounds apply to the cheapest qualifying slot.
            if query.min_rate.is_some_and(|min| cheapest.hourly_rate < min) {
                return None;
            }
            if query.max_rate.is_some_and(|max| cheapest.hourly_rate > max) {
                return None;
            }

            let distance_m =
                haversine_m(query.latitude, query.longitude, space.latitude, space.longitude);
            Some(SpaceSearchResult {
                distance_m,
                cheapest_slot: SlotAvailability {
                    slot_type: cheapest.slot_type,
                    hourly_rate: cheapest.hourly_rate,
                    available_count: cheapest.available_count,
                    total_count: cheapest.total_count,
                },
                space,
            })
        })
        .collect();

    results.sort_by(|a, b| {
        a.distance_m
            .partial_cmp(&b.distance_m)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.space.id.cmp(&b.space.id))
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const NYC_LAT: f64 = 40.7128;
    const NYC_LON: f64 = -74.0060;

    fn space(lat: f64, lon: f64) -> ParkingSpace {
        ParkingSpace {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            name: "Lot".into(),
            address: "1 Main St".into(),
            latitude: lat,
            longitude: lon,
            total_slots: 10,
            base_hourly_rate: Decimal::from(60),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn group(space_id: Uuid, slot_type: SlotType, rate: i64) -> SlotGroup {
        SlotGroup {
            id: Uuid::new_v4(),
            space_id,
            slot_type,
            hourly_rate: Decimal::from(rate),
            total_count: 10,
            available_count: 5,
            is_available: true,
            updated_at: Utc::now(),
        }
    }

    fn query(radius_m: f64) -> SearchQuery {
        SearchQuery {
            latitude: NYC_LAT,
            longitude: NYC_LON,
            radius_m,
            slot_type: None,
            min_rate: None,
            max_rate: None,
        }
    }

    #[test]
    fn haversine_is_symmetric_and_zero_on_self() {
        let d1 = haversine_m(NYC_LAT, NYC_LON, 51.5074, -0.1278);
        let d2 = haversine_m(51.5074, -0.1278, NYC_LAT, NYC_LON);
        assert!((d1 - d2).abs() < 1e-6);
        assert_eq!(haversine_m(NYC_LAT, NYC_LON, NYC_LAT, NYC_LON), 0.0);
    }

    #[test]
    fn haversine_matches_known_scale() {
        // One degree of latitude is roughly 111.2 km.
        let d = haversine_m(NYC_LAT, NYC_LON, NYC_LAT + 1.0, NYC_LON);
        assert!((d - 111_195.0).abs() < 100.0);
    }

    #[test]
    fn radius_includes_450m_and_excludes_600m() {
        // ~449 m and ~600 m north of the query point.
        let near = space(NYC_LAT + 0.00404, NYC_LON);
        let far = space(NYC_LAT + 0.0054, NYC_LON);
        let near_id = near.id;

        let mut by_space = HashMap::new();
        by_space.insert(near.id, vec![group(near.id, SlotType::Standard, 60)]);
        by_space.insert(far.id, vec![group(far.id, SlotType::Standard, 60)]);

        let q = query(500.0);
        let spaces: Vec<_> = [near, far]
            .into_iter()
            .filter(|s| haversine_m(q.latitude, q.longitude, s.latitude, s.longitude) <= q.radius_m)
            .collect();
        let results = rank(&q, spaces, &by_space);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].space.id, near_id);
        assert!(results[0].distance_m < 500.0);
    }

    #[test]
    fn results_sorted_by_distance_ascending() {
        let a = space(NYC_LAT + 0.003, NYC_LON);
        let b = space(NYC_LAT + 0.001, NYC_LON);
        let c = space(NYC_LAT + 0.002, NYC_LON);

        let mut by_space = HashMap::new();
        for s in [&a, &b, &c] {
            by_space.insert(s.id, vec![group(s.id, SlotType::Standard, 60)]);
        }

        let results = rank(&query(1_000.0), vec![a, b, c], &by_space);
        assert_eq!(results.len(), 3);
        assert!(results.windows(2).all(|w| w[0].distance_m <= w[1].distance_m));
    }

    #[test]
    fn space_without_qualifying_slot_is_excluded() {
        let s = space(NYC_LAT + 0.001, NYC_LON);
        let mut by_space = HashMap::new();
        by_space.insert(s.id, vec![group(s.id, SlotType::Standard, 60)]);

        let mut q = query(1_000.0);
        q.slot_type = Some(SlotType::Premium);
        let results = rank(&q, vec![s], &by_space);
        assert!(results.is_empty());
    }

    #[test]
    fn rate_bounds_apply_to_cheapest_slot() {
        let s = space(NYC_LAT + 0.001, NYC_LON);
        let mut by_space = HashMap::new();
        by_space.insert(
            s.id,
            vec![group(s.id, SlotType::Standard, 40), group(s.id, SlotType::Premium, 90)],
        );

        // Cheapest is 40; a min_rate of 50 excludes the space even though
        // the premium group would qualify.
        let mut q = query(1_000.0);
        q.min_rate = Some(Decimal::from(50));
        assert!(rank(&q, vec![s.clone()], &by_space).is_empty());

        let mut q = query(1_000.0);
        q.max_rate = Some(Decimal::from(50));
        let results = rank(&q, vec![s], &by_space);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].cheapest_slot.hourly_rate, Decimal::from(40));
    }
}
