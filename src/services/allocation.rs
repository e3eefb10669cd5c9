// src/services/allocation.rs
//
// Picks the concrete slot group a booking lands on. Selection is
// deterministic (cheapest rate, then id) so the same availability state
// always yields the same slot. The caller is responsible for locking the
// candidate rows; this module only decides.

use crate::{
    common::error::AppError,
    models::space::{SlotGroup, SlotType},
};

// Cheapest matching group with free capacity, if any.
pub fn pick<'a>(candidates: &'a [SlotGroup], slot_type: Option<SlotType>) -> Option<&'a SlotGroup> {
    candidates
        .iter()
        .filter(|g| g.is_available && g.available_count > 0)
        .filter(|g| slot_type.map_or(true, |t| g.slot_type == t))
        .min_by(|a, b| {
            a.hourly_rate
                .cmp(&b.hourly_rate)
                .then_with(|| a.id.cmp(&b.id))
        })
}

// Allocation for a booking request. A requested type is never silently
// substituted: no matching group means Conflict, even if other types are
// free.
pub fn choose_slot(
    candidates: &[SlotGroup],
    slot_type: Option<SlotType>,
) -> Result<SlotGroup, AppError> {
    pick(candidates, slot_type).cloned().ok_or_else(|| {
        AppError::Conflict(match slot_type {
            Some(t) => format!("No available slot of type {:?} in this space.", t),
            None => "No available slot in this space.".to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn group(slot_type: SlotType, rate: i64, available: i32) -> SlotGroup {
        SlotGroup {
            id: Uuid::new_v4(),
            space_id: Uuid::nil(),
            slot_type,
            hourly_rate: Decimal::from(rate),
            total_count: 10,
            available_count: available,
            is_available: available > 0,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn picks_cheapest_available() {
        let groups = vec![
            group(SlotType::Premium, 90, 3),
            group(SlotType::Standard, 50, 2),
            group(SlotType::Compact, 40, 0),
        ];
        let chosen = choose_slot(&groups, None).unwrap();
        assert_eq!(chosen.slot_type, SlotType::Standard);
    }

    #[test]
    fn tie_breaks_by_id() {
        let mut a = group(SlotType::Standard, 50, 1);
        let mut b = group(SlotType::Premium, 50, 1);
        // Force a known ordering between the two ids.
        if a.id > b.id {
            std::mem::swap(&mut a.id, &mut b.id);
        }
        let expected = a.id;
        let chosen = choose_slot(&[b, a], None).unwrap();
        assert_eq!(chosen.id, expected);
    }

    #[test]
    fn requested_type_is_never_substituted() {
        // Standard slots free, premium requested: Conflict, not fallback.
        let groups = vec![group(SlotType::Standard, 50, 5)];
        let err = choose_slot(&groups, Some(SlotType::Premium)).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn exhausted_groups_are_skipped() {
        let groups = vec![group(SlotType::Premium, 90, 0)];
        let err = choose_slot(&groups, Some(SlotType::Premium)).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
