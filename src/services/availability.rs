// src/services/availability.rs
//
// Projects per-space availability out of the slot_groups table and feeds
// the SSE endpoint. The stream is poll-based: one timer per connection,
// emitting only when the projected slot vector actually changed.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::Event;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::SlotRepository,
    models::space::{AvailabilitySnapshot, SlotAvailability, SlotGroup},
};

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const CHANNEL_CAPACITY: usize = 16;

#[derive(Clone)]
pub struct AvailabilityService {
    slot_repo: SlotRepository,
}

impl AvailabilityService {
    pub fn new(slot_repo: SlotRepository) -> Self {
        Self { slot_repo }
    }

    // One-shot projection, also used by each poll tick.
    pub async fn project(&self, space_id: Uuid) -> Result<AvailabilitySnapshot, AppError> {
        let groups = self.slot_repo.list_by_space(space_id).await?;
        if groups.is_empty() {
            return Err(AppError::NotFound("Parking space slots".into()));
        }
        Ok(snapshot_from(groups))
    }

    // Spawns the per-connection poll loop. Dropping the returned stream
    // (client disconnect) closes the channel and wakes the loop, so the
    // timer stops even when the snapshot never changes again.
    pub fn stream(&self, space_id: Uuid) -> ReceiverStream<Result<Event, Infallible>> {
        let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(CHANNEL_CAPACITY);
        tokio::spawn(poll_loop(self.clone(), space_id, tx));
        ReceiverStream::new(rx)
    }
}

async fn poll_loop(
    service: AvailabilityService,
    space_id: Uuid,
    tx: mpsc::Sender<Result<Event, Infallible>>,
) {
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let mut last_sent: Option<Vec<SlotAvailability>> = None;

    loop {
        tokio::select! {
            biased;
            // Consumer went away; stop polling.
            _ = tx.closed() => break,
            _ = ticker.tick() => {}
        }

        let snapshot = match service.project(space_id).await {
            Ok(s) => s,
            Err(e) => {
                // Transient store failures keep the feed alive.
                tracing::warn!(space_id = %space_id, "availability poll failed: {}", e);
                continue;
            }
        };

        if !should_emit(last_sent.as_deref(), &snapshot.slots) {
            continue;
        }

        let event = match Event::default().json_data(&snapshot) {
            Ok(ev) => ev,
            Err(e) => {
                tracing::error!("failed to serialize availability snapshot: {}", e);
                continue;
            }
        };
        if tx.send(Ok(event)).await.is_err() {
            break;
        }
        last_sent = Some(snapshot.slots);
    }
}

fn snapshot_from(groups: Vec<SlotGroup>) -> AvailabilitySnapshot {
    AvailabilitySnapshot {
        timestamp: Utc::now(),
        slots: groups
            .into_iter()
            .map(|g| SlotAvailability {
                slot_type: g.slot_type,
                hourly_rate: g.hourly_rate,
                available_count: g.available_count,
                total_count: g.total_count,
            })
            .collect(),
    }
}

// De-duplication by value equality of the last sent snapshot; the
// timestamp alone never triggers an emit.
fn should_emit(last_sent: Option<&[SlotAvailability]>, current: &[SlotAvailability]) -> bool {
    last_sent != Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::space::SlotType;
    use rust_decimal::Decimal;

    fn slot(available: i32) -> SlotAvailability {
        SlotAvailability {
            slot_type: SlotType::Standard,
            hourly_rate: Decimal::from(60),
            available_count: available,
            total_count: 10,
        }
    }

    #[test]
    fn first_snapshot_always_emits() {
        assert!(should_emit(None, &[slot(5)]));
    }

    #[test]
    fn identical_snapshot_is_suppressed() {
        let prev = vec![slot(5)];
        assert!(!should_emit(Some(&prev), &[slot(5)]));
    }

    #[test]
    fn changed_count_emits() {
        let prev = vec![slot(5)];
        assert!(should_emit(Some(&prev), &[slot(4)]));
    }

    #[tokio::test]
    async fn poll_loop_stops_when_receiver_is_dropped() {
        // A lazy pool never connects; the loop must exit on channel close
        // before it ever reaches the store.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/unreachable")
            .expect("lazy pool");
        let service = AvailabilityService::new(crate::db::SlotRepository::new(pool));

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        drop(rx);

        tokio::time::timeout(
            std::time::Duration::from_secs(5),
            poll_loop(service, Uuid::new_v4(), tx),
        )
        .await
        .expect("poll loop must stop once the consumer is gone");
    }

    #[test]
    fn projection_carries_counts_and_rates() {
        let groups = vec![SlotGroup {
            id: Uuid::new_v4(),
            space_id: Uuid::new_v4(),
            slot_type: SlotType::EvCharging,
            hourly_rate: Decimal::from(90),
            total_count: 4,
            available_count: 1,
            is_available: true,
            updated_at: Utc::now(),
        }];
        let snap = snapshot_from(groups);
        assert_eq!(snap.slots.len(), 1);
        assert_eq!(snap.slots[0].slot_type, SlotType::EvCharging);
        assert_eq!(snap.slots[0].available_count, 1);
        assert_eq!(snap.slots[0].total_count, 4);
    }
}
