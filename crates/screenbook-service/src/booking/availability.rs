//! Slot capacity query.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use screenbook_core::clock::Clock;
use screenbook_core::config::booking::BookingConfig;
use screenbook_core::result::AppResult;
use screenbook_database::BookingStore;
use screenbook_entity::availability::{DayAvailability, SlotAvailability, SlotStatus};
use screenbook_entity::reservation::{ReservationStatus, SlotNumber};

/// Read-only availability view over reservation rows.
///
/// Capacity is always recomputed from the rows; there is no cached
/// per-slot counter to drift out of sync.
#[derive(Clone)]
pub struct AvailabilityService {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    booking: BookingConfig,
}

impl AvailabilityService {
    /// Creates a new availability service.
    pub fn new(store: Arc<dyn BookingStore>, clock: Arc<dyn Clock>, booking: BookingConfig) -> Self {
        Self {
            store,
            clock,
            booking,
        }
    }

    /// Returns the fill state of every slot on a date.
    ///
    /// A date without a published schedule reports `published: false` and
    /// no slots. When a viewer is given, each slot also notes whether that
    /// user already holds it.
    pub async fn day_availability(
        &self,
        date: NaiveDate,
        viewer: Option<Uuid>,
    ) -> AppResult<DayAvailability> {
        let published = self
            .store
            .find_schedule(date)
            .await?
            .is_some_and(|s| s.published);
        if !published {
            return Ok(DayAvailability {
                date,
                published: false,
                slots: Vec::new(),
            });
        }

        let now = self.clock.now();
        let active = self.store.active_reservations_for_date(date, now).await?;

        let mut counts: HashMap<SlotNumber, u32> = HashMap::new();
        let mut mine: HashMap<SlotNumber, Option<DateTime<Utc>>> = HashMap::new();
        for reservation in &active {
            *counts.entry(reservation.slot_number).or_insert(0) += 1;
            // The own-hold marker only describes live holds; confirmed rows
            // count against capacity but keep a stale hold_expires_at that
            // must never be surfaced.
            if viewer == Some(reservation.user_id)
                && reservation.status == ReservationStatus::Hold
            {
                mine.insert(reservation.slot_number, reservation.hold_expires_at);
            }
        }

        let capacity = self.booking.max_per_slot;
        let slots = SlotNumber::all()
            .iter()
            .map(|&slot| {
                let active_count = counts.get(&slot).copied().unwrap_or(0);
                let held_by_me = mine.contains_key(&slot);
                SlotAvailability {
                    slot,
                    status: SlotStatus::from_count(active_count, capacity),
                    active_count,
                    capacity,
                    held_by_me,
                    my_hold_expires_at: mine.get(&slot).copied().flatten(),
                }
            })
            .collect();

        Ok(DayAvailability {
            date,
            published: true,
            slots,
        })
    }
}
