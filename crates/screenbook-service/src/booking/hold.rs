//! Hold allocation: the entry point of every booking.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rand::RngExt;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use screenbook_core::clock::Clock;
use screenbook_core::config::booking::BookingConfig;
use screenbook_core::error::AppError;
use screenbook_core::result::AppResult;
use screenbook_database::BookingStore;
use screenbook_entity::reservation::{CreateHold, Reservation, SlotNumber};

use crate::context::RequestContext;

/// Request to place a hold on a slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldSlotRequest {
    /// The video to project.
    pub video_id: Uuid,
    /// The projection date.
    pub date: NaiveDate,
    /// The slot number (1-4).
    pub slot: SlotNumber,
}

/// Allocates tentative holds against slot capacity.
#[derive(Clone)]
pub struct HoldService {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    booking: BookingConfig,
}

impl HoldService {
    /// Creates a new hold service.
    pub fn new(store: Arc<dyn BookingStore>, clock: Arc<dyn Clock>, booking: BookingConfig) -> Self {
        Self {
            store,
            clock,
            booking,
        }
    }

    /// Places a hold for the caller on a (date, slot).
    ///
    /// The hold lapses after the configured expiry unless the checkout
    /// completes first. A user may hold the same slot more than once;
    /// duplicates consume capacity like any other hold.
    pub async fn hold_slot(
        &self,
        ctx: &RequestContext,
        req: HoldSlotRequest,
    ) -> AppResult<Reservation> {
        let now = self.clock.now();

        if req.date < now.date_naive() {
            return Err(AppError::validation(format!(
                "Projection date {} is in the past",
                req.date
            )));
        }

        // Ownership failures read as not-found so the endpoint never
        // confirms that someone else's video id exists.
        let video = self
            .store
            .find_video(req.video_id)
            .await?
            .filter(|v| v.is_owned_by(ctx.user_id))
            .ok_or_else(|| AppError::not_found("Video not found"))?;

        let published = self
            .store
            .find_schedule(req.date)
            .await?
            .is_some_and(|s| s.published);
        if !published {
            return Err(AppError::validation(format!(
                "No published schedule for {}",
                req.date
            )));
        }

        let reservation = self
            .store
            .create_hold(
                &CreateHold {
                    user_id: ctx.user_id,
                    video_id: video.id,
                    projection_date: req.date,
                    slot_number: req.slot,
                    hold_expires_at: now + Duration::minutes(self.booking.hold_expiry_minutes),
                    idempotency_key: generate_idempotency_key(),
                    now,
                },
                self.booking.max_per_slot,
            )
            .await?;

        info!(
            reservation_id = %reservation.id,
            user_id = %ctx.user_id,
            date = %req.date,
            slot = %req.slot,
            "Slot held"
        );
        Ok(reservation)
    }
}

/// Generates a random key tying the hold to one checkout attempt.
fn generate_idempotency_key() -> String {
    let mut rng = rand::rng();
    (0..32)
        .map(|_| format!("{:02x}", rng.random::<u8>()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idempotency_key_shape() {
        let key = generate_idempotency_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_idempotency_key());
    }
}
