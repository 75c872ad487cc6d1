//! Hold lifecycle: explicit release and background expiry.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use screenbook_core::clock::Clock;
use screenbook_core::result::AppResult;
use screenbook_database::BookingStore;
use screenbook_entity::reservation::Reservation;

use crate::context::RequestContext;

/// Releases abandoned holds, explicitly or by sweep.
#[derive(Clone)]
pub struct LifecycleService {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
}

impl LifecycleService {
    /// Creates a new lifecycle service.
    pub fn new(store: Arc<dyn BookingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Releases the caller's own hold immediately.
    ///
    /// Only rows still in `hold` can be released; anything else is a
    /// not-found, including reservations that already lapsed on their own.
    pub async fn release_slot(
        &self,
        ctx: &RequestContext,
        reservation_id: Uuid,
    ) -> AppResult<Reservation> {
        let reservation = self
            .store
            .release_hold(reservation_id, ctx.user_id, self.clock.now())
            .await?;
        info!(reservation_id = %reservation.id, user_id = %ctx.user_id, "Hold released");
        Ok(reservation)
    }

    /// Expires every hold whose deadline has passed. Idempotent; rows
    /// already promoted or terminal are never touched, even when their
    /// stale `hold_expires_at` is still set.
    pub async fn sweep_expired_holds(&self) -> AppResult<u64> {
        let count = self.store.expire_due_holds(self.clock.now()).await?;
        if count > 0 {
            info!(count, "Expired lapsed holds");
        }
        Ok(count)
    }
}
