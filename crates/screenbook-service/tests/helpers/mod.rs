//! Shared test fixtures: an in-memory store, a pinned clock, and wired
//! services.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use screenbook_core::clock::{Clock as _, FixedClock};
use screenbook_core::config::booking::BookingConfig;
use screenbook_database::{BookingStore, MemoryBookingStore};
use screenbook_entity::video::Video;
use screenbook_service::payments::NoopPaymentGateway;
use screenbook_service::{
    AvailabilityService, CancellationService, ConfirmationService, HoldService, HoldSlotRequest,
    LifecycleService, PaymentEvent, RequestContext, UserRole,
};

/// A date safely in the future relative to [`start_instant`].
pub fn projection_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, 10).unwrap()
}

/// The instant every test clock starts at.
pub fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).unwrap()
}

/// Everything a booking test needs, wired against the in-memory store.
pub struct TestWorld {
    pub store: Arc<MemoryBookingStore>,
    pub clock: Arc<FixedClock>,
    pub booking: BookingConfig,
    pub availability: AvailabilityService,
    pub holds: HoldService,
    pub lifecycle: LifecycleService,
    pub confirmations: ConfirmationService,
    pub cancellations: CancellationService,
}

impl TestWorld {
    /// Builds a world with a published schedule on [`projection_date`].
    pub async fn new() -> Self {
        let store = Arc::new(MemoryBookingStore::new());
        let clock = Arc::new(FixedClock::new(start_instant()));
        let booking = BookingConfig::default();

        let dyn_store: Arc<dyn BookingStore> = store.clone();
        let dyn_clock: Arc<dyn screenbook_core::clock::Clock> = clock.clone();
        let gateway = Arc::new(NoopPaymentGateway::new());

        let world = Self {
            availability: AvailabilityService::new(
                dyn_store.clone(),
                dyn_clock.clone(),
                booking.clone(),
            ),
            holds: HoldService::new(dyn_store.clone(), dyn_clock.clone(), booking.clone()),
            lifecycle: LifecycleService::new(dyn_store.clone(), dyn_clock.clone()),
            confirmations: ConfirmationService::new(
                dyn_store.clone(),
                dyn_clock.clone(),
                booking.clone(),
            ),
            cancellations: CancellationService::new(
                dyn_store.clone(),
                gateway,
                dyn_clock.clone(),
                booking.clone(),
            ),
            store,
            clock,
            booking,
        };

        world
            .store
            .upsert_schedule(projection_date(), true)
            .await
            .unwrap();
        world
    }

    /// Creates a user context plus a video that user owns.
    pub async fn user_with_video(&self) -> (RequestContext, Uuid) {
        let ctx = self.user();
        let video_id = self.video_for(ctx.user_id).await;
        (ctx, video_id)
    }

    /// Creates a regular user context.
    pub fn user(&self) -> RequestContext {
        RequestContext::new(Uuid::new_v4(), UserRole::User, self.clock.now())
    }

    /// Creates an admin context.
    pub fn admin(&self) -> RequestContext {
        RequestContext::new(Uuid::new_v4(), UserRole::Admin, self.clock.now())
    }

    /// Seeds an ephemeral video owned by the given user.
    pub async fn video_for(&self, user_id: Uuid) -> Uuid {
        let now = self.clock.now();
        let video = Video {
            id: Uuid::new_v4(),
            user_id,
            title: "test reel".to_string(),
            storage_key: format!("videos/{}", Uuid::new_v4()),
            ephemeral: true,
            retention_until: None,
            created_at: now,
            updated_at: now,
        };
        let id = video.id;
        self.store.insert_video(video).await;
        id
    }

    /// A hold request for slot 1 on the seeded date.
    pub fn hold_request(&self, video_id: Uuid, slot: i16) -> HoldSlotRequest {
        HoldSlotRequest {
            video_id,
            date: projection_date(),
            slot: slot.try_into().unwrap(),
        }
    }

    /// A payment event for the given reservation.
    pub fn payment_event(
        &self,
        event_id: &str,
        reservation: &screenbook_entity::reservation::Reservation,
    ) -> PaymentEvent {
        PaymentEvent {
            event_id: event_id.to_string(),
            reservation_id: reservation.id,
            user_id: reservation.user_id,
            video_id: reservation.video_id,
            amount_cents: 2500,
            currency: "EUR".to_string(),
            payment_reference: format!("ch_{event_id}"),
        }
    }
}
