//! Hold allocation, availability, and lifecycle behavior.

mod helpers;

use chrono::Duration;
use futures::future::join_all;
use uuid::Uuid;

use screenbook_core::error::ErrorKind;
use screenbook_database::BookingStore;
use screenbook_entity::availability::SlotStatus;
use screenbook_entity::reservation::ReservationStatus;

use helpers::{projection_date, TestWorld};

#[tokio::test]
async fn test_concurrent_holds_never_exceed_capacity() {
    let world = TestWorld::new().await;
    let (ctx, video_id) = world.user_with_video().await;

    let attempts = join_all((0..20).map(|_| {
        let holds = world.holds.clone();
        let ctx = ctx.clone();
        let req = world.hold_request(video_id, 1);
        async move { holds.hold_slot(&ctx, req).await }
    }))
    .await;

    let granted = attempts.iter().filter(|r| r.is_ok()).count();
    let full = attempts
        .iter()
        .filter(|r| {
            r.as_ref()
                .is_err_and(|e| e.kind == ErrorKind::SlotUnavailable)
        })
        .count();
    assert_eq!(granted, 4);
    assert_eq!(full, 16);

    let day = world
        .availability
        .day_availability(projection_date(), None)
        .await
        .unwrap();
    let slot_one = &day.slots[0];
    assert_eq!(slot_one.active_count, 4);
    assert_eq!(slot_one.status, SlotStatus::Full);
}

#[tokio::test]
async fn test_expired_holds_are_invisible_without_a_sweep() {
    let world = TestWorld::new().await;
    let (ctx, video_id) = world.user_with_video().await;

    for _ in 0..4 {
        world
            .holds
            .hold_slot(&ctx, world.hold_request(video_id, 1))
            .await
            .unwrap();
    }

    // Past the 15-minute hold expiry; no sweep has run.
    world.clock.advance(Duration::minutes(20));

    let day = world
        .availability
        .day_availability(projection_date(), None)
        .await
        .unwrap();
    assert_eq!(day.slots[0].active_count, 0);
    assert_eq!(day.slots[0].status, SlotStatus::Available);

    // And the freed capacity is usable again.
    world
        .holds
        .hold_slot(&ctx, world.hold_request(video_id, 1))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sweep_counts_and_is_idempotent() {
    let world = TestWorld::new().await;
    let (ctx, video_id) = world.user_with_video().await;

    let first = world
        .holds
        .hold_slot(&ctx, world.hold_request(video_id, 1))
        .await
        .unwrap();
    world
        .holds
        .hold_slot(&ctx, world.hold_request(video_id, 2))
        .await
        .unwrap();

    world.clock.advance(Duration::minutes(20));
    assert_eq!(world.lifecycle.sweep_expired_holds().await.unwrap(), 2);
    assert_eq!(world.lifecycle.sweep_expired_holds().await.unwrap(), 0);

    let swept = world.store.find_reservation(first.id).await.unwrap().unwrap();
    assert_eq!(swept.status, ReservationStatus::Expired);
}

#[tokio::test]
async fn test_release_requires_a_live_hold() {
    let world = TestWorld::new().await;
    let (ctx, video_id) = world.user_with_video().await;

    let hold = world
        .holds
        .hold_slot(&ctx, world.hold_request(video_id, 1))
        .await
        .unwrap();

    let released = world.lifecycle.release_slot(&ctx, hold.id).await.unwrap();
    assert_eq!(released.status, ReservationStatus::Expired);

    // Releasing again is a no-op error and the row is untouched.
    let err = world.lifecycle.release_slot(&ctx, hold.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let row = world.store.find_reservation(hold.id).await.unwrap().unwrap();
    assert_eq!(row.status, ReservationStatus::Expired);
}

#[tokio::test]
async fn test_release_is_owner_only() {
    let world = TestWorld::new().await;
    let (ctx, video_id) = world.user_with_video().await;
    let hold = world
        .holds
        .hold_slot(&ctx, world.hold_request(video_id, 1))
        .await
        .unwrap();

    let stranger = world.user();
    let err = world
        .lifecycle
        .release_slot(&stranger, hold.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_hold_rejects_past_dates_and_foreign_videos() {
    let world = TestWorld::new().await;
    let (ctx, video_id) = world.user_with_video().await;

    let mut req = world.hold_request(video_id, 1);
    req.date = projection_date() - Duration::days(30);
    let err = world.holds.hold_slot(&ctx, req).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    // Another user's video reads as not-found, not forbidden.
    let stranger = world.user();
    let err = world
        .holds
        .hold_slot(&stranger, world.hold_request(video_id, 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = world
        .holds
        .hold_slot(&ctx, world.hold_request(Uuid::new_v4(), 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_hold_requires_a_published_schedule() {
    let world = TestWorld::new().await;
    let (ctx, video_id) = world.user_with_video().await;

    let mut req = world.hold_request(video_id, 1);
    req.date = projection_date() + Duration::days(1);
    let err = world.holds.hold_slot(&ctx, req).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    // An unpublished schedule row behaves like a missing one.
    let unpublished = projection_date() + Duration::days(2);
    world.store.upsert_schedule(unpublished, false).await.unwrap();
    let mut req = world.hold_request(video_id, 1);
    req.date = unpublished;
    let err = world.holds.hold_slot(&ctx, req).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let day = world
        .availability
        .day_availability(unpublished, None)
        .await
        .unwrap();
    assert!(!day.published);
    assert!(day.slots.is_empty());
}

#[tokio::test]
async fn test_availability_marks_the_viewers_own_hold() {
    let world = TestWorld::new().await;
    let (ctx, video_id) = world.user_with_video().await;
    let hold = world
        .holds
        .hold_slot(&ctx, world.hold_request(video_id, 2))
        .await
        .unwrap();

    let day = world
        .availability
        .day_availability(projection_date(), Some(ctx.user_id))
        .await
        .unwrap();
    let slot_two = &day.slots[1];
    assert!(slot_two.held_by_me);
    assert_eq!(slot_two.my_hold_expires_at, hold.hold_expires_at);
    assert!(!day.slots[0].held_by_me);

    let other = world
        .availability
        .day_availability(projection_date(), Some(Uuid::new_v4()))
        .await
        .unwrap();
    assert!(!other.slots[1].held_by_me);
}

#[tokio::test]
async fn test_availability_drops_the_hold_marker_after_confirmation() {
    let world = TestWorld::new().await;
    let (ctx, video_id) = world.user_with_video().await;
    let hold = world
        .holds
        .hold_slot(&ctx, world.hold_request(video_id, 2))
        .await
        .unwrap();
    let result = world
        .confirmations
        .confirm(world.payment_event("evt-confirmed-view", &hold))
        .await
        .unwrap();
    assert!(result.applied);

    // Well past the original hold expiry. The row stays active because it
    // is confirmed, but its stale expiry must not resurface as a hold.
    world.clock.advance(Duration::minutes(60));
    let day = world
        .availability
        .day_availability(projection_date(), Some(ctx.user_id))
        .await
        .unwrap();
    let slot_two = &day.slots[1];
    assert_eq!(slot_two.active_count, 1);
    assert!(!slot_two.held_by_me);
    assert_eq!(slot_two.my_hold_expires_at, None);
}
