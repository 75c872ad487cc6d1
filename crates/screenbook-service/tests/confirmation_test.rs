//! Exactly-once payment confirmation and compensation behavior.

mod helpers;

use chrono::Duration;
use screenbook_database::BookingStore;
use screenbook_entity::compensation::{CompensationAction, CompensationTrigger};
use screenbook_entity::reservation::ReservationStatus;

use helpers::TestWorld;

#[tokio::test]
async fn test_confirmation_promotes_hold_and_extends_retention() {
    let world = TestWorld::new().await;
    let (ctx, video_id) = world.user_with_video().await;
    let hold = world
        .holds
        .hold_slot(&ctx, world.hold_request(video_id, 1))
        .await
        .unwrap();

    let result = world
        .confirmations
        .confirm(world.payment_event("evt_1", &hold))
        .await
        .unwrap();
    assert!(result.applied);
    assert_eq!(result.reason, "confirmed");

    let reservation = world.store.find_reservation(hold.id).await.unwrap().unwrap();
    assert_eq!(reservation.status, ReservationStatus::Confirmed);
    assert!(reservation.payment_id.is_some());
    assert!(reservation.idempotency_key.is_none());

    let video = world.store.find_video(video_id).await.unwrap().unwrap();
    assert!(!video.ephemeral);
    let retention = video.retention_until.unwrap();
    assert_eq!(
        retention.date_naive(),
        hold.projection_date + Duration::days(world.booking.retention_days)
    );
}

#[tokio::test]
async fn test_duplicate_event_delivery_is_absorbed() {
    let world = TestWorld::new().await;
    let (ctx, video_id) = world.user_with_video().await;
    let hold = world
        .holds
        .hold_slot(&ctx, world.hold_request(video_id, 1))
        .await
        .unwrap();

    let deliveries = futures::future::join_all((0..2).map(|_| {
        let confirmations = world.confirmations.clone();
        let event = world.payment_event("evt_dup", &hold);
        async move { confirmations.confirm(event).await.unwrap() }
    }))
    .await;

    let applied = deliveries.iter().filter(|r| r.applied).count();
    assert_eq!(applied, 1);
    let duplicate = deliveries.iter().find(|r| !r.applied).unwrap();
    assert_eq!(duplicate.reason, "already_processed");

    assert_eq!(world.store.payments_for_reservation(hold.id).await.len(), 1);
}

#[tokio::test]
async fn test_second_event_for_confirmed_reservation_is_benign() {
    let world = TestWorld::new().await;
    let (ctx, video_id) = world.user_with_video().await;
    let hold = world
        .holds
        .hold_slot(&ctx, world.hold_request(video_id, 1))
        .await
        .unwrap();

    let first = world
        .confirmations
        .confirm(world.payment_event("evt_a", &hold))
        .await
        .unwrap();
    assert!(first.applied);

    // Same charge retried under a fresh event id.
    let second = world
        .confirmations
        .confirm(world.payment_event("evt_b", &hold))
        .await
        .unwrap();
    assert!(!second.applied);
    assert_eq!(second.reason, "already_confirmed");

    assert_eq!(world.store.payments_for_reservation(hold.id).await.len(), 1);
    assert!(world.store.compensation_entries().await.is_empty());
}

#[tokio::test]
async fn test_stale_hold_confirmation_records_a_refund() {
    let world = TestWorld::new().await;
    let (ctx, video_id) = world.user_with_video().await;
    let hold = world
        .holds
        .hold_slot(&ctx, world.hold_request(video_id, 1))
        .await
        .unwrap();

    // The charge lands after the hold lapsed; no sweep has run.
    world.clock.advance(Duration::minutes(20));
    let result = world
        .confirmations
        .confirm(world.payment_event("evt_late", &hold))
        .await
        .unwrap();
    assert!(!result.applied);
    assert_eq!(result.reason, "hold_expired");

    let reservation = world.store.find_reservation(hold.id).await.unwrap().unwrap();
    assert_eq!(reservation.status, ReservationStatus::Hold);
    assert!(world.store.payments_for_reservation(hold.id).await.is_empty());

    let entries = world.store.compensation_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, CompensationAction::Refund);
    assert_eq!(entries[0].trigger, CompensationTrigger::HoldExpired);
    assert_eq!(entries[0].amount_cents, Some(2500));
}

#[tokio::test]
async fn test_confirmation_of_a_cancelled_reservation_records_a_refund() {
    let world = TestWorld::new().await;
    let (ctx, video_id) = world.user_with_video().await;
    let hold = world
        .holds
        .hold_slot(&ctx, world.hold_request(video_id, 1))
        .await
        .unwrap();

    world.cancellations.cancel(&ctx, hold.id).await.unwrap();

    let result = world
        .confirmations
        .confirm(world.payment_event("evt_after_cancel", &hold))
        .await
        .unwrap();
    assert!(!result.applied);
    assert_eq!(result.reason, "status_not_hold");

    let entries = world.store.compensation_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].trigger, CompensationTrigger::StatusNotHold);

    // A duplicate of the same event does not add a second entry.
    let retry = world
        .confirmations
        .confirm(world.payment_event("evt_after_cancel", &hold))
        .await
        .unwrap();
    assert_eq!(retry.reason, "already_processed");
    assert_eq!(world.store.compensation_entries().await.len(), 1);
}

#[tokio::test]
async fn test_unknown_reservation_fails_without_consuming_the_event() {
    let world = TestWorld::new().await;
    let (ctx, video_id) = world.user_with_video().await;
    let hold = world
        .holds
        .hold_slot(&ctx, world.hold_request(video_id, 1))
        .await
        .unwrap();

    let mut event = world.payment_event("evt_ghost", &hold);
    event.reservation_id = uuid::Uuid::new_v4();
    assert!(world.confirmations.confirm(event.clone()).await.is_err());

    // The event id was not burned; a redelivery naming the real
    // reservation still applies.
    event.reservation_id = hold.id;
    let result = world.confirmations.confirm(event).await.unwrap();
    assert!(result.applied);
}
