//! Cancellation deadlines, operator override, and refund bookkeeping.

mod helpers;

use chrono::{Duration, TimeZone, Utc};
use screenbook_core::error::ErrorKind;
use screenbook_database::BookingStore;
use screenbook_entity::payment::PaymentStatus;
use screenbook_entity::reservation::{Reservation, ReservationStatus};

use helpers::TestWorld;

/// Slot 1 starts at 18:00 on the seeded projection date.
fn slot_one_start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 10, 18, 0, 0).unwrap()
}

async fn confirmed_reservation(world: &TestWorld) -> (screenbook_service::RequestContext, Reservation) {
    let (ctx, video_id) = world.user_with_video().await;
    let hold = world
        .holds
        .hold_slot(&ctx, world.hold_request(video_id, 1))
        .await
        .unwrap();
    world
        .confirmations
        .confirm(world.payment_event(&format!("evt_{}", hold.id), &hold))
        .await
        .unwrap();
    let reservation = world.store.find_reservation(hold.id).await.unwrap().unwrap();
    (ctx, reservation)
}

/// Waits for the background refund task to finish.
async fn refunded_payment(
    world: &TestWorld,
    reservation: &Reservation,
) -> screenbook_entity::payment::Payment {
    let payment_id = reservation.payment_id.unwrap();
    for _ in 0..100 {
        tokio::task::yield_now().await;
        let payment = world.store.find_payment(payment_id).await.unwrap().unwrap();
        if payment.status == PaymentStatus::Refunded {
            return payment;
        }
    }
    panic!("refund task did not complete");
}

#[tokio::test]
async fn test_hold_cancels_without_deadline_or_refund() {
    let world = TestWorld::new().await;
    let (ctx, video_id) = world.user_with_video().await;
    let hold = world
        .holds
        .hold_slot(&ctx, world.hold_request(video_id, 1))
        .await
        .unwrap();

    let cancelled = world.cancellations.cancel(&ctx, hold.id).await.unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());
    assert!(world.store.payments_for_reservation(hold.id).await.is_empty());
}

#[tokio::test]
async fn test_confirmed_cancellation_respects_the_deadline() {
    let world = TestWorld::new().await;
    let deadline = slot_one_start() - Duration::hours(world.booking.cancel_deadline_hours);

    // One hour past the cutoff the reservation is locked in.
    let (ctx, reservation) = confirmed_reservation(&world).await;
    world.clock.set(deadline + Duration::hours(1));
    let err = world
        .cancellations
        .cancel(&ctx, reservation.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    let row = world
        .store
        .find_reservation(reservation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, ReservationStatus::Confirmed);

    // One hour before the cutoff it still cancels.
    world.clock.set(deadline - Duration::hours(1));
    let cancelled = world
        .cancellations
        .cancel(&ctx, reservation.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
}

#[tokio::test]
async fn test_confirmed_cancellation_refunds_the_payment() {
    let world = TestWorld::new().await;
    let (ctx, reservation) = confirmed_reservation(&world).await;

    world.cancellations.cancel(&ctx, reservation.id).await.unwrap();

    let payment = refunded_payment(&world, &reservation).await;
    assert_eq!(payment.status, PaymentStatus::Refunded);
    assert!(payment.refund_reference.is_some());
    assert!(payment.refunded_at.is_some());
}

#[tokio::test]
async fn test_admin_cancellation_ignores_the_deadline() {
    let world = TestWorld::new().await;
    let deadline = slot_one_start() - Duration::hours(world.booking.cancel_deadline_hours);
    let (_, reservation) = confirmed_reservation(&world).await;

    world.clock.set(deadline + Duration::hours(1));
    let admin = world.admin();
    let cancelled = world
        .cancellations
        .cancel_as_admin(&admin, reservation.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    refunded_payment(&world, &reservation).await;
}

#[tokio::test]
async fn test_cancel_is_owner_only_and_monotonic() {
    let world = TestWorld::new().await;
    let (ctx, reservation) = confirmed_reservation(&world).await;

    let stranger = world.user();
    let err = world
        .cancellations
        .cancel(&stranger, reservation.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    world.cancellations.cancel(&ctx, reservation.id).await.unwrap();
    // Cancelled is terminal.
    let err = world
        .cancellations
        .cancel(&ctx, reservation.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}
