//! In-memory booking store for tests and single-node development.
//!
//! A single Tokio mutex guards all tables, which serializes every
//! mutating operation — a strictly stronger exclusion than the per-key
//! advisory lock the PostgreSQL store takes, with the same outward
//! semantics.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use screenbook_core::error::AppError;
use screenbook_core::result::AppResult;
use screenbook_entity::compensation::{
    CompensationAction, CompensationLogEntry, CompensationTrigger, NewCompensation,
};
use screenbook_entity::confirmation::{ConfirmPaymentCommand, ConfirmationOutcome};
use screenbook_entity::event::ProcessedPaymentEvent;
use screenbook_entity::payment::{Payment, PaymentStatus};
use screenbook_entity::reservation::{CreateHold, Reservation, ReservationStatus};
use screenbook_entity::schedule::Schedule;
use screenbook_entity::video::Video;

use super::BookingStore;

/// Tables held behind the mutex.
#[derive(Debug, Default)]
struct MemoryState {
    videos: HashMap<Uuid, Video>,
    schedules: HashMap<NaiveDate, Schedule>,
    reservations: HashMap<Uuid, Reservation>,
    payments: HashMap<Uuid, Payment>,
    processed_events: HashMap<String, ProcessedPaymentEvent>,
    compensation_log: Vec<CompensationLogEntry>,
}

/// In-memory booking store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBookingStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBookingStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a video row. The upload flow lives outside this service, so
    /// tests and dev mode insert assets directly.
    pub async fn insert_video(&self, video: Video) {
        let mut state = self.state.lock().await;
        state.videos.insert(video.id, video);
    }

    /// All payments recorded for a reservation (test assertion helper).
    pub async fn payments_for_reservation(&self, reservation_id: Uuid) -> Vec<Payment> {
        let state = self.state.lock().await;
        state
            .payments
            .values()
            .filter(|p| p.reservation_id == reservation_id)
            .cloned()
            .collect()
    }

    /// Snapshot of the compensation log (test assertion helper).
    pub async fn compensation_entries(&self) -> Vec<CompensationLogEntry> {
        let state = self.state.lock().await;
        state.compensation_log.clone()
    }

    /// Number of processed-event ledger entries (test assertion helper).
    pub async fn processed_event_count(&self) -> usize {
        let state = self.state.lock().await;
        state.processed_events.len()
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn find_video(&self, video_id: Uuid) -> AppResult<Option<Video>> {
        let state = self.state.lock().await;
        Ok(state.videos.get(&video_id).cloned())
    }

    async fn find_schedule(&self, date: NaiveDate) -> AppResult<Option<Schedule>> {
        let state = self.state.lock().await;
        Ok(state.schedules.get(&date).cloned())
    }

    async fn upsert_schedule(&self, date: NaiveDate, published: bool) -> AppResult<Schedule> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let schedule = state
            .schedules
            .entry(date)
            .and_modify(|s| {
                s.published = published;
                s.updated_at = now;
            })
            .or_insert_with(|| Schedule {
                id: Uuid::new_v4(),
                projection_date: date,
                published,
                created_at: now,
                updated_at: now,
            });
        Ok(schedule.clone())
    }

    async fn active_reservations_for_date(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        Ok(state
            .reservations
            .values()
            .filter(|r| r.projection_date == date && r.is_active_at(now))
            .cloned()
            .collect())
    }

    async fn find_reservation(&self, id: Uuid) -> AppResult<Option<Reservation>> {
        let state = self.state.lock().await;
        Ok(state.reservations.get(&id).cloned())
    }

    async fn reservations_for_user(&self, user_id: Uuid) -> AppResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn create_hold(&self, data: &CreateHold, max_per_slot: u32) -> AppResult<Reservation> {
        // Count and insert under one lock acquisition; the capacity check
        // is only valid while no other writer is interleaved.
        let mut state = self.state.lock().await;

        let active = state
            .reservations
            .values()
            .filter(|r| {
                r.projection_date == data.projection_date
                    && r.slot_number == data.slot_number
                    && r.is_active_at(data.now)
            })
            .count() as u32;

        if active >= max_per_slot {
            return Err(AppError::slot_unavailable(format!(
                "Slot {} on {} is fully booked",
                data.slot_number, data.projection_date
            )));
        }

        let reservation = Reservation {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            video_id: data.video_id,
            projection_date: data.projection_date,
            slot_number: data.slot_number,
            status: ReservationStatus::Hold,
            hold_expires_at: Some(data.hold_expires_at),
            idempotency_key: Some(data.idempotency_key.clone()),
            payment_id: None,
            locked_at: None,
            cancelled_at: None,
            created_at: data.now,
            updated_at: data.now,
        };
        state.reservations.insert(reservation.id, reservation.clone());

        info!(
            reservation_id = %reservation.id,
            date = %reservation.projection_date,
            slot = %reservation.slot_number,
            "Hold created"
        );
        Ok(reservation)
    }

    async fn release_hold(
        &self,
        reservation_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Reservation> {
        let mut state = self.state.lock().await;
        let reservation = state
            .reservations
            .get_mut(&reservation_id)
            .filter(|r| r.user_id == user_id && r.status == ReservationStatus::Hold)
            .ok_or_else(|| AppError::not_found("Reservation not found or not currently held"))?;

        reservation.status = ReservationStatus::Expired;
        reservation.updated_at = now;
        Ok(reservation.clone())
    }

    async fn expire_due_holds(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let mut count = 0u64;
        for reservation in state.reservations.values_mut() {
            if reservation.status == ReservationStatus::Hold
                && reservation.hold_expires_at.is_some_and(|expires| expires < now)
            {
                reservation.status = ReservationStatus::Expired;
                reservation.updated_at = now;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn confirm_payment(
        &self,
        cmd: &ConfirmPaymentCommand,
    ) -> AppResult<ConfirmationOutcome> {
        let mut state = self.state.lock().await;

        // Exactly-once gate.
        if state.processed_events.contains_key(&cmd.event_id) {
            return Ok(ConfirmationOutcome::AlreadyProcessed);
        }

        // Unknown reservation: fail without recording the event, so a
        // redelivery surfaces the same error (matches the rollback the
        // PostgreSQL store performs).
        let Some(reservation) = state.reservations.get(&cmd.reservation_id).cloned() else {
            return Err(AppError::not_found(format!(
                "Payment event {} references unknown reservation {}",
                cmd.event_id, cmd.reservation_id
            )));
        };

        state.processed_events.insert(
            cmd.event_id.clone(),
            ProcessedPaymentEvent {
                event_id: cmd.event_id.clone(),
                reservation_id: Some(cmd.reservation_id),
                received_at: cmd.now,
            },
        );

        if reservation.user_id != cmd.claimed_user_id
            || reservation.video_id != cmd.claimed_video_id
        {
            warn!(
                reservation_id = %reservation.id,
                claimed_user_id = %cmd.claimed_user_id,
                claimed_video_id = %cmd.claimed_video_id,
                "Payment event metadata does not match stored reservation; using stored values"
            );
        }

        if reservation.status == ReservationStatus::Confirmed {
            return Ok(ConfirmationOutcome::AlreadyConfirmed);
        }

        if reservation.status != ReservationStatus::Hold {
            push_compensation(
                &mut state,
                NewCompensation {
                    action: CompensationAction::Refund,
                    trigger: CompensationTrigger::StatusNotHold,
                    reservation_id: Some(reservation.id),
                    event_id: Some(cmd.event_id.clone()),
                    amount_cents: Some(cmd.amount_cents),
                    details: format!(
                        "Charge {} succeeded but reservation {} is '{}', not 'hold'",
                        cmd.external_reference, reservation.id, reservation.status
                    ),
                },
                cmd.now,
            );
            return Ok(ConfirmationOutcome::StatusNotHold {
                status: reservation.status,
            });
        }

        let expired = match reservation.hold_expires_at {
            None => true,
            Some(expires) => expires < cmd.now,
        };
        if expired {
            push_compensation(
                &mut state,
                NewCompensation {
                    action: CompensationAction::Refund,
                    trigger: CompensationTrigger::HoldExpired,
                    reservation_id: Some(reservation.id),
                    event_id: Some(cmd.event_id.clone()),
                    amount_cents: Some(cmd.amount_cents),
                    details: format!(
                        "Charge {} succeeded but hold on reservation {} expired at {:?}",
                        cmd.external_reference, reservation.id, reservation.hold_expires_at
                    ),
                },
                cmd.now,
            );
            return Ok(ConfirmationOutcome::HoldExpired);
        }

        let payment = Payment {
            id: Uuid::new_v4(),
            user_id: reservation.user_id,
            reservation_id: reservation.id,
            amount_cents: cmd.amount_cents,
            currency: cmd.currency.clone(),
            external_reference: cmd.external_reference.clone(),
            status: PaymentStatus::Succeeded,
            refund_reference: None,
            refunded_at: None,
            created_at: cmd.now,
            updated_at: cmd.now,
        };
        state.payments.insert(payment.id, payment.clone());

        let reservation = {
            let row = state
                .reservations
                .get_mut(&cmd.reservation_id)
                .ok_or_else(|| AppError::internal("Reservation vanished mid-confirmation"))?;
            row.status = ReservationStatus::Confirmed;
            row.idempotency_key = None;
            row.payment_id = Some(payment.id);
            row.locked_at = Some(cmd.now);
            row.updated_at = cmd.now;
            row.clone()
        };

        if let Some(video) = state.videos.get_mut(&reservation.video_id) {
            video.ephemeral = false;
            video.retention_until = Some(
                reservation.projection_date.and_time(NaiveTime::MIN).and_utc()
                    + chrono::Duration::days(cmd.retention_days),
            );
            video.updated_at = cmd.now;
        }

        info!(
            reservation_id = %reservation.id,
            payment_id = %payment.id,
            event_id = %cmd.event_id,
            "Reservation confirmed"
        );
        Ok(ConfirmationOutcome::Applied {
            reservation,
            payment,
        })
    }

    async fn record_compensation(
        &self,
        entry: &NewCompensation,
        now: DateTime<Utc>,
    ) -> AppResult<CompensationLogEntry> {
        let mut state = self.state.lock().await;
        Ok(push_compensation(&mut state, entry.clone(), now))
    }

    async fn cancel_reservation(
        &self,
        reservation_id: Uuid,
        expected: ReservationStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Reservation> {
        let mut state = self.state.lock().await;
        let reservation = state
            .reservations
            .get_mut(&reservation_id)
            .filter(|r| r.status == expected)
            .ok_or_else(|| AppError::conflict("Reservation was modified concurrently"))?;

        reservation.status = ReservationStatus::Cancelled;
        reservation.cancelled_at = Some(now);
        reservation.updated_at = now;
        Ok(reservation.clone())
    }

    async fn find_payment(&self, id: Uuid) -> AppResult<Option<Payment>> {
        let state = self.state.lock().await;
        Ok(state.payments.get(&id).cloned())
    }

    async fn mark_payment_refunded(
        &self,
        payment_id: Uuid,
        refund_reference: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Payment> {
        let mut state = self.state.lock().await;
        let payment = state
            .payments
            .get_mut(&payment_id)
            .ok_or_else(|| AppError::not_found(format!("Payment {payment_id} not found")))?;

        payment.status = PaymentStatus::Refunded;
        payment.refund_reference = Some(refund_reference.to_string());
        payment.refunded_at = Some(now);
        payment.updated_at = now;
        Ok(payment.clone())
    }

    async fn purge_processed_events(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let original = state.processed_events.len();
        state.processed_events.retain(|_, e| e.received_at >= before);
        Ok((original - state.processed_events.len()) as u64)
    }
}

fn push_compensation(
    state: &mut MemoryState,
    entry: NewCompensation,
    now: DateTime<Utc>,
) -> CompensationLogEntry {
    let row = CompensationLogEntry {
        id: Uuid::new_v4(),
        action: entry.action,
        trigger: entry.trigger,
        reservation_id: entry.reservation_id,
        event_id: entry.event_id,
        amount_cents: entry.amount_cents,
        details: entry.details,
        created_at: now,
    };
    state.compensation_log.push(row.clone());
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use screenbook_entity::reservation::SlotNumber;

    fn hold_data(date: NaiveDate, slot: SlotNumber, now: DateTime<Utc>) -> CreateHold {
        CreateHold {
            user_id: Uuid::new_v4(),
            video_id: Uuid::new_v4(),
            projection_date: date,
            slot_number: slot,
            hold_expires_at: now + Duration::minutes(15),
            idempotency_key: "key".to_string(),
            now,
        }
    }

    #[tokio::test]
    async fn test_capacity_limit_enforced() {
        let store = MemoryBookingStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let now = Utc::now();

        for _ in 0..4 {
            store
                .create_hold(&hold_data(date, SlotNumber::One, now), 4)
                .await
                .unwrap();
        }
        let err = store
            .create_hold(&hold_data(date, SlotNumber::One, now), 4)
            .await
            .unwrap_err();
        assert_eq!(err.kind, screenbook_core::error::ErrorKind::SlotUnavailable);

        // Other slots on the same date are unaffected.
        store
            .create_hold(&hold_data(date, SlotNumber::Two, now), 4)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_expired_hold_frees_capacity_without_sweep() {
        let store = MemoryBookingStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let now = Utc::now();

        for _ in 0..4 {
            store
                .create_hold(&hold_data(date, SlotNumber::One, now), 4)
                .await
                .unwrap();
        }

        // 20 minutes later all four holds have lapsed; no sweep has run,
        // yet the capacity check must not count them.
        let later = now + Duration::minutes(20);
        store
            .create_hold(&hold_data(date, SlotNumber::One, later), 4)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweep_only_touches_due_holds() {
        let store = MemoryBookingStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let now = Utc::now();

        let stale = store
            .create_hold(&hold_data(date, SlotNumber::One, now), 4)
            .await
            .unwrap();
        let live = store
            .create_hold(&hold_data(date, SlotNumber::Two, now), 4)
            .await
            .unwrap();

        let later = now + Duration::minutes(20);
        // The second hold gets a fresh expiry by recreating it later.
        let fresh = store
            .create_hold(&hold_data(date, SlotNumber::Three, later), 4)
            .await
            .unwrap();

        let count = store.expire_due_holds(later).await.unwrap();
        assert_eq!(count, 2);

        let stale = store.find_reservation(stale.id).await.unwrap().unwrap();
        let live = store.find_reservation(live.id).await.unwrap().unwrap();
        let fresh = store.find_reservation(fresh.id).await.unwrap().unwrap();
        assert_eq!(stale.status, ReservationStatus::Expired);
        assert_eq!(live.status, ReservationStatus::Expired);
        assert_eq!(fresh.status, ReservationStatus::Hold);

        // Idempotent: a second sweep finds nothing new.
        assert_eq!(store.expire_due_holds(later).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_processed_events() {
        let store = MemoryBookingStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let now = Utc::now();
        let hold = store
            .create_hold(&hold_data(date, SlotNumber::One, now), 4)
            .await
            .unwrap();

        let cmd = ConfirmPaymentCommand {
            event_id: "evt_1".to_string(),
            reservation_id: hold.id,
            claimed_user_id: hold.user_id,
            claimed_video_id: hold.video_id,
            amount_cents: 2500,
            currency: "EUR".to_string(),
            external_reference: "cs_1".to_string(),
            retention_days: 365,
            now,
        };
        store.confirm_payment(&cmd).await.unwrap();
        assert_eq!(store.processed_event_count().await, 1);

        assert_eq!(
            store
                .purge_processed_events(now + Duration::days(31))
                .await
                .unwrap(),
            1
        );
        assert_eq!(store.processed_event_count().await, 0);
    }
}
