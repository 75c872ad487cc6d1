//! PostgreSQL implementation of the booking store.
//!
//! Concurrency mechanics:
//! - hold creation serializes on `pg_advisory_xact_lock` keyed by
//!   (date, slot), so the count-then-insert runs under mutual exclusion
//!   for the contended key only;
//! - confirmation's exactly-once gate is `INSERT ... ON CONFLICT DO
//!   NOTHING` on the processed-event ledger, and its promotion is a
//!   conditional `UPDATE ... WHERE status = 'hold'` compare-and-swap.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use screenbook_core::error::{AppError, ErrorKind};
use screenbook_core::result::AppResult;
use screenbook_entity::compensation::{
    CompensationAction, CompensationLogEntry, CompensationTrigger, NewCompensation,
};
use screenbook_entity::confirmation::{ConfirmPaymentCommand, ConfirmationOutcome};
use screenbook_entity::payment::Payment;
use screenbook_entity::reservation::{CreateHold, Reservation, ReservationStatus, SlotNumber};
use screenbook_entity::schedule::Schedule;
use screenbook_entity::video::Video;

use super::BookingStore;

/// SQL fragment for the "counts toward capacity" predicate. `$2` is the
/// slot, `$3` the evaluation instant; `$1` binds the date in each query
/// that uses it.
const ACTIVE_FOR_SLOT: &str = "projection_date = $1 AND slot_number = $2 \
     AND (status IN ('confirmed', 'completed') \
          OR (status = 'hold' AND (hold_expires_at IS NULL OR hold_expires_at > $3)))";

/// Production booking store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Create a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Advisory lock key for a (date, slot) pair.
///
/// Layout: day number from the common era shifted left three bits, low
/// bits carrying the slot number. Distinct pairs map to distinct keys, so
/// unrelated dates and slots never contend.
fn slot_lock_key(date: NaiveDate, slot: SlotNumber) -> i64 {
    ((date.num_days_from_ce() as i64) << 3) | slot.as_i16() as i64
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    async fn find_video(&self, video_id: Uuid) -> AppResult<Option<Video>> {
        sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find video", e))
    }

    async fn find_schedule(&self, date: NaiveDate) -> AppResult<Option<Schedule>> {
        sqlx::query_as::<_, Schedule>("SELECT * FROM schedules WHERE projection_date = $1")
            .bind(date)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find schedule", e))
    }

    async fn upsert_schedule(&self, date: NaiveDate, published: bool) -> AppResult<Schedule> {
        sqlx::query_as::<_, Schedule>(
            "INSERT INTO schedules (projection_date, published) VALUES ($1, $2) \
             ON CONFLICT (projection_date) \
             DO UPDATE SET published = EXCLUDED.published, updated_at = NOW() \
             RETURNING *",
        )
        .bind(date)
        .bind(published)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert schedule", e))
    }

    async fn active_reservations_for_date(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE projection_date = $1 \
             AND (status IN ('confirmed', 'completed') \
                  OR (status = 'hold' AND (hold_expires_at IS NULL OR hold_expires_at > $2)))",
        )
        .bind(date)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list active reservations", e)
        })
    }

    async fn find_reservation(&self, id: Uuid) -> AppResult<Option<Reservation>> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find reservation", e)
            })
    }

    async fn reservations_for_user(&self, user_id: Uuid) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list user reservations", e)
        })
    }

    async fn create_hold(&self, data: &CreateHold, max_per_slot: u32) -> AppResult<Reservation> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        // Serialize competing hold attempts for this (date, slot) only.
        // The lock is released automatically at commit or rollback.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(slot_lock_key(data.projection_date, data.slot_number))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to acquire slot lock", e)
            })?;

        // Re-count under exclusion; a count taken before the lock could
        // race with another inserter.
        let active: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM reservations WHERE {ACTIVE_FOR_SLOT}"
        ))
        .bind(data.projection_date)
        .bind(data.slot_number)
        .bind(data.now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count active reservations", e)
        })?;

        if active as u32 >= max_per_slot {
            debug!(
                date = %data.projection_date,
                slot = %data.slot_number,
                active,
                "Hold rejected: slot at capacity"
            );
            return Err(AppError::slot_unavailable(format!(
                "Slot {} on {} is fully booked",
                data.slot_number, data.projection_date
            )));
        }

        let reservation = sqlx::query_as::<_, Reservation>(
            "INSERT INTO reservations \
             (user_id, video_id, projection_date, slot_number, status, hold_expires_at, \
              idempotency_key, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, 'hold', $5, $6, $7, $7) RETURNING *",
        )
        .bind(data.user_id)
        .bind(data.video_id)
        .bind(data.projection_date)
        .bind(data.slot_number)
        .bind(data.hold_expires_at)
        .bind(&data.idempotency_key)
        .bind(data.now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert hold", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit hold", e)
        })?;

        info!(
            reservation_id = %reservation.id,
            user_id = %reservation.user_id,
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
        sqlx::query_as::<_, Reservation>(
            "UPDATE reservations SET status = 'expired', updated_at = $3 \
             WHERE id = $1 AND user_id = $2 AND status = 'hold' RETURNING *",
        )
        .bind(reservation_id)
        .bind(user_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to release hold", e))?
        .ok_or_else(|| AppError::not_found("Reservation not found or not currently held"))
    }

    async fn expire_due_holds(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE reservations SET status = 'expired', updated_at = $1 \
             WHERE status = 'hold' AND hold_expires_at IS NOT NULL AND hold_expires_at < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to expire holds", e))?;

        Ok(result.rows_affected())
    }

    async fn confirm_payment(
        &self,
        cmd: &ConfirmPaymentCommand,
    ) -> AppResult<ConfirmationOutcome> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        // Exactly-once gate. A concurrent insert of the same event id
        // blocks here until the first transaction commits, then no-ops.
        let gate = sqlx::query(
            "INSERT INTO processed_payment_events (event_id, reservation_id, received_at) \
             VALUES ($1, $2, $3) ON CONFLICT (event_id) DO NOTHING",
        )
        .bind(&cmd.event_id)
        .bind(cmd.reservation_id)
        .bind(cmd.now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record payment event", e)
        })?;

        if gate.rows_affected() == 0 {
            tx.commit().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to commit", e)
            })?;
            return Ok(ConfirmationOutcome::AlreadyProcessed);
        }

        // An event referencing an unknown reservation is a fatal
        // inconsistency; the rollback also discards the ledger row so
        // redelivery surfaces the same error.
        let reservation = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE id = $1",
        )
        .bind(cmd.reservation_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load reservation", e)
        })?
        .ok_or_else(|| {
            AppError::not_found(format!(
                "Payment event {} references unknown reservation {}",
                cmd.event_id, cmd.reservation_id
            ))
        })?;

        // The stored row is the source of truth over event metadata.
        if reservation.user_id != cmd.claimed_user_id
            || reservation.video_id != cmd.claimed_video_id
        {
            warn!(
                reservation_id = %reservation.id,
                claimed_user_id = %cmd.claimed_user_id,
                claimed_video_id = %cmd.claimed_video_id,
                stored_user_id = %reservation.user_id,
                stored_video_id = %reservation.video_id,
                "Payment event metadata does not match stored reservation; using stored values"
            );
        }

        // A row already promoted means a retried webhook for the same
        // charge under a fresh event id: the benign no-op, not a refund
        // case. The ledger row is kept so the retry is absorbed.
        if reservation.status == ReservationStatus::Confirmed {
            tx.commit().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to commit", e)
            })?;
            return Ok(ConfirmationOutcome::AlreadyConfirmed);
        }

        if reservation.status != ReservationStatus::Hold {
            record_compensation_tx(
                &mut tx,
                &NewCompensation {
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
            )
            .await?;
            tx.commit().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to commit", e)
            })?;
            return Ok(ConfirmationOutcome::StatusNotHold {
                status: reservation.status,
            });
        }

        let expired = match reservation.hold_expires_at {
            None => true,
            Some(expires) => expires < cmd.now,
        };
        if expired {
            record_compensation_tx(
                &mut tx,
                &NewCompensation {
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
            )
            .await?;
            tx.commit().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to commit", e)
            })?;
            return Ok(ConfirmationOutcome::HoldExpired);
        }

        // Compare-and-swap on status: of two racing confirmations with
        // different event ids, exactly one sees a row here.
        let cas = sqlx::query(
            "UPDATE reservations \
             SET status = 'confirmed', idempotency_key = NULL, locked_at = $2, updated_at = $2 \
             WHERE id = $1 AND status = 'hold'",
        )
        .bind(reservation.id)
        .bind(cmd.now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to confirm reservation", e)
        })?;

        if cas.rows_affected() == 0 {
            tx.commit().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to commit", e)
            })?;
            return Ok(ConfirmationOutcome::AlreadyConfirmed);
        }

        let payment = sqlx::query_as::<_, Payment>(
            "INSERT INTO payments \
             (user_id, reservation_id, amount_cents, currency, external_reference, status, \
              created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, 'succeeded', $6, $6) RETURNING *",
        )
        .bind(reservation.user_id)
        .bind(reservation.id)
        .bind(cmd.amount_cents)
        .bind(&cmd.currency)
        .bind(&cmd.external_reference)
        .bind(cmd.now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert payment", e))?;

        let reservation = sqlx::query_as::<_, Reservation>(
            "UPDATE reservations SET payment_id = $2 WHERE id = $1 RETURNING *",
        )
        .bind(reservation.id)
        .bind(payment.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to link payment", e))?;

        let retention_until = reservation
            .projection_date
            .and_time(NaiveTime::MIN)
            .and_utc()
            + chrono::Duration::days(cmd.retention_days);

        sqlx::query(
            "UPDATE videos SET ephemeral = FALSE, retention_until = $2, updated_at = $3 \
             WHERE id = $1",
        )
        .bind(reservation.video_id)
        .bind(retention_until)
        .bind(cmd.now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to extend video retention", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit confirmation", e)
        })?;

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
        sqlx::query_as::<_, CompensationLogEntry>(
            "INSERT INTO compensation_log \
             (action, trigger, reservation_id, event_id, amount_cents, details, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(entry.action)
        .bind(entry.trigger)
        .bind(entry.reservation_id)
        .bind(&entry.event_id)
        .bind(entry.amount_cents)
        .bind(&entry.details)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record compensation", e)
        })
    }

    async fn cancel_reservation(
        &self,
        reservation_id: Uuid,
        expected: ReservationStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>(
            "UPDATE reservations SET status = 'cancelled', cancelled_at = $3, updated_at = $3 \
             WHERE id = $1 AND status = $2 RETURNING *",
        )
        .bind(reservation_id)
        .bind(expected)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to cancel reservation", e)
        })?
        .ok_or_else(|| AppError::conflict("Reservation was modified concurrently"))
    }

    async fn find_payment(&self, id: Uuid) -> AppResult<Option<Payment>> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find payment", e))
    }

    async fn mark_payment_refunded(
        &self,
        payment_id: Uuid,
        refund_reference: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>(
            "UPDATE payments SET status = 'refunded', refund_reference = $2, \
             refunded_at = $3, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(payment_id)
        .bind(refund_reference)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark payment refunded", e)
        })?
        .ok_or_else(|| AppError::not_found(format!("Payment {payment_id} not found")))
    }

    async fn purge_processed_events(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM processed_payment_events WHERE received_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to purge event ledger", e)
            })?;

        Ok(result.rows_affected())
    }
}

/// Append a compensation entry inside an open confirmation transaction.
async fn record_compensation_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    entry: &NewCompensation,
    now: DateTime<Utc>,
) -> AppResult<CompensationLogEntry> {
    sqlx::query_as::<_, CompensationLogEntry>(
        "INSERT INTO compensation_log \
         (action, trigger, reservation_id, event_id, amount_cents, details, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(entry.action)
    .bind(entry.trigger)
    .bind(entry.reservation_id)
    .bind(&entry.event_id)
    .bind(entry.amount_cents)
    .bind(&entry.details)
    .bind(now)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record compensation", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lock_keys_are_distinct_across_slots_and_dates() {
        let mut keys = HashSet::new();
        for day in 1..=28 {
            let date = NaiveDate::from_ymd_opt(2026, 9, day).unwrap();
            for slot in SlotNumber::all() {
                assert!(keys.insert(slot_lock_key(date, slot)));
            }
        }
    }

    #[test]
    fn test_lock_key_is_deterministic() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        assert_eq!(
            slot_lock_key(date, SlotNumber::Two),
            slot_lock_key(date, SlotNumber::Two)
        );
    }
}
