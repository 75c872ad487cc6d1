//! The booking storage port.
//!
//! [`BookingStore`] is the single seam between the booking services and
//! persistence. Two implementations are provided: [`PostgresBookingStore`]
//! for production and [`MemoryBookingStore`] for tests and single-node
//! development. Both give the same outward semantics: capacity checks are
//! serialized per (date, slot), and payment confirmation runs as one
//! atomic unit.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use screenbook_core::result::AppResult;
use screenbook_entity::compensation::{CompensationLogEntry, NewCompensation};
use screenbook_entity::confirmation::{ConfirmPaymentCommand, ConfirmationOutcome};
use screenbook_entity::payment::Payment;
use screenbook_entity::reservation::{CreateHold, Reservation, ReservationStatus};
use screenbook_entity::schedule::Schedule;
use screenbook_entity::video::Video;

pub use memory::MemoryBookingStore;
pub use postgres::PostgresBookingStore;

/// Storage port for the slot booking core.
///
/// Every method that compares against the current time takes an explicit
/// `now` so callers observe a single instant per operation.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Find a video by id.
    async fn find_video(&self, video_id: Uuid) -> AppResult<Option<Video>>;

    /// Find the schedule for a date.
    async fn find_schedule(&self, date: NaiveDate) -> AppResult<Option<Schedule>>;

    /// Create or update the schedule for a date.
    async fn upsert_schedule(&self, date: NaiveDate, published: bool) -> AppResult<Schedule>;

    /// All reservations for a date that count toward capacity at `now`:
    /// confirmed/completed rows plus holds whose expiry has not passed.
    async fn active_reservations_for_date(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>>;

    /// Find a reservation by id.
    async fn find_reservation(&self, id: Uuid) -> AppResult<Option<Reservation>>;

    /// All reservations belonging to a user, newest first.
    async fn reservations_for_user(&self, user_id: Uuid) -> AppResult<Vec<Reservation>>;

    /// Atomically re-count active reservations for the hold's (date, slot)
    /// and insert a new hold if capacity remains.
    ///
    /// Concurrent calls for the same (date, slot) are strictly ordered;
    /// unrelated keys do not contend. Returns `SlotUnavailable` when the
    /// slot is at capacity, without creating a row.
    async fn create_hold(&self, data: &CreateHold, max_per_slot: u32) -> AppResult<Reservation>;

    /// Release a hold owned by `user_id`, transitioning it to `Expired`.
    ///
    /// Fails with not-found when the reservation does not exist, is not
    /// owned by the caller, or is no longer a hold.
    async fn release_hold(
        &self,
        reservation_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Reservation>;

    /// Bulk-expire every hold whose `hold_expires_at` has passed.
    ///
    /// Idempotent; never touches rows that have already moved past `Hold`,
    /// even when they carry a stale expiry timestamp.
    async fn expire_due_holds(&self, now: DateTime<Utc>) -> AppResult<u64>;

    /// Run the payment confirmation transaction: idempotency gate,
    /// hold validation, compare-and-swap promotion, payment insert, and
    /// video retention extension, all in one atomic unit.
    ///
    /// Invalid-hold outcomes still persist their ledger and compensation
    /// rows; only storage failures roll everything back.
    async fn confirm_payment(
        &self,
        cmd: &ConfirmPaymentCommand,
    ) -> AppResult<ConfirmationOutcome>;

    /// Append a compensation entry outside any confirmation transaction.
    async fn record_compensation(
        &self,
        entry: &NewCompensation,
        now: DateTime<Utc>,
    ) -> AppResult<CompensationLogEntry>;

    /// Transition a reservation to `Cancelled`, but only if its status
    /// still equals `expected` (compare-and-swap). Fails with a conflict
    /// when the row was modified concurrently.
    async fn cancel_reservation(
        &self,
        reservation_id: Uuid,
        expected: ReservationStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Reservation>;

    /// Find a payment by id.
    async fn find_payment(&self, id: Uuid) -> AppResult<Option<Payment>>;

    /// Record a completed refund on a payment.
    async fn mark_payment_refunded(
        &self,
        payment_id: Uuid,
        refund_reference: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Payment>;

    /// Delete processed-event ledger entries received before the cutoff.
    async fn purge_processed_events(&self, before: DateTime<Utc>) -> AppResult<u64>;
}
