//! Payment confirmation command and outcome types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::payment::Payment;
use crate::reservation::{Reservation, ReservationStatus};

/// Everything the store needs to run the confirmation transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmPaymentCommand {
    /// The provider's event identifier (idempotency key).
    pub event_id: String,
    /// The reservation the event claims to confirm.
    pub reservation_id: Uuid,
    /// User id echoed in the event metadata. The stored row is the source
    /// of truth; a mismatch is logged and the stored value used.
    pub claimed_user_id: Uuid,
    /// Video id echoed in the event metadata; same trust rules as above.
    pub claimed_video_id: Uuid,
    /// Amount charged, in minor currency units.
    pub amount_cents: i64,
    /// ISO currency code.
    pub currency: String,
    /// The provider's charge/session reference.
    pub external_reference: String,
    /// Days of video retention to grant, counted from the projection date.
    pub retention_days: i64,
    /// The instant the expiry check is evaluated at.
    pub now: DateTime<Utc>,
}

/// Outcome of one confirmation attempt.
///
/// Every variant except `Applied` is a successful no-op from the payment
/// provider's point of view and must be acknowledged upstream; only
/// storage errors (surfaced as `Err`) should make the provider retry.
#[derive(Debug, Clone)]
pub enum ConfirmationOutcome {
    /// The hold was promoted and a payment recorded.
    Applied {
        /// The confirmed reservation.
        reservation: Reservation,
        /// The payment created for it.
        payment: Payment,
    },
    /// This event id was already seen; nothing changed.
    AlreadyProcessed,
    /// Another confirmation won the status race; nothing changed.
    AlreadyConfirmed,
    /// The reservation was no longer a hold. A refund compensation entry
    /// was recorded because the external charge succeeded.
    StatusNotHold {
        /// The status found instead of `Hold`.
        status: ReservationStatus,
    },
    /// The hold had expired before the event arrived. A refund
    /// compensation entry was recorded.
    HoldExpired,
}
