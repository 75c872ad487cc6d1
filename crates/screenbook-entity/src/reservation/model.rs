//! Reservation entity model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::slot::SlotNumber;
use super::status::ReservationStatus;

/// One user's claim on one projection slot on one date.
///
/// Created as a `Hold` and promoted, released, or lapsed from there.
/// Rows are never physically deleted by the booking core.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    /// Unique reservation identifier.
    pub id: Uuid,
    /// The owning user.
    pub user_id: Uuid,
    /// The video asset to be projected.
    pub video_id: Uuid,
    /// Calendar date of the projection.
    pub projection_date: NaiveDate,
    /// Which slot of the evening.
    pub slot_number: SlotNumber,
    /// Current lifecycle status.
    pub status: ReservationStatus,
    /// When the hold lapses. Set at creation and **left in place** after
    /// promotion — readers must gate on `status` first and only consult
    /// this field while the row is still a `Hold`.
    pub hold_expires_at: Option<DateTime<Utc>>,
    /// Opaque token generated at hold creation, cleared on confirmation.
    pub idempotency_key: Option<String>,
    /// Linked payment, set exactly once during Hold → Confirmed.
    pub payment_id: Option<Uuid>,
    /// When the reservation was taken off the market by payment.
    pub locked_at: Option<DateTime<Utc>>,
    /// When the reservation was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// When the reservation was created.
    pub created_at: DateTime<Utc>,
    /// When the reservation was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Check whether this reservation counts toward slot capacity at `now`.
    ///
    /// Active = confirmed/completed, or a hold whose expiry has not passed.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            ReservationStatus::Confirmed | ReservationStatus::Completed => true,
            ReservationStatus::Hold => self.hold_expires_at.is_none_or(|expires| expires > now),
            ReservationStatus::Cancelled | ReservationStatus::Expired => false,
        }
    }

    /// Check whether this is a hold whose expiry has passed.
    pub fn is_hold_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Hold
            && self.hold_expires_at.is_some_and(|expires| expires <= now)
    }
}

/// Data required to create a new hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHold {
    /// The owning user.
    pub user_id: Uuid,
    /// The video asset to be projected.
    pub video_id: Uuid,
    /// Calendar date of the projection.
    pub projection_date: NaiveDate,
    /// Which slot of the evening.
    pub slot_number: SlotNumber,
    /// When the hold lapses.
    pub hold_expires_at: DateTime<Utc>,
    /// Freshly generated idempotency token.
    pub idempotency_key: String,
    /// The instant the capacity check is evaluated at.
    pub now: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reservation(status: ReservationStatus, expires: Option<DateTime<Utc>>) -> Reservation {
        let now = Utc::now();
        Reservation {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            video_id: Uuid::new_v4(),
            projection_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            slot_number: SlotNumber::One,
            status,
            hold_expires_at: expires,
            idempotency_key: None,
            payment_id: None,
            locked_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_active_predicate() {
        let now = Utc::now();
        let live = reservation(ReservationStatus::Hold, Some(now + Duration::minutes(5)));
        assert!(live.is_active_at(now));

        let stale = reservation(ReservationStatus::Hold, Some(now - Duration::minutes(5)));
        assert!(!stale.is_active_at(now));
        assert!(stale.is_hold_expired_at(now));

        assert!(reservation(ReservationStatus::Confirmed, None).is_active_at(now));
        assert!(reservation(ReservationStatus::Completed, None).is_active_at(now));
        assert!(!reservation(ReservationStatus::Cancelled, None).is_active_at(now));
        assert!(!reservation(ReservationStatus::Expired, None).is_active_at(now));
    }

    #[test]
    fn test_stale_expiry_ignored_once_promoted() {
        // A promoted row keeps its old hold_expires_at; status wins.
        let now = Utc::now();
        let promoted = reservation(
            ReservationStatus::Confirmed,
            Some(now - Duration::minutes(30)),
        );
        assert!(promoted.is_active_at(now));
        assert!(!promoted.is_hold_expired_at(now));
    }
}
