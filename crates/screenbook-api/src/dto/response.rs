//! Response DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use screenbook_entity::reservation::{Reservation, ReservationStatus};
use screenbook_entity::schedule::Schedule;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

/// Reservation as returned to callers.
///
/// Internal bookkeeping columns (idempotency key, payment linkage) are
/// not exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationResponse {
    /// Reservation ID.
    pub id: Uuid,
    /// The projected video.
    pub video_id: Uuid,
    /// Projection date.
    pub date: NaiveDate,
    /// Slot number.
    pub slot: i16,
    /// Current status.
    pub status: String,
    /// When the hold lapses, for rows still in `hold`.
    pub hold_expires_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationResponse {
    fn from(reservation: Reservation) -> Self {
        let hold_expires_at = if reservation.status == ReservationStatus::Hold {
            reservation.hold_expires_at
        } else {
            None
        };
        Self {
            id: reservation.id,
            video_id: reservation.video_id,
            date: reservation.projection_date,
            slot: reservation.slot_number.as_i16(),
            status: reservation.status.to_string(),
            hold_expires_at,
            created_at: reservation.created_at,
        }
    }
}

/// Schedule as returned to admin callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResponse {
    /// The date.
    pub date: NaiveDate,
    /// Whether the date is open for booking.
    pub published: bool,
}

impl From<Schedule> for ScheduleResponse {
    fn from(schedule: Schedule) -> Self {
        Self {
            date: schedule.projection_date,
            published: schedule.published,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}
