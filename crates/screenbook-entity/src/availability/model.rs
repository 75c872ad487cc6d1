//! Derived slot availability view.
//!
//! Never persisted — always recomputed from reservation rows so there is
//! no second, independently-driftable source of truth for capacity.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::reservation::SlotNumber;

/// Fill state of a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    /// No active reservations.
    Available,
    /// Some capacity remains.
    Partial,
    /// At or over capacity.
    Full,
}

/// Availability of one slot on one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotAvailability {
    /// The slot.
    pub slot: SlotNumber,
    /// Fill state.
    pub status: SlotStatus,
    /// Number of active reservations.
    pub active_count: u32,
    /// Maximum active reservations allowed.
    pub capacity: u32,
    /// Whether the viewing user already holds this slot.
    pub held_by_me: bool,
    /// Expiry of the viewing user's hold, if any.
    pub my_hold_expires_at: Option<DateTime<Utc>>,
}

/// Availability of all slots on one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAvailability {
    /// The date queried.
    pub date: NaiveDate,
    /// Whether a published schedule exists for the date.
    pub published: bool,
    /// Per-slot availability; empty when the date is not published.
    pub slots: Vec<SlotAvailability>,
}

impl SlotStatus {
    /// Classify a slot from its active count and capacity.
    pub fn from_count(active_count: u32, capacity: u32) -> Self {
        if active_count == 0 {
            Self::Available
        } else if active_count < capacity {
            Self::Partial
        } else {
            Self::Full
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(SlotStatus::from_count(0, 4), SlotStatus::Available);
        assert_eq!(SlotStatus::from_count(1, 4), SlotStatus::Partial);
        assert_eq!(SlotStatus::from_count(3, 4), SlotStatus::Partial);
        assert_eq!(SlotStatus::from_count(4, 4), SlotStatus::Full);
        assert_eq!(SlotStatus::from_count(5, 4), SlotStatus::Full);
    }
}
