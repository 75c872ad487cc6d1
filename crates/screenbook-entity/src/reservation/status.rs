//! Reservation status enumeration and transition rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a reservation.
///
/// Transitions are monotonic: `Hold` → {`Confirmed`, `Expired`, `Cancelled`},
/// `Confirmed` → {`Completed`, `Cancelled`}. Nothing else is valid.
/// `Expired` doubles as the terminal state for explicit user release;
/// both free slot capacity identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reservation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Temporary claim awaiting payment; lapses at `hold_expires_at`.
    Hold,
    /// Paid and durable.
    Confirmed,
    /// The projection took place.
    Completed,
    /// Cancelled by the user or an operator.
    Cancelled,
    /// Lapsed without payment, or explicitly released by the user.
    Expired,
}

impl ReservationStatus {
    /// Check whether a transition from this status to `next` is valid.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        matches!(
            (self, next),
            (Self::Hold, Self::Confirmed)
                | (Self::Hold, Self::Expired)
                | (Self::Hold, Self::Cancelled)
                | (Self::Confirmed, Self::Completed)
                | (Self::Confirmed, Self::Cancelled)
        )
    }

    /// Check whether this status is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hold => "hold",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = screenbook_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hold" => Ok(Self::Hold),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            _ => Err(screenbook_core::AppError::validation(format!(
                "Invalid reservation status: '{s}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(ReservationStatus::Hold.can_transition_to(ReservationStatus::Confirmed));
        assert!(ReservationStatus::Hold.can_transition_to(ReservationStatus::Expired));
        assert!(ReservationStatus::Hold.can_transition_to(ReservationStatus::Cancelled));
        assert!(ReservationStatus::Confirmed.can_transition_to(ReservationStatus::Completed));
        assert!(ReservationStatus::Confirmed.can_transition_to(ReservationStatus::Cancelled));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!ReservationStatus::Confirmed.can_transition_to(ReservationStatus::Hold));
        assert!(!ReservationStatus::Expired.can_transition_to(ReservationStatus::Confirmed));
        assert!(!ReservationStatus::Cancelled.can_transition_to(ReservationStatus::Hold));
        assert!(!ReservationStatus::Completed.can_transition_to(ReservationStatus::Cancelled));
        assert!(!ReservationStatus::Hold.can_transition_to(ReservationStatus::Completed));
    }

    #[test]
    fn test_terminal_states() {
        assert!(ReservationStatus::Expired.is_terminal());
        assert!(ReservationStatus::Cancelled.is_terminal());
        assert!(ReservationStatus::Completed.is_terminal());
        assert!(!ReservationStatus::Hold.is_terminal());
        assert!(!ReservationStatus::Confirmed.is_terminal());
    }
}
