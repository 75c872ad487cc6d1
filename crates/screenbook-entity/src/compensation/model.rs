//! Compensation log entity.
//!
//! Append-only remediation trail for cases where money moved but the
//! corresponding reservation state could not be advanced. The booking
//! core writes these and never reads them back; a human or an automated
//! refund process acts on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// What kind of remediation the entry calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "compensation_action", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CompensationAction {
    /// The charge should be refunded.
    Refund,
    /// A human must investigate before acting.
    Manual,
}

/// Why the compensation entry was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "compensation_trigger", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CompensationTrigger {
    /// The reservation was no longer a hold at confirmation time.
    StatusNotHold,
    /// The hold's expiry had passed at confirmation time.
    HoldExpired,
    /// A storage failure occurred after the external charge succeeded.
    DbFailure,
}

impl fmt::Display for CompensationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatusNotHold => write!(f, "status_not_hold"),
            Self::HoldExpired => write!(f, "hold_expired"),
            Self::DbFailure => write!(f, "db_failure"),
        }
    }
}

/// A recorded compensation entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompensationLogEntry {
    /// Unique entry identifier.
    pub id: Uuid,
    /// Remediation called for.
    pub action: CompensationAction,
    /// Why the entry exists.
    pub trigger: CompensationTrigger,
    /// The reservation involved, when known.
    pub reservation_id: Option<Uuid>,
    /// The external payment event involved, when known.
    pub event_id: Option<String>,
    /// Amount charged, in minor currency units, when known.
    pub amount_cents: Option<i64>,
    /// Free-form context for investigation.
    pub details: String,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

/// Data required to append a compensation entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCompensation {
    /// Remediation called for.
    pub action: CompensationAction,
    /// Why the entry exists.
    pub trigger: CompensationTrigger,
    /// The reservation involved, when known.
    pub reservation_id: Option<Uuid>,
    /// The external payment event involved, when known.
    pub event_id: Option<String>,
    /// Amount charged, in minor currency units, when known.
    pub amount_cents: Option<i64>,
    /// Free-form context for investigation.
    pub details: String,
}
