//! Processed payment event ledger entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Idempotency ledger entry keyed by the provider's event identifier.
///
/// Inserted on first sight of an event; the primary-key uniqueness
/// constraint on `event_id` is the duplicate-detection mechanism that
/// makes payment confirmation exactly-once.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProcessedPaymentEvent {
    /// The provider's event identifier.
    pub event_id: String,
    /// The reservation the event referred to, when its metadata carried one.
    pub reservation_id: Option<Uuid>,
    /// When the event was first seen.
    pub received_at: DateTime<Utc>,
}
