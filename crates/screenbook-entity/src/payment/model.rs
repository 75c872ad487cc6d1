//! Payment entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::PaymentStatus;

/// One successful charge tied 1:1 to a reservation at confirmation time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    /// Unique payment identifier.
    pub id: Uuid,
    /// The paying user (taken from the reservation row, not event metadata).
    pub user_id: Uuid,
    /// The reservation this payment confirmed.
    pub reservation_id: Uuid,
    /// Amount charged, in minor currency units.
    pub amount_cents: i64,
    /// ISO currency code.
    pub currency: String,
    /// The provider's charge/session reference.
    pub external_reference: String,
    /// Current status.
    pub status: PaymentStatus,
    /// The provider's refund reference, once refunded.
    pub refund_reference: Option<String>,
    /// When the refund was recorded.
    pub refunded_at: Option<DateTime<Utc>>,
    /// When the payment was created.
    pub created_at: DateTime<Utc>,
    /// When the payment was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to record a new payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePayment {
    /// The paying user.
    pub user_id: Uuid,
    /// The reservation being confirmed.
    pub reservation_id: Uuid,
    /// Amount charged, in minor currency units.
    pub amount_cents: i64,
    /// ISO currency code.
    pub currency: String,
    /// The provider's charge/session reference.
    pub external_reference: String,
}
