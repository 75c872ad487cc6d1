//! Request DTOs with validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Body of `POST /api/reservations/hold`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HoldRequest {
    /// The video to project.
    pub video_id: Uuid,
    /// The projection date.
    pub date: NaiveDate,
    /// The slot number.
    #[validate(range(min = 1, max = 4, message = "Slot must be between 1 and 4"))]
    pub slot: i16,
}

/// Body of `POST /api/admin/schedules`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishScheduleRequest {
    /// The date to publish.
    pub date: NaiveDate,
}

/// Checkout metadata echoed back by the payment provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookMetadata {
    /// The reservation this charge pays for.
    pub reservation_id: Uuid,
    /// The video named at checkout.
    pub video_id: Uuid,
    /// The paying user.
    pub user_id: Uuid,
}

/// Body of `POST /api/webhooks/payment`: a successful-charge event.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WebhookPaymentRequest {
    /// The provider's unique event id.
    #[validate(length(min = 1, message = "event_id is required"))]
    pub event_id: String,
    /// The provider's checkout session reference.
    pub session_reference: String,
    /// Amount charged, in minor currency units.
    #[validate(range(min = 0, message = "amount_cents must not be negative"))]
    pub amount_cents: i64,
    /// ISO currency code.
    pub currency: String,
    /// Checkout metadata.
    pub metadata: WebhookMetadata,
    /// The provider's charge reference, used for refunds.
    #[validate(length(min = 1, message = "payment_reference is required"))]
    pub payment_reference: String,
}
