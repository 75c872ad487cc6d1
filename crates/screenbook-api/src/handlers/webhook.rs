//! Payment provider webhook handler.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use tracing::debug;
use validator::Validate;

use screenbook_core::error::AppError;
use screenbook_service::{ConfirmationResult, PaymentEvent};

use crate::dto::request::WebhookPaymentRequest;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/webhooks/payment
///
/// Always answers 200 for outcomes the provider must not retry —
/// duplicates, stale holds, already-confirmed rows. Only unexpected
/// storage failures surface as 5xx, which makes the provider redeliver.
pub async fn payment_succeeded(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<WebhookPaymentRequest>,
) -> Result<Json<ConfirmationResult>, ApiError> {
    if let Some(expected) = &state.config.payment.webhook_secret {
        let provided = headers
            .get("x-webhook-secret")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing webhook secret"))?;
        if provided != expected {
            return Err(AppError::authentication("Invalid webhook secret").into());
        }
    }

    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    debug!(
        event_id = %req.event_id,
        session = %req.session_reference,
        reservation_id = %req.metadata.reservation_id,
        "Payment webhook received"
    );

    let result = state
        .confirmations
        .confirm(PaymentEvent {
            event_id: req.event_id,
            reservation_id: req.metadata.reservation_id,
            user_id: req.metadata.user_id,
            video_id: req.metadata.video_id,
            amount_cents: req.amount_cents,
            currency: req.currency,
            payment_reference: req.payment_reference,
        })
        .await?;

    Ok(Json(result))
}
