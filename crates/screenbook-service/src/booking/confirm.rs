//! Payment confirmation: turning a successful external charge into a
//! confirmed reservation, exactly once.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use screenbook_core::clock::Clock;
use screenbook_core::config::booking::BookingConfig;
use screenbook_core::result::AppResult;
use screenbook_database::BookingStore;
use screenbook_entity::compensation::{CompensationAction, CompensationTrigger, NewCompensation};
use screenbook_entity::confirmation::{ConfirmPaymentCommand, ConfirmationOutcome};

/// A successful-charge event delivered by the payment provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// The provider's unique event id.
    pub event_id: String,
    /// The reservation named in the checkout metadata.
    pub reservation_id: Uuid,
    /// The user id echoed in the metadata.
    pub user_id: Uuid,
    /// The video id echoed in the metadata.
    pub video_id: Uuid,
    /// Amount charged, in minor currency units.
    pub amount_cents: i64,
    /// ISO currency code.
    pub currency: String,
    /// The provider's charge reference, used later for refunds.
    pub payment_reference: String,
}

/// Outcome reported back to the webhook endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationResult {
    /// Whether this delivery promoted the hold.
    pub applied: bool,
    /// Machine-readable reason when nothing was applied.
    pub reason: String,
}

/// Applies successful-charge events to reservations.
#[derive(Clone)]
pub struct ConfirmationService {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    booking: BookingConfig,
}

impl ConfirmationService {
    /// Creates a new confirmation service.
    pub fn new(store: Arc<dyn BookingStore>, clock: Arc<dyn Clock>, booking: BookingConfig) -> Self {
        Self {
            store,
            clock,
            booking,
        }
    }

    /// Processes one payment event.
    ///
    /// Every `Ok` result, applied or not, must be acknowledged to the
    /// provider with a success response; duplicates and invalid-hold
    /// outcomes are normal operation, not failures. An `Err` means the
    /// state of the event is unknown and the provider should redeliver.
    pub async fn confirm(&self, event: PaymentEvent) -> AppResult<ConfirmationResult> {
        let now = self.clock.now();
        let cmd = ConfirmPaymentCommand {
            event_id: event.event_id.clone(),
            reservation_id: event.reservation_id,
            claimed_user_id: event.user_id,
            claimed_video_id: event.video_id,
            amount_cents: event.amount_cents,
            currency: event.currency.clone(),
            external_reference: event.payment_reference.clone(),
            retention_days: self.booking.retention_days,
            now,
        };

        let outcome = match self.store.confirm_payment(&cmd).await {
            Ok(outcome) => outcome,
            Err(err) => {
                // The charge already happened; a lost confirmation needs a
                // human. The ledger insert rolled back with the failure, so
                // the provider's retry will re-run the whole transaction.
                error!(
                    event_id = %event.event_id,
                    reservation_id = %event.reservation_id,
                    error = %err,
                    "Confirmation transaction failed after successful charge"
                );
                if let Err(log_err) = self
                    .store
                    .record_compensation(
                        &NewCompensation {
                            action: CompensationAction::Manual,
                            trigger: CompensationTrigger::DbFailure,
                            reservation_id: Some(event.reservation_id),
                            event_id: Some(event.event_id.clone()),
                            amount_cents: Some(event.amount_cents),
                            details: format!(
                                "Charge {} succeeded but confirmation failed: {err}",
                                event.payment_reference
                            ),
                        },
                        now,
                    )
                    .await
                {
                    error!(error = %log_err, "Failed to record compensation entry");
                }
                return Err(err);
            }
        };

        let result = match outcome {
            ConfirmationOutcome::Applied {
                reservation,
                payment,
            } => {
                info!(
                    reservation_id = %reservation.id,
                    payment_id = %payment.id,
                    event_id = %event.event_id,
                    "Payment confirmed"
                );
                ConfirmationResult {
                    applied: true,
                    reason: "confirmed".to_string(),
                }
            }
            ConfirmationOutcome::AlreadyProcessed => ConfirmationResult {
                applied: false,
                reason: "already_processed".to_string(),
            },
            ConfirmationOutcome::AlreadyConfirmed => ConfirmationResult {
                applied: false,
                reason: "already_confirmed".to_string(),
            },
            ConfirmationOutcome::StatusNotHold { status } => {
                warn!(
                    reservation_id = %event.reservation_id,
                    event_id = %event.event_id,
                    status = %status,
                    "Charge arrived for a reservation that is no longer held"
                );
                ConfirmationResult {
                    applied: false,
                    reason: "status_not_hold".to_string(),
                }
            }
            ConfirmationOutcome::HoldExpired => {
                warn!(
                    reservation_id = %event.reservation_id,
                    event_id = %event.event_id,
                    "Charge arrived after the hold expired"
                );
                ConfirmationResult {
                    applied: false,
                    reason: "hold_expired".to_string(),
                }
            }
        };
        Ok(result)
    }
}
