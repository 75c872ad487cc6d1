//! Cancellation and refund coordination.

use std::sync::Arc;

use chrono::Duration;
use tracing::{error, info};
use uuid::Uuid;

use screenbook_core::clock::Clock;
use screenbook_core::config::booking::BookingConfig;
use screenbook_core::error::AppError;
use screenbook_core::result::AppResult;
use screenbook_database::BookingStore;
use screenbook_entity::reservation::{Reservation, ReservationStatus};

use crate::context::RequestContext;
use crate::payments::PaymentGateway;

/// Cancels reservations and coordinates refunds for confirmed ones.
#[derive(Clone)]
pub struct CancellationService {
    store: Arc<dyn BookingStore>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    booking: BookingConfig,
}

impl CancellationService {
    /// Creates a new cancellation service.
    pub fn new(
        store: Arc<dyn BookingStore>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        booking: BookingConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            clock,
            booking,
        }
    }

    /// Cancels the caller's own reservation.
    ///
    /// Holds cancel freely; confirmed reservations only up to the
    /// configured deadline before the slot starts. Cancelling a confirmed
    /// reservation triggers an asynchronous refund of its payment.
    pub async fn cancel(&self, ctx: &RequestContext, reservation_id: Uuid) -> AppResult<Reservation> {
        let reservation = self
            .store
            .find_reservation(reservation_id)
            .await?
            .filter(|r| r.user_id == ctx.user_id)
            .ok_or_else(|| AppError::not_found("Reservation not found"))?;

        if reservation.status == ReservationStatus::Confirmed {
            let slot_start = reservation
                .projection_date
                .and_time(self.booking.slot_start_time(reservation.slot_number.as_i16())?)
                .and_utc();
            let deadline = slot_start - Duration::hours(self.booking.cancel_deadline_hours);
            if self.clock.now() >= deadline {
                return Err(AppError::validation(format!(
                    "Reservation can no longer be cancelled; the deadline was {deadline}"
                )));
            }
        }

        self.cancel_inner(reservation).await
    }

    /// Cancels any reservation, bypassing the deadline. Operator use only;
    /// role enforcement happens at the API boundary.
    pub async fn cancel_as_admin(
        &self,
        ctx: &RequestContext,
        reservation_id: Uuid,
    ) -> AppResult<Reservation> {
        let reservation = self
            .store
            .find_reservation(reservation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Reservation not found"))?;

        info!(
            reservation_id = %reservation.id,
            admin_id = %ctx.user_id,
            "Operator cancellation"
        );
        self.cancel_inner(reservation).await
    }

    async fn cancel_inner(&self, reservation: Reservation) -> AppResult<Reservation> {
        let expected = match reservation.status {
            ReservationStatus::Hold | ReservationStatus::Confirmed => reservation.status,
            other => {
                return Err(AppError::validation(format!(
                    "Reservation in status '{other}' cannot be cancelled"
                )));
            }
        };

        let now = self.clock.now();
        let cancelled = self
            .store
            .cancel_reservation(reservation.id, expected, now)
            .await?;
        info!(reservation_id = %cancelled.id, from = %expected, "Reservation cancelled");

        if expected == ReservationStatus::Confirmed {
            if let Some(payment_id) = cancelled.payment_id {
                self.spawn_refund(payment_id);
            }
        }
        Ok(cancelled)
    }

    /// Fires the refund in the background. A failure here is logged and
    /// left to operational follow-up; the cancellation itself already
    /// committed and must not be unwound by a flaky provider call.
    fn spawn_refund(&self, payment_id: Uuid) {
        let store = Arc::clone(&self.store);
        let gateway = Arc::clone(&self.gateway);
        let clock = Arc::clone(&self.clock);
        tokio::spawn(async move {
            let payment = match store.find_payment(payment_id).await {
                Ok(Some(payment)) => payment,
                Ok(None) => {
                    error!(payment_id = %payment_id, "Payment to refund not found");
                    return;
                }
                Err(err) => {
                    error!(payment_id = %payment_id, error = %err, "Failed to load payment for refund");
                    return;
                }
            };

            match gateway
                .refund(&payment.external_reference, payment.amount_cents)
                .await
            {
                Ok(reference) => {
                    if let Err(err) = store
                        .mark_payment_refunded(payment.id, &reference, clock.now())
                        .await
                    {
                        error!(payment_id = %payment.id, error = %err, "Refund succeeded but could not be recorded");
                    } else {
                        info!(payment_id = %payment.id, refund = %reference, "Payment refunded");
                    }
                }
                Err(err) => {
                    error!(
                        payment_id = %payment.id,
                        charge = %payment.external_reference,
                        error = %err,
                        "Refund call failed"
                    );
                }
            }
        });
    }
}
