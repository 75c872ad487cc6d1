//! Reservation handlers: hold, list, release, cancel.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;
use validator::Validate;

use screenbook_core::error::AppError;
use screenbook_service::HoldSlotRequest;

use crate::dto::request::HoldRequest;
use crate::dto::response::ReservationResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/reservations/hold
pub async fn hold_slot(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<HoldRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let slot = req
        .slot
        .try_into()
        .map_err(|_| AppError::validation(format!("Invalid slot number {}", req.slot)))?;

    let reservation = state
        .holds
        .hold_slot(
            &auth,
            HoldSlotRequest {
                video_id: req.video_id,
                date: req.date,
                slot,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(reservation.into())))
}

/// GET /api/reservations
pub async fn list_reservations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ReservationResponse>>, ApiError> {
    let reservations = state.store.reservations_for_user(auth.user_id).await?;
    Ok(Json(
        reservations.into_iter().map(ReservationResponse::from).collect(),
    ))
}

/// POST /api/reservations/{id}/release
pub async fn release_slot(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let reservation = state.lifecycle.release_slot(&auth, id).await?;
    Ok(Json(reservation.into()))
}

/// POST /api/reservations/{id}/cancel
pub async fn cancel_reservation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let reservation = state.cancellations.cancel(&auth, id).await?;
    Ok(Json(reservation.into()))
}
