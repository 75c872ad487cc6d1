//! Operator handlers: schedule publishing and override cancellation.

use axum::Json;
use axum::extract::{Path, State};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::dto::request::PublishScheduleRequest;
use crate::dto::response::{ReservationResponse, ScheduleResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/admin/schedules
pub async fn publish_schedule(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<PublishScheduleRequest>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    auth.require_admin()?;
    let schedule = state.store.upsert_schedule(req.date, true).await?;
    Ok(Json(schedule.into()))
}

/// DELETE /api/admin/schedules/{date}
///
/// Unpublishing stops new holds; existing reservations are untouched.
pub async fn unpublish_schedule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(date): Path<NaiveDate>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    auth.require_admin()?;
    let schedule = state.store.upsert_schedule(date, false).await?;
    Ok(Json(schedule.into()))
}

/// POST /api/admin/reservations/{id}/cancel
pub async fn cancel_reservation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationResponse>, ApiError> {
    auth.require_admin()?;
    let reservation = state.cancellations.cancel_as_admin(&auth, id).await?;
    Ok(Json(reservation.into()))
}
