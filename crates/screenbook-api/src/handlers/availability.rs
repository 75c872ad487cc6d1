//! Slot availability handlers.

use axum::Json;
use axum::extract::{Path, State};
use chrono::NaiveDate;

use screenbook_core::error::AppError;
use screenbook_entity::availability::DayAvailability;

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/availability/{date}
///
/// Anonymous callers see the fill state; authenticated callers also see
/// which slots they already hold.
pub async fn day_availability(
    State(state): State<AppState>,
    Path(date): Path<String>,
    auth: Option<AuthUser>,
) -> Result<Json<DayAvailability>, ApiError> {
    let date: NaiveDate = date
        .parse()
        .map_err(|_| AppError::validation(format!("Invalid date '{date}', expected YYYY-MM-DD")))?;

    let viewer = auth.map(|a| a.user_id);
    let day = state.availability.day_availability(date, viewer).await?;
    Ok(Json(day))
}
