//! Projection schedule model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Whether projections are offered on a given date.
///
/// One row per calendar date; holds can only be placed against a
/// published date.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    /// Unique schedule identifier.
    pub id: Uuid,
    /// The calendar date projections are offered on.
    pub projection_date: NaiveDate,
    /// Whether the date is visible and bookable.
    pub published: bool,
    /// When the schedule was created.
    pub created_at: DateTime<Utc>,
    /// When the schedule was last updated.
    pub updated_at: DateTime<Utc>,
}
