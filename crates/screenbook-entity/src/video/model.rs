//! Video asset model.
//!
//! Screenbook only consumes the narrow asset-registry facet the booking
//! core needs: ownership lookup at hold time and the retention/tier
//! update at confirmation time. Upload and catalog management live
//! elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's uploaded video asset.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Video {
    /// Unique video identifier.
    pub id: Uuid,
    /// The owning user.
    pub user_id: Uuid,
    /// Display title.
    pub title: String,
    /// Object storage key.
    pub storage_key: String,
    /// Whether the asset is still on the ephemeral free tier.
    pub ephemeral: bool,
    /// When the asset will be reclaimed (None = indefinite).
    pub retention_until: Option<DateTime<Utc>>,
    /// When the video was created.
    pub created_at: DateTime<Utc>,
    /// When the video was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Check whether the given user owns this video.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}
