//! Application state shared across all handlers.

use std::sync::Arc;

use screenbook_core::config::AppConfig;
use screenbook_database::BookingStore;
use screenbook_service::{
    AvailabilityService, CancellationService, ConfirmationService, HoldService, LifecycleService,
};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Booking store (PostgreSQL or in-memory).
    pub store: Arc<dyn BookingStore>,
    /// Slot availability queries.
    pub availability: Arc<AvailabilityService>,
    /// Hold allocation.
    pub holds: Arc<HoldService>,
    /// Hold release and expiry sweep.
    pub lifecycle: Arc<LifecycleService>,
    /// Payment confirmation processing.
    pub confirmations: Arc<ConfirmationService>,
    /// Cancellation and refunds.
    pub cancellations: Arc<CancellationService>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish()
    }
}
