//! Cron scheduler for periodic booking maintenance.

use std::sync::Arc;

use chrono::Duration;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use screenbook_core::clock::Clock;
use screenbook_core::config::worker::WorkerConfig;
use screenbook_core::error::AppError;
use screenbook_database::BookingStore;
use screenbook_service::LifecycleService;

/// Cron-based scheduler for periodic booking tasks.
pub struct BookingScheduler {
    /// The underlying job scheduler.
    scheduler: JobScheduler,
    /// Hold lifecycle service for the expiry sweep.
    lifecycle: Arc<LifecycleService>,
    /// Store handle for ledger pruning.
    store: Arc<dyn BookingStore>,
    /// Time source for the pruning cutoff.
    clock: Arc<dyn Clock>,
    /// Cron expressions and retention settings.
    config: WorkerConfig,
}

impl std::fmt::Debug for BookingScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingScheduler").finish()
    }
}

impl BookingScheduler {
    /// Create a new booking scheduler.
    pub async fn new(
        lifecycle: Arc<LifecycleService>,
        store: Arc<dyn BookingStore>,
        clock: Arc<dyn Clock>,
        config: WorkerConfig,
    ) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            lifecycle,
            store,
            clock,
            config,
        })
    }

    /// Register all default scheduled tasks.
    pub async fn register_default_tasks(&self) -> Result<(), AppError> {
        self.register_hold_sweep().await?;
        self.register_event_pruning().await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Booking scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Booking scheduler shut down");
        Ok(())
    }

    /// Hold expiry sweep — every minute by default.
    async fn register_hold_sweep(&self) -> Result<(), AppError> {
        let lifecycle = Arc::clone(&self.lifecycle);
        let job = CronJob::new_async(self.config.hold_sweep_cron.as_str(), move |_uuid, _lock| {
            let lifecycle = Arc::clone(&lifecycle);
            Box::pin(async move {
                tracing::debug!("Running hold expiry sweep");
                match lifecycle.sweep_expired_holds().await {
                    Ok(count) if count > 0 => {
                        tracing::info!(count, "Hold sweep expired lapsed holds");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!("Hold sweep failed: {}", e),
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create hold_sweep schedule: {}", e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add hold_sweep schedule: {}", e)))?;

        tracing::info!(cron = %self.config.hold_sweep_cron, "Registered: hold_sweep");
        Ok(())
    }

    /// Processed-event ledger pruning — daily at 4 AM by default.
    async fn register_event_pruning(&self) -> Result<(), AppError> {
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let retention_days = self.config.event_retention_days;
        let job = CronJob::new_async(
            self.config.ledger_prune_cron.as_str(),
            move |_uuid, _lock| {
                let store = Arc::clone(&store);
                let clock = Arc::clone(&clock);
                Box::pin(async move {
                    tracing::debug!("Pruning processed payment events");
                    let cutoff = clock.now() - Duration::days(retention_days);
                    match store.purge_processed_events(cutoff).await {
                        Ok(count) if count > 0 => {
                            tracing::info!(count, "Pruned processed payment events");
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!("Event pruning failed: {}", e),
                    }
                })
            },
        )
        .map_err(|e| AppError::internal(format!("Failed to create event_prune schedule: {}", e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add event_prune schedule: {}", e)))?;

        tracing::info!(cron = %self.config.ledger_prune_cron, "Registered: event_prune");
        Ok(())
    }
}
