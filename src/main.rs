//! Screenbook Server — projection-slot booking service
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use screenbook_core::clock::{Clock, SystemClock};
use screenbook_core::config::AppConfig;
use screenbook_core::error::AppError;
use screenbook_database::{BookingStore, DatabasePool, MemoryBookingStore, PostgresBookingStore};
use screenbook_service::{
    AvailabilityService, CancellationService, ConfirmationService, HoldService, LifecycleService,
};

#[tokio::main]
async fn main() {
    let env = std::env::var("SCREENBOOK_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Screenbook v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Booking store ────────────────────────────────────
    let store: Arc<dyn BookingStore> = match config.database.backend.as_str() {
        "postgres" => {
            tracing::info!("Connecting to database...");
            let db_pool = DatabasePool::connect(&config.database).await?;

            tracing::info!("Running database migrations...");
            screenbook_database::migration::run_migrations(db_pool.pool()).await?;
            tracing::info!("Database migrations complete");

            Arc::new(PostgresBookingStore::new(db_pool.into_pool()))
        }
        "memory" => {
            tracing::warn!("Using in-memory store; all state is lost on restart");
            Arc::new(MemoryBookingStore::new())
        }
        other => {
            return Err(AppError::configuration(format!(
                "Unknown database backend: '{other}'. Supported: postgres, memory"
            )));
        }
    };

    // ── Step 2: Services ─────────────────────────────────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let gateway = screenbook_service::payments::gateway_from_config(&config.payment)?;

    let availability = Arc::new(AvailabilityService::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        config.booking.clone(),
    ));
    let holds = Arc::new(HoldService::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        config.booking.clone(),
    ));
    let lifecycle = Arc::new(LifecycleService::new(
        Arc::clone(&store),
        Arc::clone(&clock),
    ));
    let confirmations = Arc::new(ConfirmationService::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        config.booking.clone(),
    ));
    let cancellations = Arc::new(CancellationService::new(
        Arc::clone(&store),
        gateway,
        Arc::clone(&clock),
        config.booking.clone(),
    ));
    tracing::info!("Services initialized");

    // ── Step 3: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, _shutdown_rx) = watch::channel(false);

    // ── Step 4: Background scheduler ─────────────────────────────
    let scheduler = if config.worker.enabled {
        tracing::info!("Starting booking scheduler...");
        let scheduler = screenbook_worker::BookingScheduler::new(
            Arc::clone(&lifecycle),
            Arc::clone(&store),
            Arc::clone(&clock),
            config.worker.clone(),
        )
        .await?;
        scheduler.register_default_tasks().await?;
        scheduler.start().await?;
        tracing::info!("Booking scheduler started");
        Some(scheduler)
    } else {
        tracing::info!("Booking scheduler disabled");
        None
    };

    // ── Step 5: Build and start HTTP server ──────────────────────
    tracing::info!(
        "Starting HTTP server on {}:{}...",
        config.server.host,
        config.server.port
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app_state = screenbook_api::AppState {
        config: Arc::new(config),
        store,
        availability,
        holds,
        lifecycle,
        confirmations,
        cancellations,
    };

    let app = screenbook_api::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Screenbook server listening on {}", addr);

    // ── Step 6: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    if let Some(mut scheduler) = scheduler {
        scheduler.shutdown().await?;
    }

    tracing::info!("Screenbook server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
