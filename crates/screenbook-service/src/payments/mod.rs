//! Payment provider integration.

pub mod gateway;

use std::sync::Arc;

use tracing::info;

use screenbook_core::config::payment::PaymentConfig;
use screenbook_core::error::AppError;
use screenbook_core::result::AppResult;

pub use gateway::{HttpPaymentGateway, NoopPaymentGateway, PaymentGateway};

/// Builds the gateway selected by configuration.
pub fn gateway_from_config(config: &PaymentConfig) -> AppResult<Arc<dyn PaymentGateway>> {
    match config.provider.as_str() {
        "http" => {
            info!(url = %config.refund_url, "Initializing HTTP payment gateway");
            Ok(Arc::new(HttpPaymentGateway::new(config)?))
        }
        "noop" => {
            info!("Initializing no-op payment gateway");
            Ok(Arc::new(NoopPaymentGateway::new()))
        }
        other => Err(AppError::configuration(format!(
            "Unknown payment provider: '{other}'. Supported: http, noop"
        ))),
    }
}
