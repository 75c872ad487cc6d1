//! Payment provider gateway for outbound refund calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use screenbook_core::config::payment::PaymentConfig;
use screenbook_core::error::AppError;
use screenbook_core::result::AppResult;

/// Outbound interface to the payment provider.
///
/// Incoming money flows through the webhook; this trait only covers the
/// calls this service originates itself.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Refunds a previously captured charge.
    ///
    /// Returns the provider's refund reference on success.
    async fn refund(&self, external_reference: &str, amount_cents: i64) -> AppResult<String>;
}

/// Gateway that POSTs refund requests to the provider's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    refund_url: String,
    api_secret: String,
}

#[derive(Debug, Serialize)]
struct RefundRequest<'a> {
    charge: &'a str,
    amount_cents: i64,
}

#[derive(Debug, Deserialize)]
struct RefundResponse {
    refund_id: String,
}

impl HttpPaymentGateway {
    /// Creates a gateway from payment configuration.
    pub fn new(config: &PaymentConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    screenbook_core::error::ErrorKind::Configuration,
                    "Failed to build payment HTTP client",
                    e,
                )
            })?;
        Ok(Self {
            client,
            refund_url: config.refund_url.clone(),
            api_secret: config.api_secret.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn refund(&self, external_reference: &str, amount_cents: i64) -> AppResult<String> {
        let response = self
            .client
            .post(&self.refund_url)
            .bearer_auth(&self.api_secret)
            .json(&RefundRequest {
                charge: external_reference,
                amount_cents,
            })
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    screenbook_core::error::ErrorKind::ExternalService,
                    "Refund request failed",
                    e,
                )
            })?;

        if !response.status().is_success() {
            return Err(AppError::external_service(format!(
                "Refund for charge {external_reference} rejected with status {}",
                response.status()
            )));
        }

        let body: RefundResponse = response.json().await.map_err(|e| {
            AppError::with_source(
                screenbook_core::error::ErrorKind::ExternalService,
                "Malformed refund response",
                e,
            )
        })?;
        Ok(body.refund_id)
    }
}

/// Gateway that approves every refund without calling anywhere.
///
/// Used in development and tests.
#[derive(Debug, Clone, Default)]
pub struct NoopPaymentGateway;

impl NoopPaymentGateway {
    /// Creates a new no-op gateway.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for NoopPaymentGateway {
    async fn refund(&self, external_reference: &str, _amount_cents: i64) -> AppResult<String> {
        let reference = format!("noop-refund-{}", Uuid::new_v4());
        info!(charge = %external_reference, refund = %reference, "No-op refund issued");
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_refund_returns_reference() {
        let gateway = NoopPaymentGateway::new();
        let reference = gateway.refund("cs_test", 2500).await.unwrap();
        assert!(reference.starts_with("noop-refund-"));
    }
}
