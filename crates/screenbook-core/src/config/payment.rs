//! Payment provider configuration.

use serde::{Deserialize, Serialize};

/// Payment provider integration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Gateway implementation: `"http"` or `"noop"` (dev/test).
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL of the provider's refund endpoint.
    #[serde(default)]
    pub refund_url: String,
    /// Bearer secret for outbound provider calls.
    #[serde(default)]
    pub api_secret: String,
    /// Shared secret expected on incoming webhook requests.
    /// When unset, webhook signature checking is skipped.
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// Outbound request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            refund_url: String::new(),
            api_secret: String::new(),
            webhook_secret: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_provider() -> String {
    "noop".to_string()
}

fn default_timeout() -> u64 {
    10
}
