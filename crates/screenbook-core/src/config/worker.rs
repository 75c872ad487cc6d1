//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Six-field cron expression for the hold-expiry sweep.
    #[serde(default = "default_hold_sweep_cron")]
    pub hold_sweep_cron: String,
    /// Six-field cron expression for processed-event ledger pruning.
    #[serde(default = "default_ledger_prune_cron")]
    pub ledger_prune_cron: String,
    /// Days to retain processed payment event records.
    #[serde(default = "default_event_retention_days")]
    pub event_retention_days: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            hold_sweep_cron: default_hold_sweep_cron(),
            ledger_prune_cron: default_ledger_prune_cron(),
            event_retention_days: default_event_retention_days(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_hold_sweep_cron() -> String {
    // every minute
    "0 * * * * *".to_string()
}

fn default_ledger_prune_cron() -> String {
    // daily at 4 AM
    "0 0 4 * * *".to_string()
}

fn default_event_retention_days() -> i64 {
    30
}
