//! Processed payment event ledger.

pub mod model;

pub use model::ProcessedPaymentEvent;
