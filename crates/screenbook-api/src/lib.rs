//! # screenbook-api
//!
//! HTTP API layer for Screenbook built on Axum.
//!
//! Provides the REST endpoints, the payment webhook, identity-header
//! extractors, DTOs, and error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
