//! # screenbook-database
//!
//! PostgreSQL connection management and the booking store port with its
//! PostgreSQL and in-memory implementations.

pub mod connection;
pub mod migration;
pub mod store;

pub use connection::DatabasePool;
pub use store::{BookingStore, MemoryBookingStore, PostgresBookingStore};
