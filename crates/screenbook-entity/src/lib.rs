//! # screenbook-entity
//!
//! Domain entity models for Screenbook. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.

pub mod availability;
pub mod compensation;
pub mod confirmation;
pub mod event;
pub mod payment;
pub mod reservation;
pub mod schedule;
pub mod video;
