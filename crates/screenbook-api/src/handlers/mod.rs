//! HTTP handlers, one module per route group.

pub mod admin;
pub mod availability;
pub mod health;
pub mod reservation;
pub mod webhook;
