//! Background maintenance for Screenbook bookings.
//!
//! This crate provides a cron scheduler running two periodic tasks:
//! - the hold-expiry sweep that lapses abandoned holds
//! - pruning of old processed payment event records

pub mod scheduler;

pub use scheduler::BookingScheduler;
