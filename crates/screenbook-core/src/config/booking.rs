//! Slot booking configuration.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// Slot booking configuration: capacity, hold expiry, and deadlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Maximum active reservations per (date, slot).
    #[serde(default = "default_max_per_slot")]
    pub max_per_slot: u32,
    /// Minutes a hold stays valid before it lapses.
    #[serde(default = "default_hold_expiry_minutes")]
    pub hold_expiry_minutes: i64,
    /// Hours before the slot's start time after which a confirmed
    /// reservation can no longer be cancelled by the user.
    #[serde(default = "default_cancel_deadline_hours")]
    pub cancel_deadline_hours: i64,
    /// Days of video retention granted on confirmation, counted from the
    /// projection date.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    /// Start time of day for each slot, indexed by slot number - 1,
    /// as `HH:MM` strings.
    #[serde(default = "default_slot_start_times")]
    pub slot_start_times: Vec<String>,
}

impl BookingConfig {
    /// Returns the configured start time of day for a slot number (1-based).
    pub fn slot_start_time(&self, slot_number: i16) -> AppResult<NaiveTime> {
        let index = usize::try_from(i32::from(slot_number) - 1).map_err(|_| {
            AppError::configuration(format!("No start time configured for slot {slot_number}"))
        })?;
        let raw = self.slot_start_times.get(index).ok_or_else(|| {
            AppError::configuration(format!("No start time configured for slot {slot_number}"))
        })?;
        NaiveTime::parse_from_str(raw, "%H:%M").map_err(|e| {
            AppError::configuration(format!("Invalid start time '{raw}' for slot {slot_number}: {e}"))
        })
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            max_per_slot: default_max_per_slot(),
            hold_expiry_minutes: default_hold_expiry_minutes(),
            cancel_deadline_hours: default_cancel_deadline_hours(),
            retention_days: default_retention_days(),
            slot_start_times: default_slot_start_times(),
        }
    }
}

fn default_max_per_slot() -> u32 {
    4
}

fn default_hold_expiry_minutes() -> i64 {
    15
}

fn default_cancel_deadline_hours() -> i64 {
    48
}

fn default_retention_days() -> i64 {
    365
}

fn default_slot_start_times() -> Vec<String> {
    vec![
        "18:00".to_string(),
        "19:00".to_string(),
        "20:00".to_string(),
        "21:00".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_start_time_lookup() {
        let config = BookingConfig::default();
        let time = config.slot_start_time(1).unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        let time = config.slot_start_time(4).unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(21, 0, 0).unwrap());
        assert!(config.slot_start_time(5).is_err());
    }

    #[test]
    fn test_slot_start_time_rejects_non_positive_slots() {
        let config = BookingConfig::default();
        assert!(config.slot_start_time(0).is_err());
        assert!(config.slot_start_time(-3).is_err());
    }
}
