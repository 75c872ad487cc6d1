//! Derived slot availability view.

pub mod model;

pub use model::{DayAvailability, SlotAvailability, SlotStatus};
