//! Compensation log entity.

pub mod model;

pub use model::{CompensationAction, CompensationLogEntry, CompensationTrigger, NewCompensation};
