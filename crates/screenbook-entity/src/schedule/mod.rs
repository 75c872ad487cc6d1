//! Schedule registry facet consumed by the booking core.

pub mod model;

pub use model::Schedule;
