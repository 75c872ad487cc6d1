//! Video asset facet consumed by the booking core.

pub mod model;

pub use model::Video;
