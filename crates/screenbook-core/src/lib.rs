//! # screenbook-core
//!
//! Core crate for Screenbook. Contains configuration schemas, the time
//! source abstraction, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Screenbook crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod result;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::AppError;
pub use result::AppResult;
