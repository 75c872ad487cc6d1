//! Booking use cases: availability, holds, confirmation, cancellation.

pub mod availability;
pub mod cancel;
pub mod confirm;
pub mod hold;
pub mod lifecycle;

pub use availability::AvailabilityService;
pub use cancel::CancellationService;
pub use confirm::{ConfirmationResult, ConfirmationService, PaymentEvent};
pub use hold::{HoldService, HoldSlotRequest};
pub use lifecycle::LifecycleService;
