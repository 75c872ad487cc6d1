//! # screenbook-service
//!
//! Business logic service layer for Screenbook. Each service orchestrates
//! the booking store, the clock, and the payment gateway to implement one
//! application-level use case.
//!
//! Services follow constructor injection — all dependencies are provided
//! at construction time via `Arc` references.

pub mod booking;
pub mod context;
pub mod payments;

pub use booking::{
    AvailabilityService, CancellationService, ConfirmationResult, ConfirmationService,
    HoldService, HoldSlotRequest, LifecycleService, PaymentEvent,
};
pub use context::{RequestContext, UserRole};
pub use payments::{HttpPaymentGateway, NoopPaymentGateway, PaymentGateway};
