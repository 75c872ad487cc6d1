//! Payment entity: model and status.

pub mod model;
pub mod status;

pub use model::{CreatePayment, Payment};
pub use status::PaymentStatus;
