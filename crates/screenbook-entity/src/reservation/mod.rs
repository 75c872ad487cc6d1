//! Reservation entity: model, status machine, and slot enumeration.

pub mod model;
pub mod slot;
pub mod status;

pub use model::{CreateHold, Reservation};
pub use slot::SlotNumber;
pub use status::ReservationStatus;
