//! Reservation and waitlist rules
//!
//! Pure functions only. Storage backends call these inside their slot-scoped
//! critical sections so both backends decide the same way.

pub mod capacity;
pub mod phone;
pub mod policy;
pub mod queue;
pub mod slot;

pub use capacity::SlotAvailability;
pub use phone::{PhoneError, normalize_phone, parse_phone};
pub use policy::{BookingPolicy, CancellationCheck};
pub use slot::{Slot, SlotError};
