//! Booking lifecycle module.
//!
//! Bookings move from `Booked` to `Cancelled` (and then removal) or age into
//! `Completed`. Reschedules keep the paid duration; checkout records one
//! payment per booking.

pub mod models;
pub mod reschedule;
pub mod services;

// Re-export commonly used items
pub use models::{derive_status, Booking, BookingId, BookingStatus, BookingView, Payment};
pub use reschedule::RescheduleValidator;
pub use services::{BookingLifecycle, CancelOutcome, CreateBooking};
