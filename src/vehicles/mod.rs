//! Vehicles and their availability flag.

pub mod models;
pub mod services;

pub use models::{Availability, Vehicle, VehicleFilter, VehicleId};
pub use services::{AvailabilityManager, Reservation};
