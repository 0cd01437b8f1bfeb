//! The booking backend (system of record).
//!
//! [`Backend`] has one method per endpoint the client talks to. It speaks
//! domain types; the HTTP implementation owns the JSON shapes.

pub mod http;
pub mod memory;
pub mod wire;

use async_trait::async_trait;
use std::fmt;

use crate::auth::BearerToken;
use crate::booking::models::{
    Booking, BookingId, NewBooking, Payment, RescheduleChange, WalletCharge,
};
use crate::error::Result;
use crate::vehicles::models::{Availability, Vehicle, VehicleId};

pub use http::HttpBackend;
pub use memory::InMemoryBackend;

#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /cars`
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>>;

    /// `GET /cars/{id}`
    async fn get_vehicle(&self, id: &VehicleId) -> Result<Vehicle>;

    /// `PUT /cars/{id}/status`
    async fn set_availability(
        &self,
        token: &BearerToken,
        id: &VehicleId,
        availability: Availability,
    ) -> Result<()>;

    /// `POST /bookings`
    async fn create_booking(&self, token: &BearerToken, booking: &NewBooking) -> Result<BookingId>;

    /// `GET /booking-history`
    async fn booking_history(&self, token: &BearerToken) -> Result<Vec<Booking>>;

    /// `POST /cancel-booking/{id}`
    async fn cancel_booking(&self, token: &BearerToken, id: &BookingId) -> Result<String>;

    /// `DELETE /delete-booking/{id}`
    async fn delete_booking(&self, token: &BearerToken, id: &BookingId) -> Result<String>;

    /// `PUT /bookings/{id}`
    async fn reschedule_booking(
        &self,
        token: &BearerToken,
        id: &BookingId,
        change: &RescheduleChange,
    ) -> Result<String>;

    /// `POST /payments`
    async fn record_payment(&self, token: &BearerToken, payment: &Payment) -> Result<()>;

    /// `POST /create-gcash-payment`, returning the checkout URL
    async fn create_wallet_payment(
        &self,
        token: &BearerToken,
        charge: &WalletCharge,
    ) -> Result<String>;
}

/// Backend operations, for call logs and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListVehicles,
    GetVehicle,
    SetAvailability,
    CreateBooking,
    BookingHistory,
    CancelBooking,
    DeleteBooking,
    RescheduleBooking,
    RecordPayment,
    CreateWalletPayment,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ListVehicles => "list vehicles",
            Operation::GetVehicle => "get vehicle",
            Operation::SetAvailability => "set availability",
            Operation::CreateBooking => "create booking",
            Operation::BookingHistory => "booking history",
            Operation::CancelBooking => "cancel booking",
            Operation::DeleteBooking => "delete booking",
            Operation::RescheduleBooking => "reschedule booking",
            Operation::RecordPayment => "record payment",
            Operation::CreateWalletPayment => "create wallet payment",
        };
        f.write_str(name)
    }
}
