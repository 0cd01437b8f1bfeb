//! Booking and payment models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::pricing::models::{CheckoutBreakdown, DateRange, DiscountType, PaymentMethod};
use crate::vehicles::models::{serialize_id, RawId, VehicleId};

/// Booking identifier assigned by the system of record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "RawId")]
pub struct BookingId(String);

impl BookingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BookingId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BookingId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for BookingId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<RawId> for BookingId {
    fn from(raw: RawId) -> Self {
        Self(raw.into_string())
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for BookingId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_id(&self.0, serializer)
    }
}

/// Lifecycle state of a booking.
///
/// Only `Booked` and `Cancelled` are ever written by the backend in practice;
/// `Upcoming` and `Completed` come from [`derive_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    Booked,
    Upcoming,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Case-insensitive parse of a stored status; `None` for unknown values.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "booked" => Some(BookingStatus::Booked),
            "upcoming" => Some(BookingStatus::Upcoming),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" | "canceled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Booked => "Booked",
            BookingStatus::Upcoming => "Upcoming",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    /// States in which cancel and reschedule are allowed.
    pub fn is_active(self) -> bool {
        matches!(self, BookingStatus::Booked | BookingStatus::Upcoming)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective status: a stored value wins, otherwise the end date decides.
pub fn derive_status(
    stored: Option<BookingStatus>,
    end_date: NaiveDate,
    today: NaiveDate,
) -> BookingStatus {
    match stored {
        Some(status) => status,
        None if end_date > today => BookingStatus::Upcoming,
        None => BookingStatus::Completed,
    }
}

/// Reservation of one vehicle for an inclusive date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    pub booking_id: BookingId,
    /// Weak reference; the vehicle may be gone by now.
    pub vehicle_id: Option<VehicleId>,
    pub vehicle_name: Option<String>,
    pub contact: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub stored_status: Option<BookingStatus>,
    pub base_price: Decimal,
    /// Present once a payment has been recorded.
    pub final_price: Option<Decimal>,
    pub reason: Option<String>,
}

impl Booking {
    pub fn dates(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    pub fn status(&self, today: NaiveDate) -> BookingStatus {
        derive_status(self.stored_status, self.end_date, today)
    }

    pub fn is_paid(&self) -> bool {
        self.final_price.is_some()
    }
}

/// Booking together with its status as of a given day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingView {
    pub booking: Booking,
    pub status: BookingStatus,
}

/// Data sent to the backend to create a booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub vehicle_id: VehicleId,
    pub vehicle_name: String,
    pub contact: String,
    pub dates: DateRange,
    pub total_price: Decimal,
}

/// New dates (and optional reason) for an existing booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescheduleChange {
    pub dates: DateRange,
    pub reason: Option<String>,
}

/// Request to open a wallet checkout session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletCharge {
    pub booking_id: BookingId,
    pub amount: Decimal,
    pub description: String,
}

/// Immutable record of a completed checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payment {
    pub booking_id: BookingId,
    pub vehicle_id: Option<VehicleId>,
    pub base_price: Decimal,
    pub discount_type: DiscountType,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
    pub cash_tendered: Decimal,
    pub change_due: Decimal,
    pub method: PaymentMethod,
}

impl Payment {
    pub fn new(booking: &Booking, breakdown: CheckoutBreakdown, method: PaymentMethod) -> Self {
        Self {
            booking_id: booking.booking_id.clone(),
            vehicle_id: booking.vehicle_id.clone(),
            base_price: breakdown.base_total,
            discount_type: breakdown.discount_type,
            discount_amount: breakdown.discount_amount,
            final_price: breakdown.final_price,
            cash_tendered: breakdown.cash_tendered,
            change_due: breakdown.change_due,
            method,
        }
    }
}
