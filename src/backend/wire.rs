//! JSON request/response shapes of the booking backend.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::booking::models::{
    Booking, BookingId, BookingStatus, NewBooking, Payment, RescheduleChange, WalletCharge,
};
use crate::error::{AppError, Result};
use crate::pricing::models::{DiscountType, PaymentMethod};
use crate::vehicles::models::{Availability, RawId, Vehicle, VehicleId};

// ==================== responses ====================

/// Row of `GET /cars`
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleRecord {
    #[serde(default)]
    pub car_id: Option<RawId>,
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl VehicleRecord {
    pub fn into_vehicle(self) -> Result<Vehicle> {
        let id = self
            .car_id
            .or(self.id)
            .map(VehicleId::from)
            .ok_or_else(|| AppError::MalformedResponse("vehicle without car_id".to_string()))?;

        Ok(Vehicle {
            id,
            name: self.brand.or(self.name).unwrap_or_default(),
            daily_rate: self.price,
            availability: Availability::from_status(self.status.as_deref()),
            category: self.category,
            image: self.image,
        })
    }
}

/// Row of `GET /booking-history`
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRecord {
    pub booking_id: RawId,
    #[serde(default)]
    pub car_id: Option<RawId>,
    #[serde(default)]
    pub car_name: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub total_price: Option<Decimal>,
    #[serde(default)]
    pub final_price: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl BookingRecord {
    pub fn into_booking(self, offset: FixedOffset) -> Result<Booking> {
        let booking_id = BookingId::from(self.booking_id);

        let stored_status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let parsed = BookingStatus::parse(raw);
                if parsed.is_none() {
                    warn!(
                        "Unknown status {:?} on booking {}, deriving from dates",
                        raw, booking_id
                    );
                }
                parsed
            }
        };

        Ok(Booking {
            vehicle_id: self.car_id.map(VehicleId::from),
            vehicle_name: self.car_name,
            contact: self.contact,
            start_date: parse_backend_date(&self.start_date, offset)?,
            end_date: parse_backend_date(&self.end_date, offset)?,
            stored_status,
            base_price: self.total_price.unwrap_or(Decimal::ZERO),
            final_price: self.final_price,
            reason: self.reason.filter(|r| !r.trim().is_empty()),
            booking_id,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingHistoryResponse {
    #[serde(default)]
    pub bookings: Vec<BookingRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingResponse {
    #[serde(rename = "bookingId", alias = "booking_id")]
    pub booking_id: RawId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletPaymentResponse {
    #[serde(default)]
    pub checkout_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of a rejected request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn text(self) -> Option<String> {
        self.message.or(self.error)
    }
}

// ==================== requests ====================

#[derive(Debug, Serialize)]
pub struct StatusUpdateRequest {
    pub status: Availability,
}

#[derive(Debug, Serialize)]
pub struct CreateBookingRequest<'a> {
    pub car_id: &'a VehicleId,
    pub car_name: &'a str,
    pub contact: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

impl<'a> From<&'a NewBooking> for CreateBookingRequest<'a> {
    fn from(booking: &'a NewBooking) -> Self {
        Self {
            car_id: &booking.vehicle_id,
            car_name: &booking.vehicle_name,
            contact: &booking.contact,
            start_date: booking.dates.start,
            end_date: booking.dates.end,
            total_price: booking.total_price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RescheduleRequest<'a> {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: &'a str,
}

impl<'a> From<&'a RescheduleChange> for RescheduleRequest<'a> {
    fn from(change: &'a RescheduleChange) -> Self {
        Self {
            start_date: change.dates.start,
            end_date: change.dates.end,
            reason: change.reason.as_deref().unwrap_or(""),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentRequest<'a> {
    pub booking_id: &'a BookingId,
    pub car_id: Option<&'a VehicleId>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub discount_type: DiscountType,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cash: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub change_amount: Decimal,
    pub payment_method: PaymentMethod,
}

impl<'a> From<&'a Payment> for PaymentRequest<'a> {
    fn from(payment: &'a Payment) -> Self {
        Self {
            booking_id: &payment.booking_id,
            car_id: payment.vehicle_id.as_ref(),
            total_price: payment.base_price,
            discount_type: payment.discount_type,
            discount_amount: payment.discount_amount,
            final_price: payment.final_price,
            cash: payment.cash_tendered,
            change_amount: payment.change_due,
            payment_method: payment.method,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WalletPaymentRequest<'a> {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: &'a str,
    #[serde(rename = "bookingId")]
    pub booking_id: &'a BookingId,
}

impl<'a> From<&'a WalletCharge> for WalletPaymentRequest<'a> {
    fn from(charge: &'a WalletCharge) -> Self {
        Self {
            amount: charge.amount,
            description: &charge.description,
            booking_id: &charge.booking_id,
        }
    }
}

// ==================== dates ====================

/// Calendar date from a backend value.
///
/// Plain `YYYY-MM-DD` is taken as-is. RFC 3339 timestamps are moved into
/// `offset` first: the backend serializes local midnight as the previous day
/// in UTC. A zoneless `YYYY-MM-DD HH:MM:SS` is already backend wall-clock
/// time, so its date is taken without a shift.
pub fn parse_backend_date(raw: &str, offset: FixedOffset) -> Result<NaiveDate> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(stamp.with_timezone(&offset).date_naive());
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(stamp.date());
    }

    Err(AppError::MalformedResponse(format!("unrecognized date {:?}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::models::DateRange;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn manila() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_vehicle_record_normalizes_status_and_ids() {
        let record: VehicleRecord = serde_json::from_value(json!({
            "car_id": 4,
            "brand": "Toyota Vios",
            "price": 1500,
            "status": "Available ",
            "category": "Sedan"
        }))
        .unwrap();
        let vehicle = record.into_vehicle().unwrap();
        assert_eq!(vehicle.id, VehicleId::from("4"));
        assert_eq!(vehicle.name, "Toyota Vios");
        assert_eq!(vehicle.daily_rate, dec!(1500));
        assert!(vehicle.is_bookable());
    }

    #[test]
    fn test_vehicle_record_fallbacks() {
        let record: VehicleRecord = serde_json::from_value(json!({
            "id": "x9",
            "name": "Mitsubishi L300",
            "price": "2100.50"
        }))
        .unwrap();
        let vehicle = record.into_vehicle().unwrap();
        assert_eq!(vehicle.id.as_str(), "x9");
        assert_eq!(vehicle.name, "Mitsubishi L300");
        assert_eq!(vehicle.daily_rate, dec!(2100.50));
        assert_eq!(vehicle.availability, Availability::Unavailable);
    }

    #[test]
    fn test_vehicle_record_without_id() {
        let record: VehicleRecord = serde_json::from_value(json!({ "price": 100 })).unwrap();
        assert!(matches!(record.into_vehicle(), Err(AppError::MalformedResponse(_))));
    }

    #[test]
    fn test_booking_record_with_timestamps() {
        let record: BookingRecord = serde_json::from_value(json!({
            "booking_id": 31,
            "car_name": "Honda Civic",
            "start_date": "2024-05-31T16:00:00.000Z",
            "end_date": "2024-06-02T16:00:00.000Z",
            "total_price": "4500.00",
            "final_price": null,
            "status": null,
            "reason": ""
        }))
        .unwrap();
        let booking = record.into_booking(manila()).unwrap();
        assert_eq!(booking.booking_id, BookingId::from("31"));
        assert_eq!(booking.start_date, date(2024, 6, 1));
        assert_eq!(booking.end_date, date(2024, 6, 3));
        assert_eq!(booking.base_price, dec!(4500));
        assert_eq!(booking.stored_status, None);
        assert_eq!(booking.reason, None);
        assert!(!booking.is_paid());
    }

    #[test]
    fn test_booking_record_status_override() {
        let record: BookingRecord = serde_json::from_value(json!({
            "booking_id": "b-1",
            "car_id": 2,
            "start_date": "2024-06-01",
            "end_date": "2024-06-03",
            "total_price": 4500,
            "final_price": 3600,
            "status": "Cancelled"
        }))
        .unwrap();
        let booking = record.into_booking(manila()).unwrap();
        assert_eq!(booking.stored_status, Some(BookingStatus::Cancelled));
        assert_eq!(booking.vehicle_id, Some(VehicleId::from("2")));
        assert_eq!(booking.final_price, Some(dec!(3600)));
    }

    #[test]
    fn test_bad_date_is_malformed() {
        assert!(matches!(
            parse_backend_date("June 1st", manila()),
            Err(AppError::MalformedResponse(_))
        ));
        assert_eq!(
            parse_backend_date("2024-06-01 10:30:00", manila()).unwrap(),
            date(2024, 6, 1)
        );
    }

    #[test]
    fn test_only_zoned_timestamps_are_shifted() {
        assert_eq!(
            parse_backend_date("2024-05-31 23:30:00", manila()).unwrap(),
            date(2024, 5, 31)
        );
        assert_eq!(
            parse_backend_date("2024-05-31T23:30:00Z", manila()).unwrap(),
            date(2024, 6, 1)
        );
        assert_eq!(
            parse_backend_date("2024-05-31T23:30:00+08:00", manila()).unwrap(),
            date(2024, 5, 31)
        );
    }

    #[test]
    fn test_create_booking_request_shape() {
        let booking = NewBooking {
            vehicle_id: VehicleId::from("4"),
            vehicle_name: "Toyota Vios".to_string(),
            contact: "09171234567".to_string(),
            dates: DateRange::new(date(2024, 6, 1), date(2024, 6, 3)),
            total_price: dec!(4500),
        };
        let body = serde_json::to_value(CreateBookingRequest::from(&booking)).unwrap();
        assert_eq!(
            body,
            json!({
                "car_id": 4,
                "car_name": "Toyota Vios",
                "contact": "09171234567",
                "start_date": "2024-06-01",
                "end_date": "2024-06-03",
                "total_price": 4500.0
            })
        );
    }

    #[test]
    fn test_payment_request_shape() {
        let payment = Payment {
            booking_id: BookingId::from("31"),
            vehicle_id: Some(VehicleId::from("4")),
            base_price: dec!(4500),
            discount_type: DiscountType::Student,
            discount_amount: dec!(900),
            final_price: dec!(3600),
            cash_tendered: dec!(4000),
            change_due: dec!(400),
            method: PaymentMethod::Cash,
        };
        let body = serde_json::to_value(PaymentRequest::from(&payment)).unwrap();
        assert_eq!(body["booking_id"], json!(31));
        assert_eq!(body["car_id"], json!(4));
        assert_eq!(body["discount_type"], json!("student"));
        assert_eq!(body["final_price"], json!(3600.0));
        assert_eq!(body["cash"], json!(4000.0));
        assert_eq!(body["change_amount"], json!(400.0));
        assert_eq!(body["payment_method"], json!("cash"));
    }

    #[test]
    fn test_status_update_request_shape() {
        let body = serde_json::to_value(StatusUpdateRequest {
            status: Availability::Unavailable,
        })
        .unwrap();
        assert_eq!(body, json!({ "status": "unavailable" }));
    }
}
