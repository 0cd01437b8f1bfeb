//! Booking lifecycle service.
//!
//! Drives a booking through `Booked`/`Upcoming` to `Cancelled` or `Completed`
//! against the backend. Every rule that can be checked locally is checked
//! before a request is sent.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::auth::Credentials;
use crate::backend::Backend;
use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::pricing::{
    breakdown, compute_duration, format_peso, quote, DateRange, DiscountType, PaymentMethod,
};
use crate::vehicles::{AvailabilityManager, VehicleId};

use super::models::{
    Booking, BookingId, BookingStatus, BookingView, NewBooking, Payment, RescheduleChange,
    WalletCharge,
};
use super::reschedule::RescheduleValidator;

/// Input for [`BookingLifecycle::create`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBooking {
    pub vehicle_id: VehicleId,
    pub contact: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Result of a cancellation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOutcome {
    /// Acknowledgement from the backend
    pub message: String,
    /// Whether the vehicle went back into the pool
    pub vehicle_released: bool,
}

#[derive(Clone)]
pub struct BookingLifecycle {
    backend: Arc<dyn Backend>,
    availability: AvailabilityManager,
    credentials: Arc<Credentials>,
    clock: Arc<dyn Clock>,
    release_on_cancel: bool,
    payments: Arc<Mutex<HashMap<BookingId, Payment>>>,
}

impl BookingLifecycle {
    pub fn new(
        backend: Arc<dyn Backend>,
        availability: AvailabilityManager,
        credentials: Arc<Credentials>,
        clock: Arc<dyn Clock>,
        release_on_cancel: bool,
    ) -> Self {
        Self {
            backend,
            availability,
            credentials,
            clock,
            release_on_cancel,
            payments: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Create a booking for a vehicle.
    ///
    /// The vehicle is reserved (marked unavailable) before the booking is
    /// written. If the backend rejects the write the reservation is released
    /// again and the original error is returned. An undecodable reply to the
    /// write keeps the reservation, since the booking may already exist.
    ///
    /// # Errors
    /// * `Unauthorized` - no session token
    /// * `InvalidRange` / `InvalidRate` - bad dates or vehicle rate
    /// * `VehicleUnavailable` - the vehicle is not bookable
    /// * `SyncFailed` - reservation or booking write rejected
    /// * `MalformedResponse` - booking write answered with an unreadable body
    pub async fn create(&self, request: CreateBooking) -> Result<Booking> {
        let token = self.credentials.bearer()?;

        let dates = DateRange::new(request.start, request.end);
        compute_duration(dates)?;

        let vehicle = self.availability.vehicle(&request.vehicle_id).await?;
        if !AvailabilityManager::is_bookable(&vehicle) {
            warn!("Refusing booking: vehicle {} is {}", vehicle.id, vehicle.availability);
            return Err(AppError::VehicleUnavailable(vehicle.id));
        }
        let priced = quote(vehicle.daily_rate, dates)?;

        let reservation = self.availability.reserve(&vehicle.id).await?;

        let new_booking = NewBooking {
            vehicle_id: vehicle.id.clone(),
            vehicle_name: vehicle.name.clone(),
            contact: request.contact,
            dates,
            total_price: priced.base_total,
        };

        let booking_id = match self.backend.create_booking(&token, &new_booking).await {
            Ok(id) => id,
            // 2xx with an unreadable body: the booking may exist, keep the vehicle held
            Err(err @ AppError::MalformedResponse(_)) => {
                error!(
                    "Booking for vehicle {} may have been written (reservation {} kept): {}",
                    vehicle.id, reservation.id, err
                );
                return Err(err);
            }
            Err(err) => {
                warn!(
                    "Booking for vehicle {} failed, releasing reservation {}: {}",
                    vehicle.id, reservation.id, err
                );
                let reservation_id = reservation.id;
                if let Err(release_err) = self.availability.release(reservation).await {
                    error!(
                        "Could not release vehicle {} (reservation {}): {}",
                        vehicle.id, reservation_id, release_err
                    );
                }
                return Err(err);
            }
        };

        info!(
            "Created booking {} for vehicle {} ({} day(s), {})",
            booking_id,
            vehicle.id,
            priced.days,
            format_peso(priced.base_total)
        );

        Ok(Booking {
            booking_id,
            vehicle_id: Some(new_booking.vehicle_id),
            vehicle_name: Some(new_booking.vehicle_name),
            contact: Some(new_booking.contact),
            start_date: dates.start,
            end_date: dates.end,
            stored_status: Some(BookingStatus::Booked),
            base_price: priced.base_total,
            final_price: None,
            reason: None,
        })
    }

    /// Every booking of the session's customer with its status as of today.
    pub async fn history(&self) -> Result<Vec<BookingView>> {
        let token = self.credentials.bearer()?;
        let today = self.today();
        let bookings = self.backend.booking_history(&token).await?;

        Ok(bookings
            .into_iter()
            .map(|booking| BookingView {
                status: booking.status(today),
                booking,
            })
            .collect())
    }

    pub async fn find(&self, booking_id: &BookingId) -> Result<Booking> {
        let token = self.credentials.bearer()?;
        self.backend
            .booking_history(&token)
            .await?
            .into_iter()
            .find(|b| &b.booking_id == booking_id)
            .ok_or_else(|| AppError::NotFound(format!("Booking {}", booking_id)))
    }

    /// Cancel an active booking, then put its vehicle back in the pool when
    /// configured to.
    ///
    /// A failed release does not undo the cancellation; it shows up as
    /// `vehicle_released == false`.
    pub async fn cancel(&self, booking_id: &BookingId) -> Result<CancelOutcome> {
        let token = self.credentials.bearer()?;
        let booking = self.find(booking_id).await?;
        self.require_active(&booking, "cancel")?;

        let message = self.backend.cancel_booking(&token, booking_id).await?;
        info!("Cancelled booking {}", booking_id);

        let vehicle_released = match (&booking.vehicle_id, self.release_on_cancel) {
            (Some(vehicle_id), true) => match self.availability.mark_available(vehicle_id).await {
                Ok(()) => true,
                Err(err) => {
                    error!(
                        "Booking {} cancelled but vehicle {} was not released: {}",
                        booking_id, vehicle_id, err
                    );
                    false
                }
            },
            _ => false,
        };

        Ok(CancelOutcome {
            message,
            vehicle_released,
        })
    }

    /// Permanently delete a cancelled booking.
    pub async fn remove(&self, booking_id: &BookingId) -> Result<String> {
        let token = self.credentials.bearer()?;
        let booking = self.find(booking_id).await?;

        let status = booking.status(self.today());
        if status != BookingStatus::Cancelled {
            return Err(AppError::InvalidState {
                operation: "remove",
                status: status.to_string(),
            });
        }

        let message = self.backend.delete_booking(&token, booking_id).await?;
        info!("Removed booking {}", booking_id);
        Ok(message)
    }

    /// Move an active booking to new dates of the same length.
    ///
    /// On rejection nothing is sent and the booking stays as it was.
    pub async fn reschedule(
        &self,
        booking_id: &BookingId,
        start: NaiveDate,
        end: NaiveDate,
        reason: Option<String>,
    ) -> Result<Booking> {
        let token = self.credentials.bearer()?;
        let proposed = DateRange::new(start, end);
        compute_duration(proposed)?;

        let booking = self.find(booking_id).await?;
        self.require_active(&booking, "reschedule")?;

        if let Err(err) = RescheduleValidator::validate(booking.dates(), proposed) {
            warn!("Rejected reschedule of booking {}: {}", booking_id, err);
            return Err(err);
        }

        let change = RescheduleChange {
            dates: proposed,
            reason: reason.filter(|r| !r.trim().is_empty()),
        };
        self.backend
            .reschedule_booking(&token, booking_id, &change)
            .await?;
        info!(
            "Rescheduled booking {} to {} - {}",
            booking_id, proposed.start, proposed.end
        );

        Ok(Booking {
            start_date: change.dates.start,
            end_date: change.dates.end,
            reason: change.reason,
            ..booking
        })
    }

    /// Settle a booking and record exactly one payment for it.
    ///
    /// # Arguments
    /// * `discount_type` - discount category claimed by the customer
    /// * `method` - cash or digital wallet
    /// * `cash_tendered` - amount handed over; ignored for wallet payments,
    ///   and treated as zero when missing on a cash payment
    pub async fn checkout(
        &self,
        booking_id: &BookingId,
        discount_type: DiscountType,
        method: PaymentMethod,
        cash_tendered: Option<Decimal>,
    ) -> Result<Payment> {
        let token = self.credentials.bearer()?;
        let booking = self.find(booking_id).await?;
        self.require_payable(&booking)?;

        let tendered = match method {
            PaymentMethod::Cash => Some(cash_tendered.unwrap_or(Decimal::ZERO)),
            PaymentMethod::DigitalWallet => None,
        };
        let numbers = breakdown(booking.base_price, discount_type, tendered)?;
        let payment = Payment::new(&booking, numbers, method);

        self.backend.record_payment(&token, &payment).await?;
        self.payments_lock()
            .insert(booking_id.clone(), payment.clone());

        info!(
            "Recorded {} payment for booking {}: {} ({} discount {})",
            method.as_str(),
            booking_id,
            format_peso(payment.final_price),
            discount_type.as_str(),
            format_peso(payment.discount_amount)
        );
        Ok(payment)
    }

    /// Open a wallet checkout for the discounted amount and return its URL.
    ///
    /// Nothing is recorded here; call [`checkout`](Self::checkout) with
    /// `PaymentMethod::DigitalWallet` once the wallet confirms.
    pub async fn begin_wallet_payment(
        &self,
        booking_id: &BookingId,
        discount_type: DiscountType,
    ) -> Result<String> {
        let token = self.credentials.bearer()?;
        let booking = self.find(booking_id).await?;
        self.require_payable(&booking)?;

        let numbers = breakdown(booking.base_price, discount_type, None)?;
        let vehicle = booking
            .vehicle_name
            .clone()
            .unwrap_or_else(|| format!("booking {}", booking_id));
        let charge = WalletCharge {
            booking_id: booking_id.clone(),
            amount: numbers.final_price,
            description: format!("Car rental payment for {}", vehicle),
        };

        let url = self.backend.create_wallet_payment(&token, &charge).await?;
        info!(
            "Opened wallet checkout for booking {} ({})",
            booking_id,
            format_peso(charge.amount)
        );
        Ok(url)
    }

    /// Payment recorded for a booking during this session.
    pub fn payment(&self, booking_id: &BookingId) -> Option<Payment> {
        self.payments_lock().get(booking_id).cloned()
    }

    fn require_active(&self, booking: &Booking, operation: &'static str) -> Result<()> {
        let status = booking.status(self.today());
        if !status.is_active() {
            warn!("Cannot {} booking {}: it is {}", operation, booking.booking_id, status);
            return Err(AppError::InvalidState {
                operation,
                status: status.to_string(),
            });
        }
        Ok(())
    }

    fn require_payable(&self, booking: &Booking) -> Result<()> {
        let status = booking.status(self.today());
        if status == BookingStatus::Cancelled {
            return Err(AppError::InvalidState {
                operation: "check out",
                status: status.to_string(),
            });
        }
        if booking.is_paid() || self.payments_lock().contains_key(&booking.booking_id) {
            return Err(AppError::InvalidState {
                operation: "check out",
                status: "Paid".to_string(),
            });
        }
        Ok(())
    }

    fn payments_lock(&self) -> MutexGuard<'_, HashMap<BookingId, Payment>> {
        self.payments.lock().unwrap_or_else(|e| e.into_inner())
    }
}
