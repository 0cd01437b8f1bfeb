//! In-process system of record.
//!
//! Same contract as the HTTP backend, kept in a mutex. Records every call and
//! can be told to fail the next call of a given operation, which is how the
//! compensation paths get exercised without a network.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::auth::BearerToken;
use crate::booking::models::{
    Booking, BookingId, BookingStatus, NewBooking, Payment, RescheduleChange, WalletCharge,
};
use crate::error::{AppError, Result};
use crate::vehicles::models::{Availability, Vehicle, VehicleId};

use super::{Backend, Operation};

#[derive(Debug, Default)]
struct Store {
    vehicles: BTreeMap<VehicleId, Vehicle>,
    bookings: BTreeMap<BookingId, Booking>,
    payments: Vec<Payment>,
    next_booking_id: i64,
    calls: Vec<Operation>,
    fail_next: HashSet<Operation>,
    garble_next: HashSet<Operation>,
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    store: Mutex<Store>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vehicles(vehicles: impl IntoIterator<Item = Vehicle>) -> Self {
        let backend = Self::new();
        {
            let mut store = backend.lock();
            for vehicle in vehicles {
                store.vehicles.insert(vehicle.id.clone(), vehicle);
            }
        }
        backend
    }

    /// Seed a booking as if it had been created earlier.
    pub fn insert_booking(&self, booking: Booking) {
        self.lock().bookings.insert(booking.booking_id.clone(), booking);
    }

    /// Make the next call of `operation` fail with `SyncFailed`.
    pub fn fail_next(&self, operation: Operation) {
        self.lock().fail_next.insert(operation);
    }

    /// Apply the next call of `operation`, then answer it with an
    /// undecodable response.
    pub fn garble_next(&self, operation: Operation) {
        self.lock().garble_next.insert(operation);
    }

    pub fn calls(&self) -> Vec<Operation> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn vehicle(&self, id: &VehicleId) -> Option<Vehicle> {
        self.lock().vehicles.get(id).cloned()
    }

    pub fn booking(&self, id: &BookingId) -> Option<Booking> {
        self.lock().bookings.get(id).cloned()
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.lock().bookings.values().cloned().collect()
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.lock().payments.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Log the call and consume any injected failure.
    fn enter(&self, operation: Operation) -> Result<MutexGuard<'_, Store>> {
        let mut store = self.lock();
        store.calls.push(operation);
        if store.fail_next.remove(&operation) {
            return Err(AppError::SyncFailed(format!("{}: injected failure", operation)));
        }
        Ok(store)
    }
}

impl Store {
    /// Reply for a call that has already been applied.
    fn reply<T>(&mut self, operation: Operation, value: T) -> Result<T> {
        if self.garble_next.remove(&operation) {
            return Err(AppError::MalformedResponse(format!(
                "{}: undecodable response",
                operation
            )));
        }
        Ok(value)
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>> {
        let mut store = self.enter(Operation::ListVehicles)?;
        let vehicles: Vec<Vehicle> = store.vehicles.values().cloned().collect();
        store.reply(Operation::ListVehicles, vehicles)
    }

    async fn get_vehicle(&self, id: &VehicleId) -> Result<Vehicle> {
        let mut store = self.enter(Operation::GetVehicle)?;
        let vehicle = store
            .vehicles
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Vehicle {}", id)))?;
        store.reply(Operation::GetVehicle, vehicle)
    }

    async fn set_availability(
        &self,
        _token: &BearerToken,
        id: &VehicleId,
        availability: Availability,
    ) -> Result<()> {
        let mut store = self.enter(Operation::SetAvailability)?;
        let vehicle = store
            .vehicles
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Vehicle {}", id)))?;
        vehicle.availability = availability;
        store.reply(Operation::SetAvailability, ())
    }

    async fn create_booking(
        &self,
        _token: &BearerToken,
        booking: &NewBooking,
    ) -> Result<BookingId> {
        let mut store = self.enter(Operation::CreateBooking)?;
        store.next_booking_id += 1;
        let booking_id = BookingId::from(store.next_booking_id);
        store.bookings.insert(
            booking_id.clone(),
            Booking {
                booking_id: booking_id.clone(),
                vehicle_id: Some(booking.vehicle_id.clone()),
                vehicle_name: Some(booking.vehicle_name.clone()),
                contact: Some(booking.contact.clone()),
                start_date: booking.dates.start,
                end_date: booking.dates.end,
                stored_status: Some(BookingStatus::Booked),
                base_price: booking.total_price,
                final_price: None,
                reason: None,
            },
        );
        store.reply(Operation::CreateBooking, booking_id)
    }

    async fn booking_history(&self, _token: &BearerToken) -> Result<Vec<Booking>> {
        let mut store = self.enter(Operation::BookingHistory)?;
        let bookings: Vec<Booking> = store.bookings.values().cloned().collect();
        store.reply(Operation::BookingHistory, bookings)
    }

    async fn cancel_booking(&self, _token: &BearerToken, id: &BookingId) -> Result<String> {
        let mut store = self.enter(Operation::CancelBooking)?;
        let booking = store
            .bookings
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Booking {}", id)))?;
        booking.stored_status = Some(BookingStatus::Cancelled);
        store.reply(Operation::CancelBooking, "Booking cancelled successfully".to_string())
    }

    async fn delete_booking(&self, _token: &BearerToken, id: &BookingId) -> Result<String> {
        let mut store = self.enter(Operation::DeleteBooking)?;
        store
            .bookings
            .remove(id)
            .ok_or_else(|| AppError::NotFound(format!("Booking {}", id)))?;
        store.reply(Operation::DeleteBooking, "Booking removed successfully".to_string())
    }

    async fn reschedule_booking(
        &self,
        _token: &BearerToken,
        id: &BookingId,
        change: &RescheduleChange,
    ) -> Result<String> {
        let mut store = self.enter(Operation::RescheduleBooking)?;
        let booking = store
            .bookings
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Booking {}", id)))?;
        booking.start_date = change.dates.start;
        booking.end_date = change.dates.end;
        booking.reason = change.reason.clone();
        store.reply(
            Operation::RescheduleBooking,
            "Booking rescheduled successfully".to_string(),
        )
    }

    async fn record_payment(&self, _token: &BearerToken, payment: &Payment) -> Result<()> {
        let mut store = self.enter(Operation::RecordPayment)?;
        let booking = store
            .bookings
            .get_mut(&payment.booking_id)
            .ok_or_else(|| AppError::NotFound(format!("Booking {}", payment.booking_id)))?;
        booking.final_price = Some(payment.final_price);
        store.payments.push(payment.clone());
        store.reply(Operation::RecordPayment, ())
    }

    async fn create_wallet_payment(
        &self,
        _token: &BearerToken,
        charge: &WalletCharge,
    ) -> Result<String> {
        let mut store = self.enter(Operation::CreateWalletPayment)?;
        if !store.bookings.contains_key(&charge.booking_id) {
            return Err(AppError::NotFound(format!("Booking {}", charge.booking_id)));
        }
        let url = format!(
            "https://wallet.invalid/checkout/{}?amount={}",
            charge.booking_id, charge.amount
        );
        store.reply(Operation::CreateWalletPayment, url)
    }
}
