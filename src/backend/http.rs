//! HTTP client for the booking backend
//!
//! JSON over HTTPS via reqwest. The request timeout is set here, at the
//! transport boundary; nothing above this layer retries.

use async_trait::async_trait;
use chrono::FixedOffset;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::BearerToken;
use crate::booking::models::{
    Booking, BookingId, NewBooking, Payment, RescheduleChange, WalletCharge,
};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::vehicles::models::{Availability, Vehicle, VehicleId};

use super::wire::{
    BookingHistoryResponse, CreateBookingRequest, CreateBookingResponse, ErrorBody,
    MessageResponse, PaymentRequest, RescheduleRequest, StatusUpdateRequest, VehicleRecord,
    WalletPaymentRequest, WalletPaymentResponse,
};
use super::{Backend, Operation};

/// Backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    utc_offset: FixedOffset,
}

impl HttpBackend {
    /// Create a new client for `base_url` with the given request timeout
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        utc_offset: FixedOffset,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            utc_offset,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.api_base_url.clone(),
            config.request_timeout,
            config.backend_utc_offset,
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, operation: Operation, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            warn!("{} failed in transport: {}", operation, e);
            AppError::from(e)
        })?;
        debug!("{} -> {}", operation, response.status());

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(ErrorBody::text)
            .unwrap_or_else(|| format!("HTTP {}", status));

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized,
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            _ => AppError::SyncFailed(format!("{}: {}", operation, message)),
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.send(operation, request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::MalformedResponse(format!("{}: {}", operation, e)))
    }

    /// Parse `{message}` if present; acks may come back with an empty body.
    async fn send_message(&self, operation: Operation, request: RequestBuilder) -> Result<String> {
        let response = self.send(operation, request).await?;
        let text = response.text().await?;
        let body: MessageResponse = serde_json::from_str(&text).unwrap_or_default();
        Ok(body.message.unwrap_or_default())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>> {
        let records: Vec<VehicleRecord> = self
            .send_json(Operation::ListVehicles, self.client.get(self.url("/cars")))
            .await?;
        records.into_iter().map(VehicleRecord::into_vehicle).collect()
    }

    async fn get_vehicle(&self, id: &VehicleId) -> Result<Vehicle> {
        let record: Option<VehicleRecord> = self
            .send_json(
                Operation::GetVehicle,
                self.client.get(self.url(&format!("/cars/{}", id))),
            )
            .await?;
        record
            .ok_or_else(|| AppError::NotFound(format!("Vehicle {}", id)))?
            .into_vehicle()
    }

    async fn set_availability(
        &self,
        token: &BearerToken,
        id: &VehicleId,
        availability: Availability,
    ) -> Result<()> {
        let request = self
            .client
            .put(self.url(&format!("/cars/{}/status", id)))
            .bearer_auth(token.as_str())
            .json(&StatusUpdateRequest { status: availability });
        self.send_message(Operation::SetAvailability, request).await?;
        Ok(())
    }

    async fn create_booking(&self, token: &BearerToken, booking: &NewBooking) -> Result<BookingId> {
        let request = self
            .client
            .post(self.url("/bookings"))
            .bearer_auth(token.as_str())
            .json(&CreateBookingRequest::from(booking));
        let created: CreateBookingResponse =
            self.send_json(Operation::CreateBooking, request).await?;
        Ok(BookingId::from(created.booking_id))
    }

    async fn booking_history(&self, token: &BearerToken) -> Result<Vec<Booking>> {
        let request = self
            .client
            .get(self.url("/booking-history"))
            .bearer_auth(token.as_str());
        let history: BookingHistoryResponse =
            self.send_json(Operation::BookingHistory, request).await?;
        history
            .bookings
            .into_iter()
            .map(|record| record.into_booking(self.utc_offset))
            .collect()
    }

    async fn cancel_booking(&self, token: &BearerToken, id: &BookingId) -> Result<String> {
        let request = self
            .client
            .post(self.url(&format!("/cancel-booking/{}", id)))
            .bearer_auth(token.as_str());
        self.send_message(Operation::CancelBooking, request).await
    }

    async fn delete_booking(&self, token: &BearerToken, id: &BookingId) -> Result<String> {
        let request = self
            .client
            .delete(self.url(&format!("/delete-booking/{}", id)))
            .bearer_auth(token.as_str());
        self.send_message(Operation::DeleteBooking, request).await
    }

    async fn reschedule_booking(
        &self,
        token: &BearerToken,
        id: &BookingId,
        change: &RescheduleChange,
    ) -> Result<String> {
        let request = self
            .client
            .put(self.url(&format!("/bookings/{}", id)))
            .bearer_auth(token.as_str())
            .json(&RescheduleRequest::from(change));
        self.send_message(Operation::RescheduleBooking, request).await
    }

    async fn record_payment(&self, token: &BearerToken, payment: &Payment) -> Result<()> {
        let request = self
            .client
            .post(self.url("/payments"))
            .bearer_auth(token.as_str())
            .json(&PaymentRequest::from(payment));
        self.send_message(Operation::RecordPayment, request).await?;
        Ok(())
    }

    async fn create_wallet_payment(
        &self,
        token: &BearerToken,
        charge: &WalletCharge,
    ) -> Result<String> {
        let request = self
            .client
            .post(self.url("/create-gcash-payment"))
            .bearer_auth(token.as_str())
            .json(&WalletPaymentRequest::from(charge));
        let response: WalletPaymentResponse =
            self.send_json(Operation::CreateWalletPayment, request).await?;

        response.checkout_url.filter(|url| !url.is_empty()).ok_or_else(|| {
            AppError::SyncFailed(
                response
                    .message
                    .unwrap_or_else(|| "wallet checkout returned no URL".to_string()),
            )
        })
    }
}
