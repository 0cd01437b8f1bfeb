//! Booking, availability and pricing core of the car rental client.
//!
//! [`RentalClient`] wires the pieces together: a [`Backend`] (HTTP or
//! in-memory), the session [`Credentials`], the [`Clock`] used for status
//! derivation, the [`AvailabilityManager`] and the [`BookingLifecycle`].

pub mod auth;
pub mod backend;
pub mod booking;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod pricing;
pub mod telemetry;
pub mod vehicles;

use std::sync::Arc;
use std::time::Duration;

pub use auth::Credentials;
pub use backend::{Backend, HttpBackend, InMemoryBackend};
pub use booking::{BookingLifecycle, CreateBooking};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{AppError, Result};
pub use vehicles::AvailabilityManager;

use cache::AvailabilityCache;

/// Shared client state
#[derive(Clone)]
pub struct RentalClient {
    pub credentials: Arc<Credentials>,
    availability: AvailabilityManager,
    bookings: BookingLifecycle,
}

impl RentalClient {
    /// Load config from the environment, install logging, then connect.
    pub fn from_env(credentials: Arc<Credentials>) -> anyhow::Result<Self> {
        let config = Config::from_env()?;
        telemetry::init_tracing(&config.log_filter);
        Ok(Self::from_config(&config, credentials)?)
    }

    /// Client talking to the HTTP backend described by `config`.
    pub fn from_config(config: &Config, credentials: Arc<Credentials>) -> Result<Self> {
        let backend = HttpBackend::from_config(config)?;
        tracing::info!("Booking backend at {}", config.api_base_url);

        Ok(Self::with_backend(
            Arc::new(backend),
            credentials,
            Arc::new(SystemClock),
            config.release_on_cancel,
            config.vehicle_cache_ttl,
        ))
    }

    pub fn with_backend(
        backend: Arc<dyn Backend>,
        credentials: Arc<Credentials>,
        clock: Arc<dyn Clock>,
        release_on_cancel: bool,
        cache_ttl: Duration,
    ) -> Self {
        let availability = AvailabilityManager::new(
            backend.clone(),
            AvailabilityCache::new(cache_ttl),
            credentials.clone(),
        );
        let bookings = BookingLifecycle::new(
            backend,
            availability.clone(),
            credentials.clone(),
            clock,
            release_on_cancel,
        );

        Self {
            credentials,
            availability,
            bookings,
        }
    }

    pub fn availability(&self) -> &AvailabilityManager {
        &self.availability
    }

    pub fn bookings(&self) -> &BookingLifecycle {
        &self.bookings
    }
}
