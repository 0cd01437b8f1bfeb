//! Availability manager.
//!
//! Single place that flips a vehicle's availability flag. Flips are applied to
//! the local cache first and pushed to the backend second; if the push fails the
//! cache is put back the way it was.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::Credentials;
use crate::backend::Backend;
use crate::cache::{AvailabilityCache, CacheStats};
use crate::error::{AppError, Result};

use super::models::{Availability, Vehicle, VehicleFilter, VehicleId};

/// Tentative hold on a vehicle, released if the booking never lands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: Uuid,
    pub vehicle_id: VehicleId,
    pub reserved_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AvailabilityManager {
    backend: Arc<dyn Backend>,
    cache: AvailabilityCache,
    credentials: Arc<Credentials>,
}

impl AvailabilityManager {
    pub fn new(
        backend: Arc<dyn Backend>,
        cache: AvailabilityCache,
        credentials: Arc<Credentials>,
    ) -> Self {
        Self {
            backend,
            cache,
            credentials,
        }
    }

    pub fn is_bookable(vehicle: &Vehicle) -> bool {
        vehicle.is_bookable()
    }

    /// Fetch the full fleet and reconcile the local cache with it.
    pub async fn refresh(&self) -> Result<Vec<Vehicle>> {
        let vehicles = self.backend.list_vehicles().await?;
        self.cache.replace_all(&vehicles).await;
        Ok(vehicles)
    }

    /// Refresh, then keep the vehicles matching `filter`.
    pub async fn browse(&self, filter: &VehicleFilter) -> Result<Vec<Vehicle>> {
        let vehicles = self.refresh().await?;
        Ok(vehicles.into_iter().filter(|v| filter.matches(v)).collect())
    }

    /// Vehicle by id: local cache first, backend on a miss.
    pub async fn vehicle(&self, id: &VehicleId) -> Result<Vehicle> {
        if let Some(cached) = self.cache.get(id).await {
            return Ok((*cached).clone());
        }
        let vehicle = self.backend.get_vehicle(id).await?;
        self.cache.insert(vehicle.clone()).await;
        Ok(vehicle)
    }

    /// Idempotent. Fails with `SyncFailed` if the backend rejects the change,
    /// after restoring the local cache.
    pub async fn mark_unavailable(&self, id: &VehicleId) -> Result<()> {
        self.set(id, Availability::Unavailable).await
    }

    pub async fn mark_available(&self, id: &VehicleId) -> Result<()> {
        self.set(id, Availability::Available).await
    }

    /// Take a vehicle out of the pool ahead of creating a booking for it.
    pub async fn reserve(&self, id: &VehicleId) -> Result<Reservation> {
        self.mark_unavailable(id).await?;
        let reservation = Reservation {
            id: Uuid::new_v4(),
            vehicle_id: id.clone(),
            reserved_at: Utc::now(),
        };
        info!("Reserved vehicle {} (reservation {})", id, reservation.id);
        Ok(reservation)
    }

    /// Give a reserved vehicle back.
    pub async fn release(&self, reservation: Reservation) -> Result<()> {
        self.mark_available(&reservation.vehicle_id).await?;
        info!(
            "Released vehicle {} (reservation {})",
            reservation.vehicle_id, reservation.id
        );
        Ok(())
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    async fn set(&self, id: &VehicleId, availability: Availability) -> Result<()> {
        let token = self.credentials.bearer()?;

        let previous = self.cache.set_availability(id, availability).await;

        if let Err(err) = self.backend.set_availability(&token, id, availability).await {
            warn!("Setting vehicle {} {} failed: {}", id, availability, err);
            match previous {
                Some(prev) => {
                    self.cache.set_availability(id, prev).await;
                }
                None => self.cache.invalidate(id).await,
            }
            return Err(match err {
                AppError::MalformedResponse(msg) => AppError::SyncFailed(msg),
                other => other,
            });
        }

        info!("Vehicle {} marked {}", id, availability);
        Ok(())
    }
}
