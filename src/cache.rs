//! In-memory caching using moka
//!
//! Holds the client's view of vehicle availability. Optimistic flips land here
//! before the backend confirms them; a full refresh from the backend replaces
//! every entry.

use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::vehicles::models::{Availability, Vehicle, VehicleId};

/// Default lifetime of a cached vehicle
pub const DEFAULT_VEHICLE_TTL: Duration = Duration::from_secs(5 * 60);

/// Local availability cache (vehicle id -> Vehicle)
#[derive(Clone)]
pub struct AvailabilityCache {
    vehicles: Cache<VehicleId, Arc<Vehicle>>,
}

impl AvailabilityCache {
    /// Create a new cache instance with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            // Fleet sizes are small; 1000 entries is plenty
            vehicles: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, id: &VehicleId) -> Option<Arc<Vehicle>> {
        let hit = self.vehicles.get(id).await;
        match &hit {
            Some(_) => debug!("Cache HIT for vehicle: {}", id),
            None => debug!("Cache MISS for vehicle: {}", id),
        }
        hit
    }

    pub async fn insert(&self, vehicle: Vehicle) {
        self.vehicles
            .insert(vehicle.id.clone(), Arc::new(vehicle))
            .await;
    }

    /// Overwrite the availability of a cached vehicle.
    ///
    /// Returns the previous value so the caller can restore it, or `None`
    /// when the vehicle is not cached.
    pub async fn set_availability(
        &self,
        id: &VehicleId,
        availability: Availability,
    ) -> Option<Availability> {
        let cached = self.vehicles.get(id).await?;
        let previous = cached.availability;
        if previous != availability {
            let mut updated = (*cached).clone();
            updated.availability = availability;
            self.vehicles.insert(id.clone(), Arc::new(updated)).await;
        }
        Some(previous)
    }

    /// Replace the whole cache with a fresh listing from the backend
    pub async fn replace_all(&self, vehicles: &[Vehicle]) {
        let stale: Vec<VehicleId> = self
            .vehicles
            .iter()
            .map(|(id, _)| (*id).clone())
            .filter(|id| !vehicles.iter().any(|v| &v.id == id))
            .collect();
        for id in &stale {
            self.vehicles.invalidate(id).await;
        }
        for vehicle in vehicles {
            self.insert(vehicle.clone()).await;
        }
        info!("Availability cache reconciled with {} vehicles", vehicles.len());
    }

    pub async fn invalidate(&self, id: &VehicleId) {
        self.vehicles.invalidate(id).await;
    }

    /// Get cache statistics for monitoring
    pub async fn stats(&self) -> CacheStats {
        self.vehicles.run_pending_tasks().await;
        let mut size = 0;
        let mut available = 0;
        for (_, vehicle) in self.vehicles.iter() {
            size += 1;
            if vehicle.is_bookable() {
                available += 1;
            }
        }
        CacheStats {
            vehicles_size: size,
            available_count: available,
        }
    }
}

impl Default for AvailabilityCache {
    fn default() -> Self {
        Self::new(DEFAULT_VEHICLE_TTL)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub vehicles_size: u64,
    pub available_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn civic() -> Vehicle {
        Vehicle::new("1", "Honda Civic", dec!(1500))
    }

    #[tokio::test]
    async fn test_set_availability_returns_previous() {
        let cache = AvailabilityCache::default();
        cache.insert(civic()).await;

        let id = VehicleId::from("1");
        let previous = cache.set_availability(&id, Availability::Unavailable).await;
        assert_eq!(previous, Some(Availability::Available));
        assert_eq!(
            cache.get(&id).await.unwrap().availability,
            Availability::Unavailable
        );
    }

    #[tokio::test]
    async fn test_set_availability_on_missing_vehicle() {
        let cache = AvailabilityCache::default();
        let previous = cache
            .set_availability(&VehicleId::from("99"), Availability::Unavailable)
            .await;
        assert_eq!(previous, None);
    }

    #[tokio::test]
    async fn test_replace_all_drops_stale_entries() {
        let cache = AvailabilityCache::default();
        cache.insert(civic()).await;

        let fresh = vec![Vehicle::new("2", "Toyota Vios", dec!(1200))
            .with_availability(Availability::Unavailable)];
        cache.replace_all(&fresh).await;

        assert!(cache.get(&VehicleId::from("1")).await.is_none());
        assert!(cache.get(&VehicleId::from("2")).await.is_some());

        let stats = cache.stats().await;
        assert_eq!(stats.vehicles_size, 1);
        assert_eq!(stats.available_count, 0);
    }
}
