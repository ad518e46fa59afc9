//! Deterministic generated metrics for development and tests.
//!
//! Values are drawn from per-service ranges with an RNG seeded from
//! `(seed, location name, service, generation)`. A fixed provider always
//! uses generation 0, so every call for a pair returns the same snapshot. A
//! rotating provider advances the generation on each fetch of a pair, so
//! every collection cycle sees fresh numbers while a given seed still
//! replays the same sequence.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use qcsite_core::{Location, ProviderSnapshot, ServiceArea, ServiceId, SnapshotSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use crate::error::ProviderError;
use crate::provider::MetricsProvider;

const AREA_NAMES: [&str; 5] = [
    "Downtown",
    "Residential Area",
    "Commercial District",
    "Suburbs",
    "Industrial Zone",
];

/// Generation ranges for one service. Integer ranges are half-open.
struct ServiceProfile {
    availability: f64,
    orders: (u64, u64),
    order_value: (u32, u32),
    delivery_minutes: (u32, u32),
    categories: [&'static str; 4],
    peak_hours: [&'static str; 2],
}

fn profile(service: ServiceId) -> ServiceProfile {
    match service {
        ServiceId::Blinkit => ServiceProfile {
            availability: 0.7,
            orders: (100, 1100),
            order_value: (200, 700),
            delivery_minutes: (10, 40),
            categories: ["Groceries", "Fresh Vegetables", "Dairy", "Beverages"],
            peak_hours: ["6:00 PM - 9:00 PM", "11:00 AM - 2:00 PM"],
        },
        ServiceId::Zepto => ServiceProfile {
            availability: 0.8,
            orders: (80, 880),
            order_value: (180, 630),
            delivery_minutes: (8, 33),
            categories: ["Groceries", "Fresh Fruits", "Snacks", "Beverages"],
            peak_hours: ["5:00 PM - 8:00 PM", "10:00 AM - 1:00 PM"],
        },
        ServiceId::Swiggy => ServiceProfile {
            availability: 0.85,
            orders: (120, 1320),
            order_value: (250, 850),
            delivery_minutes: (12, 47),
            categories: ["Groceries", "Fresh Meat", "Frozen Foods", "Beverages"],
            peak_hours: ["6:30 PM - 9:30 PM", "11:30 AM - 2:30 PM"],
        },
    }
}

/// Metrics provider that generates plausible snapshots without network access.
#[derive(Debug)]
pub struct SimulatedProvider {
    seed: u64,
    /// Next generation per `(location name, service)`; `None` when fixed.
    generations: Option<Mutex<HashMap<(String, ServiceId), u64>>>,
}

impl SimulatedProvider {
    /// A provider that returns the same snapshot for a pair on every fetch.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            generations: None,
        }
    }

    /// A provider whose snapshots for a pair change on every fetch.
    #[must_use]
    pub fn rotating(seed: u64) -> Self {
        Self {
            seed,
            generations: Some(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn is_rotating(&self) -> bool {
        self.generations.is_some()
    }

    fn next_generation(&self, location: &Location, service: ServiceId) -> u64 {
        let Some(generations) = &self.generations else {
            return 0;
        };
        let mut generations = generations.lock().unwrap_or_else(PoisonError::into_inner);
        let next = generations
            .entry((location.name.clone(), service))
            .or_insert(0);
        let current = *next;
        *next = next.saturating_add(1);
        current
    }

    fn rng_for(&self, location: &Location, service: ServiceId, generation: u64) -> StdRng {
        let digest = Sha256::digest(format!(
            "{}:{}:{service}:{generation}",
            self.seed, location.name
        ));
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        StdRng::seed_from_u64(u64::from_le_bytes(bytes))
    }

    /// Generation 0 of [`Self::generate_at`].
    #[must_use]
    pub fn generate(&self, location: &Location, service: ServiceId) -> ProviderSnapshot {
        self.generate_at(location, service, 0)
    }

    /// Generates the snapshot for one pair. Pure function of the seed,
    /// location name, service, and generation.
    #[must_use]
    pub fn generate_at(
        &self,
        location: &Location,
        service: ServiceId,
        generation: u64,
    ) -> ProviderSnapshot {
        let mut rng = self.rng_for(location, service, generation);
        let p = profile(service);

        let available = rng.random_bool(p.availability);
        let orders = rng.random_range(p.orders.0..p.orders.1);
        let order_value = f64::from(rng.random_range(p.order_value.0..p.order_value.1));
        let delivery = f64::from(rng.random_range(p.delivery_minutes.0..p.delivery_minutes.1));

        let area_count = rng.random_range(3..=AREA_NAMES.len());
        let service_areas = AREA_NAMES
            .iter()
            .take(area_count)
            .map(|area| {
                ServiceArea::new(
                    format!("{area} {}", location.name),
                    f64::from(rng.random_range(70u32..100)),
                    rng.random_range(10_000u64..60_000),
                )
            })
            .collect();

        ProviderSnapshot::new(
            service,
            available,
            orders,
            order_value,
            delivery,
            SnapshotSource::Simulated,
            Utc::now(),
        )
        .with_service_areas(service_areas)
        .with_popular_categories(p.categories.iter().map(ToString::to_string).collect())
        .with_peak_hours(p.peak_hours.iter().map(ToString::to_string).collect())
    }
}

#[async_trait]
impl MetricsProvider for SimulatedProvider {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn fetch(
        &self,
        location: &Location,
        service: ServiceId,
    ) -> Result<ProviderSnapshot, ProviderError> {
        let generation = self.next_generation(location, service);
        Ok(self.generate_at(location, service, generation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcsite_core::default_locations;

    fn mumbai() -> Location {
        Location::new("Mumbai", "Mumbai", "Maharashtra", 19.0760, 72.8777)
    }

    /// Compare everything but the capture time.
    fn same_metrics(a: &ProviderSnapshot, b: &ProviderSnapshot) -> bool {
        a.service_available() == b.service_available()
            && a.estimated_orders() == b.estimated_orders()
            && a.average_order_value() == b.average_order_value()
            && a.delivery_time_minutes() == b.delivery_time_minutes()
            && a.service_areas() == b.service_areas()
    }

    #[test]
    fn same_seed_same_pair_is_repeatable() {
        let provider = SimulatedProvider::new(7);
        let a = provider.generate(&mumbai(), ServiceId::Blinkit);
        let b = provider.generate(&mumbai(), ServiceId::Blinkit);
        assert!(same_metrics(&a, &b));
    }

    #[test]
    fn different_seeds_diverge_somewhere() {
        let a = SimulatedProvider::new(1);
        let b = SimulatedProvider::new(2);
        let differs = default_locations().iter().any(|loc| {
            !same_metrics(
                &a.generate(loc, ServiceId::Swiggy),
                &b.generate(loc, ServiceId::Swiggy),
            )
        });
        assert!(differs);
    }

    #[test]
    fn values_stay_within_service_ranges() {
        let provider = SimulatedProvider::new(99);
        for loc in default_locations() {
            for service in [ServiceId::Blinkit, ServiceId::Zepto, ServiceId::Swiggy] {
                let p = profile(service);
                let snap = provider.generate(&loc, service);
                if snap.service_available() {
                    assert!((p.orders.0..p.orders.1).contains(&snap.estimated_orders()));
                    assert!(snap.average_order_value() >= f64::from(p.order_value.0));
                } else {
                    assert_eq!(snap.estimated_orders(), 0);
                    assert_eq!(snap.average_order_value(), 0.0);
                }
                assert!(snap.delivery_time_minutes() >= f64::from(p.delivery_minutes.0));
                assert!((3..=5).contains(&snap.service_areas().len()));
                for area in snap.service_areas() {
                    assert!((70.0..=100.0).contains(&area.coverage_percent));
                    assert!(area.name.ends_with(&loc.name));
                }
                assert_eq!(snap.source(), SnapshotSource::Simulated);
            }
        }
    }

    #[tokio::test]
    async fn fixed_provider_repeats_on_every_fetch() {
        let provider = SimulatedProvider::new(21);
        let first = provider.fetch(&mumbai(), ServiceId::Blinkit).await.unwrap();
        let second = provider.fetch(&mumbai(), ServiceId::Blinkit).await.unwrap();
        assert!(same_metrics(&first, &second));
        assert!(!provider.is_rotating());
    }

    #[tokio::test]
    async fn rotating_provider_advances_per_pair() {
        let provider = SimulatedProvider::rotating(21);
        let mut changed = false;
        for loc in default_locations() {
            let first = provider.fetch(&loc, ServiceId::Swiggy).await.unwrap();
            let second = provider.fetch(&loc, ServiceId::Swiggy).await.unwrap();
            assert!(same_metrics(&first, &provider.generate_at(&loc, ServiceId::Swiggy, 0)));
            assert!(same_metrics(&second, &provider.generate_at(&loc, ServiceId::Swiggy, 1)));
            changed |= !same_metrics(&first, &second);
        }
        assert!(changed, "rotation never changed any snapshot");

        // Other pairs keep their own count.
        let zepto = provider.fetch(&mumbai(), ServiceId::Zepto).await.unwrap();
        assert!(same_metrics(&zepto, &provider.generate(&mumbai(), ServiceId::Zepto)));
    }

    #[tokio::test]
    async fn rotating_sequence_replays_for_the_same_seed() {
        let a = SimulatedProvider::rotating(8);
        let b = SimulatedProvider::rotating(8);
        for _ in 0..3 {
            let x = a.fetch(&mumbai(), ServiceId::Blinkit).await.unwrap();
            let y = b.fetch(&mumbai(), ServiceId::Blinkit).await.unwrap();
            assert!(same_metrics(&x, &y));
        }
    }

    #[tokio::test]
    async fn fetch_never_fails() {
        let provider = SimulatedProvider::new(3);
        let snap = provider.fetch(&mumbai(), ServiceId::Zepto).await;
        assert!(snap.is_ok());
    }
}
