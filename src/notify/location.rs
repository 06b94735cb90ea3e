//! Best-effort user location for distance annotation.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle (haversine) distance in meters. NaN inputs yield NaN.
    #[must_use]
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let d_phi = (other.latitude - self.latitude).to_radians();
        let d_lambda = (other.longitude - self.longitude).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }
}

/// Source of the user's current position.
///
/// Implementations return `None` when no fix is available; they may take
/// arbitrarily long, callers bound them with [`locate_within`].
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_location(&self) -> Option<GeoPoint>;
}

/// Provider for hosts without any location source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn current_location(&self) -> Option<GeoPoint> {
        None
    }
}

/// Provider that always reports one configured position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub GeoPoint);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(&self) -> Option<GeoPoint> {
        Some(self.0)
    }
}

/// Ask `provider` for a fix, giving up after `budget`.
///
/// A timeout degrades to `None` ("no distance shown") instead of delaying
/// the sync attempt.
pub async fn locate_within(provider: &dyn LocationProvider, budget: Duration) -> Option<GeoPoint> {
    match tokio::time::timeout(budget, provider.current_location()).await {
        Ok(location) => location,
        Err(_) => {
            debug!(budget_ms = budget.as_millis() as u64, "location lookup timed out");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverResolves;

    #[async_trait]
    impl LocationProvider for NeverResolves {
        async fn current_location(&self) -> Option<GeoPoint> {
            std::future::pending().await
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = GeoPoint::new(49.74, 8.62);
        assert!(p.distance_meters(&p).abs() < 1e-6);
    }

    #[test]
    fn one_hundredth_degree_latitude_is_about_1112_m() {
        let a = GeoPoint::new(49.74, 8.62);
        let b = GeoPoint::new(49.75, 8.62);
        let d = a.distance_meters(&b);
        assert!((d - 1111.95).abs() < 1.0, "distance was {d}");
    }

    #[test]
    fn one_degree_on_equator_is_about_111_km() {
        let d = GeoPoint::new(0.0, 0.0).distance_meters(&GeoPoint::new(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 10.0, "distance was {d}");
    }

    #[tokio::test]
    async fn fixed_location_resolves() {
        let here = GeoPoint::new(1.0, 2.0);
        let found = locate_within(&FixedLocation(here), Duration::from_secs(1)).await;
        assert_eq!(found, Some(here));
        assert_eq!(locate_within(&NoLocation, Duration::from_secs(1)).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out_to_none() {
        let started = tokio::time::Instant::now();
        let found = locate_within(&NeverResolves, Duration::from_secs(5)).await;
        assert_eq!(found, None);
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
