//! Points on the surface of the Earth.
use crate::metric::{MetricItem, Relocatable};

/// Mean radius of the Earth, in meters.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// A latitude/longitude pair in degrees. Distances between points are
/// great-circle distances in meters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoPoint { latitude, longitude }
    }
}

impl MetricItem<f64> for GeoPoint {
    /// Haversine formula.
    fn distance(&self, other: &Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS * a.sqrt().min(1.0).asin()
    }
}

impl Relocatable<f64> for GeoPoint {
    fn relocate_to(&mut self, destination: &Self) {
        self.latitude = destination.latitude;
        self.longitude = destination.longitude;
    }
}

#[cfg(test)]
mod tests {
    use super::GeoPoint;
    use crate::metric::MetricItem;

    #[test]
    fn distance_to_self_is_zero() {
        let p = GeoPoint::new(42.396745, -71.122479);
        assert_eq!(p.distance(&p), 0.0);
    }

    #[test]
    fn quarter_meridian() {
        let equator = GeoPoint::new(0.0, 0.0);
        let pole = GeoPoint::new(90.0, 0.0);
        let expected = super::EARTH_RADIUS * ::std::f64::consts::FRAC_PI_2;
        assert!((equator.distance(&pole) - expected).abs() < 1e-6);
    }

    #[test]
    fn symmetric() {
        let boston = GeoPoint::new(42.3601, -71.0589);
        let paris = GeoPoint::new(48.8566, 2.3522);
        let d = boston.distance(&paris);
        assert!((d - paris.distance(&boston)).abs() < 1e-6);
        // Roughly 5,500 km apart.
        assert!(d > 5.4e6 && d < 5.6e6);
    }
}
