//! Great-circle distance for the geofence check.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A point on the Earth's surface in signed decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Haversine distance between two points, in meters.
///
/// Computed in radians with `f64` throughout; the 100 m geofence threshold
/// needs sub-meter precision.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_distance_at_identical_points() {
        let p = GeoPoint::new(30.0, 76.0);
        assert_eq!(haversine_m(p, p), 0.0);
    }

    #[test]
    fn hundred_meters_at_equator() {
        // 0.0009 degrees of longitude at the equator is just over 100 m:
        // 0.0009 * (pi / 180) * 6_371_000 = 100.0754 m.
        let d = haversine_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.0009));
        assert!((d - 100.0754).abs() < 0.01, "got {d}");
    }

    #[test]
    fn fifty_five_meters_near_lecture_hall() {
        // End-to-end scenario fixture: (30.0, 76.0) to (30.0, 76.0005).
        let d = haversine_m(GeoPoint::new(30.0, 76.0), GeoPoint::new(30.0, 76.0005));
        assert!(d > 40.0 && d < 60.0, "got {d}");
    }

    proptest! {
        #[test]
        fn distance_is_non_negative(
            lat1 in -89.0f64..89.0, lng1 in -179.0f64..179.0,
            lat2 in -89.0f64..89.0, lng2 in -179.0f64..179.0,
        ) {
            let d = haversine_m(GeoPoint::new(lat1, lng1), GeoPoint::new(lat2, lng2));
            prop_assert!(d >= 0.0);
            // No two surface points are further apart than half the
            // circumference.
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_M + 1.0);
        }

        #[test]
        fn distance_is_symmetric(
            lat1 in -89.0f64..89.0, lng1 in -179.0f64..179.0,
            lat2 in -89.0f64..89.0, lng2 in -179.0f64..179.0,
        ) {
            let a = GeoPoint::new(lat1, lng1);
            let b = GeoPoint::new(lat2, lng2);
            prop_assert!((haversine_m(a, b) - haversine_m(b, a)).abs() < 1e-6);
        }
    }
}
