//! Haversine distance calculation.
//!
//! Great-circle distance between two points on a sphere, used to rank ports
//! by proximity to a coordinate.

use crate::Coordinate;

/// Earth's mean radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculates the great-circle distance between two coordinates in kilometers.
///
/// # Example
/// ```
/// use portmatch_geo::{haversine_distance, Coordinate};
///
/// let seattle = Coordinate::new(47.6062, -122.3321);
/// let vancouver = Coordinate::new(49.2827, -123.1207);
///
/// let distance = haversine_distance(&seattle, &vancouver);
/// assert!((distance - 195.0).abs() < 5.0);
/// ```
#[inline]
pub fn haversine_distance(from: &Coordinate, to: &Coordinate) -> f64 {
    let (lat1, lon1) = from.to_radians();
    let (lat2, lon2) = to.to_radians();

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MIAMI: Coordinate = Coordinate { latitude: 25.7781, longitude: -80.1794 };
    const NASSAU: Coordinate = Coordinate { latitude: 25.0780, longitude: -77.3431 };
    const SOUTHAMPTON: Coordinate = Coordinate { latitude: 50.8998, longitude: -1.4044 };
    const NEW_YORK: Coordinate = Coordinate { latitude: 40.7681, longitude: -73.9997 };

    #[test]
    fn test_miami_to_nassau() {
        let distance = haversine_distance(&MIAMI, &NASSAU);
        // Expected: ~294 km
        assert!((distance - 294.0).abs() < 10.0, "Miami-Nassau: {distance}");
    }

    #[test]
    fn test_transatlantic() {
        let distance = haversine_distance(&SOUTHAMPTON, &NEW_YORK);
        // Expected: ~5,500 km
        assert!((distance - 5500.0).abs() < 50.0, "Southampton-NYC: {distance}");
    }

    #[test]
    fn test_same_point_zero_distance() {
        assert!(haversine_distance(&MIAMI, &MIAMI).abs() < 0.001);
    }

    proptest! {
        #[test]
        fn prop_symmetric_and_bounded(
            lat1 in -90.0f64..=90.0, lng1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0, lng2 in -180.0f64..=180.0,
        ) {
            let a = Coordinate::new(lat1, lng1);
            let b = Coordinate::new(lat2, lng2);
            let d1 = haversine_distance(&a, &b);
            let d2 = haversine_distance(&b, &a);
            prop_assert!((d1 - d2).abs() < 1e-6);
            prop_assert!(d1 >= 0.0);
            prop_assert!(d1 <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
        }
    }
}
