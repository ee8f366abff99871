//! Great-circle trip length.

use crate::model::Coordinate;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points, in kilometers.
///
/// Symmetric in its arguments and exactly `0.0` when both points are equal.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let half_dphi = ((to.lat - from.lat).to_radians() * 0.5).sin();
    let half_dlambda = ((to.lon - from.lon).to_radians() * 0.5).sin();

    let a = half_dphi * half_dphi + phi1.cos() * phi2.cos() * half_dlambda * half_dlambda;
    // Rounding can push `a` a hair past 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_same_point_is_zero() {
        let p = Coordinate::new(40.7128, -74.0060);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let a = Coordinate::new(40.71911552, -74.00666661);
        let b = Coordinate::new(40.73492695, -73.99200509);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < EPS);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // One degree along a meridian is R * pi / 180.
        let d = haversine_km(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        let expected = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
        assert!((d - expected).abs() < 1e-6);
    }

    #[test]
    fn test_antipodes_are_half_circumference() {
        let d = haversine_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!((d - EARTH_RADIUS_KM * std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_short_manhattan_hop() {
        // Roughly 2 km between these two docks.
        let a = Coordinate::new(40.71911552, -74.00666661);
        let b = Coordinate::new(40.73492695, -73.99200509);
        let d = haversine_km(a, b);
        assert!(d > 1.9 && d < 2.3, "got {d}");
    }
}
