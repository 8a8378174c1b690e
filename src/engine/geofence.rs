//! Geofence admission for punches.
//!
//! An empty restriction set admits everything. Otherwise a point is admitted
//! when it lies inside at least one allowed circle (union of zones).

use crate::model::location::{AllowedLocation, GeoPoint};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance in meters between two coordinates.
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

pub fn is_admissible(point: GeoPoint, allowed: &[AllowedLocation]) -> bool {
    if allowed.is_empty() {
        return true;
    }

    allowed
        .iter()
        .any(|location| haversine_distance(point, location.center()) <= location.radius_meters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(id: u64, latitude: f64, longitude: f64, radius_meters: f64) -> AllowedLocation {
        AllowedLocation {
            id,
            tenant_id: 1,
            name: format!("site-{id}"),
            latitude,
            longitude,
            radius_meters,
        }
    }

    #[test]
    fn test_distance_between_identical_points_is_zero() {
        let p = GeoPoint::new(51.5007, -0.1246);
        assert_eq!(haversine_distance(p, p), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude_is_about_111km() {
        let d = haversine_distance(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((d - 111_194.93).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_empty_restriction_set_admits_any_point() {
        assert!(is_admissible(GeoPoint::new(-89.9, 179.9), &[]));
    }

    #[test]
    fn test_union_of_circles() {
        // ~0.0009 degrees of latitude is ~100 m
        let c1 = circle(1, 10.0, 20.0, 100.0);
        let c2 = circle(2, 10.01, 20.0, 50.0);
        let allowed = vec![c1, c2];

        assert!(is_admissible(GeoPoint::new(10.0008, 20.0), &allowed));
        assert!(is_admissible(GeoPoint::new(10.0103, 20.0), &allowed));
        assert!(!is_admissible(GeoPoint::new(10.005, 20.0), &allowed));
    }

    #[test]
    fn test_point_on_boundary_is_admitted() {
        let center = GeoPoint::new(0.0, 0.0);
        let edge = GeoPoint::new(0.001, 0.0);
        let radius = haversine_distance(center, edge);

        assert!(is_admissible(edge, &[circle(1, 0.0, 0.0, radius)]));
    }
}
