//! great-circle geometry over waypoint coordinates.

/// mean earth radius in miles used throughout the project.
pub const EARTH_RADIUS: f64 = 3963.1;

/// scale factor compensating for curves that mapped routes do not plot.
pub const ROUTE_DISTANCE_FACTOR: f64 = 1.02112;

/// distance in miles between two (lat, lng) points in degrees, by the
/// spherical law of cosines, scaled by [ROUTE_DISTANCE_FACTOR].
pub fn distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let rlat1 = lat1.to_radians();
    let rlng1 = lng1.to_radians();
    let rlat2 = lat2.to_radians();
    let rlng2 = lng2.to_radians();

    let central = (rlat1.cos() * rlng1.cos() * rlat2.cos() * rlng2.cos()
        + rlat1.cos() * rlng1.sin() * rlat2.cos() * rlng2.sin()
        + rlat1.sin() * rlat2.sin())
    .clamp(-1.0, 1.0);
    central.acos() * EARTH_RADIUS * ROUTE_DISTANCE_FACTOR
}

/// unscaled great-circle distance in miles, for area (place radius) tests.
pub fn arc_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    distance(lat1, lng1, lat2, lng2) / ROUTE_DISTANCE_FACTOR
}

/// the angle in degrees formed at (mid) between the chords from (prev)
/// and to (succ). the caller must rule out coincident adjacent points
/// first; those are flagged as BAD_ANGLE instead of computed here.
pub fn angle(
    prev: (f64, f64),
    mid: (f64, f64),
    succ: (f64, f64),
) -> f64 {
    let to_xyz = |(lat, lng): (f64, f64)| {
        let rlat = lat.to_radians();
        let rlng = lng.to_radians();
        (
            rlng.cos() * rlat.cos(),
            rlng.sin() * rlat.cos(),
            rlat.sin(),
        )
    };
    let (x0, y0, z0) = to_xyz(prev);
    let (x1, y1, z1) = to_xyz(mid);
    let (x2, y2, z2) = to_xyz(succ);

    let dot = (x2 - x1) * (x1 - x0) + (y2 - y1) * (y1 - y0) + (z2 - z1) * (z1 - z0);
    let norm = (((x2 - x1).powi(2) + (y2 - y1).powi(2) + (z2 - z1).powi(2))
        * ((x1 - x0).powi(2) + (y1 - y0).powi(2) + (z1 - z0).powi(2)))
    .sqrt();
    (dot / norm).clamp(-1.0, 1.0).acos().to_degrees()
}

/// axis-aligned closeness test in degrees, used by near-miss detection.
pub fn nearby(lat1: f64, lng1: f64, lat2: f64, lng2: f64, tolerance: f64) -> bool {
    (lat1 - lat2).abs() < tolerance && (lng1 - lng2).abs() < tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_zero_for_identical_points() {
        assert_eq!(distance(40.0, -75.0, 40.0, -75.0), 0.0);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        // one degree of latitude is about 69.1 miles before scaling
        let d = distance(40.0, -75.0, 41.0, -75.0);
        let expected = 69.17 * ROUTE_DISTANCE_FACTOR;
        assert!((d - expected).abs() < 0.5, "got {d}");
    }

    #[test]
    fn test_distance_symmetric() {
        let d1 = distance(40.0, -75.0, 40.5, -74.2);
        let d2 = distance(40.5, -74.2, 40.0, -75.0);
        assert!((d1 - d2).abs() < 1e-12);
    }

    #[test]
    fn test_angle_straight_line_is_near_zero() {
        let a = angle((40.0, -75.0), (40.1, -75.0), (40.2, -75.0));
        assert!(a < 0.01, "got {a}");
    }

    #[test]
    fn test_angle_right_turn() {
        let a = angle((40.0, -75.0), (40.1, -75.0), (40.1, -74.9));
        assert!((a - 90.0).abs() < 1.0, "got {a}");
    }

    #[test]
    fn test_angle_reversal_is_sharp() {
        let a = angle((40.0, -75.0), (40.1, -75.0), (40.0, -75.0));
        assert!(a > 179.0, "got {a}");
    }

    #[test]
    fn test_nearby_is_axis_aligned() {
        assert!(nearby(40.0, -75.0, 40.0004, -75.0004, 0.0005));
        assert!(!nearby(40.0, -75.0, 40.0006, -75.0, 0.0005));
        assert!(!nearby(40.0, -75.0, 40.0, -75.0006, 0.0005));
    }
}
