//! Spherical Geometry
//!
//! Distance, bearing and angle helpers on a spherical earth model.
//!
//! All angles are in degrees. Bearings run clockwise from north in
//! `[0, 360)`; angle differences are normalized to `(-180, 180]`.

use nalgebra::Vector2;

/// Mean earth radius in kilometers (spherical model)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometers (haversine).
///
/// Symmetric, never negative, and exactly zero for coincident points.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` marginally outside [0, 1]
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Initial bearing from point 1 to point 2 in degrees `[0, 360)`.
///
/// The bearing from a point to itself is degenerate; the formula yields 0.
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let x = delta_lon.sin() * lat2_rad.cos();
    let y = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lon.cos();

    normalize_bearing(x.atan2(y).to_degrees())
}

/// Destination reached from a start point after travelling `distance_km`
/// along the great circle leaving at `bearing`.
///
/// Returns `(latitude, longitude)` with longitude normalized to `(-180, 180]`.
pub fn destination(lat: f64, lon: f64, bearing: f64, distance_km: f64) -> (f64, f64) {
    let lat_rad = lat.to_radians();
    let lon_rad = lon.to_radians();
    let brg_rad = bearing.to_radians();
    let delta = distance_km / EARTH_RADIUS_KM;

    let lat2 = (lat_rad.sin() * delta.cos() + lat_rad.cos() * delta.sin() * brg_rad.cos()).asin();
    let lon2 = lon_rad
        + (brg_rad.sin() * delta.sin() * lat_rad.cos())
            .atan2(delta.cos() - lat_rad.sin() * lat2.sin());

    (lat2.to_degrees(), normalize_angle_diff(lon2.to_degrees()))
}

/// Reduce any angle to a bearing in `[0, 360)`.
#[inline]
pub fn normalize_bearing(angle: f64) -> f64 {
    let b = angle.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if b >= 360.0 {
        0.0
    } else {
        b
    }
}

/// Reduce an angle difference to its shortest signed form in `(-180, 180]`.
///
/// `normalize_angle_diff(x + 360 * k) == normalize_angle_diff(x)` for any
/// integer `k`. Non-finite input yields NaN.
#[inline]
pub fn normalize_angle_diff(angle: f64) -> f64 {
    if !angle.is_finite() {
        return f64::NAN;
    }
    if angle > -180.0 && angle <= 180.0 {
        return angle;
    }
    let d = angle.rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Circular distance between two angles in degrees `[0, 180]`.
#[inline]
pub fn angular_distance(a: f64, b: f64) -> f64 {
    normalize_angle_diff(a - b).abs()
}

/// Circular mean of a set of angles in degrees `[0, 360)`.
///
/// Sums the unit vectors of every angle and returns the direction of the
/// resultant. The mean of an empty set is undefined and yields `None`.
pub fn circular_mean<I>(angles: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut count = 0usize;
    let resultant = angles.into_iter().fold(Vector2::zeros(), |acc, deg| {
        count += 1;
        let rad = deg.to_radians();
        acc + Vector2::new(rad.cos(), rad.sin())
    });

    if count == 0 {
        return None;
    }
    Some(normalize_bearing(resultant.y.atan2(resultant.x).to_degrees()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_distance_zero_for_same_point() {
        for (lat, lon) in [(0.0, 0.0), (51.5, -0.12), (-33.9, 151.2), (89.9, 179.9)] {
            assert_eq!(distance_km(lat, lon, lat, lon), 0.0);
        }
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let d = distance_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.195).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = distance_km(48.85, 2.35, 41.9, 12.5);
        let b = distance_km(41.9, 12.5, 48.85, 2.35);
        assert!((a - b).abs() < EPS);
        assert!(a > 0.0);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        assert!(bearing_deg(0.0, 0.0, 1.0, 0.0).abs() < EPS);
        assert!((bearing_deg(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < EPS);
        assert!((bearing_deg(0.0, 0.0, -1.0, 0.0) - 180.0).abs() < EPS);
        assert!((bearing_deg(0.0, 0.0, 0.0, -1.0) - 270.0).abs() < EPS);
    }

    #[test]
    fn test_bearing_range() {
        let b = bearing_deg(10.0, 10.0, 9.0, 9.999);
        assert!((0.0..360.0).contains(&b));
    }

    #[test]
    fn test_destination_round_trip() {
        let (lat, lon) = destination(52.0, 4.0, 123.0, 25.0);
        assert!((distance_km(52.0, 4.0, lat, lon) - 25.0).abs() < 1e-6);
        assert!((bearing_deg(52.0, 4.0, lat, lon) - 123.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_angle_diff_range() {
        for x in [-1000.5, -540.0, -180.0, -179.0, 0.0, 179.0, 180.0, 181.0, 359.0, 720.25] {
            let n = normalize_angle_diff(x);
            assert!(n > -180.0 && n <= 180.0, "{} -> {}", x, n);
        }
        assert_eq!(normalize_angle_diff(-180.0), 180.0);
        assert_eq!(normalize_angle_diff(180.0), 180.0);
        assert_eq!(normalize_angle_diff(270.0), -90.0);
        assert_eq!(normalize_angle_diff(-90.0), -90.0);
    }

    #[test]
    fn test_normalize_angle_diff_periodic() {
        for x in [-725.0, -3.0, 0.0, 17.0, 90.0, 179.0, 180.0, 333.0] {
            for k in [-3.0, -1.0, 1.0, 2.0] {
                assert_eq!(normalize_angle_diff(x + 360.0 * k), normalize_angle_diff(x));
            }
        }
    }

    #[test]
    fn test_normalize_angle_diff_keeps_in_range_values() {
        for x in [0.1, 20.1, -45.7, -179.999, 179.5, 1e-12] {
            assert_eq!(normalize_angle_diff(x), x);
        }
        assert!((normalize_angle_diff(360.1) - 0.1).abs() < EPS);
        assert!((normalize_angle_diff(-359.9) - 0.1).abs() < EPS);
        assert_eq!(normalize_angle_diff(-1e-15 - 360.0), 0.0);
    }

    #[test]
    fn test_normalize_angle_diff_non_finite() {
        assert!(normalize_angle_diff(f64::NAN).is_nan());
        assert!(normalize_angle_diff(f64::INFINITY).is_nan());
    }

    #[test]
    fn test_circular_mean_single() {
        assert!((circular_mean([45.0]).unwrap() - 45.0).abs() < EPS);
        assert!((circular_mean([-90.0]).unwrap() - 270.0).abs() < EPS);
        assert!((circular_mean([370.0]).unwrap() - 10.0).abs() < EPS);
    }

    #[test]
    fn test_circular_mean_wraparound() {
        let m = circular_mean([10.0, -10.0]).unwrap();
        assert!(angular_distance(m, 0.0) < EPS, "got {}", m);

        let m = circular_mean([350.0, 10.0]).unwrap();
        assert!(angular_distance(m, 0.0) < EPS, "got {}", m);
    }

    #[test]
    fn test_circular_mean_empty() {
        assert_eq!(circular_mean(std::iter::empty()), None);
    }
}
