//! Great-circle distance math for the location check-in feature.

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates via the haversine formula,
/// rounded to two decimal places.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    let d = EARTH_RADIUS_KM * c;
    (d * 100.0).round() / 100.0
}

/// Whether a (latitude, longitude) pair is a finite, in-range coordinate.
pub fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_same_point() {
        assert_eq!(haversine_km(39.9042, 116.4074, 39.9042, 116.4074), 0.0);
    }

    #[test]
    fn beijing_to_new_york() {
        // Known great-circle distance is roughly 11,000 km.
        let d = haversine_km(39.9042, 116.4074, 40.7589, -73.9851);
        assert!((10800.0..11200.0).contains(&d), "got {}", d);
    }

    #[test]
    fn short_hop_is_plausible() {
        // Shanghai to Beijing, about 1070 km.
        let d = haversine_km(31.2304, 121.4737, 39.9042, 116.4074);
        assert!((1000.0..1150.0).contains(&d), "got {}", d);
    }

    #[test]
    fn symmetric() {
        let ab = haversine_km(51.5074, -0.1278, 48.8566, 2.3522);
        let ba = haversine_km(48.8566, 2.3522, 51.5074, -0.1278);
        assert_eq!(ab, ba);
    }

    #[test]
    fn coordinate_validation() {
        assert!(valid_coordinates(0.0, 0.0));
        assert!(valid_coordinates(-90.0, 180.0));
        assert!(!valid_coordinates(90.1, 0.0));
        assert!(!valid_coordinates(0.0, -180.5));
        assert!(!valid_coordinates(f64::NAN, 0.0));
        assert!(!valid_coordinates(0.0, f64::INFINITY));
    }
}
