use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        is_valid_coordinate(self.latitude, self.longitude)
    }

    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// Great-circle distance between two points given in degrees.
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[must_use]
pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

/// Parses a `"lat,lon"` pair. Returns `None` unless both halves are numbers.
#[must_use]
pub fn parse_lat_lon(value: &str) -> Option<GeoPoint> {
    let (lat, lon) = value.split_once(',')?;
    let latitude = lat.trim().parse::<f64>().ok()?;
    let longitude = lon.trim().parse::<f64>().ok()?;
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    Some(GeoPoint::new(latitude, longitude))
}

/// Cache key used for forecast lookups: both coordinates at two decimals.
#[must_use]
pub fn coordinate_key(point: &GeoPoint) -> String {
    format!("{:.2},{:.2}", point.latitude, point.longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_zero_for_same_point() {
        assert_eq!(haversine_km(48.85, 2.35, 48.85, 2.35), 0.0);
    }

    #[test]
    fn haversine_paris_london() {
        let d = haversine_km(48.8566, 2.3522, 51.5074, -0.1278);
        assert!((d - 343.5).abs() < 1.0, "got {d}");
    }

    #[test]
    fn haversine_one_degree_latitude() {
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(1.005_000_1), 1.01);
        assert_eq!(round2(2.344), 2.34);
        assert_eq!(round2(-2.345_1), -2.35);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn parse_lat_lon_accepts_pairs() {
        assert_eq!(
            parse_lat_lon("12.5,-7.25"),
            Some(GeoPoint::new(12.5, -7.25))
        );
        assert_eq!(parse_lat_lon(" 1 , 2 "), Some(GeoPoint::new(1.0, 2.0)));
    }

    #[test]
    fn parse_lat_lon_rejects_garbage() {
        assert_eq!(parse_lat_lon("12.5"), None);
        assert_eq!(parse_lat_lon("abc,1"), None);
        assert_eq!(parse_lat_lon("1,"), None);
        assert_eq!(parse_lat_lon("NaN,1"), None);
    }

    #[test]
    fn coordinate_validation() {
        assert!(is_valid_coordinate(90.0, 180.0));
        assert!(is_valid_coordinate(-90.0, -180.0));
        assert!(!is_valid_coordinate(90.1, 0.0));
        assert!(!is_valid_coordinate(0.0, -180.5));
        assert!(!is_valid_coordinate(f64::NAN, 0.0));
    }

    #[test]
    fn coordinate_key_uses_two_decimals() {
        assert_eq!(coordinate_key(&GeoPoint::new(12.3456, -1.0)), "12.35,-1.00");
    }
}
