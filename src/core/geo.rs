use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Mean Earth radius used for great-circle distances, in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check that both components are finite and inside the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Great-circle distance between two coordinates (haversine formula)
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Linear interpolation between two coordinates.
///
/// `t` is expected in [0, 1]; callers clamp it.
pub fn lerp(a: Coordinate, b: Coordinate, t: f64) -> Coordinate {
    Coordinate {
        latitude: a.latitude + (b.latitude - a.latitude) * t,
        longitude: a.longitude + (b.longitude - a.longitude) * t,
    }
}

/// Linear interpolation between two instants, at millisecond resolution.
///
/// Returns `None` unless both instants are present and `t2 > t1`.
pub fn lerp_instant(
    t1: Option<DateTime<Utc>>,
    t2: Option<DateTime<Utc>>,
    t: f64,
) -> Option<DateTime<Utc>> {
    let (t1, t2) = (t1?, t2?);
    if t2 <= t1 {
        return None;
    }
    if t >= 1.0 {
        return Some(t2);
    }
    let span_ms = (t2 - t1).num_milliseconds() as f64;
    let offset_ms = (span_ms * t.max(0.0)).round() as i64;
    Some(t1 + Duration::milliseconds(offset_ms))
}
