use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::geo::Coordinate;

/// One recorded sample along a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,

    /// Time of the fix, if the recorder captured one
    pub timestamp: Option<DateTime<Utc>>,
}

impl Waypoint {
    pub fn new(latitude: f64, longitude: f64, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Build a waypoint from raw loader fields.
    ///
    /// A timestamp that does not parse is dropped with a warning and the
    /// waypoint is kept as untimed.
    pub fn from_raw(latitude: f64, longitude: f64, timestamp: Option<&str>) -> Self {
        let timestamp = timestamp
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| {
                let parsed = parse_timestamp(s);
                if parsed.is_none() {
                    warn!("Ignoring unparseable timestamp {:?}", s);
                }
                parsed
            });

        Self::new(latitude, longitude, timestamp)
    }
}

/// Parse an ISO-8601 instant.
///
/// Accepts RFC 3339 (`2024-01-01T10:00:00Z`, `...+02:00`) and zone-less
/// `2024-01-01T10:00:00[.fff]`, which is read as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
