use serde::Deserialize;

use crate::core::{LoadError, Waypoint};

/// One record of a JSON route document
#[derive(Debug, Deserialize)]
struct RawWaypoint {
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    longitude: f64,
    #[serde(default, alias = "time")]
    timestamp: Option<String>,
}

/// Parse waypoints from JSON bytes
///
/// Expected document: an array of `{ "latitude", "longitude", "timestamp"? }`
/// objects, in playback order. `null` and `[]` are both an empty route.
pub fn parse_json(data: &[u8]) -> Result<Vec<Waypoint>, LoadError> {
    let raw: Option<Vec<RawWaypoint>> = serde_json::from_slice(data)?;
    let raw = raw.unwrap_or_default();

    if raw.is_empty() {
        return Err(LoadError::Empty);
    }

    Ok(raw
        .into_iter()
        .map(|r| Waypoint::from_raw(r.latitude, r.longitude, r.timestamp.as_deref()))
        .collect())
}
