use std::io::Read;

use tracing::debug;

use crate::core::{LoadError, Waypoint};

const LATITUDE_NAMES: &[&str] = &["latitude", "lat"];
const LONGITUDE_NAMES: &[&str] = &["longitude", "lon", "lng", "long"];
const TIMESTAMP_NAMES: &[&str] = &["timestamp", "time", "ts", "datetime"];

/// Parse waypoints from CSV
///
/// Supports flexible column names:
/// - latitude,longitude,timestamp
/// - lat,lon,time
/// - lat,lng (no timestamps)
///
/// Rows are taken in order; the timestamp column is optional. A row whose
/// coordinates are not numbers fails the whole load.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Waypoint>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let lat_idx = find_column(&headers, LATITUDE_NAMES)?;
    let lon_idx = find_column(&headers, LONGITUDE_NAMES)?;
    let time_idx = find_column(&headers, TIMESTAMP_NAMES).ok();
    debug!(
        "CSV columns: latitude={}, longitude={}, timestamp={:?}",
        lat_idx, lon_idx, time_idx
    );

    let mut waypoints = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;

        let latitude = parse_number(&record, lat_idx, row + 1, "latitude")?;
        let longitude = parse_number(&record, lon_idx, row + 1, "longitude")?;

        let timestamp = time_idx.and_then(|idx| record.get(idx));
        waypoints.push(Waypoint::from_raw(latitude, longitude, timestamp));
    }

    if waypoints.is_empty() {
        return Err(LoadError::Empty);
    }

    Ok(waypoints)
}

/// Parse a coordinate field. `row` is 1-based over data rows.
fn parse_number(
    record: &csv::StringRecord,
    idx: usize,
    row: usize,
    field: &'static str,
) -> Result<f64, LoadError> {
    let value = record.get(idx).unwrap_or_default();
    value.parse::<f64>().map_err(|_| LoadError::InvalidRow {
        row,
        field,
        value: value.to_string(),
    })
}

/// Find a column by checking possible names
fn find_column(headers: &csv::StringRecord, names: &'static [&'static str]) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|header| {
            let header_lower = header.to_lowercase();
            names.iter().any(|&name| header_lower == name)
        })
        .ok_or(LoadError::MissingColumn(names))
}
