pub mod csv;
pub mod json;

pub use self::csv::parse_csv;
pub use self::json::parse_json;

use std::path::Path;

use tracing::info;

use crate::core::{LoadError, Route, SegmentTiming, Waypoint};

/// Input format detection result
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputFormat {
    Json,
    Csv,
    Unknown,
}

/// Detect the format of route data from its leading content
pub fn detect_format(data: &[u8]) -> InputFormat {
    let sample = match std::str::from_utf8(&data[..data.len().min(500)]) {
        Ok(text) => text,
        // A multi-byte character may straddle the cut
        Err(e) => match std::str::from_utf8(&data[..e.valid_up_to()]) {
            Ok(text) => text,
            Err(_) => return InputFormat::Unknown,
        },
    };

    let trimmed = sample.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return InputFormat::Json;
    }

    if is_csv(trimmed) {
        return InputFormat::Csv;
    }

    InputFormat::Unknown
}

fn is_csv(text: &str) -> bool {
    // A header line with at least latitude and longitude columns
    text.lines()
        .next()
        .map(|line| line.contains(',') && line.split(',').count() >= 2)
        .unwrap_or(false)
}

fn format_from_extension(path: &Path) -> InputFormat {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => InputFormat::Json,
        Some("csv") => InputFormat::Csv,
        _ => InputFormat::Unknown,
    }
}

/// Load waypoints from a file, auto-detecting format
pub fn load_waypoints<P: AsRef<Path>>(path: P) -> Result<Vec<Waypoint>, LoadError> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;

    let format = match detect_format(&data) {
        InputFormat::Unknown => format_from_extension(path),
        detected => detected,
    };

    match format {
        InputFormat::Json => parse_json(&data),
        InputFormat::Csv => parse_csv(data.as_slice()),
        InputFormat::Unknown => Err(LoadError::UnknownFormat),
    }
}

/// Load and validate a route. Any failure leaves nothing initialized.
pub fn load_route<P: AsRef<Path>>(path: P, timing: SegmentTiming) -> Result<Route, LoadError> {
    let path = path.as_ref();
    let waypoints = load_waypoints(path)?;
    info!("Loaded {} waypoints from {}", waypoints.len(), path.display());
    Route::with_timing(waypoints, timing)
}
