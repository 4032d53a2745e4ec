use thiserror::Error;

/// Failure to load a route. Fatal to initialization: no Route is built.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read route source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed route JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed route CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not find column with names: {0:?}")]
    MissingColumn(&'static [&'static str]),

    #[error("Row {row}: {field} is not a number ({value:?})")]
    InvalidRow {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("Route is empty or invalid")]
    Empty,

    #[error("Waypoint {index} has out-of-range coordinates ({latitude}, {longitude})")]
    InvalidCoordinate {
        index: usize,
        latitude: f64,
        longitude: f64,
    },

    #[error("Unknown route format")]
    UnknownFormat,
}
