use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::core::Coordinate;

/// Placeholder shown for an unknown instant or speed
pub const UNKNOWN: &str = "—";

/// Elapsed time as `MM:SS`, truncating partial seconds
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn format_coordinate(coord: Coordinate) -> String {
    format!("{:.6}, {:.6}", coord.latitude, coord.longitude)
}

/// Speed in m/s with two decimals
pub fn format_speed(speed: Option<f64>) -> String {
    match speed {
        Some(mps) => format!("{:.2}", mps),
        None => UNKNOWN.to_string(),
    }
}

/// ISO-8601 UTC with milliseconds, e.g. `2024-01-01T00:00:02.000Z`
pub fn format_instant(instant: Option<DateTime<Utc>>) -> String {
    match instant {
        Some(ts) => ts.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => UNKNOWN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00");
        assert_eq!(format_elapsed(Duration::from_millis(1999)), "00:01");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "02:05");
        assert_eq!(format_elapsed(Duration::from_secs(6000)), "100:00");
    }

    #[test]
    fn test_format_readouts() {
        assert_eq!(format_coordinate(Coordinate::new(1.5, -0.25)), "1.500000, -0.250000");
        assert_eq!(format_speed(Some(5.559)), "5.56");
        assert_eq!(format_speed(None), UNKNOWN);

        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 2).unwrap();
        assert_eq!(format_instant(Some(ts)), "2024-01-01T00:00:02.000Z");
        assert_eq!(format_instant(None), UNKNOWN);
    }
}
