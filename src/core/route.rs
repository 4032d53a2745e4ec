use std::time::Duration;

use tracing::{debug, info};

use crate::core::error::LoadError;
use crate::core::geo::{distance_meters, Coordinate};
use crate::core::waypoint::Waypoint;

/// Rules for turning endpoint timestamps into a segment duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentTiming {
    /// Used when either timestamp is missing or they are not increasing
    pub default_duration: Duration,
    /// Floor applied to timestamp-derived durations
    pub min_duration: Duration,
}

impl Default for SegmentTiming {
    fn default() -> Self {
        Self {
            default_duration: Duration::from_millis(2000),
            min_duration: Duration::from_millis(500),
        }
    }
}

/// The traversal between two consecutive waypoints
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    pub index: usize,
    pub from: &'a Waypoint,
    pub to: &'a Waypoint,
}

impl Segment<'_> {
    pub fn distance_meters(&self) -> f64 {
        distance_meters(self.from.coordinate(), self.to.coordinate())
    }

    /// Whether both endpoints carry timestamps and time moves forward
    pub fn is_timed(&self) -> bool {
        matches!((self.from.timestamp, self.to.timestamp), (Some(t1), Some(t2)) if t2 > t1)
    }
}

/// An immutable, validated, time-ordered sequence of waypoints
#[derive(Debug, Clone)]
pub struct Route {
    waypoints: Vec<Waypoint>,
    coordinates: Vec<Coordinate>,
    timing: SegmentTiming,
}

impl Route {
    /// Build a route with the default segment timing
    pub fn new(waypoints: Vec<Waypoint>) -> Result<Self, LoadError> {
        Self::with_timing(waypoints, SegmentTiming::default())
    }

    pub fn with_timing(waypoints: Vec<Waypoint>, timing: SegmentTiming) -> Result<Self, LoadError> {
        if waypoints.is_empty() {
            return Err(LoadError::Empty);
        }

        if let Some((index, wp)) = waypoints
            .iter()
            .enumerate()
            .find(|(_, wp)| !wp.coordinate().is_valid())
        {
            return Err(LoadError::InvalidCoordinate {
                index,
                latitude: wp.latitude,
                longitude: wp.longitude,
            });
        }

        let coordinates = waypoints.iter().map(Waypoint::coordinate).collect();
        let route = Self {
            waypoints,
            coordinates,
            timing,
        };

        for segment in route.segments().filter(|s| !s.is_timed()) {
            debug!(
                "Segment {} has no usable timestamps, using default duration of {}ms",
                segment.index,
                route.timing.default_duration.as_millis()
            );
        }

        info!(
            "Route built: {} waypoints, {:.1} m, {:.1} s",
            route.len(),
            route.total_distance_meters(),
            route.total_duration().as_secs_f64()
        );

        Ok(route)
    }

    /// Number of waypoints (always at least 1)
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Coordinate-only projection, same order as the waypoints
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn waypoint(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    pub fn first(&self) -> &Waypoint {
        &self.waypoints[0]
    }

    pub fn last(&self) -> &Waypoint {
        &self.waypoints[self.waypoints.len() - 1]
    }

    pub fn timing(&self) -> SegmentTiming {
        self.timing
    }

    pub fn segment_count(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }

    /// The last waypoint index is terminal: there is no segment to traverse from it
    pub fn is_terminal(&self, index: usize) -> bool {
        index >= self.waypoints.len() - 1
    }

    pub fn segment(&self, index: usize) -> Option<Segment<'_>> {
        let from = self.waypoints.get(index)?;
        let to = self.waypoints.get(index + 1)?;
        Some(Segment { index, from, to })
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment<'_>> {
        (0..self.segment_count()).filter_map(move |i| self.segment(i))
    }

    /// Playback duration of segment `index`.
    ///
    /// Timestamp difference floored at the minimum when both timestamps exist
    /// and increase, the default duration otherwise (including out-of-range indices).
    pub fn segment_duration(&self, index: usize) -> Duration {
        let Some(segment) = self.segment(index) else {
            return self.timing.default_duration;
        };

        match (segment.from.timestamp, segment.to.timestamp) {
            (Some(t1), Some(t2)) if t2 > t1 => {
                let ms = (t2 - t1).num_milliseconds().max(0) as u64;
                Duration::from_millis(ms).max(self.timing.min_duration)
            }
            _ => self.timing.default_duration,
        }
    }

    /// Constant speed across segment `index`, in meters per second
    pub fn segment_speed(&self, index: usize) -> Option<f64> {
        let segment = self.segment(index)?;
        // Same floor the segment player applies, so both report one speed
        let secs = self.segment_duration(index).max(Duration::from_millis(1)).as_secs_f64();
        Some(segment.distance_meters() / secs)
    }

    pub fn total_distance_meters(&self) -> f64 {
        self.coordinates
            .windows(2)
            .map(|pair| distance_meters(pair[0], pair[1]))
            .sum()
    }

    pub fn total_duration(&self) -> Duration {
        (0..self.segment_count()).map(|i| self.segment_duration(i)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};

    fn at(ms: i64) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + ChronoDuration::milliseconds(ms))
    }

    fn pair(t1: Option<DateTime<Utc>>, t2: Option<DateTime<Utc>>) -> Route {
        Route::new(vec![
            Waypoint::new(0.0, 0.0, t1),
            Waypoint::new(0.0, 0.001, t2),
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_route_is_load_error() {
        assert!(matches!(Route::new(vec![]), Err(LoadError::Empty)));
    }

    #[test]
    fn test_out_of_range_coordinate_is_load_error() {
        let result = Route::new(vec![
            Waypoint::new(0.0, 0.0, None),
            Waypoint::new(91.0, 0.0, None),
        ]);
        assert!(matches!(
            result,
            Err(LoadError::InvalidCoordinate { index: 1, .. })
        ));
    }

    #[test]
    fn test_segment_duration_from_timestamps() {
        assert_eq!(pair(at(0), at(1000)).segment_duration(0), Duration::from_millis(1000));
    }

    #[test]
    fn test_segment_duration_floor() {
        assert_eq!(pair(at(0), at(100)).segment_duration(0), Duration::from_millis(500));
    }

    #[test]
    fn test_segment_duration_fallback() {
        let default = Duration::from_millis(2000);
        assert_eq!(pair(None, at(1000)).segment_duration(0), default);
        assert_eq!(pair(at(1000), None).segment_duration(0), default);
        assert_eq!(pair(at(1000), at(1000)).segment_duration(0), default);
        assert_eq!(pair(at(2000), at(1000)).segment_duration(0), default);
    }

    #[test]
    fn test_custom_timing() {
        let timing = SegmentTiming {
            default_duration: Duration::from_millis(3000),
            min_duration: Duration::from_millis(250),
        };
        let route = Route::with_timing(
            vec![
                Waypoint::new(0.0, 0.0, at(0)),
                Waypoint::new(0.0, 0.001, at(100)),
                Waypoint::new(0.0, 0.002, None),
            ],
            timing,
        )
        .unwrap();

        assert_eq!(route.segment_duration(0), Duration::from_millis(250));
        assert_eq!(route.segment_duration(1), Duration::from_millis(3000));
        assert_eq!(route.total_duration(), Duration::from_millis(3250));
    }

    #[test]
    fn test_segment_speed_finite_for_sub_millisecond_segment() {
        let timing = SegmentTiming {
            default_duration: Duration::from_millis(2000),
            min_duration: Duration::ZERO,
        };
        let t0 = at(0).unwrap();
        let route = Route::with_timing(
            vec![
                Waypoint::new(0.0, 0.0, Some(t0)),
                Waypoint::new(0.0, 0.001, Some(t0 + ChronoDuration::microseconds(500))),
            ],
            timing,
        )
        .unwrap();

        assert_eq!(route.segment_duration(0), Duration::ZERO);
        let speed = route.segment_speed(0).unwrap();
        assert!(speed.is_finite());
        let expected = route.segment(0).unwrap().distance_meters() / 0.001;
        assert!((speed - expected).abs() < 1e-6);
    }

    #[test]
    fn test_segments_and_terminal() {
        let route = Route::new(vec![
            Waypoint::new(0.0, 0.0, None),
            Waypoint::new(0.0, 0.001, None),
            Waypoint::new(0.0, 0.002, None),
        ])
        .unwrap();

        assert_eq!(route.segment_count(), 2);
        assert!(!route.is_terminal(1));
        assert!(route.is_terminal(2));
        assert!(route.segment(2).is_none());
        assert_eq!(route.coordinates().len(), 3);

        let speed = route.segment_speed(0).unwrap();
        assert!((speed - route.segment(0).unwrap().distance_meters() / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_waypoint_route() {
        let route = Route::new(vec![Waypoint::new(10.0, 10.0, None)]).unwrap();
        assert_eq!(route.segment_count(), 0);
        assert!(route.is_terminal(0));
        assert_eq!(route.segments().count(), 0);
        assert_eq!(route.total_duration(), Duration::ZERO);
        assert_eq!(route.total_distance_meters(), 0.0);
    }
}
