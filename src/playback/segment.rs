use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{trace, warn};

use crate::core::{distance_meters, lerp, lerp_instant, Coordinate, Segment};

/// Identity of one segment run. A tick presented with a stale token is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunToken(u64);

/// One interpolated point along a segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentSample {
    /// Fraction of the segment covered, in [0, 1]
    pub progress: f64,
    pub position: Coordinate,
    /// Interpolated fix time, `None` when the segment is untimed
    pub instant: Option<DateTime<Utc>>,
    /// Constant segment speed in meters per second
    pub speed: f64,
}

/// Result of ticking an active run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentTick {
    /// Mid-segment sample; the run stays active
    Sample(SegmentSample),
    /// Final sample at progress 1 carrying the exact endpoint. The run is over.
    Complete(SegmentSample),
}

impl SegmentTick {
    pub fn sample(&self) -> &SegmentSample {
        match self {
            SegmentTick::Sample(sample) | SegmentTick::Complete(sample) => sample,
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveRun {
    token: RunToken,
    from: Coordinate,
    to: Coordinate,
    from_time: Option<DateTime<Utc>>,
    to_time: Option<DateTime<Utc>>,
    started_at: Duration,
    duration: Duration,
    speed: f64,
}

/// Animates one segment at a time over wall-clock time.
///
/// Progress is `(now - start) / duration`, so it does not depend on how many
/// ticks were delivered. `cancel` bumps the generation, which turns any token
/// handed out earlier into a stale one.
#[derive(Debug, Default)]
pub struct SegmentPlayer {
    generation: u64,
    run: Option<ActiveRun>,
}

impl SegmentPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a run over `segment`, timed from `now`.
    pub fn start(&mut self, segment: Segment<'_>, duration: Duration, now: Duration) -> RunToken {
        if self.run.is_some() {
            warn!("Segment {} started while another run was active", segment.index);
            self.cancel();
        }

        // Guard the division below against a zero-length timing configuration
        let duration = duration.max(Duration::from_millis(1));

        let from = segment.from.coordinate();
        let to = segment.to.coordinate();
        let speed = distance_meters(from, to) / duration.as_secs_f64();

        self.generation += 1;
        let token = RunToken(self.generation);
        self.run = Some(ActiveRun {
            token,
            from,
            to,
            from_time: segment.from.timestamp,
            to_time: segment.to.timestamp,
            started_at: now,
            duration,
            speed,
        });

        token
    }

    /// Stop the active run, if any. No further samples are produced for it.
    pub fn cancel(&mut self) {
        if let Some(run) = self.run.take() {
            trace!("Cancelled run {:?}", run.token);
        }
        self.generation += 1;
    }

    pub fn is_active(&self) -> bool {
        self.run.is_some()
    }

    /// Compute the sample for `now`.
    ///
    /// Returns `None` for a stale token or when no run is active.
    pub fn tick(&mut self, token: RunToken, now: Duration) -> Option<SegmentTick> {
        let run = match &self.run {
            Some(run) if run.token == token => run,
            _ => {
                trace!("Discarding stale tick for {:?}", token);
                return None;
            }
        };

        let elapsed = now.saturating_sub(run.started_at);
        let t = (elapsed.as_secs_f64() / run.duration.as_secs_f64()).clamp(0.0, 1.0);

        if t >= 1.0 {
            let sample = SegmentSample {
                progress: 1.0,
                position: run.to,
                instant: lerp_instant(run.from_time, run.to_time, 1.0),
                speed: run.speed,
            };
            self.run = None;
            return Some(SegmentTick::Complete(sample));
        }

        Some(SegmentTick::Sample(SegmentSample {
            progress: t,
            position: lerp(run.from, run.to, t),
            instant: lerp_instant(run.from_time, run.to_time, t),
            speed: run.speed,
        }))
    }
}
