use std::time::Duration;

use tracing::{debug, info};

use crate::core::{Coordinate, Route};
use crate::playback::clock::{Clock, MonotonicClock};
use crate::playback::readout::format_elapsed;
use crate::playback::segment::{RunToken, SegmentPlayer, SegmentSample, SegmentTick};
use crate::playback::sink::PresentationSink;
use crate::playback::PlaybackState;

/// Read-only view of the controller at one moment
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub segment_index: usize,
    pub elapsed: Duration,
    pub position: Coordinate,
}

/// Playback state machine for one route.
///
/// Owns the segment index, accumulated elapsed time and the single active
/// segment run. The host calls [`on_frame`](Self::on_frame) once per frame;
/// everything else happens through `play`, `pause` and `reset`.
pub struct PlaybackController<S, C = MonotonicClock> {
    route: Route,
    sink: S,
    clock: C,
    player: SegmentPlayer,
    state: PlaybackState,
    index: usize,
    active_run: Option<RunToken>,
    /// Elapsed time folded in from finished runs
    accumulated: Duration,
    /// Clock reading when the current run of playing began
    run_started_at: Option<Duration>,
    position: Coordinate,
    trail: Vec<Coordinate>,
}

impl<S: PresentationSink> PlaybackController<S, MonotonicClock> {
    pub fn new(route: Route, sink: S) -> Self {
        Self::with_clock(route, sink, MonotonicClock::new())
    }
}

impl<S: PresentationSink, C: Clock> PlaybackController<S, C> {
    /// Create an idle controller and push the initial readout to the sink
    pub fn with_clock(route: Route, sink: S, clock: C) -> Self {
        let start = route.first().coordinate();
        let mut controller = Self {
            route,
            sink,
            clock,
            player: SegmentPlayer::new(),
            state: PlaybackState::Idle,
            index: 0,
            active_run: None,
            accumulated: Duration::ZERO,
            run_started_at: None,
            position: start,
            trail: vec![start],
        };
        controller.emit_idle();
        controller
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Index of the waypoint the current (or next) segment starts from
    pub fn segment_index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> Coordinate {
        self.position
    }

    /// Points traversed since the last rewind, starting at the first waypoint
    pub fn trail(&self) -> &[Coordinate] {
        &self.trail
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Total time spent playing since the last reset (or rewind)
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(self.clock.now())
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state,
            segment_index: self.index,
            elapsed: self.elapsed(),
            position: self.position,
        }
    }

    /// Start or resume playback. No-op while already playing.
    ///
    /// From the terminal waypoint this rewinds to the start with elapsed time
    /// cleared. A single-waypoint route goes straight to `Finished`.
    pub fn play(&mut self) {
        if self.state == PlaybackState::Playing {
            return;
        }

        let now = self.clock.now();

        if self.route.is_terminal(self.index) {
            self.rewind();
        }

        if self.route.segment_count() == 0 {
            debug!("Route has a single waypoint, nothing to animate");
            self.finish(now);
            return;
        }

        debug!("{:?} -> Playing at segment {}", self.state, self.index);
        self.state = PlaybackState::Playing;
        self.run_started_at = Some(now);
        self.sink.on_playback_state_changed(true);
        self.start_segment(now);
    }

    /// Pause playback, freezing position and elapsed time. No-op unless playing.
    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }

        let now = self.clock.now();
        self.cancel_run();
        self.fold_elapsed(now);
        self.state = PlaybackState::Paused;
        debug!("Playing -> Paused at segment {}, elapsed {:?}", self.index, self.accumulated);

        self.sink.on_elapsed_changed(&format_elapsed(self.accumulated));
        self.sink.on_playback_state_changed(false);
    }

    /// Pause when playing, play otherwise
    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Return to the idle start: first waypoint, zero elapsed. Always legal.
    pub fn reset(&mut self) {
        self.cancel_run();
        debug!("{:?} -> Idle", self.state);

        self.state = PlaybackState::Idle;
        self.index = 0;
        self.accumulated = Duration::ZERO;
        self.run_started_at = None;
        self.position = self.route.first().coordinate();
        self.trail = vec![self.position];
        self.emit_idle();
    }

    /// Advance the active run to the current time. Call once per host frame.
    pub fn on_frame(&mut self) {
        let Some(token) = self.active_run else {
            return;
        };

        let now = self.clock.now();
        match self.player.tick(token, now) {
            Some(SegmentTick::Sample(sample)) => self.apply_sample(&sample, now),
            Some(SegmentTick::Complete(sample)) => {
                self.apply_sample(&sample, now);
                self.active_run = None;
                self.advance(now);
            }
            None => self.active_run = None,
        }
    }

    fn start_segment(&mut self, now: Duration) {
        let Some(segment) = self.route.segment(self.index) else {
            self.finish(now);
            return;
        };

        let duration = self.route.segment_duration(self.index);
        debug!("Starting segment {} over {}ms", self.index, duration.as_millis());
        self.active_run = Some(self.player.start(segment, duration, now));
    }

    /// Natural completion of the current segment
    fn advance(&mut self, now: Duration) {
        self.index += 1;

        if self.route.is_terminal(self.index) {
            self.finish(now);
        } else {
            self.start_segment(now);
        }
    }

    fn finish(&mut self, now: Duration) {
        self.cancel_run();
        self.fold_elapsed(now);
        self.state = PlaybackState::Finished;
        self.index = self.route.len() - 1;

        let last = self.route.last();
        self.position = last.coordinate();
        info!("Playback finished after {:?}", self.accumulated);

        self.sink.on_position_changed(self.position);
        self.sink.on_instant_changed(last.timestamp);
        self.sink.on_speed_changed(None);
        self.sink.on_elapsed_changed(&format_elapsed(self.accumulated));
        self.sink.on_playback_state_changed(false);
    }

    /// Back to the first waypoint with elapsed time and trail cleared
    fn rewind(&mut self) {
        debug!("Rewinding to the start of the route");
        self.index = 0;
        self.accumulated = Duration::ZERO;
        self.position = self.route.first().coordinate();
        self.trail = vec![self.position];

        self.sink.on_trail_reset(self.position);
        self.sink.on_position_changed(self.position);
        self.sink.on_instant_changed(self.route.first().timestamp);
        self.sink.on_elapsed_changed(&format_elapsed(Duration::ZERO));
    }

    fn apply_sample(&mut self, sample: &SegmentSample, now: Duration) {
        self.position = sample.position;
        self.trail.push(sample.position);

        self.sink.on_position_changed(sample.position);
        self.sink.on_trail_extended(sample.position);
        self.sink.on_instant_changed(sample.instant);
        self.sink.on_speed_changed(Some(sample.speed));
        self.sink.on_elapsed_changed(&format_elapsed(self.elapsed_at(now)));
    }

    fn cancel_run(&mut self) {
        self.player.cancel();
        self.active_run = None;
    }

    fn fold_elapsed(&mut self, now: Duration) {
        if let Some(started) = self.run_started_at.take() {
            self.accumulated += now.saturating_sub(started);
        }
    }

    fn elapsed_at(&self, now: Duration) -> Duration {
        match self.run_started_at {
            Some(started) => self.accumulated + now.saturating_sub(started),
            None => self.accumulated,
        }
    }

    fn emit_idle(&mut self) {
        let first = self.route.first();
        self.sink.on_trail_reset(self.position);
        self.sink.on_position_changed(self.position);
        self.sink.on_instant_changed(first.timestamp);
        self.sink.on_speed_changed(None);
        self.sink.on_elapsed_changed(&format_elapsed(Duration::ZERO));
        self.sink.on_playback_state_changed(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Waypoint;
    use crate::playback::clock::ManualClock;
    use crate::playback::sink::{RecordingSink, SinkEvent};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(secs))
    }

    fn abc_route() -> Route {
        Route::new(vec![
            Waypoint::new(0.0, 0.0, at(0)),
            Waypoint::new(0.0, 0.001, at(2)),
            Waypoint::new(0.0, 0.002, at(4)),
        ])
        .unwrap()
    }

    fn controller(route: Route) -> (PlaybackController<RecordingSink, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let mut controller = PlaybackController::with_clock(route, RecordingSink::new(), clock.clone());
        controller.sink_mut().take_events();
        (controller, clock)
    }

    #[test]
    fn test_initial_readout() {
        let clock = ManualClock::new();
        let controller = PlaybackController::with_clock(abc_route(), RecordingSink::new(), clock);

        let sink = controller.sink();
        assert_eq!(sink.last_position(), Some(Coordinate::new(0.0, 0.0)));
        assert_eq!(sink.last_elapsed(), Some("00:00"));
        assert_eq!(sink.last_speed(), Some(None));
        assert_eq!(sink.playback_states(), vec![false]);
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_end_to_end_three_waypoints() {
        let (mut c, clock) = controller(abc_route());

        c.play();
        assert_eq!(c.state(), PlaybackState::Playing);

        clock.advance_ms(1000);
        c.on_frame();
        let mid = c.position();
        assert!((mid.longitude - 0.0005).abs() < 1e-12);

        clock.advance_ms(1000);
        c.on_frame();
        assert_eq!(c.sink().last_position(), Some(Coordinate::new(0.0, 0.001)));
        assert_eq!(c.sink().last_elapsed(), Some("00:02"));
        // The next segment is already running
        assert_eq!(c.state(), PlaybackState::Playing);
        assert_eq!(c.segment_index(), 1);

        clock.advance_ms(1000);
        c.on_frame();
        assert!(c.position().longitude > 0.001);

        clock.advance_ms(1000);
        c.on_frame();
        assert_eq!(c.state(), PlaybackState::Finished);
        assert_eq!(c.position(), Coordinate::new(0.0, 0.002));
        assert_eq!(c.sink().last_position(), Some(Coordinate::new(0.0, 0.002)));
        assert_eq!(c.sink().last_elapsed(), Some("00:04"));
        assert_eq!(c.sink().last_speed(), Some(None));
        assert_eq!(c.sink().playback_states(), vec![true, false]);
        assert_eq!(c.segment_index(), 2);

        // Further frames do nothing once finished
        let before = c.sink().events().len();
        clock.advance_ms(1000);
        c.on_frame();
        assert_eq!(c.sink().events().len(), before);
    }

    #[test]
    fn test_samples_carry_speed_and_instant() {
        let (mut c, clock) = controller(abc_route());
        c.play();
        clock.advance_ms(500);
        c.on_frame();

        let expected_speed = c.route().segment_speed(0).unwrap();
        assert_eq!(c.sink().last_speed(), Some(Some(expected_speed)));
        assert!(c.sink().events().contains(&SinkEvent::InstantChanged(
            at(0).map(|t| t + chrono::Duration::milliseconds(500))
        )));
    }

    #[test]
    fn test_pause_and_resume_keep_elapsed_monotonic() {
        let (mut c, clock) = controller(abc_route());

        c.play();
        clock.advance_ms(700);
        c.on_frame();
        c.pause();
        assert_eq!(c.state(), PlaybackState::Paused);
        assert_eq!(c.elapsed(), Duration::from_millis(700));

        // Time passing while paused does not count
        clock.advance_ms(5000);
        c.on_frame();
        assert_eq!(c.elapsed(), Duration::from_millis(700));

        c.play();
        clock.advance_ms(1500);
        c.on_frame();
        assert_eq!(c.elapsed(), Duration::from_millis(2200));
        assert_eq!(c.sink().last_elapsed(), Some("00:02"));
        assert_eq!(c.segment_index(), 0);
    }

    #[test]
    fn test_pause_cancels_pending_run() {
        let (mut c, clock) = controller(abc_route());
        c.play();
        clock.advance_ms(500);
        c.pause();
        c.sink_mut().take_events();

        clock.advance_ms(10_000);
        c.on_frame();
        c.on_frame();
        assert!(c.sink().events().is_empty());
        assert_eq!(c.segment_index(), 0);
    }

    #[test]
    fn test_idempotent_no_ops() {
        let (mut c, clock) = controller(abc_route());

        // Pause while idle
        c.pause();
        assert!(c.sink().events().is_empty());
        assert_eq!(c.state(), PlaybackState::Idle);

        // Play while playing
        c.play();
        c.sink_mut().take_events();
        c.play();
        assert!(c.sink().events().is_empty());

        // Pause while paused
        c.pause();
        c.sink_mut().take_events();
        c.pause();
        assert!(c.sink().events().is_empty());

        // Pause while finished
        c.play();
        clock.advance_ms(10_000);
        c.on_frame();
        clock.advance_ms(10_000);
        c.on_frame();
        assert_eq!(c.state(), PlaybackState::Finished);
        c.sink_mut().take_events();
        c.pause();
        assert!(c.sink().events().is_empty());
        assert_eq!(c.state(), PlaybackState::Finished);
    }

    #[test]
    fn test_replay_from_finished_rewinds() {
        let (mut c, clock) = controller(abc_route());
        c.play();
        for _ in 0..2 {
            clock.advance_ms(2000);
            c.on_frame();
        }
        assert_eq!(c.state(), PlaybackState::Finished);
        assert_eq!(c.elapsed(), Duration::from_secs(4));
        c.sink_mut().take_events();

        c.play();
        assert_eq!(c.state(), PlaybackState::Playing);
        assert_eq!(c.segment_index(), 0);
        assert_eq!(c.elapsed(), Duration::ZERO);
        assert_eq!(c.trail(), &[Coordinate::new(0.0, 0.0)]);

        let events = c.sink().events();
        assert!(events.contains(&SinkEvent::TrailReset(Coordinate::new(0.0, 0.0))));
        assert!(events.contains(&SinkEvent::ElapsedChanged("00:00".to_string())));
        assert_eq!(c.sink().playback_states(), vec![true]);

        clock.advance_ms(1000);
        c.on_frame();
        assert_eq!(c.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let (mut c, clock) = controller(abc_route());
        c.play();
        clock.advance_ms(3000);
        c.on_frame();
        c.on_frame();
        assert_eq!(c.segment_index(), 1);

        c.reset();
        assert_eq!(c.state(), PlaybackState::Idle);
        assert_eq!(c.segment_index(), 0);
        assert_eq!(c.elapsed(), Duration::ZERO);
        assert_eq!(c.position(), Coordinate::new(0.0, 0.0));
        assert_eq!(c.sink().last_elapsed(), Some("00:00"));
        assert_eq!(c.sink().last_speed(), Some(None));

        // The cancelled run never fires again
        c.sink_mut().take_events();
        clock.advance_ms(5000);
        c.on_frame();
        assert!(c.sink().events().is_empty());
    }

    #[test]
    fn test_segment_index_is_monotonic_and_bounded() {
        let route = Route::new(
            (0..6)
                .map(|i| Waypoint::new(0.0, i as f64 * 0.001, at(i)))
                .collect(),
        )
        .unwrap();
        let (mut c, clock) = controller(route);

        c.play();
        let mut last_index = 0;
        for step in [130u64, 990, 17, 2400, 600, 1, 1000, 3000, 250, 5000, 700, 4000] {
            clock.advance_ms(step);
            c.on_frame();
            if step % 3 == 0 {
                c.pause();
                c.play();
            }
            assert!(c.segment_index() >= last_index);
            assert!(c.segment_index() <= c.route().len() - 1);
            last_index = c.segment_index();
        }
    }

    #[test]
    fn test_single_waypoint_route() {
        let route = Route::new(vec![Waypoint::new(5.0, 5.0, at(0))]).unwrap();
        let (mut c, clock) = controller(route);

        c.play();
        assert_eq!(c.state(), PlaybackState::Finished);
        assert!(!c.player.is_active());
        assert_eq!(c.sink().last_elapsed(), Some("00:00"));
        assert!(!c.sink().playback_states().contains(&true));

        clock.advance_ms(1000);
        c.on_frame();
        assert_eq!(c.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_toggle_and_snapshot() {
        let (mut c, clock) = controller(abc_route());

        c.toggle();
        assert!(c.is_playing());
        clock.advance_ms(1000);
        c.on_frame();
        c.toggle();

        let snapshot = c.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Paused);
        assert_eq!(snapshot.segment_index, 0);
        assert_eq!(snapshot.elapsed, Duration::from_secs(1));
        assert_eq!(snapshot.position, c.position());
    }

    #[test]
    fn test_untimed_segments_use_default_duration() {
        let route = Route::new(vec![
            Waypoint::new(0.0, 0.0, None),
            Waypoint::new(0.0, 0.001, None),
        ])
        .unwrap();
        let (mut c, clock) = controller(route);

        c.play();
        clock.advance_ms(1999);
        c.on_frame();
        assert_eq!(c.state(), PlaybackState::Playing);
        assert!(c.sink().events().contains(&SinkEvent::InstantChanged(None)));

        clock.advance_ms(1);
        c.on_frame();
        assert_eq!(c.state(), PlaybackState::Finished);
    }

    #[test]
    fn test_trail_follows_samples() {
        let (mut c, clock) = controller(abc_route());
        c.play();
        clock.advance_ms(1000);
        c.on_frame();
        clock.advance_ms(1000);
        c.on_frame();

        assert_eq!(c.trail().len(), 3);
        assert_eq!(c.trail()[2], Coordinate::new(0.0, 0.001));
    }
}
