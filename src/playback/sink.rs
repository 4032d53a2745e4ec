use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::core::Coordinate;

/// Receiver of presentation updates.
///
/// Called synchronously from the controller's tick and transition handling.
/// Implementations must return promptly; the controller never waits on them.
pub trait PresentationSink {
    fn on_position_changed(&mut self, position: Coordinate);

    /// `None` when the current segment has no usable timestamps
    fn on_instant_changed(&mut self, instant: Option<DateTime<Utc>>);

    /// Meters per second, `None` when not moving
    fn on_speed_changed(&mut self, speed: Option<f64>);

    /// Elapsed playback time formatted as `MM:SS`
    fn on_elapsed_changed(&mut self, elapsed: &str);

    fn on_playback_state_changed(&mut self, is_playing: bool);

    /// A point was appended to the traversed trail
    fn on_trail_extended(&mut self, _position: Coordinate) {}

    /// The traversed trail was collapsed back to `start`
    fn on_trail_reset(&mut self, _start: Coordinate) {}
}

/// A presentation update as a value
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    PositionChanged(Coordinate),
    InstantChanged(Option<DateTime<Utc>>),
    SpeedChanged(Option<f64>),
    ElapsedChanged(String),
    PlaybackStateChanged(bool),
    TrailExtended(Coordinate),
    TrailReset(Coordinate),
}

/// Sink that records every update, for tests and harnesses
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    /// Take all recorded events, leaving the sink empty
    pub fn take_events(&mut self) -> Vec<SinkEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn last_position(&self) -> Option<Coordinate> {
        self.events.iter().rev().find_map(|e| match e {
            SinkEvent::PositionChanged(p) => Some(*p),
            _ => None,
        })
    }

    pub fn last_elapsed(&self) -> Option<&str> {
        self.events.iter().rev().find_map(|e| match e {
            SinkEvent::ElapsedChanged(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn last_speed(&self) -> Option<Option<f64>> {
        self.events.iter().rev().find_map(|e| match e {
            SinkEvent::SpeedChanged(s) => Some(*s),
            _ => None,
        })
    }

    /// Every `PlaybackStateChanged` value, in order
    pub fn playback_states(&self) -> Vec<bool> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::PlaybackStateChanged(playing) => Some(*playing),
                _ => None,
            })
            .collect()
    }
}

impl PresentationSink for RecordingSink {
    fn on_position_changed(&mut self, position: Coordinate) {
        self.events.push(SinkEvent::PositionChanged(position));
    }

    fn on_instant_changed(&mut self, instant: Option<DateTime<Utc>>) {
        self.events.push(SinkEvent::InstantChanged(instant));
    }

    fn on_speed_changed(&mut self, speed: Option<f64>) {
        self.events.push(SinkEvent::SpeedChanged(speed));
    }

    fn on_elapsed_changed(&mut self, elapsed: &str) {
        self.events.push(SinkEvent::ElapsedChanged(elapsed.to_string()));
    }

    fn on_playback_state_changed(&mut self, is_playing: bool) {
        self.events.push(SinkEvent::PlaybackStateChanged(is_playing));
    }

    fn on_trail_extended(&mut self, position: Coordinate) {
        self.events.push(SinkEvent::TrailExtended(position));
    }

    fn on_trail_reset(&mut self, start: Coordinate) {
        self.events.push(SinkEvent::TrailReset(start));
    }
}

/// Sink that forwards updates over an unbounded channel.
///
/// Sending never blocks. Updates are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<SinkEvent>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::UnboundedSender<SinkEvent>) -> Self {
        Self { sender }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, event: SinkEvent) {
        let _ = self.sender.send(event);
    }
}

impl PresentationSink for ChannelSink {
    fn on_position_changed(&mut self, position: Coordinate) {
        self.send(SinkEvent::PositionChanged(position));
    }

    fn on_instant_changed(&mut self, instant: Option<DateTime<Utc>>) {
        self.send(SinkEvent::InstantChanged(instant));
    }

    fn on_speed_changed(&mut self, speed: Option<f64>) {
        self.send(SinkEvent::SpeedChanged(speed));
    }

    fn on_elapsed_changed(&mut self, elapsed: &str) {
        self.send(SinkEvent::ElapsedChanged(elapsed.to_string()));
    }

    fn on_playback_state_changed(&mut self, is_playing: bool) {
        self.send(SinkEvent::PlaybackStateChanged(is_playing));
    }

    fn on_trail_extended(&mut self, position: Coordinate) {
        self.send(SinkEvent::TrailExtended(position));
    }

    fn on_trail_reset(&mut self, start: Coordinate) {
        self.send(SinkEvent::TrailReset(start));
    }
}
