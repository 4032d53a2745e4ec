//! Animated playback of recorded GPS routes.
//!
//! A [`Route`] is built once from loaded waypoints. A [`PlaybackController`]
//! turns it into a continuous, pausable animation, pushing position, speed,
//! timestamp and elapsed-time readouts to a [`PresentationSink`].

pub mod config;
pub mod core;
pub mod input;
pub mod playback;

pub use crate::config::PlayerSettings;
pub use crate::core::{Coordinate, LoadError, Route, SegmentTiming, Waypoint};
pub use crate::input::load_route;
pub use crate::playback::{
    spawn_player, PlaybackController, PlaybackState, PlayerCommand, PlayerHandle, PresentationSink,
    SinkEvent,
};
