pub mod clock;
pub mod controller;
pub mod driver;
pub mod readout;
pub mod segment;
pub mod sink;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use controller::{PlaybackController, PlaybackSnapshot};
pub use driver::{spawn_player, PlayerCommand, PlayerControl, PlayerHandle, PlayerStopped};
pub use segment::{RunToken, SegmentPlayer, SegmentSample, SegmentTick};
pub use sink::{ChannelSink, PresentationSink, RecordingSink, SinkEvent};

use serde::{Deserialize, Serialize};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// At the first waypoint with nothing elapsed
    Idle,
    /// A segment run is active
    Playing,
    /// Stopped mid-route, elapsed time frozen
    Paused,
    /// At the terminal waypoint
    Finished,
}
