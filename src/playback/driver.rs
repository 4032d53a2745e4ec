use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::core::Route;
use crate::playback::clock::MonotonicClock;
use crate::playback::controller::{PlaybackController, PlaybackSnapshot};
use crate::playback::sink::{ChannelSink, SinkEvent};

/// Control surface commands accepted by the player task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    Play,
    Pause,
    Toggle,
    Reset,
    Shutdown,
}

#[derive(Debug, Error)]
#[error("Player task has stopped")]
pub struct PlayerStopped;

/// Cloneable sender side of a running player
#[derive(Debug, Clone)]
pub struct PlayerControl {
    commands: mpsc::Sender<PlayerCommand>,
    snapshot: watch::Receiver<PlaybackSnapshot>,
}

impl PlayerControl {
    pub async fn send(&self, command: PlayerCommand) -> Result<(), PlayerStopped> {
        self.commands.send(command).await.map_err(|_| PlayerStopped)
    }

    pub async fn play(&self) -> Result<(), PlayerStopped> {
        self.send(PlayerCommand::Play).await
    }

    pub async fn pause(&self) -> Result<(), PlayerStopped> {
        self.send(PlayerCommand::Pause).await
    }

    pub async fn toggle(&self) -> Result<(), PlayerStopped> {
        self.send(PlayerCommand::Toggle).await
    }

    pub async fn reset(&self) -> Result<(), PlayerStopped> {
        self.send(PlayerCommand::Reset).await
    }

    pub async fn shutdown(&self) -> Result<(), PlayerStopped> {
        self.send(PlayerCommand::Shutdown).await
    }

    /// Latest state published by the player task
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.borrow().clone()
    }
}

/// Handle to a player task spawned with [`spawn_player`]
pub struct PlayerHandle {
    control: PlayerControl,
    events: mpsc::UnboundedReceiver<SinkEvent>,
    task: JoinHandle<()>,
}

impl PlayerHandle {
    pub fn control(&self) -> PlayerControl {
        self.control.clone()
    }

    /// Next presentation update, `None` once the task has stopped and drained
    pub async fn next_event(&mut self) -> Option<SinkEvent> {
        self.events.recv().await
    }

    /// Ask the task to stop and wait for it
    pub async fn shutdown(self) {
        let _ = self.control.shutdown().await;
        let _ = self.task.await;
    }
}

/// Run a playback controller for `route` on its own task.
///
/// The task owns the controller outright. It advances the active segment
/// once per `frame_interval` and applies commands between frames, so ticks
/// and transitions never interleave.
pub fn spawn_player(route: Route, frame_interval: Duration) -> PlayerHandle {
    let (sink, events) = ChannelSink::channel();
    let controller = PlaybackController::new(route, sink);

    let (command_tx, command_rx) = mpsc::channel(32);
    let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

    let task = tokio::spawn(run_player(controller, command_rx, snapshot_tx, frame_interval));

    PlayerHandle {
        control: PlayerControl {
            commands: command_tx,
            snapshot: snapshot_rx,
        },
        events,
        task,
    }
}

async fn run_player(
    mut controller: PlaybackController<ChannelSink, MonotonicClock>,
    mut commands: mpsc::Receiver<PlayerCommand>,
    snapshot: watch::Sender<PlaybackSnapshot>,
    frame_interval: Duration,
) {
    let mut frames = tokio::time::interval(frame_interval.max(Duration::from_millis(1)));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Player task started ({}ms frames)", frame_interval.as_millis());

    loop {
        tokio::select! {
            command = commands.recv() => {
                debug!("Player command: {:?}", command);
                match command {
                    Some(PlayerCommand::Play) => controller.play(),
                    Some(PlayerCommand::Pause) => controller.pause(),
                    Some(PlayerCommand::Toggle) => controller.toggle(),
                    Some(PlayerCommand::Reset) => controller.reset(),
                    Some(PlayerCommand::Shutdown) | None => break,
                }
            }
            _ = frames.tick() => controller.on_frame(),
        }

        let _ = snapshot.send(controller.snapshot());
    }

    info!("Player task stopped");
}
