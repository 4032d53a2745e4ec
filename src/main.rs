use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use route_replay::playback::readout::{format_coordinate, format_instant, format_speed, UNKNOWN};
use route_replay::{load_route, spawn_player, PlayerCommand, PlayerSettings, SinkEvent};

/// Replay a recorded GPS route as a live position readout
#[derive(Parser, Debug)]
#[command(name = "route-replay", version, about)]
struct Args {
    /// Route file (JSON array of {latitude, longitude, timestamp} or CSV)
    route: PathBuf,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start playing immediately
    #[arg(long)]
    autoplay: bool,

    /// Animation frames per second (overrides the settings file)
    #[arg(long)]
    fps: Option<u32>,
}

/// Latest values of every readout, printed as one status line
struct Readout {
    position: String,
    instant: String,
    speed: String,
    elapsed: String,
    playing: bool,
}

impl Readout {
    fn new() -> Self {
        Self {
            position: String::new(),
            instant: UNKNOWN.to_string(),
            speed: UNKNOWN.to_string(),
            elapsed: "00:00".to_string(),
            playing: false,
        }
    }

    /// Apply an update; true when the status line should be reprinted
    fn apply(&mut self, event: SinkEvent) -> bool {
        match event {
            SinkEvent::PositionChanged(p) => self.position = format_coordinate(p),
            SinkEvent::InstantChanged(ts) => self.instant = format_instant(ts),
            SinkEvent::SpeedChanged(s) => self.speed = format_speed(s),
            SinkEvent::ElapsedChanged(e) => {
                let changed = e != self.elapsed;
                self.elapsed = e;
                return changed;
            }
            SinkEvent::PlaybackStateChanged(playing) => {
                self.playing = playing;
                return true;
            }
            SinkEvent::TrailExtended(_) | SinkEvent::TrailReset(_) => {}
        }
        false
    }

    fn line(&self) -> String {
        format!(
            "[{}] {} | {} | {} m/s | {}",
            if self.playing { "Pause" } else { "Play" },
            self.position,
            self.instant,
            self.speed,
            self.elapsed
        )
    }
}

fn parse_command(line: &str) -> Option<PlayerCommand> {
    match line.trim().to_lowercase().as_str() {
        "" | "p" | "space" => Some(PlayerCommand::Toggle),
        "play" => Some(PlayerCommand::Play),
        "pause" => Some(PlayerCommand::Pause),
        "r" | "reset" => Some(PlayerCommand::Reset),
        "q" | "quit" | "exit" => Some(PlayerCommand::Shutdown),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the readout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => PlayerSettings::load_from(path),
        None => PlayerSettings::load(),
    };
    if let Some(fps) = args.fps.filter(|&fps| fps > 0) {
        settings.frame_interval_ms = (1000 / fps as u64).max(1);
    }
    settings.autoplay |= args.autoplay;

    let route = load_route(&args.route, settings.segment_timing())
        .with_context(|| format!("Failed to load route: {}", args.route.display()))?;

    println!(
        "Loaded {} waypoints, {:.0} m over {:.1} s",
        route.len(),
        route.total_distance_meters(),
        route.total_duration().as_secs_f64()
    );
    println!("Commands: <enter>/p toggle, play, pause, r reset, q quit");

    let mut player = spawn_player(route, settings.frame_interval());
    let control = player.control();
    if settings.autoplay {
        control.play().await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut readout = Readout::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    Some(PlayerCommand::Shutdown) => break,
                    Some(command) => control.send(command).await?,
                    None => println!("Unknown command: {}", line.trim()),
                }
            }
            event = player.next_event() => {
                let Some(event) = event else {
                    break;
                };
                if readout.apply(event) {
                    println!("{}", readout.line());
                }
            }
        }
    }

    info!("Shutting down");
    player.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use route_replay::Coordinate;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command(""), Some(PlayerCommand::Toggle));
        assert_eq!(parse_command(" Pause "), Some(PlayerCommand::Pause));
        assert_eq!(parse_command("r"), Some(PlayerCommand::Reset));
        assert_eq!(parse_command("q"), Some(PlayerCommand::Shutdown));
        assert_eq!(parse_command("rewind"), None);
    }

    #[test]
    fn test_readout_reprints_on_second_change() {
        let mut readout = Readout::new();
        assert!(!readout.apply(SinkEvent::PositionChanged(Coordinate::new(1.0, 2.0))));
        assert!(!readout.apply(SinkEvent::ElapsedChanged("00:00".to_string())));
        assert!(readout.apply(SinkEvent::ElapsedChanged("00:01".to_string())));
        assert!(readout.apply(SinkEvent::PlaybackStateChanged(true)));
        assert_eq!(
            readout.line(),
            "[Pause] 1.000000, 2.000000 | — | — m/s | 00:01"
        );
    }
}
