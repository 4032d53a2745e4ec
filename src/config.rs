use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::SegmentTiming;

/// Persistent player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Time between animation frames
    pub frame_interval_ms: u64,
    /// Segment duration when timestamps are missing or not increasing
    pub default_segment_ms: u64,
    /// Floor for timestamp-derived segment durations
    pub min_segment_ms: u64,
    /// Start playing as soon as the route is loaded
    pub autoplay: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            default_segment_ms: 2000,
            min_segment_ms: 500,
            autoplay: false,
        }
    }
}

impl PlayerSettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("route-replay").join("settings.json"))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`. A missing file gives defaults; a bad one is logged and ignored.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path).map(|contents| serde_json::from_str::<Self>(&contents)) {
            Ok(Ok(settings)) => settings,
            Ok(Err(e)) => {
                warn!("Ignoring malformed settings {}: {}", path.display(), e);
                Self::default()
            }
            Err(e) => {
                warn!("Could not read settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn segment_timing(&self) -> SegmentTiming {
        SegmentTiming {
            default_duration: Duration::from_millis(self.default_segment_ms),
            min_duration: Duration::from_millis(self.min_segment_ms),
        }
    }
}
