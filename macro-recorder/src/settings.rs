use crate::hotkeys::{Hotkey, HotkeyAction, Hotkeys};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for the macro recorder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Global hotkeys, persisted as `record_key` / `play_key` / `stop_key`
    #[serde(flatten)]
    pub hotkeys: Hotkeys,

    /// Where downsampled screen snapshots are written
    pub cache_dir: PathBuf,

    /// Tick period while recording or playing (milliseconds)
    pub tick_interval_ms: u64,

    /// Take a screen snapshot on every Nth recording tick
    pub snapshot_every_ticks: u32,

    /// Plain moves closer than this (squared pixels) to the previous sample are dropped
    pub min_move_distance_sq: i64,

    /// Release synthesized keys and buttons still held when playback is stopped
    pub release_held_on_stop: bool,

    /// Drop old screen states when a new recording starts
    pub clear_snapshots_on_record: bool,

    /// Whether to grab the screen at all while recording
    pub record_snapshots: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hotkeys: Hotkeys::default(),
            cache_dir: PathBuf::from("./cache"),
            tick_interval_ms: 8,
            snapshot_every_ticks: 5,
            min_move_distance_sq: 2,
            release_held_on_stop: true,
            clear_snapshots_on_record: false,
            record_snapshots: true,
        }
    }
}

impl Settings {
    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&json)?;
        info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        info!(path = %path.as_ref().display(), "Saved settings");
        Ok(())
    }

    /// Rebind one action
    pub fn change_hotkey(&mut self, action: HotkeyAction, hotkey: Hotkey) {
        info!(
            action = action.setting_key(),
            hotkey = %hotkey.name(),
            "Hotkey changed"
        );
        self.hotkeys.set(action, hotkey);
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn snapshot_every_ticks(&self) -> u64 {
        u64::from(self.snapshot_every_ticks.max(1))
    }
}
