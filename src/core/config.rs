use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Overlay settings, persisted in settings.json.
/// The realtime credential is never stored here.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the StreamElements realtime service
    pub realtime_url: String,
    pub assets_dir: PathBuf,
    /// Scene manifest, relative to `assets_dir`
    pub scene_file: String,
    /// Typeface JSON, relative to `assets_dir`
    pub font_file: String,
    /// Alert sound, relative to `assets_dir`
    pub sound_file: String,
    pub volume: f32,
    /// Set once audio playback has been enabled by the operator
    pub audio_enabled: bool,
    pub frame_rate: u32,
    /// Longest time one alert may stay on screen, 0 waits forever
    pub alert_timeout_seconds: u64,
    pub reconnect_min_seconds: u64,
    pub reconnect_max_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            realtime_url: "https://realtime.streamelements.com".to_string(),
            assets_dir: PathBuf::from("assets"),
            scene_file: "shields.json".to_string(),
            font_file: "fonts/opensans.json".to_string(),
            sound_file: "alert.wav".to_string(),
            volume: 0.6,
            audio_enabled: false,
            frame_rate: 30,
            alert_timeout_seconds: 30,
            reconnect_min_seconds: 1,
            reconnect_max_seconds: 30,
        }
    }
}

impl Settings {
    pub fn scene_path(&self) -> PathBuf {
        self.assets_dir.join(&self.scene_file)
    }

    pub fn font_path(&self) -> PathBuf {
        self.assets_dir.join(&self.font_file)
    }

    pub fn sound_path(&self) -> PathBuf {
        self.assets_dir.join(&self.sound_file)
    }

    pub fn alert_timeout(&self) -> Option<Duration> {
        (self.alert_timeout_seconds > 0).then(|| Duration::from_secs(self.alert_timeout_seconds))
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate.max(1)))
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(app_config_dir: PathBuf) -> Self {
        Self {
            config_path: app_config_dir.join("settings.json"),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn load(&self) -> Settings {
        if self.config_path.exists() {
            match fs::read_to_string(&self.config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(settings) => return settings,
                    Err(e) => log::warn!("Ignoring invalid {:?}: {}", self.config_path, e),
                },
                Err(e) => log::warn!("Cannot read {:?}: {}", self.config_path, e),
            }
        }
        Settings::default()
    }

    pub fn save(&self, settings: &Settings) -> io::Result<()> {
        // Ensure directory exists
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_path, content)
    }
}
