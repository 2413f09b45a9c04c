//! Configuration management

use std::path::PathBuf;

use ini::Ini;
use log::{debug, info};

use crate::request::{PlaybackRequest, DEFAULT_VOLUME, SETTING_MAX, SETTING_MIN};
use crate::{Result, VoxdeckError};

/// Text preloaded into a fresh deck.
pub const DEFAULT_TEXT: &str = "Experience the most natural-sounding text-to-speech technology with our advanced AI voice synthesis.";

/// Application configuration for the playback deck
///
/// Persists the speech parameters between sessions.
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path (~/.voxdeck.cfg)
    path: PathBuf,
}

impl Config {
    /// Load configuration from disk or create default
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from an explicit path, creating it with defaults
    /// when missing.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| VoxdeckError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| VoxdeckError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        Ok(Self { ini, path })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| VoxdeckError::Config(format!("Failed to save config: {}", e)))
    }

    /// Get config file path (~/.voxdeck.cfg)
    ///
    /// This is where deck settings persist between sessions
    fn config_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".voxdeck.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Create default configuration
    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("speech"))
            .set("text", DEFAULT_TEXT)
            .set("rate", "1.0")
            .set("pitch", "1.0")
            .set("volume", "75")
            .set("voice_idx", "-1");

        ini
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get an integer value from config
    pub fn get_int(&self, section: &str, key: &str, default: i32) -> i32 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get a float value from config
    pub fn get_float(&self, section: &str, key: &str, default: f32) -> f32 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    // Deck-specific configuration getters

    /// Text preloaded into the panel
    pub fn default_text(&self) -> String {
        self.get_string("speech", "text", DEFAULT_TEXT)
    }

    /// Speech rate (0.0-2.0, 1.0 is normal)
    pub fn rate(&self) -> f32 {
        self.get_float("speech", "rate", 1.0)
            .clamp(SETTING_MIN, SETTING_MAX)
    }

    /// Speech pitch (0.0-2.0, 1.0 is normal)
    pub fn pitch(&self) -> f32 {
        self.get_float("speech", "pitch", 1.0)
            .clamp(SETTING_MIN, SETTING_MAX)
    }

    /// Speech volume (0-100)
    pub fn volume(&self) -> u8 {
        self.get_int("speech", "volume", i32::from(DEFAULT_VOLUME))
            .clamp(0, 100) as u8
    }

    /// Voice index into the engine's voice list; `None` keeps the default voice
    pub fn voice_idx(&self) -> Option<usize> {
        self.get_int("speech", "voice_idx", -1).try_into().ok()
    }

    /// Starting request for the panel, built from the stored settings.
    pub fn initial_request(&self) -> PlaybackRequest {
        let mut request = PlaybackRequest::new(self.default_text());
        request.rate = self.rate();
        request.pitch = self.pitch();
        request.volume = self.volume();
        request.voice = self.voice_idx();
        request.muted = request.volume == 0;
        request
    }

    /// Store a request's parameters back into the config.
    pub fn remember_request(&mut self, request: &PlaybackRequest) {
        let voice = request.voice.map_or(-1i64, |v| v as i64);
        self.set("speech", "text", &request.text);
        self.set("speech", "rate", &format!("{:.2}", request.rate));
        self.set("speech", "pitch", &format!("{:.2}", request.pitch));
        self.set("speech", "volume", &request.volume.to_string());
        self.set("speech", "voice_idx", &voice.to_string());
    }
}
