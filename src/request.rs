//! Playback request model

use serde::{Deserialize, Serialize};

/// Starting volume for a fresh request.
pub const DEFAULT_VOLUME: u8 = 75;

/// Rate and pitch share one domain: 0.0 to 2.0 with 1.0 as normal.
pub const SETTING_MIN: f32 = 0.0;
pub const SETTING_MAX: f32 = 2.0;

/// User-editable playback parameters for the next utterance.
///
/// `voice` selects by position in the controller's cached voice list; `None`
/// means the engine default. An index that no longer resolves falls back to
/// the default silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackRequest {
    pub text: String,
    pub voice: Option<usize>,
    pub rate: f32,
    pub pitch: f32,
    /// Stored volume, 0 to 100. Engines never see this directly; they
    /// receive [`effective_volume`](Self::effective_volume), which is forced
    /// to zero while muted.
    pub volume: u8,
    pub muted: bool,
}

impl Default for PlaybackRequest {
    fn default() -> Self {
        Self {
            text: String::new(),
            voice: None,
            rate: 1.0,
            pitch: 1.0,
            volume: DEFAULT_VOLUME,
            muted: false,
        }
    }
}

impl PlaybackRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Volume actually sent to the engine: 0 when muted, else `volume / 100`.
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            f32::from(self.volume.min(100)) / 100.0
        }
    }

    /// Rate clamped into its 0.0-2.0 domain.
    pub fn clamped_rate(&self) -> f32 {
        self.rate.clamp(SETTING_MIN, SETTING_MAX)
    }

    /// Pitch clamped into its 0.0-2.0 domain.
    pub fn clamped_pitch(&self) -> f32 {
        self.pitch.clamp(SETTING_MIN, SETTING_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = PlaybackRequest::default();
        assert_eq!(request.volume, 75);
        assert_eq!(request.rate, 1.0);
        assert_eq!(request.pitch, 1.0);
        assert!(!request.muted);
        assert!(request.voice.is_none());
        assert!(request.text.is_empty());
    }

    #[test]
    fn test_effective_volume() {
        let mut request = PlaybackRequest::new("hi");
        assert_eq!(request.effective_volume(), 0.75);

        request.muted = true;
        assert_eq!(request.effective_volume(), 0.0);

        request.muted = false;
        request.volume = 200;
        assert_eq!(request.effective_volume(), 1.0);
    }

    #[test]
    fn test_setting_clamps() {
        let mut request = PlaybackRequest::new("hi");
        request.rate = 9.0;
        request.pitch = -3.0;
        assert_eq!(request.clamped_rate(), 2.0);
        assert_eq!(request.clamped_pitch(), 0.0);
    }
}
