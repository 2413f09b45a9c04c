//! Native speech backend using the tts crate
//!
//! The `tts` crate provides a unified interface to:
//! - Speech Dispatcher on Linux (via native bindings)
//! - AVFoundation on macOS/iOS
//! - WinRT on Windows
//!
//! Utterance callbacks fire on a platform thread, so they are bridged into
//! the backend through a channel and drained by `poll_event`. On platforms
//! without callback support, start is reported at submit time and completion
//! is inferred by polling `is_speaking`.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};

use log::{debug, error, warn};
use tts::Tts as TtsCrate;
use tts::UtteranceId as TtsUtteranceId;

use crate::engine::{EngineEvent, SpeechEngine, Utterance, UtteranceId, VoiceDescriptor};
use crate::{Result, VoxdeckError};

/// Raw callback notifications from the platform speech stack.
enum BackendEvent {
    Begin(TtsUtteranceId),
    End(TtsUtteranceId),
    Stop(TtsUtteranceId),
}

/// The utterance the backend last submitted and has not yet retired.
struct Current {
    id: UtteranceId,
    /// Platform id from `speak`; some platforms return none, in which case
    /// events are matched on the single-outstanding-utterance guarantee.
    backend: Option<TtsUtteranceId>,
}

/// Native speech engine over the platform TTS stack.
pub struct NativeEngine {
    tts: TtsCrate,
    events: Receiver<BackendEvent>,
    pending: VecDeque<EngineEvent>,
    current: Option<Current>,
    callbacks_supported: bool,
}

impl NativeEngine {
    /// Create a native engine on the platform default backend.
    pub fn new() -> Result<Self> {
        debug!("Creating native TTS backend");

        let tts = TtsCrate::default()
            .map_err(|e| VoxdeckError::Engine(format!("Failed to initialize TTS: {}", e)))?;

        let callbacks_supported = tts.supported_features().utterance_callbacks;
        let (sender, events) = mpsc::channel();
        if callbacks_supported {
            register_callbacks(&tts, &sender)?;
        } else {
            warn!("Utterance callbacks not supported; completion will be inferred by polling");
        }

        debug!(
            "Native TTS backend created successfully (callbacks: {})",
            callbacks_supported
        );

        Ok(Self {
            tts,
            events,
            pending: VecDeque::new(),
            current: None,
            callbacks_supported,
        })
    }

    fn find_backend_voice(&self, id: &str) -> Result<Option<tts::Voice>> {
        let voices = self
            .tts
            .voices()
            .map_err(|e| VoxdeckError::Engine(format!("Failed to get voices: {}", e)))?;
        Ok(voices.into_iter().find(|v| v.id() == id))
    }

    /// Map a raw callback onto the current utterance, or drop it as stale.
    fn translate(&mut self, backend_event: BackendEvent) -> Option<EngineEvent> {
        let (id, backend) = match &self.current {
            Some(current) => (current.id, current.backend.clone()),
            None => return None,
        };
        let matches = |raw: &TtsUtteranceId| backend.as_ref().map_or(true, |b| b == raw);

        match backend_event {
            BackendEvent::Begin(raw) if matches(&raw) => Some(EngineEvent::Started { id }),
            BackendEvent::End(raw) | BackendEvent::Stop(raw) if matches(&raw) => {
                self.current = None;
                Some(EngineEvent::Ended { id })
            }
            _ => None,
        }
    }
}

impl SpeechEngine for NativeEngine {
    fn voices(&mut self) -> Result<Vec<VoiceDescriptor>> {
        let voices = self
            .tts
            .voices()
            .map_err(|e| VoxdeckError::Engine(format!("Failed to get voices: {}", e)))?;
        Ok(voices
            .iter()
            .map(|v| VoiceDescriptor::new(v.id(), v.name(), v.language().as_str()))
            .collect())
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        let features = self.tts.supported_features();

        match &utterance.voice {
            Some(voice) if features.voice => match self.find_backend_voice(&voice.id)? {
                Some(backend_voice) => {
                    debug!("Selecting voice {}", voice.id);
                    if let Err(e) = self.tts.set_voice(&backend_voice) {
                        // Falls back to the platform default voice.
                        warn!("Failed to set voice {}: {}", voice.id, e);
                    }
                }
                None => warn!("Voice {} no longer offered, using default", voice.id),
            },
            Some(_) => warn!("Voice selection not supported on this platform"),
            None => {}
        }

        if features.rate {
            let rate = scale_setting(
                utterance.rate,
                self.tts.min_rate(),
                self.tts.normal_rate(),
                self.tts.max_rate(),
            );
            self.tts
                .set_rate(rate)
                .map_err(|e| VoxdeckError::Engine(format!("Failed to set rate: {}", e)))?;
        } else {
            warn!("Rate control not supported on this platform");
        }

        if features.pitch {
            let pitch = scale_setting(
                utterance.pitch,
                self.tts.min_pitch(),
                self.tts.normal_pitch(),
                self.tts.max_pitch(),
            );
            self.tts
                .set_pitch(pitch)
                .map_err(|e| VoxdeckError::Engine(format!("Failed to set pitch: {}", e)))?;
        } else {
            warn!("Pitch control not supported on this platform");
        }

        if features.volume {
            let volume = scale_volume(
                utterance.volume,
                self.tts.min_volume(),
                self.tts.max_volume(),
            );
            self.tts
                .set_volume(volume)
                .map_err(|e| VoxdeckError::Engine(format!("Failed to set volume: {}", e)))?;
        } else {
            warn!("Volume control not supported on this platform");
        }

        debug!("Speaking {}: {}", utterance.id, utterance.text);
        let backend = self.tts.speak(utterance.text.as_str(), false).map_err(|e| {
            error!("Failed to speak: {}", e);
            VoxdeckError::Engine(format!("Speak failed: {}", e))
        })?;

        self.current = Some(Current {
            id: utterance.id,
            backend,
        });
        if !self.callbacks_supported {
            // No begin callback will arrive; report the start here.
            self.pending.push_back(EngineEvent::Started { id: utterance.id });
        }

        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        debug!("Canceling speech");

        if !self.tts.supported_features().stop {
            warn!("Stop not supported on this platform");
            return Ok(());
        }

        self.tts.stop().map_err(|e| {
            error!("Failed to cancel speech: {}", e);
            VoxdeckError::Engine(format!("Cancel failed: {}", e))
        })?;

        if !self.callbacks_supported {
            // No stop callback will arrive to retire the utterance.
            self.current = None;
        }

        Ok(())
    }

    fn is_speaking(&self) -> bool {
        self.tts.is_speaking().unwrap_or(false)
    }

    fn set_live_volume(&mut self, volume: f32) -> Result<()> {
        if !self.tts.supported_features().volume {
            warn!("Volume control not supported on this platform");
            return Ok(());
        }

        // Most platforms apply this from the next utterance only; whether the
        // in-flight one changes is a platform capability we cannot detect.
        let volume = scale_volume(volume, self.tts.min_volume(), self.tts.max_volume());
        self.tts
            .set_volume(volume)
            .map_err(|e| VoxdeckError::Engine(format!("Failed to set volume: {}", e)))?;

        Ok(())
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }

        while let Ok(backend_event) = self.events.try_recv() {
            if let Some(event) = self.translate(backend_event) {
                return Some(event);
            }
        }

        if !self.callbacks_supported {
            if let Some(current) = &self.current {
                if !self.is_speaking() {
                    let id = current.id;
                    self.current = None;
                    return Some(EngineEvent::Ended { id });
                }
            }
        }

        None
    }
}

impl Drop for NativeEngine {
    fn drop(&mut self) {
        debug!("Shutting down native TTS backend");
        let _ = self.cancel();
    }
}

fn register_callbacks(tts: &TtsCrate, sender: &Sender<BackendEvent>) -> Result<()> {
    let begin = sender.clone();
    tts.on_utterance_begin(Some(Box::new(move |id| {
        let _ = begin.send(BackendEvent::Begin(id));
    })))
    .map_err(|e| VoxdeckError::Engine(format!("Failed to register begin callback: {}", e)))?;

    let end = sender.clone();
    tts.on_utterance_end(Some(Box::new(move |id| {
        let _ = end.send(BackendEvent::End(id));
    })))
    .map_err(|e| VoxdeckError::Engine(format!("Failed to register end callback: {}", e)))?;

    let stop = sender.clone();
    tts.on_utterance_stop(Some(Box::new(move |id| {
        let _ = stop.send(BackendEvent::Stop(id));
    })))
    .map_err(|e| VoxdeckError::Engine(format!("Failed to register stop callback: {}", e)))?;

    Ok(())
}

/// Map a 0.0-2.0 user setting onto an engine range where 1.0 means `normal`.
fn scale_setting(setting: f32, min: f32, normal: f32, max: f32) -> f32 {
    let setting = setting.clamp(0.0, 2.0);
    if setting <= 1.0 {
        min + (normal - min) * setting
    } else {
        normal + (max - normal) * (setting - 1.0)
    }
}

/// Map an effective 0.0-1.0 volume onto the engine's volume range.
fn scale_volume(volume: f32, min: f32, max: f32) -> f32 {
    min + (max - min) * volume.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_setting_hits_anchors() {
        assert_eq!(scale_setting(0.0, -100.0, 0.0, 100.0), -100.0);
        assert_eq!(scale_setting(1.0, -100.0, 0.0, 100.0), 0.0);
        assert_eq!(scale_setting(2.0, -100.0, 0.0, 100.0), 100.0);
    }

    #[test]
    fn test_scale_setting_is_piecewise() {
        // Halfway below normal and halfway above use different slopes.
        assert_eq!(scale_setting(0.5, 0.0, 10.0, 100.0), 5.0);
        assert_eq!(scale_setting(1.5, 0.0, 10.0, 100.0), 55.0);
    }

    #[test]
    fn test_scale_setting_clamps_input() {
        assert_eq!(scale_setting(-1.0, 0.0, 1.0, 2.0), 0.0);
        assert_eq!(scale_setting(9.0, 0.0, 1.0, 2.0), 2.0);
    }

    #[test]
    fn test_scale_volume() {
        assert_eq!(scale_volume(0.0, 0.0, 1.0), 0.0);
        assert_eq!(scale_volume(0.75, 0.0, 1.0), 0.75);
        assert_eq!(scale_volume(1.0, 0.0, 100.0), 100.0);
        assert_eq!(scale_volume(2.0, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_create_engine() {
        // May fail if the system lacks speech-dispatcher (Linux) or when
        // running in CI without audio.
        match NativeEngine::new() {
            Ok(_) => println!("✓ Native TTS backend initialized successfully"),
            Err(e) => println!("⚠ TTS initialization failed (may be expected in CI): {}", e),
        }
    }
}
