//! Utterance payloads submitted to speech engines

use std::fmt;

use crate::engine::VoiceDescriptor;

/// Identity of one submitted utterance.
///
/// Allocated by the playback controller, never by the engine. Engines echo
/// it back in lifecycle events, which is how callbacks from a superseded
/// utterance are told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(u64);

impl UtteranceId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "utterance #{}", self.0)
    }
}

/// One synthesis request handed to an engine.
///
/// `volume` is the effective value: mute is applied by the controller before
/// submission, so a muted request always arrives here with volume 0.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    /// Resolved voice; `None` means the engine default.
    pub voice: Option<VoiceDescriptor>,
    /// 0.0 to 2.0, 1.0 is normal.
    pub rate: f32,
    /// 0.0 to 2.0, 1.0 is normal.
    pub pitch: f32,
    /// 0.0 to 1.0.
    pub volume: f32,
}
