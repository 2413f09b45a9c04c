//! Speech engine trait and lifecycle events

use crate::engine::{Utterance, UtteranceId, VoiceDescriptor};
use crate::Result;

/// Lifecycle events reported by a speech engine.
///
/// For each accepted utterance an engine emits one `Started`, then exactly
/// one of `Ended` or `Errored`, in that order, all tagged with the id the
/// controller attached at submit time. `VoicesChanged` may arrive at any
/// point, zero or more times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Audible playback of the identified utterance has begun.
    Started { id: UtteranceId },
    /// The identified utterance finished playing.
    Ended { id: UtteranceId },
    /// The engine failed while speaking; `code` is the engine's own
    /// diagnostic text.
    Errored { id: UtteranceId, code: String },
    /// The voice inventory changed and should be re-fetched.
    VoicesChanged,
}

/// Speech engine trait
///
/// Implementations provide asynchronous text-to-speech playback. An engine
/// holds at most one in-flight utterance; the controller guarantees a cancel
/// is issued before a second submission.
pub trait SpeechEngine: Send {
    /// Snapshot of the voices the engine currently offers.
    fn voices(&mut self) -> Result<Vec<VoiceDescriptor>>;

    /// Submit an utterance for playback.
    fn speak(&mut self, utterance: &Utterance) -> Result<()>;

    /// Terminate any in-flight utterance. No-op when nothing is speaking.
    fn cancel(&mut self) -> Result<()>;

    /// Whether an utterance is currently being spoken.
    fn is_speaking(&self) -> bool;

    /// Apply a new volume to the in-flight utterance, best effort.
    ///
    /// Engines without live mutation apply the value from the next utterance
    /// onward instead; callers must not rely on an immediate change.
    fn set_live_volume(&mut self, volume: f32) -> Result<()>;

    /// Drain the next pending lifecycle event, if any.
    fn poll_event(&mut self) -> Option<EngineEvent>;
}

impl<E: SpeechEngine + ?Sized> SpeechEngine for Box<E> {
    fn voices(&mut self) -> Result<Vec<VoiceDescriptor>> {
        (**self).voices()
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        (**self).speak(utterance)
    }

    fn cancel(&mut self) -> Result<()> {
        (**self).cancel()
    }

    fn is_speaking(&self) -> bool {
        (**self).is_speaking()
    }

    fn set_live_volume(&mut self, volume: f32) -> Result<()> {
        (**self).set_live_volume(volume)
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        (**self).poll_event()
    }
}
