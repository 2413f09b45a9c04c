//! In-memory speech backend
//!
//! Records every call made into it and replays scripted lifecycle events,
//! so controller behavior (cancel-before-restart, stale-event immunity,
//! volume coupling) can be asserted without a platform speech stack. It
//! also powers `--mock` runs of the panel.
//!
//! Cloning a `MockEngine` yields another handle onto the same shared state,
//! which keeps the call log observable after the engine has been moved into
//! a controller.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::engine::{EngineEvent, SpeechEngine, Utterance, UtteranceId, VoiceDescriptor};
use crate::{Result, VoxdeckError};

/// One call made into the engine, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Speak {
        id: UtteranceId,
        text: String,
        voice: Option<String>,
        rate: f32,
        pitch: f32,
        volume: f32,
    },
    Cancel,
    SetLiveVolume(f32),
}

#[derive(Default)]
struct Inner {
    voices: Vec<VoiceDescriptor>,
    calls: Vec<EngineCall>,
    events: VecDeque<EngineEvent>,
    speaking: bool,
    current: Option<UtteranceId>,
    spoke_at: Option<Instant>,
    auto_complete: Option<Duration>,
    fail_next_speak: Option<String>,
}

/// Recording in-memory speech engine.
///
/// `speak` queues a `Started` event for the submitted utterance; completion
/// is scripted from the test (or timed, for `--mock` panel runs).
#[derive(Clone, Default)]
pub struct MockEngine {
    inner: Arc<Mutex<Inner>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine preloaded with a voice inventory.
    pub fn with_voices(voices: Vec<VoiceDescriptor>) -> Self {
        let engine = Self::new();
        engine.inner.lock().unwrap().voices = voices;
        engine
    }

    /// Finish utterances on their own after `delay`, for interactive runs
    /// where nothing scripts the completion.
    pub fn auto_complete_after(self, delay: Duration) -> Self {
        self.inner.lock().unwrap().auto_complete = Some(delay);
        self
    }

    /// Another handle onto the same engine state.
    pub fn handle(&self) -> MockEngine {
        self.clone()
    }

    /// Everything that has been called so far.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    /// Id of the utterance submitted most recently and not yet retired.
    pub fn current_utterance(&self) -> Option<UtteranceId> {
        self.inner.lock().unwrap().current
    }

    /// Replace the voice inventory and queue the change notification.
    pub fn replace_voices(&self, voices: Vec<VoiceDescriptor>) {
        let mut inner = self.inner.lock().unwrap();
        inner.voices = voices;
        inner.events.push_back(EngineEvent::VoicesChanged);
    }

    /// Queue an arbitrary lifecycle event.
    pub fn push_event(&self, event: EngineEvent) {
        self.inner.lock().unwrap().events.push_back(event);
    }

    /// Finish the in-flight utterance normally.
    pub fn complete_current(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(id) = inner.current.take() {
            inner.speaking = false;
            inner.events.push_back(EngineEvent::Ended { id });
        }
    }

    /// Fail the in-flight utterance with an engine diagnostic.
    pub fn fail_current(&self, code: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(id) = inner.current.take() {
            inner.speaking = false;
            inner.events.push_back(EngineEvent::Errored {
                id,
                code: code.to_string(),
            });
        }
    }

    /// Make the next `speak` call fail synchronously with `message`.
    pub fn fail_next_speak(&self, message: &str) {
        self.inner.lock().unwrap().fail_next_speak = Some(message.to_string());
    }
}

impl SpeechEngine for MockEngine {
    fn voices(&mut self) -> Result<Vec<VoiceDescriptor>> {
        Ok(self.inner.lock().unwrap().voices.clone())
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(EngineCall::Speak {
            id: utterance.id,
            text: utterance.text.clone(),
            voice: utterance.voice.as_ref().map(|v| v.id.clone()),
            rate: utterance.rate,
            pitch: utterance.pitch,
            volume: utterance.volume,
        });
        if let Some(message) = inner.fail_next_speak.take() {
            return Err(VoxdeckError::Engine(message));
        }
        inner.speaking = true;
        inner.current = Some(utterance.id);
        inner.spoke_at = Some(Instant::now());
        inner.events.push_back(EngineEvent::Started { id: utterance.id });
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(EngineCall::Cancel);
        inner.speaking = false;
        inner.current = None;
        Ok(())
    }

    fn is_speaking(&self) -> bool {
        self.inner.lock().unwrap().speaking
    }

    fn set_live_volume(&mut self, volume: f32) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .calls
            .push(EngineCall::SetLiveVolume(volume));
        Ok(())
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(event) = inner.events.pop_front() {
            return Some(event);
        }
        // Timed completion for interactive runs.
        if let (Some(delay), Some(spoke_at)) = (inner.auto_complete, inner.spoke_at) {
            if inner.speaking && spoke_at.elapsed() >= delay {
                if let Some(id) = inner.current.take() {
                    inner.speaking = false;
                    return Some(EngineEvent::Ended { id });
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speak_records_call_and_queues_start() {
        let mut engine = MockEngine::new();
        let utterance = Utterance {
            id: UtteranceId::new(7),
            text: "hello".to_string(),
            voice: None,
            rate: 1.0,
            pitch: 1.0,
            volume: 0.75,
        };
        engine.speak(&utterance).unwrap();

        assert!(engine.is_speaking());
        assert_eq!(engine.calls().len(), 1);
        assert_eq!(
            engine.poll_event(),
            Some(EngineEvent::Started { id: utterance.id })
        );
        assert_eq!(engine.poll_event(), None);
    }

    #[test]
    fn test_cancel_clears_current_but_keeps_queued_events() {
        let mut engine = MockEngine::new();
        let utterance = Utterance {
            id: UtteranceId::new(1),
            text: "hello".to_string(),
            voice: None,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        };
        engine.speak(&utterance).unwrap();
        engine.cancel().unwrap();

        assert!(!engine.is_speaking());
        assert_eq!(engine.current_utterance(), None);
        // The queued start from before the cancel still drains.
        assert_eq!(
            engine.poll_event(),
            Some(EngineEvent::Started { id: utterance.id })
        );
    }
}
