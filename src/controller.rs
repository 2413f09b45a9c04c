//! Playback controller
//!
//! Mediates between user-editable request fields and a speech engine's
//! asynchronous utterance lifecycle. Owns the playback state, the cosmetic
//! progress estimate, and the transient status message.
//!
//! The controller is single-threaded and cooperative. The host loop feeds
//! it engine events through [`PlaybackController::pump`] and the clock
//! through [`PlaybackController::run_due`], and sizes its poll timeout from
//! [`PlaybackController::next_deadline`].

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::engine::{EngineEvent, SpeechEngine, Utterance, UtteranceId, VoiceDescriptor};
use crate::request::{PlaybackRequest, SETTING_MAX, SETTING_MIN};
use crate::VoxdeckError;

/// How long a status message stays visible.
pub const STATUS_TTL: Duration = Duration::from_secs(3);

/// Bounds for the progress tick interval. The lower bound keeps short text
/// at a high rate from producing a zero interval; the upper keeps a rate
/// near zero from scheduling a deadline hours out.
const MIN_TICK: Duration = Duration::from_millis(1);
const MAX_TICK: Duration = Duration::from_secs(600);

/// Lifecycle of the controller's playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing in flight.
    Idle,
    /// The engine reported the current utterance started.
    Speaking,
    /// A stop was requested and the cancel is being issued. Transient;
    /// collapses back to `Idle` before `stop` returns.
    Stopped,
}

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Error,
}

/// Short human-readable notice with an expiry deadline.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    text: String,
    severity: Severity,
    expires_at: Instant,
}

impl StatusMessage {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }
}

/// The utterance the controller currently tracks.
struct ActiveUtterance {
    id: UtteranceId,
    /// Progress tick interval computed from the submitted text and rate.
    tick: Duration,
}

/// Cosmetic progress ticker; at most one exists at a time.
struct Ticker {
    interval: Duration,
    next_due: Instant,
}

/// Playback controller over an injected speech engine.
pub struct PlaybackController<E: SpeechEngine> {
    engine: E,
    request: PlaybackRequest,
    voices: Vec<VoiceDescriptor>,
    state: PlaybackState,
    progress: u8,
    status: Option<StatusMessage>,
    active: Option<ActiveUtterance>,
    ticker: Option<Ticker>,
    next_id: u64,
}

impl<E: SpeechEngine> PlaybackController<E> {
    /// Create a controller around an engine and fetch its voice list.
    pub fn new(engine: E) -> Self {
        let mut controller = Self {
            engine,
            request: PlaybackRequest::default(),
            voices: Vec::new(),
            state: PlaybackState::Idle,
            progress: 0,
            status: None,
            active: None,
            ticker: None,
            next_id: 0,
        };
        controller.refresh_voices();
        controller
    }

    /// Submit a playback request.
    ///
    /// The request becomes the controller's current one, so later volume and
    /// mute changes apply to it. Empty or whitespace-only text is rejected
    /// locally with an error status and no engine call. A request submitted
    /// while something is speaking cancels the old utterance first.
    pub fn play(&mut self, request: PlaybackRequest) {
        self.request = request;

        if self.request.text.trim().is_empty() {
            debug!("Rejecting playback of empty text");
            self.set_status("Please enter some text to speak", Severity::Error);
            return;
        }

        // One utterance outstanding at a time is a hard engine constraint;
        // the cancel must complete before the next submission.
        if self.engine.is_speaking() {
            if let Err(e) = self.engine.cancel() {
                warn!("Cancel before restart failed: {}", e);
                self.abandon_playback(&engine_code(&e));
                return;
            }
        }
        // Likewise at most one ticker; the old one must not race the new.
        self.ticker = None;

        let id = self.next_utterance_id();
        let utterance = Utterance {
            id,
            text: self.request.text.clone(),
            voice: self.resolve_voice(),
            rate: self.request.clamped_rate(),
            pitch: self.request.clamped_pitch(),
            volume: self.request.effective_volume(),
        };
        let tick = tick_interval(&utterance.text, utterance.rate);

        debug!(
            "Submitting {} ({} chars, rate {}, volume {})",
            id,
            utterance.text.chars().count(),
            utterance.rate,
            utterance.volume
        );
        match self.engine.speak(&utterance) {
            Ok(()) => {
                self.active = Some(ActiveUtterance { id, tick });
            }
            Err(e) => {
                warn!("Speak failed: {}", e);
                self.abandon_playback(&engine_code(&e));
            }
        }
    }

    /// Stop active playback. Silent no-op when nothing is speaking.
    pub fn stop(&mut self) {
        if !self.engine.is_speaking() {
            return;
        }

        self.state = PlaybackState::Stopped;
        let failure = self.engine.cancel().err();
        // Late callbacks from the cancelled utterance no longer match.
        self.active = None;
        self.enter_idle();

        match failure {
            None => {
                info!("Speech stopped");
                self.set_status("Speech stopped", Severity::Normal);
            }
            Some(e) => {
                warn!("Cancel failed: {}", e);
                self.set_status(
                    format!("Error occurred: {}", engine_code(&e)),
                    Severity::Error,
                );
            }
        }
    }

    /// `stop` plus forcing progress back to zero. Idempotent when idle.
    pub fn reset(&mut self) {
        self.stop();
        self.progress = 0;
    }

    /// Update the mute flag. When an utterance is active the new effective
    /// volume is pushed onto it, best effort.
    pub fn set_muted(&mut self, muted: bool) {
        self.request.muted = muted;
        if self.active.is_some() && self.engine.is_speaking() {
            let volume = self.request.effective_volume();
            debug!("Pushing live volume {}", volume);
            if let Err(e) = self.engine.set_live_volume(volume) {
                // Not a synthesis failure; playback continues at the old volume.
                warn!("Live volume change rejected: {}", e);
            }
        }
    }

    /// Store a new volume for the next submission. Zero volume and mute
    /// imply each other: setting 0 mutes, setting anything higher unmutes.
    pub fn set_volume(&mut self, volume: u8) {
        let volume = volume.min(100);
        self.request.volume = volume;
        self.request.muted = volume == 0;
    }

    /// Replace the text for the next playback.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.request.text = text.into();
    }

    /// Select a voice by list position; `None` restores the engine default.
    pub fn set_voice(&mut self, voice: Option<usize>) {
        self.request.voice = voice;
    }

    /// Set the rate for the next playback, clamped to 0.0-2.0.
    pub fn set_rate(&mut self, rate: f32) {
        self.request.rate = rate.clamp(SETTING_MIN, SETTING_MAX);
    }

    /// Set the pitch for the next playback, clamped to 0.0-2.0.
    pub fn set_pitch(&mut self, pitch: f32) {
        self.request.pitch = pitch.clamp(SETTING_MIN, SETTING_MAX);
    }

    /// Replace the current request wholesale without touching playback.
    pub fn set_request(&mut self, request: PlaybackRequest) {
        self.request = request;
    }

    /// Drain and apply all pending engine events.
    pub fn pump(&mut self) {
        while let Some(event) = self.engine.poll_event() {
            self.handle_event(event);
        }
    }

    /// Run any time-driven work that is due: progress ticks, status expiry.
    pub fn run_due(&mut self, now: Instant) {
        if let Some(status) = &self.status {
            if now >= status.expires_at {
                self.status = None;
            }
        }

        if let Some(mut ticker) = self.ticker.take() {
            let mut keep = true;
            while now >= ticker.next_due {
                self.progress = (self.progress + 1).min(100);
                if self.progress >= 100 {
                    // Estimator is done; playback itself may still be going.
                    keep = false;
                    break;
                }
                ticker.next_due += ticker.interval;
            }
            if keep {
                self.ticker = Some(ticker);
            }
        }
    }

    /// Earliest instant at which [`run_due`](Self::run_due) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let tick = self.ticker.as_ref().map(|t| t.next_due);
        let expiry = self.status.as_ref().map(|s| s.expires_at);
        [tick, expiry].into_iter().flatten().min()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Progress estimate, 0 to 100. Cosmetic; not tied to audio position.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// The current status message, if one is set and unexpired.
    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Cached voice list, in engine order.
    pub fn voices(&self) -> &[VoiceDescriptor] {
        &self.voices
    }

    pub fn request(&self) -> &PlaybackRequest {
        &self.request
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::VoicesChanged => {
                debug!("Voice inventory changed");
                self.refresh_voices();
            }
            EngineEvent::Started { id } => {
                if !self.is_current(id) {
                    debug!("Ignoring stale start for {}", id);
                    return;
                }
                info!("{} started", id);
                let tick = self.active.as_ref().map_or(MIN_TICK, |a| a.tick);
                self.state = PlaybackState::Speaking;
                self.progress = 0;
                self.ticker = Some(Ticker {
                    interval: tick,
                    next_due: Instant::now() + tick,
                });
                self.set_status("Speaking...", Severity::Normal);
            }
            EngineEvent::Ended { id } => {
                if !self.is_current(id) {
                    debug!("Ignoring stale end for {}", id);
                    return;
                }
                info!("{} finished", id);
                self.active = None;
                self.enter_idle();
                self.set_status("Finished speaking", Severity::Normal);
            }
            EngineEvent::Errored { id, code } => {
                if !self.is_current(id) {
                    debug!("Ignoring stale error for {}", id);
                    return;
                }
                warn!("{} failed: {}", id, code);
                self.active = None;
                self.enter_idle();
                self.set_status(format!("Error occurred: {}", code), Severity::Error);
            }
        }
    }

    fn is_current(&self, id: UtteranceId) -> bool {
        self.active.as_ref().is_some_and(|a| a.id == id)
    }

    fn next_utterance_id(&mut self) -> UtteranceId {
        self.next_id += 1;
        UtteranceId::new(self.next_id)
    }

    /// Positional lookup; misses fall back to the engine default silently.
    fn resolve_voice(&self) -> Option<VoiceDescriptor> {
        let index = self.request.voice?;
        self.voices.get(index).cloned()
    }

    fn abandon_playback(&mut self, code: &str) {
        self.active = None;
        self.enter_idle();
        self.set_status(format!("Error occurred: {}", code), Severity::Error);
    }

    fn enter_idle(&mut self) {
        self.state = PlaybackState::Idle;
        self.progress = 0;
        self.ticker = None;
    }

    fn set_status(&mut self, text: impl Into<String>, severity: Severity) {
        self.status = Some(StatusMessage {
            text: text.into(),
            severity,
            expires_at: Instant::now() + STATUS_TTL,
        });
    }

    fn refresh_voices(&mut self) {
        match self.engine.voices() {
            Ok(voices) => {
                debug!("Voice list refreshed: {} voices", voices.len());
                self.voices = voices;
            }
            Err(e) => {
                // Previous snapshot stays in place.
                warn!("Voice enumeration failed: {}", e);
            }
        }
    }
}

impl<E: SpeechEngine> Drop for PlaybackController<E> {
    fn drop(&mut self) {
        // Teardown must not leave an utterance or a timer behind.
        self.ticker = None;
        if self.engine.is_speaking() {
            let _ = self.engine.cancel();
        }
    }
}

/// Status messages carry the engine's own diagnostic text, not our wrapper.
fn engine_code(error: &VoxdeckError) -> String {
    match error {
        VoxdeckError::Engine(code) => code.clone(),
        other => other.to_string(),
    }
}

/// Interval between progress ticks: 10ms per character, stretched by slower
/// rates, bounded to stay positive and finite.
fn tick_interval(text: &str, rate: f32) -> Duration {
    let chars = text.chars().count() as f64;
    let ms = (chars * 10.0) / f64::from(rate);
    if !ms.is_finite() {
        return MAX_TICK;
    }
    let clamped = ms.clamp(
        MIN_TICK.as_secs_f64() * 1000.0,
        MAX_TICK.as_secs_f64() * 1000.0,
    );
    Duration::from_secs_f64(clamped / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_interval_scales_with_rate() {
        assert_eq!(tick_interval(&"a".repeat(100), 1.0), Duration::from_millis(1000));
        assert_eq!(tick_interval(&"a".repeat(100), 2.0), Duration::from_millis(500));
        assert_eq!(tick_interval(&"a".repeat(50), 0.5), Duration::from_millis(1000));
    }

    #[test]
    fn test_tick_interval_counts_chars_not_bytes() {
        // Four characters, twelve bytes.
        assert_eq!(tick_interval("日本語字", 1.0), Duration::from_millis(40));
    }

    #[test]
    fn test_tick_interval_bounds() {
        assert_eq!(tick_interval("hi", 0.0), MAX_TICK);
        assert_eq!(tick_interval("", 2.0), MIN_TICK);
        assert_eq!(tick_interval(&"a".repeat(100_000), 0.01), MAX_TICK);
    }

    #[test]
    fn test_engine_code_unwraps_engine_errors() {
        assert_eq!(engine_code(&VoxdeckError::Engine("boom".into())), "boom");
        assert_eq!(
            engine_code(&VoxdeckError::Other("plain".into())),
            "plain"
        );
    }
}
