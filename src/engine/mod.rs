//! Speech engine abstraction and backends

pub mod backends;
mod traits;
mod utterance;
mod voice;

pub use traits::{EngineEvent, SpeechEngine};
pub use utterance::{Utterance, UtteranceId};
pub use voice::VoiceDescriptor;
