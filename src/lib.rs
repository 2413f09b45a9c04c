//! voxdeck - interactive text-to-speech playback deck
//!
//! Wraps a pluggable speech engine in a small playback controller that
//! tracks utterance lifecycle, a progress estimate, and transient status
//! messages. The binary drives the controller from single keypresses in a
//! raw-mode terminal.

pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod request;
pub mod tty;

pub use error::{Result, VoxdeckError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "voxdeck";
