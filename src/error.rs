//! Error types for voxdeck

use std::io;
use thiserror::Error;

/// Main error type for voxdeck
#[derive(Error, Debug)]
pub enum VoxdeckError {
    #[error("Speech engine error: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for voxdeck operations
pub type Result<T> = std::result::Result<T, VoxdeckError>;

impl From<String> for VoxdeckError {
    fn from(s: String) -> Self {
        VoxdeckError::Other(s)
    }
}

impl From<&str> for VoxdeckError {
    fn from(s: &str) -> Self {
        VoxdeckError::Other(s.to_string())
    }
}
