//! Terminal raw-mode helpers for the interactive panel

use std::os::fd::AsFd;

use nix::sys::termios::{self, SetArg, Termios};

use crate::{Result, VoxdeckError};

/// Set terminal to raw mode, returning the attributes to restore.
///
/// Raw mode lets the panel react to single keypresses without echo. Fails
/// when the descriptor is not a tty, which is how the panel notices it was
/// started under a pipe or redirect.
pub fn set_raw_mode<Fd: AsFd>(fd: Fd) -> Result<Termios> {
    let original = termios::tcgetattr(&fd)
        .map_err(|e| VoxdeckError::Terminal(format!("Not an interactive terminal: {}", e)))?;

    let mut raw = original.clone();
    termios::cfmakeraw(&mut raw);
    termios::tcsetattr(&fd, SetArg::TCSANOW, &raw)
        .map_err(|e| VoxdeckError::Terminal(format!("Failed to enter raw mode: {}", e)))?;

    Ok(original)
}

/// Restore terminal attributes
///
/// Called when the panel exits to return the terminal to normal state.
/// Errors are ignored; this runs on every exit path.
pub fn restore_termios<Fd: AsFd>(fd: Fd, termios: &Termios) {
    let _ = termios::tcsetattr(&fd, SetArg::TCSANOW, termios);
}
