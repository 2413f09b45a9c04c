//! Integration tests for the native speech backend
//!
//! These exercise the platform TTS stack when one is present. They must not
//! fail in CI or headless environments, so a backend that cannot be
//! constructed is reported and skipped rather than asserted on.
#![cfg(feature = "native")]

use voxdeck::controller::PlaybackController;
use voxdeck::engine::backends::NativeEngine;
use voxdeck::engine::SpeechEngine;
use voxdeck::request::PlaybackRequest;

#[test]
fn test_create_native_engine() {
    match NativeEngine::new() {
        Ok(engine) => {
            println!("✓ Successfully created native TTS backend");
            drop(engine);
        }
        Err(e) => {
            // Expected in environments without speech-dispatcher or audio.
            println!("⚠ TTS creation failed (may be expected): {}", e);
        }
    }
}

#[test]
fn test_native_voice_enumeration() {
    let mut engine = match NativeEngine::new() {
        Ok(engine) => engine,
        Err(e) => {
            println!("⚠ Skipping voice enumeration test (TTS not available): {}", e);
            return;
        }
    };

    match engine.voices() {
        Ok(voices) => {
            println!("✓ {} voices available", voices.len());
            for voice in voices.iter().take(3) {
                // Labels feed the panel's voice menu directly.
                assert!(!voice.label().is_empty());
            }
        }
        Err(e) => println!("⚠ Voice enumeration failed: {}", e),
    }
}

#[test]
fn test_native_playback_through_controller() {
    let engine = match NativeEngine::new() {
        Ok(engine) => engine,
        Err(e) => {
            println!("⚠ Skipping playback test (TTS not available): {}", e);
            return;
        }
    };

    let mut controller = PlaybackController::new(engine);

    // These should not error even if no audio actually plays.
    controller.play(PlaybackRequest::new("Integration test"));
    controller.pump();
    controller.stop();
    controller.reset();

    println!("✓ Native playback smoke test passed");
}

#[test]
fn test_native_unicode_text() {
    let engine = match NativeEngine::new() {
        Ok(engine) => engine,
        Err(e) => {
            println!("⚠ Skipping Unicode test (TTS not available): {}", e);
            return;
        }
    };

    let mut controller = PlaybackController::new(engine);
    controller.play(PlaybackRequest::new("Accents: café naïve, CJK: 世界"));
    controller.stop();

    println!("✓ Unicode playback smoke test passed");
}
