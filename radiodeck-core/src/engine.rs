//! Playback engine abstraction.
//!
//! The session never decodes audio itself. An engine loads one file at a
//! time, reports its duration and plays it from an offset. Positions reported
//! by `position` are relative to the engine's own origin (the last `play` or
//! `resume`), not necessarily absolute within the track; the session corrects
//! for that with a seek offset.

use std::path::Path;
use std::time::Duration;

use crate::error::EngineError;

/// Transport operations the playback session needs from an audio backend
pub trait PlaybackEngine {
    /// Load a file, replacing whatever was loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a supported
    /// audio format.
    fn load(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Duration of the loaded file, zero when unknown
    fn duration(&self) -> Duration;

    /// Start the loaded file at `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is loaded or the audio output fails.
    fn play(&mut self, start: Duration) -> Result<(), EngineError>;

    fn pause(&mut self);

    fn resume(&mut self);

    fn stop(&mut self);

    /// Elapsed playback time since the last `play` or `resume`.
    ///
    /// Engines whose clock carries on through a pause may report time since
    /// the last `play` instead.
    fn position(&self) -> Duration;

    /// Set output volume in `0.0..=1.0`
    fn set_volume(&mut self, volume: f32);

    /// Whether audio is currently being produced
    fn is_busy(&self) -> bool;
}
