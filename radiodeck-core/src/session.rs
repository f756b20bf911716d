//! Playback session: the transport state machine.
//!
//! The session drives a [`PlaybackEngine`] through one track at a time and
//! keeps the displayed elapsed time and the lyric window in step with it. Engines are not assumed to support absolute
//! seeking: after a seek the engine is restarted at the target and the
//! difference between the target and what the engine reports is kept as a
//! signed offset.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::engine::PlaybackEngine;
use crate::error::{CoreError, EngineError, Result};
use crate::lrc::{LyricTimeline, LyricWindow};
use crate::lyrics::LyricsLoader;
use crate::playlist::display_name;
use crate::time::{clamp_millis, format_progress, DurationExt};

/// Auto-advance fires once elapsed time is within this margin of the end
const END_OF_TRACK_MARGIN: Duration = Duration::from_secs(1);

/// Policy for choosing the next track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// Repeat the current track
    SingleLoop,
    /// Play the list in order, wrapping at the end
    #[default]
    ListLoop,
    /// Pick a uniformly random track, repeats allowed
    Random,
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleLoop => write!(f, "single loop"),
            Self::ListLoop => write!(f, "list loop"),
            Self::Random => write!(f, "random"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Playing => write!(f, "playing"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing, or a seek drag is in progress
    Idle,
    /// Elapsed time and lyrics were refreshed
    Progressed,
    /// The track ended and the next one started
    Advanced,
    /// The track ended and there was nothing to advance to
    Ended,
}

#[derive(Debug, Clone)]
struct LoadedTrack {
    path: PathBuf,
    duration: Duration,
}

/// Transport state, elapsed-time model and lyric selection for one engine
pub struct PlaybackSession<E> {
    engine: E,
    lyrics_loader: LyricsLoader,
    rng: StdRng,
    context_lines: usize,

    track_index: usize,
    play_mode: PlayMode,
    state: TransportState,
    loaded: Option<LoadedTrack>,
    elapsed: Duration,
    timeline: LyricTimeline,
    window: LyricWindow,
    is_seeking: bool,
    seek_offset_ms: i64,
    pending_start: Option<Duration>,
    volume: u8,
    /// Where the next advance lands after the list under the current track changed
    next_from: Option<usize>,
}

impl<E: PlaybackEngine> PlaybackSession<E> {
    #[must_use]
    pub fn new(engine: E, lyrics_loader: LyricsLoader) -> Self {
        Self {
            engine,
            lyrics_loader,
            rng: StdRng::from_os_rng(),
            context_lines: 1,
            track_index: 0,
            play_mode: PlayMode::default(),
            state: TransportState::Stopped,
            loaded: None,
            elapsed: Duration::ZERO,
            timeline: LyricTimeline::default(),
            window: LyricWindow::default(),
            is_seeking: false,
            seek_offset_ms: 0,
            pending_start: None,
            volume: 100,
            next_from: None,
        }
    }

    /// Number of lyric lines shown before and after the current one
    #[must_use]
    pub fn with_context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines;
        self
    }

    /// Use a fixed seed for random play mode
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // Accessors

    #[must_use]
    pub fn state(&self) -> TransportState {
        self.state
    }

    #[must_use]
    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    #[must_use]
    pub fn track_index(&self) -> usize {
        self.track_index
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Duration of the loaded track, zero when nothing is loaded
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.loaded.as_ref().map_or(Duration::ZERO, |t| t.duration)
    }

    #[must_use]
    pub fn current_track(&self) -> Option<&Path> {
        self.loaded.as_ref().map(|t| t.path.as_path())
    }

    #[must_use]
    pub fn lyric_window(&self) -> &LyricWindow {
        &self.window
    }

    #[must_use]
    pub fn timeline(&self) -> &LyricTimeline {
        &self.timeline
    }

    #[must_use]
    pub fn is_seeking(&self) -> bool {
        self.is_seeking
    }

    #[must_use]
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// `MM:SS / MM:SS` label for the current position
    #[must_use]
    pub fn progress_label(&self) -> String {
        format_progress(self.elapsed, self.duration())
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[cfg(test)]
    pub(crate) fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    // Transport

    /// Start playback.
    ///
    /// From `Stopped` the track at the current index is loaded and started
    /// from the beginning. From `Paused` this resumes. From `Playing` the
    /// current track restarts.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPlaylist` if `tracks` is empty, or `PlaybackLoad` if the
    /// engine cannot load or start the track.
    pub fn play(&mut self, tracks: &[PathBuf]) -> Result<()> {
        match self.state {
            TransportState::Paused => self.resume(),
            TransportState::Stopped | TransportState::Playing => self.start_track(tracks),
        }
    }

    /// Pause if playing; otherwise nothing happens
    pub fn pause(&mut self) {
        if self.state != TransportState::Playing {
            return;
        }
        self.engine.pause();
        self.state = TransportState::Paused;
        debug!("Paused at {:?}", self.elapsed);
    }

    /// Resume if paused, applying a seek made while paused.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackLoad` if the engine cannot restart at the pending
    /// seek target. The session is stopped in that case.
    pub fn resume(&mut self) -> Result<()> {
        if self.state != TransportState::Paused {
            return Ok(());
        }

        if let Some(start) = self.pending_start.take() {
            self.restart_engine_at(start)?;
        } else {
            self.engine.resume();
            // Engines may count from the resume point
            self.seek_offset_ms =
                self.elapsed.as_millis_i64() - self.engine.position().as_millis_i64();
        }

        self.state = TransportState::Playing;
        debug!("Resumed at {:?}", self.elapsed);
        Ok(())
    }

    /// Stop playback and forget the loaded track
    pub fn stop(&mut self) {
        self.engine.stop();
        self.state = TransportState::Stopped;
        self.loaded = None;
        self.elapsed = Duration::ZERO;
        self.timeline = LyricTimeline::default();
        self.window = LyricWindow::default();
        self.is_seeking = false;
        self.seek_offset_ms = 0;
        self.pending_start = None;
    }

    /// Move to the next track according to the play mode and start it.
    ///
    /// With an empty list the session just stops.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackLoad` if the next track cannot be played.
    pub fn advance(&mut self, tracks: &[PathBuf]) -> Result<()> {
        if tracks.is_empty() {
            self.stop();
            return Ok(());
        }

        self.track_index = self.next_index(tracks.len());
        self.stop();
        self.start_track(tracks)
    }

    /// User-requested skip; same selection rules as auto-advance.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackLoad` if the next track cannot be played.
    pub fn next(&mut self, tracks: &[PathBuf]) -> Result<()> {
        self.advance(tracks)
    }

    /// Jump to `target` within the loaded track.
    ///
    /// While playing the engine restarts at the target immediately; while
    /// paused the target is applied on resume. The displayed time and lyric
    /// window move to the target right away.
    ///
    /// # Errors
    ///
    /// Returns `NoTrackLoaded` if nothing is loaded, or `PlaybackLoad` if the
    /// engine cannot restart.
    pub fn seek(&mut self, target: Duration) -> Result<()> {
        let Some(duration) = self.loaded.as_ref().map(|t| t.duration) else {
            return Err(CoreError::NoTrackLoaded);
        };
        let target = clamp_to_track(target, duration);

        if self.state == TransportState::Playing {
            self.restart_engine_at(target)?;
        } else {
            self.pending_start = Some(target);
        }

        self.elapsed = target;
        self.refresh_window();
        debug!("Seeked to {:?}", target);
        Ok(())
    }

    /// Start a seek drag. Ticks leave the displayed time alone until it ends.
    pub fn begin_seek(&mut self) {
        if self.loaded.is_some() {
            self.is_seeking = true;
        }
    }

    /// Show `target` while dragging without touching the engine
    pub fn preview_seek(&mut self, target: Duration) {
        if !self.is_seeking {
            return;
        }
        self.elapsed = clamp_to_track(target, self.duration());
        self.refresh_window();
    }

    /// Finish a seek drag at `target`.
    ///
    /// # Errors
    ///
    /// Same as [`seek`](Self::seek).
    pub fn end_seek(&mut self, target: Duration) -> Result<()> {
        self.is_seeking = false;
        self.seek(target)
    }

    /// Refresh elapsed time and lyrics, auto-advancing at the end of a track.
    ///
    /// Advancing reloads, which resets elapsed time, so the end of one track
    /// triggers a single advance.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackLoad` if auto-advance could not start the next track.
    /// The session is stopped and later ticks do nothing.
    pub fn tick(&mut self, tracks: &[PathBuf]) -> Result<TickOutcome> {
        if self.state != TransportState::Playing || self.is_seeking {
            return Ok(TickOutcome::Idle);
        }
        let Some(duration) = self.loaded.as_ref().map(|t| t.duration) else {
            return Ok(TickOutcome::Idle);
        };

        let millis = self.engine.position().as_millis_i64() + self.seek_offset_ms;
        self.elapsed = clamp_to_track(
            Duration::from_millis(u64::try_from(millis.max(0)).unwrap_or(0)),
            duration,
        );
        self.refresh_window();

        if !self.track_finished(duration) {
            return Ok(TickOutcome::Progressed);
        }

        debug!("Track finished at {:?}, advancing", self.elapsed);
        self.advance(tracks)?;

        Ok(if self.state == TransportState::Playing {
            TickOutcome::Advanced
        } else {
            TickOutcome::Ended
        })
    }

    /// Set the volume in percent, capped at 100
    pub fn set_volume(&mut self, percent: u8) {
        self.volume = percent.min(100);
        self.engine.set_volume(f32::from(self.volume) / 100.0);
    }

    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.play_mode = mode;
    }

    /// Keep the track index inside a list of `len` tracks
    pub fn clamp_index(&mut self, len: usize) {
        self.track_index = self.track_index.min(len.saturating_sub(1));
    }

    /// Point at the top of a new list; the next advance plays its first track
    pub fn reset_index(&mut self) {
        self.track_index = 0;
        self.next_from = Some(0);
    }

    /// Follow the current track after `removed` (ascending, pre-removal
    /// indices) were taken out of the list, leaving `len` tracks.
    ///
    /// When the current track itself was removed, the next advance plays the
    /// track that moved into its slot.
    pub fn tracks_removed(&mut self, removed: &[usize], len: usize) {
        let below = removed.partition_point(|&i| i < self.track_index);
        let current_removed = removed.binary_search(&self.track_index).is_ok();
        self.track_index -= below;

        if current_removed && self.loaded.is_some() {
            let slot = if self.track_index < len {
                self.track_index
            } else {
                0
            };
            self.next_from = Some(slot);
        }
        self.clamp_index(len);
    }

    // Internals

    fn start_track(&mut self, tracks: &[PathBuf]) -> Result<()> {
        if tracks.is_empty() {
            return Err(CoreError::EmptyPlaylist);
        }

        self.clamp_index(tracks.len());
        self.next_from = None;
        let path = tracks[self.track_index].clone();

        // Whatever was loaded goes away, even if the new track fails
        self.stop();

        if let Err(source) = self.engine.load(&path) {
            return Err(self.load_failed(path, source));
        }

        let duration = self.engine.duration();
        self.timeline = self.lyrics_loader.load_for(&path);
        self.loaded = Some(LoadedTrack {
            path: path.clone(),
            duration,
        });
        self.refresh_window();

        if let Err(source) = self.engine.play(Duration::ZERO) {
            return Err(self.load_failed(path, source));
        }

        self.state = TransportState::Playing;
        info!(
            "Playing {} ({}/{}, {} lyric lines)",
            display_name(&path),
            self.track_index + 1,
            tracks.len(),
            self.timeline.len()
        );
        Ok(())
    }

    fn restart_engine_at(&mut self, start: Duration) -> Result<()> {
        if let Err(source) = self.engine.play(start) {
            let path = self
                .loaded
                .as_ref()
                .map(|t| t.path.clone())
                .unwrap_or_default();
            return Err(self.load_failed(path, source));
        }

        self.seek_offset_ms = start.as_millis_i64() - self.engine.position().as_millis_i64();
        Ok(())
    }

    fn load_failed(&mut self, path: PathBuf, source: EngineError) -> CoreError {
        warn!("Cannot play {:?}: {}", path, source);
        self.stop();
        CoreError::PlaybackLoad { path, source }
    }

    fn next_index(&mut self, len: usize) -> usize {
        if let Some(index) = self.next_from.take() {
            return index.min(len - 1);
        }
        match self.play_mode {
            PlayMode::SingleLoop => self.track_index.min(len - 1),
            PlayMode::ListLoop => (self.track_index + 1) % len,
            PlayMode::Random => self.rng.random_range(0..len),
        }
    }

    fn track_finished(&self, duration: Duration) -> bool {
        let near_end = !duration.is_zero() && self.elapsed + END_OF_TRACK_MARGIN >= duration;
        near_end || !self.engine.is_busy()
    }

    fn refresh_window(&mut self) {
        self.window = self
            .timeline
            .window(self.elapsed, self.context_lines, self.context_lines);
    }
}

/// Clamp to `[0, duration]`; an unknown (zero) duration does not cap
fn clamp_to_track(target: Duration, duration: Duration) -> Duration {
    if duration.is_zero() {
        target
    } else {
        clamp_millis(target.as_millis_i64(), duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::FakeEngine;
    use std::fs;

    fn tracks() -> Vec<PathBuf> {
        vec![
            PathBuf::from("/m/a.mp3"),
            PathBuf::from("/m/b.mp3"),
            PathBuf::from("/m/c.mp3"),
        ]
    }

    fn engine() -> FakeEngine {
        FakeEngine::default()
            .with_track("/m/a.mp3", 180)
            .with_track("/m/b.mp3", 200)
            .with_track("/m/c.mp3", 10)
    }

    fn session(engine: FakeEngine) -> PlaybackSession<FakeEngine> {
        PlaybackSession::new(engine, LyricsLoader::default()).with_seed(7)
    }

    #[test]
    fn test_play_from_stopped() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();

        assert_eq!(s.state(), TransportState::Playing);
        assert_eq!(s.current_track(), Some(Path::new("/m/a.mp3")));
        assert_eq!(s.duration(), Duration::from_secs(180));
        assert_eq!(s.elapsed(), Duration::ZERO);
        assert_eq!(s.engine().plays, vec![Duration::ZERO]);
    }

    #[test]
    fn test_play_empty_list() {
        let mut s = session(engine());
        let err = s.play(&[]).unwrap_err();

        assert!(matches!(err, CoreError::EmptyPlaylist));
        assert_eq!(s.state(), TransportState::Stopped);
        assert!(s.engine().loads.is_empty());
    }

    #[test]
    fn test_play_clamps_stale_index() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.next(&tracks()).unwrap();
        s.next(&tracks()).unwrap();
        assert_eq!(s.track_index(), 2);
        s.stop();

        let shorter = &tracks()[..1];
        s.play(shorter).unwrap();
        assert_eq!(s.track_index(), 0);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut s = session(engine());
        s.pause();
        assert_eq!(s.state(), TransportState::Stopped);

        s.play(&tracks()).unwrap();
        s.engine_mut().position = Duration::from_secs(42);
        s.tick(&tracks()).unwrap();
        s.pause();
        assert_eq!(s.state(), TransportState::Paused);
        assert!(s.engine().paused);
        assert_eq!(s.elapsed(), Duration::from_secs(42));

        s.resume().unwrap();
        assert_eq!(s.state(), TransportState::Playing);
        assert!(!s.engine().paused);
        // No restart on a plain resume
        assert_eq!(s.engine().plays.len(), 1);
    }

    #[test]
    fn test_resume_keeps_elapsed_when_engine_clock_restarts() {
        let mut fake = engine();
        fake.resume_restarts_clock = true;
        let mut s = session(fake);
        s.play(&tracks()).unwrap();
        s.engine_mut().position = Duration::from_secs(42);
        s.tick(&tracks()).unwrap();
        s.pause();

        s.resume().unwrap();
        s.tick(&tracks()).unwrap();
        assert_eq!(s.elapsed(), Duration::from_secs(42));

        s.engine_mut().position = Duration::from_secs(1);
        s.tick(&tracks()).unwrap();
        assert_eq!(s.elapsed(), Duration::from_secs(43));
    }

    #[test]
    fn test_resume_with_continuous_engine_clock() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.seek(Duration::from_secs(100)).unwrap();
        s.engine_mut().position = Duration::from_secs(4);
        s.tick(&tracks()).unwrap();
        s.pause();

        s.resume().unwrap();
        s.engine_mut().position = Duration::from_secs(6);
        s.tick(&tracks()).unwrap();
        assert_eq!(s.elapsed(), Duration::from_secs(106));
    }

    #[test]
    fn test_play_while_paused_resumes() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.pause();
        s.play(&tracks()).unwrap();

        assert_eq!(s.state(), TransportState::Playing);
        assert_eq!(s.engine().loads.len(), 1);
    }

    #[test]
    fn test_play_while_playing_restarts() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.engine_mut().position = Duration::from_secs(30);
        s.tick(&tracks()).unwrap();

        s.play(&tracks()).unwrap();
        assert_eq!(s.engine().loads.len(), 2);
        assert_eq!(s.elapsed(), Duration::ZERO);
        assert_eq!(s.track_index(), 0);
    }

    #[test]
    fn test_stop_resets() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.engine_mut().position = Duration::from_secs(5);
        s.tick(&tracks()).unwrap();

        s.stop();
        assert_eq!(s.state(), TransportState::Stopped);
        assert_eq!(s.elapsed(), Duration::ZERO);
        assert!(s.lyric_window().is_empty());
        assert!(s.current_track().is_none());
        assert!(matches!(
            s.seek(Duration::from_secs(1)),
            Err(CoreError::NoTrackLoaded)
        ));
    }

    #[test]
    fn test_advance_list_loop_wraps() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.next(&tracks()).unwrap();
        s.next(&tracks()).unwrap();
        assert_eq!(s.track_index(), 2);

        s.advance(&tracks()).unwrap();
        assert_eq!(s.track_index(), 0);
        assert_eq!(s.current_track(), Some(Path::new("/m/a.mp3")));
    }

    #[test]
    fn test_advance_single_loop_keeps_index() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.next(&tracks()).unwrap();
        s.next(&tracks()).unwrap();
        s.set_play_mode(PlayMode::SingleLoop);

        s.advance(&tracks()).unwrap();
        assert_eq!(s.track_index(), 2);
        assert_eq!(s.engine().loads.len(), 4);
    }

    #[test]
    fn test_advance_random_stays_in_range() {
        let mut s = session(engine());
        s.set_play_mode(PlayMode::Random);
        s.play(&tracks()).unwrap();

        for _ in 0..50 {
            s.advance(&tracks()).unwrap();
            assert!(s.track_index() < 3);
            assert_eq!(s.state(), TransportState::Playing);
        }
    }

    #[test]
    fn test_advance_empty_list_stops() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();

        s.advance(&[]).unwrap();
        assert_eq!(s.state(), TransportState::Stopped);
        assert_eq!(s.engine().loads.len(), 1);
    }

    #[test]
    fn test_seek_while_playing_shows_target_immediately() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.engine_mut().position = Duration::from_secs(10);
        s.tick(&tracks()).unwrap();

        s.seek(Duration::from_secs(60)).unwrap();
        assert_eq!(s.elapsed(), Duration::from_secs(60));
        assert_eq!(s.engine().plays.last(), Some(&Duration::from_secs(60)));

        // Engine restarted counting from zero; the offset makes up for it
        s.tick(&tracks()).unwrap();
        assert_eq!(s.elapsed(), Duration::from_secs(60));

        s.engine_mut().position = Duration::from_secs(5);
        s.tick(&tracks()).unwrap();
        assert_eq!(s.elapsed(), Duration::from_secs(65));
    }

    #[test]
    fn test_seek_with_absolute_engine_positions() {
        let mut fake = engine();
        fake.absolute_positions = true;
        let mut s = session(fake);
        s.play(&tracks()).unwrap();

        s.seek(Duration::from_secs(60)).unwrap();
        s.tick(&tracks()).unwrap();
        assert_eq!(s.elapsed(), Duration::from_secs(60));

        s.engine_mut().position = Duration::from_secs(61);
        s.tick(&tracks()).unwrap();
        assert_eq!(s.elapsed(), Duration::from_secs(61));
    }

    #[test]
    fn test_seek_clamps_to_duration() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();

        s.seek(Duration::from_secs(1000)).unwrap();
        assert_eq!(s.elapsed(), Duration::from_secs(180));
    }

    #[test]
    fn test_seek_while_paused_applies_on_resume() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.pause();

        s.seek(Duration::from_secs(90)).unwrap();
        assert_eq!(s.elapsed(), Duration::from_secs(90));
        // Engine untouched until resume
        assert_eq!(s.engine().plays, vec![Duration::ZERO]);

        s.resume().unwrap();
        assert_eq!(s.engine().plays.last(), Some(&Duration::from_secs(90)));
        s.engine_mut().position = Duration::from_secs(2);
        s.tick(&tracks()).unwrap();
        assert_eq!(s.elapsed(), Duration::from_secs(92));
    }

    #[test]
    fn test_seek_drag_suppresses_ticks() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();

        s.begin_seek();
        s.preview_seek(Duration::from_secs(100));
        assert_eq!(s.elapsed(), Duration::from_secs(100));
        assert_eq!(s.engine().plays.len(), 1);

        s.engine_mut().position = Duration::from_secs(3);
        assert_eq!(s.tick(&tracks()).unwrap(), TickOutcome::Idle);
        assert_eq!(s.elapsed(), Duration::from_secs(100));

        s.end_seek(Duration::from_secs(120)).unwrap();
        assert!(!s.is_seeking());
        assert_eq!(s.elapsed(), Duration::from_secs(120));
        assert_eq!(s.engine().plays.last(), Some(&Duration::from_secs(120)));
    }

    #[test]
    fn test_preview_without_drag_is_ignored() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.preview_seek(Duration::from_secs(50));
        assert_eq!(s.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_tick_clamps_elapsed() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.engine_mut().position = Duration::from_secs(500);

        // Past the end, so this also advances; elapsed was clamped first
        assert_eq!(s.tick(&tracks()).unwrap(), TickOutcome::Advanced);
        assert_eq!(s.track_index(), 1);
    }

    #[test]
    fn test_tick_idle_when_not_playing() {
        let mut s = session(engine());
        assert_eq!(s.tick(&tracks()).unwrap(), TickOutcome::Idle);

        s.play(&tracks()).unwrap();
        s.pause();
        assert_eq!(s.tick(&tracks()).unwrap(), TickOutcome::Idle);
    }

    #[test]
    fn test_auto_advance_fires_once() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();

        s.engine_mut().position = Duration::from_millis(178_900);
        assert_eq!(s.tick(&tracks()).unwrap(), TickOutcome::Progressed);

        s.engine_mut().position = Duration::from_secs(179);
        assert_eq!(s.tick(&tracks()).unwrap(), TickOutcome::Advanced);
        assert_eq!(s.track_index(), 1);
        assert_eq!(s.engine().loads.len(), 2);

        for _ in 0..3 {
            assert_eq!(s.tick(&tracks()).unwrap(), TickOutcome::Progressed);
        }
        assert_eq!(s.engine().loads.len(), 2);
    }

    #[test]
    fn test_auto_advance_when_engine_finishes_early() {
        let fake = FakeEngine::default().with_track("/m/b.mp3", 200);
        let mut s = session(fake);
        // a.mp3 has no known duration
        s.play(&tracks()).unwrap();
        assert_eq!(s.duration(), Duration::ZERO);

        s.engine_mut().position = Duration::from_secs(30);
        assert_eq!(s.tick(&tracks()).unwrap(), TickOutcome::Progressed);
        assert_eq!(s.elapsed(), Duration::from_secs(30));

        s.engine_mut().finished = true;
        assert_eq!(s.tick(&tracks()).unwrap(), TickOutcome::Advanced);
        assert_eq!(s.current_track(), Some(Path::new("/m/b.mp3")));
    }

    #[test]
    fn test_load_failure_stops_without_advancing() {
        let fake = engine().with_broken("/m/b.mp3");
        let mut s = session(fake);
        s.play(&tracks()).unwrap();

        s.engine_mut().position = Duration::from_secs(180);
        let err = s.tick(&tracks()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::PlaybackLoad { ref path, .. } if path == Path::new("/m/b.mp3")
        ));
        assert_eq!(s.state(), TransportState::Stopped);
        assert!(s.current_track().is_none());

        for _ in 0..3 {
            assert_eq!(s.tick(&tracks()).unwrap(), TickOutcome::Idle);
        }
        assert_eq!(s.engine().loads.len(), 2);
    }

    #[test]
    fn test_play_broken_track() {
        let fake = engine().with_broken("/m/a.mp3");
        let mut s = session(fake);

        assert!(matches!(
            s.play(&tracks()),
            Err(CoreError::PlaybackLoad { .. })
        ));
        assert_eq!(s.state(), TransportState::Stopped);
        assert!(s.engine().plays.is_empty());
    }

    #[test]
    fn test_lyric_window_follows_position() {
        let dir = tempfile::tempdir().unwrap();
        let track = dir.path().join("song.mp3");
        fs::write(
            dir.path().join("song.lrc"),
            "[00:01.00]one\n[00:05.00]two\n[00:09.00]three\n",
        )
        .unwrap();
        let tracks = vec![track.clone()];
        let mut fake = FakeEngine::default();
        fake.durations.insert(track, Duration::from_secs(60));
        let mut s = session(fake);

        s.play(&tracks).unwrap();
        // Before the first timestamp the first line is selected
        assert_eq!(s.lyric_window().highlighted(), Some("one"));

        s.engine_mut().position = Duration::from_secs(6);
        s.tick(&tracks).unwrap();
        let texts: Vec<&str> = s
            .lyric_window()
            .lines
            .iter()
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(s.lyric_window().highlighted(), Some("two"));

        s.seek(Duration::from_secs(10)).unwrap();
        assert_eq!(s.lyric_window().highlighted(), Some("three"));
    }

    #[test]
    fn test_set_volume() {
        let mut s = session(engine());
        s.set_volume(40);
        assert_eq!(s.volume(), 40);
        assert!((s.engine().volume - 0.4).abs() < f32::EPSILON);

        s.set_volume(250);
        assert_eq!(s.volume(), 100);
    }

    #[test]
    fn test_clamp_and_reset_index() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.next(&tracks()).unwrap();
        s.next(&tracks()).unwrap();

        s.clamp_index(2);
        assert_eq!(s.track_index(), 1);
        s.clamp_index(0);
        assert_eq!(s.track_index(), 0);

        s.next(&tracks()).unwrap();
        s.reset_index();
        assert_eq!(s.track_index(), 0);
    }

    #[test]
    fn test_reset_index_makes_next_advance_start_new_list() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.reset_index();

        let switched = vec![PathBuf::from("/n/x.mp3"), PathBuf::from("/n/y.mp3")];
        s.engine_mut().position = Duration::from_secs(180);
        assert_eq!(s.tick(&switched).unwrap(), TickOutcome::Advanced);
        assert_eq!(s.current_track(), Some(Path::new("/n/x.mp3")));

        s.advance(&switched).unwrap();
        assert_eq!(s.current_track(), Some(Path::new("/n/y.mp3")));
    }

    #[test]
    fn test_reset_index_on_same_list_replays_from_top() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.next(&tracks()).unwrap();
        s.reset_index();

        s.next(&tracks()).unwrap();
        assert_eq!(s.current_track(), Some(Path::new("/m/a.mp3")));
    }

    #[test]
    fn test_removing_earlier_track_follows_current() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.next(&tracks()).unwrap();

        // [a, b, c] playing b, a removed
        s.tracks_removed(&[0], 2);
        assert_eq!(s.track_index(), 0);

        let remaining = vec![PathBuf::from("/m/b.mp3"), PathBuf::from("/m/c.mp3")];
        s.advance(&remaining).unwrap();
        assert_eq!(s.current_track(), Some(Path::new("/m/c.mp3")));
    }

    #[test]
    fn test_removing_current_track_plays_its_successor() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.next(&tracks()).unwrap();

        s.tracks_removed(&[1], 2);
        let remaining = vec![PathBuf::from("/m/a.mp3"), PathBuf::from("/m/c.mp3")];
        s.advance(&remaining).unwrap();
        assert_eq!(s.current_track(), Some(Path::new("/m/c.mp3")));
    }

    #[test]
    fn test_removing_current_last_track_wraps() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.next(&tracks()).unwrap();
        s.next(&tracks()).unwrap();

        s.tracks_removed(&[2], 2);
        assert_eq!(s.track_index(), 1);
        let remaining = &tracks()[..2];
        s.advance(remaining).unwrap();
        assert_eq!(s.current_track(), Some(Path::new("/m/a.mp3")));
    }

    #[test]
    fn test_progress_label() {
        let mut s = session(engine());
        s.play(&tracks()).unwrap();
        s.engine_mut().position = Duration::from_secs(65);
        s.tick(&tracks()).unwrap();

        assert_eq!(s.progress_label(), "01:05 / 03:00");
    }

    #[test]
    fn test_play_mode_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: PlayMode,
        }

        let parsed: Wrapper = toml::from_str(r#"mode = "single_loop""#).unwrap();
        assert_eq!(parsed.mode, PlayMode::SingleLoop);
        assert_eq!(PlayMode::default(), PlayMode::ListLoop);
    }
}
