//! The player: applies user intents to the playlist store and the playback
//! session, persists every store change and publishes status events.

use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::engine::PlaybackEngine;
use crate::error::{CoreError, Result};
use crate::lrc::LyricWindow;
use crate::persistence::PlaylistFile;
use crate::playlist::{display_name, PlaylistStore};
use crate::session::{PlayMode, PlaybackSession, TickOutcome, TransportState};
use crate::status::{StatusEvent, StatusSink};

/// A command coming from a front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Play,
    Pause,
    Resume,
    Stop,
    Next,
    Seek(Duration),
    BeginSeek,
    PreviewSeek(Duration),
    EndSeek(Duration),
    /// Volume in percent; values above 100 are capped
    SetVolume(u8),
    SetPlayMode(PlayMode),
    SwitchPlaylist(String),
    CreatePlaylist(String),
    RemovePlaylist(String),
    /// Append files to the active playlist
    AddTracks(Vec<PathBuf>),
    /// Remove tracks from the active playlist by index
    RemoveTracks(Vec<i64>),
}

/// Everything a front end needs to draw the player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub playlists: Vec<String>,
    pub active_playlist: String,
    pub tracks: Vec<String>,
    pub state: TransportState,
    pub play_mode: PlayMode,
    pub track_index: usize,
    pub current_track: Option<PathBuf>,
    pub elapsed: Duration,
    pub duration: Duration,
    pub time_label: String,
    pub lyrics: LyricWindow,
    pub volume: u8,
}

pub struct Player<E> {
    store: PlaylistStore,
    file: PlaylistFile,
    session: PlaybackSession<E>,
    sink: Option<Box<dyn StatusSink>>,
}

impl<E: PlaybackEngine> Player<E> {
    /// Create a player, loading the playlist store from `file`
    #[must_use]
    pub fn new(file: PlaylistFile, session: PlaybackSession<E>) -> Self {
        let store = file.load();
        Self {
            store,
            file,
            session,
            sink: None,
        }
    }

    /// Attach a status sink
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn StatusSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn store(&self) -> &PlaylistStore {
        &self.store
    }

    #[must_use]
    pub fn session(&self) -> &PlaybackSession<E> {
        &self.session
    }

    /// Apply one intent.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason: unknown or duplicate playlist names,
    /// an empty playlist, no loaded track for a seek, or a track the engine
    /// could not play. Failed saves are logged, not returned.
    pub fn handle(&mut self, intent: Intent) -> Result<()> {
        debug!("Handling intent {:?}", intent);
        let result = self.apply(intent);
        if let Err(e) = &result {
            self.report(e);
        }
        result
    }

    /// Advance the clock: refresh progress and auto-advance at the end of a
    /// track.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackLoad` if the next track could not be started.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        let outcome = match self.session.tick(self.store.active_tracks()) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };

        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::Progressed => self.publish_progress(),
            TickOutcome::Advanced => {
                self.publish_track_started();
                self.publish_progress();
            }
            TickOutcome::Ended => {
                self.publish_transport();
                self.publish_progress();
            }
        }

        Ok(outcome)
    }

    /// Current state for polling front ends
    #[must_use]
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            playlists: self.store.names(),
            active_playlist: self.store.active_name().to_string(),
            tracks: self.active_track_names(),
            state: self.session.state(),
            play_mode: self.session.play_mode(),
            track_index: self.session.track_index(),
            current_track: self.session.current_track().map(PathBuf::from),
            elapsed: self.session.elapsed(),
            duration: self.session.duration(),
            time_label: self.session.progress_label(),
            lyrics: self.session.lyric_window().clone(),
            volume: self.session.volume(),
        }
    }

    fn apply(&mut self, intent: Intent) -> Result<()> {
        match intent {
            Intent::Play => {
                let resuming = self.session.state() == TransportState::Paused;
                self.session.play(self.store.active_tracks())?;
                if !resuming {
                    self.publish_track_started();
                }
                self.publish_transport();
                self.publish_progress();
            }
            Intent::Pause => {
                self.session.pause();
                self.publish_transport();
            }
            Intent::Resume => {
                self.session.resume()?;
                self.publish_transport();
            }
            Intent::Stop => {
                self.session.stop();
                self.publish_transport();
                self.publish_progress();
            }
            Intent::Next => {
                self.session.next(self.store.active_tracks())?;
                if self.session.state() == TransportState::Playing {
                    self.publish_track_started();
                }
                self.publish_transport();
                self.publish_progress();
            }
            Intent::Seek(target) => {
                self.session.seek(target)?;
                self.publish_progress();
            }
            Intent::BeginSeek => self.session.begin_seek(),
            Intent::PreviewSeek(target) => {
                self.session.preview_seek(target);
                self.publish_progress();
            }
            Intent::EndSeek(target) => {
                self.session.end_seek(target)?;
                self.publish_progress();
            }
            Intent::SetVolume(percent) => {
                self.session.set_volume(percent);
                self.publish(StatusEvent::VolumeChanged {
                    percent: self.session.volume(),
                });
            }
            Intent::SetPlayMode(mode) => {
                self.session.set_play_mode(mode);
                info!("Play mode set to {}", mode);
                self.publish(StatusEvent::PlayModeChanged { mode });
            }
            Intent::SwitchPlaylist(name) => {
                self.store.set_active(&name)?;
                // The current track keeps playing; the next one is the new list's first
                self.session.reset_index();
                info!("Switched to playlist '{}'", name);
                self.persist();
            }
            Intent::CreatePlaylist(name) => {
                self.store.create(&name)?;
                info!("Created playlist '{}'", name.trim());
                self.persist();
            }
            Intent::RemovePlaylist(name) => {
                let was_active = self.store.active_name() == name;
                self.store.remove(&name)?;
                if was_active {
                    self.session.reset_index();
                }
                info!("Removed playlist '{}'", name);
                self.persist();
            }
            Intent::AddTracks(paths) => {
                let active = self.store.active_name().to_string();
                let added = self.store.add_tracks(&active, paths)?;
                info!("Added {} track(s) to '{}'", added, active);
                self.persist();
            }
            Intent::RemoveTracks(indices) => {
                let active = self.store.active_name().to_string();
                let removed = self.store.remove_tracks(&active, &indices)?;
                self.session
                    .tracks_removed(&removed, self.store.active_tracks().len());
                info!("Removed {} track(s) from '{}'", removed.len(), active);
                self.persist();
            }
        }

        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = self.file.save(&self.store) {
            warn!("Failed to save playlists to {:?}: {}", self.file.path(), e);
        }
        self.publish(StatusEvent::PlaylistsChanged {
            names: self.store.names(),
            active: self.store.active_name().to_string(),
            tracks: self.active_track_names(),
        });
    }

    fn report(&self, error: &CoreError) {
        match error {
            CoreError::EmptyPlaylist => self.notice(format!(
                "Playlist '{}' is empty, add some tracks first",
                self.store.active_name()
            )),
            CoreError::PlaybackLoad { path, source } => {
                self.notice(format!("Cannot play {}: {}", display_name(path), source));
                self.publish_transport();
            }
            _ => {}
        }
    }

    fn active_track_names(&self) -> Vec<String> {
        self.store
            .active()
            .map(crate::playlist::Playlist::track_names)
            .unwrap_or_default()
    }

    fn notice(&self, message: String) {
        self.publish(StatusEvent::Notice { message });
    }

    fn publish_track_started(&self) {
        if let Some(path) = self.session.current_track() {
            self.publish(StatusEvent::TrackStarted {
                index: self.session.track_index(),
                path: path.to_path_buf(),
                duration: self.session.duration(),
            });
        }
    }

    fn publish_transport(&self) {
        self.publish(StatusEvent::TransportChanged {
            state: self.session.state(),
        });
    }

    fn publish_progress(&self) {
        self.publish(StatusEvent::Progress {
            elapsed: self.session.elapsed(),
            duration: self.session.duration(),
            label: self.session.progress_label(),
            lyrics: self.session.lyric_window().clone(),
        });
    }

    fn publish(&self, event: StatusEvent) {
        if let Some(sink) = &self.sink {
            sink.publish(event);
        }
    }
}
