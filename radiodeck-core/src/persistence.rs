//! Durable storage of the playlist store as a JSON document.
//!
//! File format:
//!
//! ```json
//! {
//!   "playlists": { "Default": ["/music/a.mp3"], "Chill": [] },
//!   "current_playlist_name": "Default"
//! }
//! ```
//!
//! Playlist order in the document is preserved.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::playlist::{Playlist, PlaylistStore};

/// On-disk shape of the playlist state
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    playlists: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_playlist_name: Option<String>,
}

impl PersistedState {
    fn from_store(store: &PlaylistStore) -> Result<Self> {
        let mut playlists = Map::new();
        for playlist in store.playlists() {
            playlists.insert(playlist.name.clone(), serde_json::to_value(&playlist.tracks)?);
        }

        Ok(Self {
            playlists: Some(playlists),
            current_playlist_name: Some(store.active_name().to_string()),
        })
    }

    fn into_store(self) -> Result<PlaylistStore> {
        let Some(map) = self.playlists else {
            return Ok(PlaylistStore::from_parts(Vec::new(), self.current_playlist_name));
        };

        let mut playlists = Vec::with_capacity(map.len());
        for (name, tracks) in map {
            let tracks: Vec<PathBuf> = serde_json::from_value(tracks)?;
            playlists.push(Playlist::new(name).with_tracks(tracks));
        }

        Ok(PlaylistStore::from_parts(
            playlists,
            self.current_playlist_name,
        ))
    }
}

/// Persistence gateway for a playlist state file
#[derive(Debug, Clone)]
pub struct PlaylistFile {
    path: PathBuf,
}

impl PlaylistFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Gateway at the default location (`~/.config/radiodeck/playlists.json`)
    #[must_use]
    pub fn at_default_location() -> Self {
        Self::new(crate::paths::playlists_path())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the store, never failing.
    ///
    /// A missing file is created with the default store. A file that cannot
    /// be read or parsed is left untouched and the default store is returned.
    #[must_use]
    pub fn load(&self) -> PlaylistStore {
        if !self.path.exists() {
            info!("No playlist file at {:?}, creating one", self.path);
            let store = PlaylistStore::default();
            if let Err(e) = self.save(&store) {
                warn!("Failed to create playlist file {:?}: {}", self.path, e);
            }
            return store;
        }

        match self.read() {
            Ok(store) => {
                info!(
                    "Loaded {} playlist(s) from {:?}",
                    store.playlists().len(),
                    self.path
                );
                store
            }
            Err(e) => {
                warn!(
                    "Failed to load playlist file {:?}, using defaults: {}",
                    self.path, e
                );
                PlaylistStore::default()
            }
        }
    }

    fn read(&self) -> Result<PlaylistStore> {
        let content = fs::read_to_string(&self.path)?;
        let state: PersistedState = serde_json::from_str(&content)?;
        state.into_store()
    }

    /// Write the full store.
    ///
    /// The document goes to a sibling temporary file first and is then
    /// renamed over the target, so a failed write keeps the previous file.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be serialized or written.
    pub fn save(&self, store: &PlaylistStore) -> Result<()> {
        let state = PersistedState::from_store(store)?;
        let content = serde_json::to_string_pretty(&state)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, content)?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!("Saved playlist state to {:?}", self.path);
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
