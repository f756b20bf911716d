//! Named playlists and the active playlist selection.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Reserved name of the fallback playlist that always exists
pub const DEFAULT_PLAYLIST_NAME: &str = "Default";

/// A named, ordered list of track paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub tracks: Vec<PathBuf>,
}

impl Playlist {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tracks: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tracks(mut self, tracks: Vec<PathBuf>) -> Self {
        self.tracks = tracks;
        self
    }

    /// File names of the tracks, for display
    #[must_use]
    pub fn track_names(&self) -> Vec<String> {
        self.tracks.iter().map(|p| display_name(p)).collect()
    }
}

/// Last path component of a track, falling back to the whole path
#[must_use]
pub fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// All playlists, in creation order, plus the active selection.
///
/// The active name always resolves to an existing playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistStore {
    playlists: Vec<Playlist>,
    active: String,
}

impl Default for PlaylistStore {
    fn default() -> Self {
        Self {
            playlists: vec![Playlist::new(DEFAULT_PLAYLIST_NAME)],
            active: DEFAULT_PLAYLIST_NAME.to_string(),
        }
    }
}

impl PlaylistStore {
    /// Build a store from loaded parts, repairing the active selection.
    ///
    /// Later duplicates of a name are dropped. When `active` does not name an
    /// existing playlist the default playlist becomes active, created empty if
    /// it is missing.
    #[must_use]
    pub fn from_parts(playlists: Vec<Playlist>, active: Option<String>) -> Self {
        let mut unique: Vec<Playlist> = Vec::with_capacity(playlists.len());
        for playlist in playlists {
            if !unique.iter().any(|p| p.name == playlist.name) {
                unique.push(playlist);
            }
        }

        let mut store = Self {
            playlists: unique,
            active: active.unwrap_or_else(|| DEFAULT_PLAYLIST_NAME.to_string()),
        };

        if store.position(&store.active).is_none() {
            store.fall_back_to_default();
        }

        store
    }

    /// Playlist names in creation order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.playlists.iter().map(|p| p.name.clone()).collect()
    }

    #[must_use]
    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    #[must_use]
    pub fn active_name(&self) -> &str {
        &self.active
    }

    /// The active playlist
    #[must_use]
    pub fn active(&self) -> Option<&Playlist> {
        self.get(&self.active)
    }

    /// Tracks of the active playlist
    #[must_use]
    pub fn active_tracks(&self) -> &[PathBuf] {
        self.active().map_or(&[], |p| p.tracks.as_slice())
    }

    /// Create a new empty playlist.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPlaylistName` for a blank name and `DuplicatePlaylist`
    /// if the (trimmed) name already exists.
    pub fn create(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidPlaylistName {
                name: name.to_string(),
            });
        }
        if self.contains(name) {
            return Err(CoreError::DuplicatePlaylist {
                name: name.to_string(),
            });
        }

        self.playlists.push(Playlist::new(name));
        Ok(())
    }

    /// Remove a playlist. Removing the active one makes the default active.
    ///
    /// # Errors
    ///
    /// Returns `PlaylistNotFound` if no playlist has this name.
    pub fn remove(&mut self, name: &str) -> Result<Playlist> {
        let idx = self.position_or_err(name)?;
        let removed = self.playlists.remove(idx);

        if removed.name == self.active {
            self.fall_back_to_default();
        }

        Ok(removed)
    }

    /// Make `name` the active playlist.
    ///
    /// # Errors
    ///
    /// Returns `PlaylistNotFound` if no playlist has this name.
    pub fn set_active(&mut self, name: &str) -> Result<()> {
        self.position_or_err(name)?;
        self.active = name.to_string();
        Ok(())
    }

    /// Append tracks to a playlist, keeping order and duplicates.
    ///
    /// # Errors
    ///
    /// Returns `PlaylistNotFound` if no playlist has this name.
    pub fn add_tracks<I>(&mut self, name: &str, paths: I) -> Result<usize>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let idx = self.position_or_err(name)?;
        let tracks = &mut self.playlists[idx].tracks;
        let before = tracks.len();
        tracks.extend(paths);
        Ok(tracks.len() - before)
    }

    /// Remove tracks by index, ignoring indices that are out of range.
    ///
    /// Indices are removed from the highest down so earlier removals do not
    /// shift later ones. Returns the removed indices in ascending order.
    ///
    /// # Errors
    ///
    /// Returns `PlaylistNotFound` if no playlist has this name.
    pub fn remove_tracks(&mut self, name: &str, indices: &[i64]) -> Result<Vec<usize>> {
        let idx = self.position_or_err(name)?;
        let tracks = &mut self.playlists[idx].tracks;

        let valid: BTreeSet<usize> = indices
            .iter()
            .filter_map(|&i| usize::try_from(i).ok())
            .filter(|&i| i < tracks.len())
            .collect();

        for &i in valid.iter().rev() {
            tracks.remove(i);
        }

        Ok(valid.into_iter().collect())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.playlists.iter().position(|p| p.name == name)
    }

    fn position_or_err(&self, name: &str) -> Result<usize> {
        self.position(name).ok_or_else(|| CoreError::PlaylistNotFound {
            name: name.to_string(),
        })
    }

    fn fall_back_to_default(&mut self) {
        if !self.contains(DEFAULT_PLAYLIST_NAME) {
            self.playlists.push(Playlist::new(DEFAULT_PLAYLIST_NAME));
        }
        self.active = DEFAULT_PLAYLIST_NAME.to_string();
    }
}
