use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a [`PlaybackEngine`](crate::engine::PlaybackEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported or corrupt audio file {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("No track is loaded")]
    NothingLoaded,

    #[error("Audio output unavailable: {reason}")]
    Output { reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Playlist errors
    #[error("A playlist named '{name}' already exists")]
    DuplicatePlaylist { name: String },

    #[error("No playlist named '{name}'")]
    PlaylistNotFound { name: String },

    #[error("Invalid playlist name: '{name}'")]
    InvalidPlaylistName { name: String },

    // Playback errors
    #[error("The playlist is empty")]
    EmptyPlaylist,

    #[error("No track is loaded")]
    NoTrackLoaded,

    #[error("Cannot play {path}: {source}")]
    PlaybackLoad {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    // Persistence errors
    #[error("Playlist state JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
