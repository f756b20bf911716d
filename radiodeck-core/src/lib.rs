pub mod config;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod lrc;
pub mod lyrics;
pub mod paths;
pub mod persistence;
pub mod player;
pub mod playlist;
pub mod session;
pub mod status;
pub mod time;

pub use config::{LoggingConfig, LyricsConfig, PlayerConfig, RadiodeckConfig, StorageConfig};
pub use encoding::DecoderChain;
pub use engine::PlaybackEngine;
pub use error::{CoreError, EngineError};
pub use lrc::{LyricLine, LyricTimeline, LyricWindow, WindowLine};
pub use lyrics::LyricsLoader;
pub use paths::{
    config_dir, config_path, log_file_path, playlists_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME,
    LOG_FILE_NAME, PLAYLISTS_FILE_NAME,
};
pub use persistence::PlaylistFile;
pub use player::{Intent, Player, PlayerSnapshot};
pub use playlist::{Playlist, PlaylistStore, DEFAULT_PLAYLIST_NAME};
pub use session::{PlayMode, PlaybackSession, TickOutcome, TransportState};
pub use status::{BroadcastSink, StatusEvent, StatusSink};
pub use time::{format_progress, format_time, DurationExt};
