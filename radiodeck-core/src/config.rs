use crate::encoding::{DecoderChain, DEFAULT_ENCODING_LABELS};
use crate::error::{CoreError, Result};
use crate::lyrics::{LyricsLoader, DEFAULT_LYRIC_EXTENSIONS};
use crate::session::PlayMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Upper bound for `lyrics.context_lines`
pub const MAX_CONTEXT_LINES: usize = 10;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadiodeckConfig {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub lyrics: LyricsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Initial volume in percent
    #[serde(default = "default_volume")]
    pub volume: u8,
    #[serde(default)]
    pub play_mode: PlayMode,
}

const fn default_tick_interval() -> u64 {
    1000
}

const fn default_volume() -> u8 {
    50
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            volume: default_volume(),
            play_mode: PlayMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsConfig {
    /// Lyric file extensions, tried in order
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Text encodings, tried in order; the first clean decode with timed
    /// lines wins
    #[serde(default = "default_encodings")]
    pub encodings: Vec<String>,
    /// Lines shown before and after the current line
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
}

fn default_extensions() -> Vec<String> {
    DEFAULT_LYRIC_EXTENSIONS.iter().map(ToString::to_string).collect()
}

fn default_encodings() -> Vec<String> {
    DEFAULT_ENCODING_LABELS.iter().map(ToString::to_string).collect()
}

const fn default_context_lines() -> usize {
    1
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            encodings: default_encodings(),
            context_lines: default_context_lines(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Overrides the default playlist state location
    pub playlists_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to a file in the cache directory
    #[serde(default)]
    pub enabled: bool,
}

impl RadiodeckConfig {
    /// Get the config file path (~/.config/radiodeck/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default location, writing a template on first run
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read, parsed or fails
    /// validation.
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&Self::config_path())
    }

    /// Load config from `path`, writing a template there if it is missing.
    ///
    /// A freshly written template yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, written, parsed or fails
    /// validation.
    pub fn load_or_create_at(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, CONFIG_TEMPLATE)?;
            info!("Wrote config template to {:?}", path);

            return Ok(Self::default());
        }

        Self::load_from(path)
    }

    /// Load and validate an existing config file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or fails
    /// validation.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate config text
    ///
    /// # Errors
    ///
    /// Returns `ConfigParseError` for malformed TOML and `ConfigInvalid` for
    /// out-of-range values.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.player.volume > 100 {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "player.volume must be between 0 and 100, got {}",
                    self.player.volume
                ),
            });
        }
        if self.player.tick_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "player.tick_interval_ms must be greater than 0".to_string(),
            });
        }
        if self.lyrics.context_lines > MAX_CONTEXT_LINES {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "lyrics.context_lines must be at most {MAX_CONTEXT_LINES}, got {}",
                    self.lyrics.context_lines
                ),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.player.tick_interval_ms)
    }

    /// Playlist state file, honouring `storage.playlists_file`
    #[must_use]
    pub fn playlists_file(&self) -> PathBuf {
        self.storage
            .playlists_file
            .clone()
            .unwrap_or_else(crate::paths::playlists_path)
    }

    /// Lyric loader built from the `[lyrics]` section
    #[must_use]
    pub fn lyrics_loader(&self) -> LyricsLoader {
        LyricsLoader::new(
            self.lyrics.extensions.clone(),
            DecoderChain::from_labels(self.lyrics.encodings.as_slice()),
        )
    }
}

const CONFIG_TEMPLATE: &str = r#"# radiodeck configuration
# ~/.config/radiodeck/config.toml

[player]
# How often the progress display and lyrics refresh
tick_interval_ms = 1000
# Initial volume, 0-100
volume = 50
# "single_loop", "list_loop" or "random"
play_mode = "list_loop"

[lyrics]
# Lyric files sit next to the audio file: song.mp3 -> song.lrc
extensions = ["lrc"]
# Encodings tried in order; the first that decodes cleanly and has timed lines wins
encodings = ["utf-8", "gbk", "gb18030", "windows-1252"]
# Lines shown before and after the current line
context_lines = 1

[storage]
# Where playlists are kept (default: ~/.config/radiodeck/playlists.json)
# playlists_file = "/path/to/playlists.json"

[logging]
# Also write logs to the cache directory
enabled = false
"#;
