//! Lookup of the companion lyric file for a track.

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::encoding::DecoderChain;
use crate::lrc::LyricTimeline;

/// Lyric file extensions tried when the config does not say otherwise
pub const DEFAULT_LYRIC_EXTENSIONS: [&str; 1] = ["lrc"];

/// Finds and decodes the lyric file that sits next to an audio file.
///
/// For `/music/song.mp3` the candidates are `/music/song.<ext>` for every
/// configured extension, in order.
#[derive(Debug, Clone)]
pub struct LyricsLoader {
    extensions: Vec<String>,
    decoders: DecoderChain,
}

impl Default for LyricsLoader {
    fn default() -> Self {
        Self::new(
            DEFAULT_LYRIC_EXTENSIONS.iter().map(ToString::to_string).collect(),
            DecoderChain::default(),
        )
    }
}

impl LyricsLoader {
    #[must_use]
    pub fn new(extensions: Vec<String>, decoders: DecoderChain) -> Self {
        Self {
            extensions,
            decoders,
        }
    }

    /// Load the timeline for `track`. Missing or unreadable files give an
    /// empty timeline.
    #[must_use]
    pub fn load_for(&self, track: &Path) -> LyricTimeline {
        for ext in &self.extensions {
            let candidate = track.with_extension(ext.trim_start_matches('.'));
            if !candidate.is_file() {
                continue;
            }

            return match fs::read(&candidate) {
                Ok(bytes) => {
                    let timeline = self.decoders.decode_timeline(&bytes);
                    if timeline.is_empty() {
                        debug!("No timed lines in {:?}", candidate);
                    }
                    timeline
                }
                Err(e) => {
                    warn!("Failed to read lyrics {:?}: {}", candidate, e);
                    LyricTimeline::default()
                }
            };
        }

        debug!("No lyric file for {:?}", track);
        LyricTimeline::default()
    }
}
