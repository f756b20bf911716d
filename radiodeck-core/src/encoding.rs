//! Ordered decoder fallback for lyric files.
//!
//! Lyric files come from all over the place and many older ones (especially
//! Chinese releases) are stored in GBK or other legacy encodings. Decoders are
//! tried in order; the first one that decodes cleanly *and* produces at least
//! one timed line wins.

use encoding_rs::Encoding;
use tracing::{debug, warn};

use crate::lrc::LyricTimeline;

/// Encoding labels tried when the config does not say otherwise
pub const DEFAULT_ENCODING_LABELS: [&str; 4] = ["utf-8", "gbk", "gb18030", "windows-1252"];

/// An ordered list of text decoders
#[derive(Debug, Clone)]
pub struct DecoderChain {
    encodings: Vec<&'static Encoding>,
}

impl Default for DecoderChain {
    fn default() -> Self {
        Self::from_labels(&DEFAULT_ENCODING_LABELS)
    }
}

impl DecoderChain {
    /// Build a chain from WHATWG encoding labels, skipping unknown ones
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        let encodings = labels
            .iter()
            .filter_map(|label| {
                let label = label.as_ref();
                let encoding = Encoding::for_label(label.trim().as_bytes());
                if encoding.is_none() {
                    warn!("Ignoring unknown lyric encoding label '{}'", label);
                }
                encoding
            })
            .collect();

        Self { encodings }
    }

    /// Names of the encodings in this chain, in order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.encodings.iter().map(|e| e.name()).collect()
    }

    /// Decode `bytes` with the first encoding that yields a non-empty timeline.
    ///
    /// Returns an empty timeline when no encoding qualifies.
    #[must_use]
    pub fn decode_timeline(&self, bytes: &[u8]) -> LyricTimeline {
        for encoding in &self.encodings {
            let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes)
            else {
                debug!("Lyrics are not valid {}", encoding.name());
                continue;
            };

            let timeline = LyricTimeline::parse(text.trim_start_matches('\u{FEFF}'));
            if timeline.is_empty() {
                debug!("Decoded lyrics as {} but found no timed lines", encoding.name());
                continue;
            }

            debug!(
                "Decoded {} lyric lines as {}",
                timeline.len(),
                encoding.name()
            );
            return timeline;
        }

        LyricTimeline::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // "周杰伦" in GBK encoding
    const GBK_NAME: [u8; 6] = [0xD6, 0xDC, 0xBD, 0xDC, 0xC2, 0xD7];

    #[test]
    fn test_default_chain_order() {
        let chain = DecoderChain::default();
        assert_eq!(chain.names(), vec!["UTF-8", "GBK", "gb18030", "windows-1252"]);
    }

    #[test]
    fn test_unknown_labels_skipped() {
        let chain = DecoderChain::from_labels(&["utf-8", "ansi", "not-a-charset"]);
        assert_eq!(chain.names(), vec!["UTF-8"]);
    }

    #[test]
    fn test_utf8_passthrough() {
        let chain = DecoderChain::default();
        let timeline = chain.decode_timeline("[00:01.00]你好世界".as_bytes());
        assert_eq!(timeline.lines[0].text, "你好世界");
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let chain = DecoderChain::default();
        let timeline = chain.decode_timeline("\u{FEFF}[00:01.00]first".as_bytes());
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.lines[0].text, "first");
    }

    #[test]
    fn test_gbk_fallback() {
        let mut bytes = b"[00:01.00]".to_vec();
        bytes.extend_from_slice(&GBK_NAME);

        let chain = DecoderChain::default();
        let timeline = chain.decode_timeline(&bytes);
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.lines[0].text, "周杰伦");
    }

    #[test]
    fn test_no_timed_lines_gives_empty() {
        let chain = DecoderChain::default();
        assert!(chain.decode_timeline(b"just some plain text\n").is_empty());
    }

    #[test]
    fn test_all_decoders_fail_gives_empty() {
        let mut bytes = b"[00:01.00]".to_vec();
        bytes.extend_from_slice(&GBK_NAME);

        let chain = DecoderChain::from_labels(&["utf-8"]);
        assert!(chain.decode_timeline(&bytes).is_empty());
    }

    #[test]
    fn test_empty_chain_gives_empty() {
        let chain = DecoderChain::from_labels::<&str>(&[]);
        assert!(chain.decode_timeline(b"[00:01.00]x").is_empty());
    }
}
