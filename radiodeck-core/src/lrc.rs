use std::time::Duration;

/// A single timed lyric line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    pub start_time: Duration,
    pub text: String,
}

/// Parsed lyric timeline, sorted by start time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricTimeline {
    pub lines: Vec<LyricLine>,
}

/// One line of the lyric context window shown around the current position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowLine {
    pub text: String,
    pub highlighted: bool,
}

/// The current lyric line plus its neighbours
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricWindow {
    pub lines: Vec<WindowLine>,
}

impl LyricWindow {
    /// The highlighted line, if any
    #[must_use]
    pub fn highlighted(&self) -> Option<&str> {
        self.lines
            .iter()
            .find(|line| line.highlighted)
            .map(|line| line.text.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl LyricTimeline {
    /// Parse timed text into a timeline.
    ///
    /// Only lines starting with a `[mm:ss.cc]` tag are kept; everything else
    /// is dropped without error. Lines sharing a timestamp keep their input
    /// order.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut lines: Vec<LyricLine> = input.lines().filter_map(parse_timed_line).collect();

        // sort_by_key is stable
        lines.sort_by_key(|l| l.start_time);

        Self { lines }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Find the current line index for a given playback position.
    ///
    /// This is the last line that started at or before `position`. Before the
    /// first timestamp the first line is selected.
    #[must_use]
    pub fn current_line_index(&self, position: Duration) -> Option<usize> {
        if self.lines.is_empty() {
            return None;
        }

        let started = self.lines.partition_point(|line| line.start_time <= position);
        Some(started.saturating_sub(1))
    }

    /// Build the display window around `position`
    #[must_use]
    pub fn window(&self, position: Duration, before: usize, after: usize) -> LyricWindow {
        let Some(current_idx) = self.current_line_index(position) else {
            return LyricWindow::default();
        };

        let start = current_idx.saturating_sub(before);
        let end = (current_idx + after + 1).min(self.lines.len());

        let lines = self.lines[start..end]
            .iter()
            .enumerate()
            .map(|(offset, line)| WindowLine {
                text: line.text.clone(),
                highlighted: start + offset == current_idx,
            })
            .collect();

        LyricWindow { lines }
    }
}

/// Parse a line like `[01:23.45]text`
fn parse_timed_line(line: &str) -> Option<LyricLine> {
    let rest = line.strip_prefix('[')?;
    let tag = rest.get(..9)?;
    let text = rest.get(9..)?;

    let start_time = parse_timestamp(tag)?;

    Some(LyricLine {
        start_time,
        text: text.to_string(),
    })
}

/// Parse the 9-byte tag body `mm:ss.cc]`
fn parse_timestamp(tag: &str) -> Option<Duration> {
    let bytes = tag.as_bytes();
    if bytes.len() != 9 || bytes[2] != b':' || bytes[5] != b'.' || bytes[8] != b']' {
        return None;
    }

    let minutes = two_digits(&bytes[0..2])?;
    let seconds = two_digits(&bytes[3..5])?;
    let hundredths = two_digits(&bytes[6..8])?;

    Some(Duration::from_millis(
        minutes * 60 * 1000 + seconds * 1000 + hundredths * 10,
    ))
}

fn two_digits(pair: &[u8]) -> Option<u64> {
    match pair {
        [tens, ones] if tens.is_ascii_digit() && ones.is_ascii_digit() => {
            Some(u64::from(tens - b'0') * 10 + u64::from(ones - b'0'))
        }
        _ => None,
    }
}
