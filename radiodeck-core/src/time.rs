//! Time and duration conversion utilities.
//!
//! Elapsed-time arithmetic in the session mixes engine positions with a signed
//! seek offset, so durations are converted to signed milliseconds with
//! explicit saturation instead of silent truncation.

use std::time::Duration;

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as i64, saturating at `i64::MAX`.
    ///
    /// In practice, this is always safe because durations exceeding `i64::MAX`
    /// milliseconds would represent ~292 million years.
    fn as_millis_i64(&self) -> i64;
}

impl DurationExt for Duration {
    fn as_millis_i64(&self) -> i64 {
        i64::try_from(self.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Build a duration from signed milliseconds clamped to `[0, max]`
#[must_use]
pub fn clamp_millis(millis: i64, max: Duration) -> Duration {
    let max_ms = max.as_millis_i64();
    let clamped = millis.clamp(0, max_ms.max(0));
    Duration::from_millis(u64::try_from(clamped).unwrap_or(0))
}

/// Format a duration as `MM:SS`, truncating fractional seconds.
///
/// There is no hour component; minutes keep counting past 59.
#[must_use]
pub fn format_time(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;

    format!("{minutes:02}:{seconds:02}")
}

/// Format the `elapsed / total` label shown next to the progress bar
#[must_use]
pub fn format_progress(elapsed: Duration, total: Duration) -> String {
    format!("{} / {}", format_time(elapsed), format_time(total))
}
