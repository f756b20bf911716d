use radiodeck_core::playlist::display_name;
use radiodeck_core::{format_time, StatusEvent};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

const LOG_TARGET: &str = "radiodeck::bridge";

/// Print status events to stdout until the channel closes
pub async fn print_status_events(mut rx: broadcast::Receiver<StatusEvent>) {
    let mut printer = EventPrinter::default();

    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Some(line) = printer.render(&event) {
                    println!("{line}");
                }
            }
            Err(RecvError::Closed) => {
                info!(target: LOG_TARGET, "Status channel closed");
                break;
            }
            Err(RecvError::Lagged(n)) => {
                info!(target: LOG_TARGET, "Missed {} status events", n);
            }
        }
    }
}

/// Turns status events into console lines.
///
/// Progress events only print when the highlighted lyric changes.
#[derive(Debug, Default)]
pub struct EventPrinter {
    last_lyric: Option<String>,
}

impl EventPrinter {
    pub fn render(&mut self, event: &StatusEvent) -> Option<String> {
        match event {
            StatusEvent::TrackStarted {
                index,
                path,
                duration,
            } => {
                self.last_lyric = None;
                Some(format!(
                    "> [{index}] {} ({})",
                    display_name(path),
                    format_time(*duration)
                ))
            }
            StatusEvent::TransportChanged { state } => Some(format!("  {state}")),
            StatusEvent::Progress { label, lyrics, .. } => {
                let current = lyrics.highlighted().map(str::to_string);
                if current.is_none() || current == self.last_lyric {
                    return None;
                }
                self.last_lyric.clone_from(&current);
                current.map(|text| format!("  {label}  ~ {text}"))
            }
            StatusEvent::PlaylistsChanged {
                names,
                active,
                tracks,
            } => Some(format!(
                "  playlists: {} | '{}' has {} track(s)",
                names.join(", "),
                active,
                tracks.len()
            )),
            StatusEvent::PlayModeChanged { mode } => Some(format!("  mode: {mode}")),
            StatusEvent::VolumeChanged { percent } => Some(format!("  volume: {percent}%")),
            StatusEvent::Notice { message } => Some(format!("! {message}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radiodeck_core::{LyricWindow, TransportState, WindowLine};
    use std::path::PathBuf;
    use std::time::Duration;

    fn progress(lyric: Option<&str>) -> StatusEvent {
        let lines = lyric
            .map(|text| {
                vec![WindowLine {
                    text: text.to_string(),
                    highlighted: true,
                }]
            })
            .unwrap_or_default();
        StatusEvent::Progress {
            elapsed: Duration::from_secs(5),
            duration: Duration::from_secs(60),
            label: "00:05 / 01:00".to_string(),
            lyrics: LyricWindow { lines },
        }
    }

    #[test]
    fn test_track_started_line() {
        let mut printer = EventPrinter::default();
        let line = printer.render(&StatusEvent::TrackStarted {
            index: 2,
            path: PathBuf::from("/music/song.mp3"),
            duration: Duration::from_secs(185),
        });
        assert_eq!(line.as_deref(), Some("> [2] song.mp3 (03:05)"));
    }

    #[test]
    fn test_progress_prints_only_lyric_changes() {
        let mut printer = EventPrinter::default();
        assert_eq!(printer.render(&progress(None)), None);
        assert_eq!(
            printer.render(&progress(Some("hello"))).as_deref(),
            Some("  00:05 / 01:00  ~ hello")
        );
        assert_eq!(printer.render(&progress(Some("hello"))), None);
        assert!(printer.render(&progress(Some("world"))).is_some());
    }

    #[test]
    fn test_new_track_reprints_lyric() {
        let mut printer = EventPrinter::default();
        printer.render(&progress(Some("hello")));
        printer.render(&StatusEvent::TrackStarted {
            index: 0,
            path: PathBuf::from("/m/a.mp3"),
            duration: Duration::ZERO,
        });
        assert!(printer.render(&progress(Some("hello"))).is_some());
    }

    #[test]
    fn test_other_events() {
        let mut printer = EventPrinter::default();
        assert_eq!(
            printer
                .render(&StatusEvent::TransportChanged {
                    state: TransportState::Paused
                })
                .as_deref(),
            Some("  paused")
        );
        assert_eq!(
            printer
                .render(&StatusEvent::Notice {
                    message: "oops".into()
                })
                .as_deref(),
            Some("! oops")
        );
    }
}
