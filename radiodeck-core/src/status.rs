use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::lrc::LyricWindow;
use crate::session::{PlayMode, TransportState};

/// Updates published by the player for front ends
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    /// A track was loaded and started
    TrackStarted {
        index: usize,
        path: PathBuf,
        duration: Duration,
    },
    /// Transport state changed (or was re-confirmed)
    TransportChanged { state: TransportState },
    /// Periodic position update
    Progress {
        elapsed: Duration,
        duration: Duration,
        label: String,
        lyrics: LyricWindow,
    },
    /// Playlist names, the active one, or its tracks changed
    PlaylistsChanged {
        names: Vec<String>,
        active: String,
        tracks: Vec<String>,
    },
    PlayModeChanged { mode: PlayMode },
    VolumeChanged { percent: u8 },
    /// Dismissible message for the user
    Notice { message: String },
}

/// Receiver of status events.
///
/// A player without a sink still works; front ends can poll a snapshot
/// instead.
pub trait StatusSink: Send {
    fn publish(&self, event: StatusEvent);
}

/// Sink that fans events out over a broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    event_tx: broadcast::Sender<StatusEvent>,
}

impl BroadcastSink {
    #[must_use]
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self { event_tx }
    }

    /// Subscribe to status events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for BroadcastSink {
    fn publish(&self, event: StatusEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
