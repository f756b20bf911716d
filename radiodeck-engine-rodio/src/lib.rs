//! Playback engine backed by `rodio`.
//!
//! Each `play` builds a fresh `Sink` on the output mixer with the decoder
//! skipped to the start offset, so positions reported by the sink count from
//! that offset rather than from the start of the file.

use radiodeck_core::{EngineError, PlaybackEngine};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Audio output on the default device
pub struct RodioEngine {
    stream: OutputStream,
    sink: Option<Sink>,
    loaded: Option<PathBuf>,
    duration: Duration,
    volume: f32,
}

impl RodioEngine {
    /// Open the default output device.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Output` if no output device can be opened.
    pub fn new() -> Result<Self, EngineError> {
        let mut stream =
            OutputStreamBuilder::open_default_stream().map_err(|e| EngineError::Output {
                reason: e.to_string(),
            })?;
        // rodio prints to stderr when the stream is dropped
        stream.log_on_drop(false);
        info!("Opened default audio output");

        Ok(Self {
            stream,
            sink: None,
            loaded: None,
            duration: Duration::ZERO,
            volume: 1.0,
        })
    }

    fn stop_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}

/// Open and decode a file
fn decode(path: &Path) -> Result<Decoder<BufReader<File>>, EngineError> {
    let file = File::open(path).map_err(|source| EngineError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    Decoder::new(BufReader::new(file)).map_err(|e| EngineError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Validate that `path` is playable and read its duration.
///
/// Formats that do not report a duration give zero.
///
/// # Errors
///
/// Returns `Open` if the file cannot be opened and `Decode` if it is not a
/// supported audio file.
pub fn probe_duration(path: &Path) -> Result<Duration, EngineError> {
    let source = decode(path)?;
    Ok(source.total_duration().unwrap_or_default())
}

impl PlaybackEngine for RodioEngine {
    fn load(&mut self, path: &Path) -> Result<(), EngineError> {
        self.stop_sink();
        self.loaded = None;
        self.duration = Duration::ZERO;

        self.duration = probe_duration(path)?;
        self.loaded = Some(path.to_path_buf());
        debug!("Loaded {:?} ({:?})", path, self.duration);
        Ok(())
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn play(&mut self, start: Duration) -> Result<(), EngineError> {
        let Some(path) = self.loaded.clone() else {
            return Err(EngineError::NothingLoaded);
        };

        self.stop_sink();
        let source = decode(&path)?.skip_duration(start);

        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(self.volume);
        sink.append(source);
        sink.play();
        self.sink = Some(sink);

        debug!("Started {:?} at {:?}", path, start);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn stop(&mut self) {
        self.stop_sink();
    }

    fn position(&self) -> Duration {
        self.sink.as_ref().map_or(Duration::ZERO, Sink::get_pos)
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    fn is_busy(&self) -> bool {
        self.sink
            .as_ref()
            .is_some_and(|sink| !sink.empty() && !sink.is_paused())
    }
}
