mod bridge;
mod console;

use crate::bridge::print_status_events;
use crate::console::{parse_command, Command, HELP};
use radiodeck_core::{
    BroadcastSink, CoreError, Intent, PlaybackEngine, PlaybackSession, Player, PlaylistFile,
    RadiodeckConfig,
};
use radiodeck_engine_rodio::RodioEngine;
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    let config = match RadiodeckConfig::load_or_create() {
        Ok(config) => config,
        Err(e) => {
            error!(
                "Failed to load config from {}: {e}",
                RadiodeckConfig::config_path().display()
            );
            std::process::exit(1);
        }
    };

    let engine = match RodioEngine::new() {
        Ok(engine) => engine,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    let sink = BroadcastSink::new();
    runtime.spawn(print_status_events(sink.subscribe()));

    let mut session = PlaybackSession::new(engine, config.lyrics_loader())
        .with_context_lines(config.lyrics.context_lines);
    session.set_volume(config.player.volume);
    session.set_play_mode(config.player.play_mode);

    let file = PlaylistFile::new(config.playlists_file());
    info!("Using playlists from {}", file.path().display());
    let player = Player::new(file, session).with_sink(Box::new(sink));

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    // Set up Ctrl+C handler to trigger graceful shutdown
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    println!("radiodeck ready, type 'help' for commands");
    runtime.block_on(run(player, config.tick_interval(), cancel_token));

    // Stdin is read on a blocking thread that cannot be interrupted
    runtime.shutdown_timeout(Duration::from_millis(200));
}

/// Whether the event loop should keep going after a console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Drive the player from the tick timer and console input until shutdown
async fn run<E: PlaybackEngine>(
    mut player: Player<E>,
    tick_interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = player.tick() {
                    warn!("Auto-advance failed: {e}");
                }
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if handle_line(&mut player, &line) == Flow::Quit {
                        break;
                    }
                }
                Ok(None) => {
                    info!("Input closed");
                    break;
                }
                Err(e) => {
                    error!("Failed to read input: {e}");
                    break;
                }
            },
        }
    }

    if let Err(e) = player.handle(Intent::Stop) {
        warn!("Failed to stop playback: {e}");
    }
    info!("Shutting down");
}

fn handle_line<E: PlaybackEngine>(player: &mut Player<E>, line: &str) -> Flow {
    let command = match parse_command(line) {
        Ok(command) => command,
        Err(e) => {
            println!("{e}");
            return Flow::Continue;
        }
    };

    match command {
        Command::Intent(intent) => {
            match player.handle(intent) {
                // These already reached the user as notices
                Ok(()) | Err(CoreError::EmptyPlaylist | CoreError::PlaybackLoad { .. }) => {}
                Err(e) => println!("{e}"),
            }
        }
        Command::Lists => print_lists(player),
        Command::Status => print_status(player),
        Command::Help => println!("{HELP}"),
        Command::Quit => return Flow::Quit,
        Command::Empty => {}
    }

    Flow::Continue
}

fn print_lists<E: PlaybackEngine>(player: &Player<E>) {
    let snapshot = player.snapshot();
    for name in &snapshot.playlists {
        let marker = if *name == snapshot.active_playlist { '*' } else { ' ' };
        println!("{marker} {name}");
    }
}

fn print_status<E: PlaybackEngine>(player: &Player<E>) {
    let snapshot = player.snapshot();
    println!(
        "{} | {} | mode: {} | volume: {}%",
        snapshot.state, snapshot.time_label, snapshot.play_mode, snapshot.volume
    );
    println!("playlist '{}':", snapshot.active_playlist);
    let playing = snapshot.current_track.is_some();
    for (i, track) in snapshot.tracks.iter().enumerate() {
        let marker = if playing && i == snapshot.track_index { '>' } else { ' ' };
        println!("{marker} [{i}] {track}");
    }
    for line in &snapshot.lyrics.lines {
        let marker = if line.highlighted { '~' } else { ' ' };
        println!("  {marker} {}", line.text);
    }
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled() -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let config_path = RadiodeckConfig::config_path();
    let Ok(content) = std::fs::read_to_string(&config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with console output and optional file logging
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,symphonia=warn"));

    // Logs go to stderr so they do not interleave with command output
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = radiodeck_core::paths::log_file_path();

        // Create cache directory if needed
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
