//! Line-based command parser for the console front end.

use radiodeck_core::{Intent, PlayMode};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  play                 start, or resume when paused
  pause | resume | stop
  next                 skip to the next track
  seek <secs|mm:ss>    jump within the current track
  vol <0-100>          set volume
  mode <single|list|random>
  lists                show playlists
  use <name>           switch playlist
  new <name>           create playlist
  drop <name>          remove playlist
  add <path>...        add files to the current playlist (quote paths with spaces)
  rm <index>...        remove tracks from the current playlist
  status               show what is playing
  help | quit";

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Intent(Intent),
    Lists,
    Status,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid time '{0}', use seconds or mm:ss")]
    InvalidTime(String),

    #[error("Invalid track index '{0}'")]
    InvalidIndex(String),

    #[error("Unterminated quote in '{0}'")]
    UnterminatedQuote(String),
}

/// Parse one input line
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));

    let command = match word.to_ascii_lowercase().as_str() {
        "" => Command::Empty,
        "play" => Command::Intent(Intent::Play),
        "pause" => Command::Intent(Intent::Pause),
        "resume" => Command::Intent(Intent::Resume),
        "stop" => Command::Intent(Intent::Stop),
        "next" => Command::Intent(Intent::Next),
        "seek" => Command::Intent(Intent::Seek(parse_time(rest)?)),
        "vol" | "volume" => Command::Intent(Intent::SetVolume(parse_volume(rest)?)),
        "mode" => Command::Intent(Intent::SetPlayMode(parse_mode(rest)?)),
        "lists" => Command::Lists,
        "use" => Command::Intent(Intent::SwitchPlaylist(required(rest, "use <name>")?)),
        "new" => Command::Intent(Intent::CreatePlaylist(required(rest, "new <name>")?)),
        "drop" => Command::Intent(Intent::RemovePlaylist(required(rest, "drop <name>")?)),
        "add" => {
            let paths: Vec<PathBuf> = split_args(rest)?.into_iter().map(PathBuf::from).collect();
            if paths.is_empty() {
                return Err(ParseError::Usage("add <path>..."));
            }
            Command::Intent(Intent::AddTracks(paths))
        }
        "rm" => {
            let indices = rest
                .split_whitespace()
                .map(|s| {
                    s.parse::<i64>()
                        .map_err(|_| ParseError::InvalidIndex(s.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if indices.is_empty() {
                return Err(ParseError::Usage("rm <index>..."));
            }
            Command::Intent(Intent::RemoveTracks(indices))
        }
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return Err(ParseError::Unknown(word.to_string())),
    };

    Ok(command)
}

fn required(rest: &str, usage: &'static str) -> Result<String, ParseError> {
    if rest.is_empty() {
        Err(ParseError::Usage(usage))
    } else {
        Ok(rest.to_string())
    }
}

/// Parse `90`, `12.5` or `1:30`
fn parse_time(input: &str) -> Result<Duration, ParseError> {
    let invalid = || ParseError::InvalidTime(input.to_string());
    if input.is_empty() {
        return Err(ParseError::Usage("seek <secs|mm:ss>"));
    }

    if let Some((minutes, seconds)) = input.split_once(':') {
        let minutes: u64 = minutes.parse().map_err(|_| invalid())?;
        let seconds: u64 = seconds.parse().map_err(|_| invalid())?;
        if seconds >= 60 {
            return Err(invalid());
        }
        return Ok(Duration::from_secs(minutes.saturating_mul(60) + seconds));
    }

    let secs: f64 = input.parse().map_err(|_| invalid())?;
    Duration::try_from_secs_f64(secs).map_err(|_| invalid())
}

fn parse_volume(input: &str) -> Result<u8, ParseError> {
    match input.parse::<u8>() {
        Ok(v) if v <= 100 => Ok(v),
        _ => Err(ParseError::Usage("vol <0-100>")),
    }
}

fn parse_mode(input: &str) -> Result<PlayMode, ParseError> {
    match input.to_ascii_lowercase().as_str() {
        "single" | "single_loop" => Ok(PlayMode::SingleLoop),
        "list" | "list_loop" => Ok(PlayMode::ListLoop),
        "random" | "shuffle" => Ok(PlayMode::Random),
        _ => Err(ParseError::Usage("mode <single|list|random>")),
    }
}

/// Split on whitespace, keeping double-quoted runs together
fn split_args(input: &str) -> Result<Vec<String>, ParseError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in input.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if in_quotes {
        return Err(ParseError::UnterminatedQuote(input.to_string()));
    }
    if has_token {
        args.push(current);
    }
    Ok(args)
}
