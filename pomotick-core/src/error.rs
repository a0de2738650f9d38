//! Error types for pomotick-core.
//!
//! None of these are fatal to a running timer. The engine and the stores log
//! them and keep counting down; they surface as values only for callers that
//! want to report them (the control CLI, the settings overlay).

use std::path::PathBuf;
use thiserror::Error;

/// Platform directory lookup failures.
#[derive(Error, Debug)]
pub enum PathsError {
    #[error("Could not determine a home directory for settings and logs")]
    NoProjectDirs,
}

/// Failures while reading or writing `settings.json`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode configuration: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to write configuration to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to save invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

/// Failures while touching a daily CSV log.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Row cannot be represented in Shift_JIS: {0}")]
    Unencodable(String),
}

/// Audio cue failures. Any of these disables cues for the rest of the process.
#[derive(Error, Debug)]
pub enum SoundError {
    #[error("Sound asset not found: {0}")]
    MissingAsset(PathBuf),

    #[error("No audio player available (tried {0})")]
    NoPlayer(String),

    #[error("Audio output failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected user input at the settings boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("'{field}' must be a whole number, got '{value}'")]
    NotANumber { field: &'static str, value: String },

    #[error("'{field}' must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("'{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
}
