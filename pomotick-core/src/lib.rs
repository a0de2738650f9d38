//! Core of the pomotick Pomodoro timer.
//!
//! Everything with state lives here: the settings document and its atomic
//! store, the per-day activity log, and the work/break engine that ties them
//! to audio cues. The terminal app and `pomotickctl` are thin shells over
//! this crate.
//!
//! - [`TimerEngine`]: countdown state machine, driven by a cooperative tick
//! - [`ConfigStore`]: `settings.json`, merged with defaults, written atomically
//! - [`ActivityLog`]: append-only Shift_JIS CSV, one file per day
//! - [`SoundNotifier`]: the two-cue audio contract the engine depends on

pub mod activity_log;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod paths;
pub mod settings;
pub mod sound;

pub use activity_log::{ActivityLog, LogEvent, LogRow};
pub use config::{ConfigDocument, ConfigStore};
pub use engine::{format_clock, Phase, TickOutcome, TimerEngine};
pub use error::{ConfigError, LogError, PathsError, SoundError, ValidationError};
pub use paths::ProjectPaths;
pub use settings::SettingsForm;
pub use sound::{Cue, CueRecorder, SoundNotifier};
