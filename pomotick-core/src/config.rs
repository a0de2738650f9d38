//! The settings document and its on-disk store.
//!
//! `settings.json` uses the established key layout (`timer.work_time`,
//! `sound.use_beep`, ...) so existing files keep loading.
//! Whatever is stored is deep-merged over [`ConfigDocument::default`], so a
//! file written by an older build that lacks a section still yields a full
//! document.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use crate::error::{ConfigError, ValidationError};

pub const CONFIG_FILE_NAME: &str = "settings.json";
pub const MAX_VOLUME: u32 = 100;
/// Longest work or break phase, one day.
pub const MAX_PHASE_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// Main window geometry. Carried through load/save, never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub position: Position,
    pub size: Size,
    pub topmost: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsWindowConfig {
    pub position: Position,
    pub size: Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeepConfig {
    /// Tone pitch in Hz.
    pub frequency: u32,
    /// Tone length in milliseconds.
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundConfig {
    /// 0..=100
    pub volume: u32,
    pub use_beep: bool,
    pub beep: BeepConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(rename = "work_time")]
    pub work_minutes: u32,
    #[serde(rename = "break_time")]
    pub break_minutes: u32,
    /// How many reminder cues split one work phase.
    #[serde(rename = "reminder_interval")]
    pub reminder_count: u32,
}

/// The whole settings document.
///
/// Top-level keys this build does not know about are kept in `extra` and
/// written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub window: WindowConfig,
    pub settings_window: SettingsWindowConfig,
    pub sound: SoundConfig,
    pub timer: TimerConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            window: WindowConfig {
                position: Position { x: 1920, y: 875 },
                size: Size {
                    width: 300,
                    height: 150,
                },
                topmost: true,
            },
            settings_window: SettingsWindowConfig {
                position: Position { x: 100, y: 100 },
                size: Size {
                    width: 300,
                    height: 320,
                },
            },
            sound: SoundConfig {
                volume: 50,
                use_beep: true,
                beep: BeepConfig {
                    frequency: 1000,
                    duration: 200,
                },
            },
            timer: TimerConfig {
                work_minutes: 25,
                break_minutes: 5,
                reminder_count: 3,
            },
            extra: Map::new(),
        }
    }
}

impl ConfigDocument {
    pub fn work_seconds(&self) -> u32 {
        self.timer.work_minutes.saturating_mul(60)
    }

    pub fn break_seconds(&self) -> u32 {
        self.timer.break_minutes.saturating_mul(60)
    }

    /// Checks the invariants a document must hold before it is persisted or
    /// handed to the engine.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive = [
            ("work_time", self.timer.work_minutes),
            ("break_time", self.timer.break_minutes),
            ("reminder_interval", self.timer.reminder_count),
            ("beep.frequency", self.sound.beep.frequency),
            ("beep.duration", self.sound.beep.duration),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ValidationError::NotPositive { field });
            }
        }
        let phases = [
            ("work_time", self.timer.work_minutes),
            ("break_time", self.timer.break_minutes),
        ];
        for (field, value) in phases {
            if value > MAX_PHASE_MINUTES {
                return Err(ValidationError::OutOfRange {
                    field,
                    min: 1,
                    max: MAX_PHASE_MINUTES as i64,
                    value: value as i64,
                });
            }
        }
        Ok(())
    }

    /// Replaces out-of-range values with defaults (or the nearest bound for
    /// volume), warning about each one.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let required = [
            ("work_time", &mut self.timer.work_minutes, defaults.timer.work_minutes),
            ("break_time", &mut self.timer.break_minutes, defaults.timer.break_minutes),
            (
                "reminder_interval",
                &mut self.timer.reminder_count,
                defaults.timer.reminder_count,
            ),
            (
                "beep.frequency",
                &mut self.sound.beep.frequency,
                defaults.sound.beep.frequency,
            ),
            (
                "beep.duration",
                &mut self.sound.beep.duration,
                defaults.sound.beep.duration,
            ),
        ];
        for (field, value, default) in required {
            if *value == 0 {
                warn!("Stored {} is 0, falling back to {}", field, default);
                *value = default;
            }
        }
        for (field, value) in [
            ("work_time", &mut self.timer.work_minutes),
            ("break_time", &mut self.timer.break_minutes),
        ] {
            if *value > MAX_PHASE_MINUTES {
                warn!(
                    "Stored {} of {} minutes is above {}, clamping",
                    field, value, MAX_PHASE_MINUTES
                );
                *value = MAX_PHASE_MINUTES;
            }
        }
        if self.sound.volume > MAX_VOLUME {
            warn!("Stored volume {} is above {}, clamping", self.sound.volume, MAX_VOLUME);
            self.sound.volume = MAX_VOLUME;
        }
        self
    }
}

/// Recursively lays `overlay` over `base`. Objects merge key by key, anything
/// else in `overlay` replaces what `base` had.
fn merge_over(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_over(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Reads and atomically writes the settings document at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored document merged over the defaults. Never fails and
    /// never creates the file: any problem yields the default document.
    pub fn load(&self) -> ConfigDocument {
        match self.try_load() {
            Ok(doc) => doc,
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                warn!("No settings at {}, using defaults", self.path.display());
                ConfigDocument::default()
            }
            Err(e) => {
                warn!("{}; using defaults", e);
                ConfigDocument::default()
            }
        }
    }

    pub fn try_load(&self) -> Result<ConfigDocument, ConfigError> {
        let text = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        let stored: Value = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let mut merged = serde_json::to_value(ConfigDocument::default())?;
        merge_over(&mut merged, stored);
        let doc: ConfigDocument =
            serde_json::from_value(merged).map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })?;
        debug!("Loaded settings from {}", self.path.display());
        Ok(doc.sanitized())
    }

    /// Persists `doc`, reporting success as a flag. Failures are logged.
    pub fn save(&self, doc: &ConfigDocument) -> bool {
        match self.try_save(doc) {
            Ok(()) => {
                info!("Settings saved to {}", self.path.display());
                true
            }
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }

    /// Writes to a temp file beside the destination, fsyncs it and renames it
    /// into place. The temp file is removed when the guard drops unless the
    /// rename went through.
    pub fn try_save(&self, doc: &ConfigDocument) -> Result<(), ConfigError> {
        doc.validate()?;
        let mut doc = doc.clone();
        doc.sound.volume = doc.sound.volume.min(MAX_VOLUME);

        let mut bytes = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
        doc.serialize(&mut serializer)?;

        let write_err = |source: std::io::Error| ConfigError::Write {
            path: self.path.clone(),
            source,
        };
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(dir).map_err(write_err)?;

        let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
        temp.write_all(&bytes).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    /// Writes the default document if nothing is stored yet.
    pub fn ensure_config_file(&self) -> bool {
        if self.path.exists() {
            return true;
        }
        self.save(&ConfigDocument::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> ConfigStore {
        ConfigStore::new(dir.join(CONFIG_FILE_NAME))
    }

    #[test]
    fn load_missing_file_returns_defaults_without_creating_it() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        assert_eq!(store.load(), ConfigDocument::default());
        assert!(!store.path().exists());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let mut doc = ConfigDocument::default();
        doc.timer.work_minutes = 50;
        doc.timer.break_minutes = 10;
        doc.timer.reminder_count = 4;
        doc.sound.volume = 80;
        doc.sound.use_beep = false;
        doc.window.topmost = false;

        assert!(store.save(&doc));
        assert_eq!(store.load(), doc);
    }

    #[test]
    fn partial_file_is_filled_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(store.path(), r#"{"timer": {"work_time": 45}, "sound": {"volume": 10}}"#).unwrap();

        let doc = store.load();
        assert_eq!(doc.timer.work_minutes, 45);
        assert_eq!(doc.timer.break_minutes, 5);
        assert_eq!(doc.timer.reminder_count, 3);
        assert_eq!(doc.sound.volume, 10);
        assert!(doc.sound.use_beep);
        assert_eq!(doc.sound.beep.frequency, 1000);
        assert_eq!(doc.window, ConfigDocument::default().window);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(store.path(), "{ not json").unwrap();

        assert_eq!(store.load(), ConfigDocument::default());
        assert!(matches!(store.try_load(), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn wrongly_typed_value_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(store.path(), r#"{"timer": {"work_time": -5}}"#).unwrap();

        assert_eq!(store.load(), ConfigDocument::default());
    }

    #[test]
    fn stored_zero_duration_is_replaced_and_loud_volume_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(
            store.path(),
            r#"{"timer": {"work_time": 0, "break_time": 7}, "sound": {"volume": 250}}"#,
        )
        .unwrap();

        let doc = store.load();
        assert_eq!(doc.timer.work_minutes, 25);
        assert_eq!(doc.timer.break_minutes, 7);
        assert_eq!(doc.sound.volume, 100);
    }

    #[test]
    fn save_rejects_non_positive_durations() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let mut doc = ConfigDocument::default();
        doc.timer.reminder_count = 0;

        assert!(!store.save(&doc));
        assert!(matches!(
            store.try_save(&doc),
            Err(ConfigError::Invalid(ValidationError::NotPositive {
                field: "reminder_interval"
            }))
        ));
        assert!(!store.path().exists());
    }

    #[test]
    fn save_rejects_phases_longer_than_a_day() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let mut doc = ConfigDocument::default();
        doc.timer.work_minutes = 80_000_000;

        assert!(matches!(
            store.try_save(&doc),
            Err(ConfigError::Invalid(ValidationError::OutOfRange {
                field: "work_time",
                value: 80_000_000,
                ..
            }))
        ));
        assert!(!store.path().exists());
    }

    #[test]
    fn stored_huge_duration_is_clamped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(
            store.path(),
            r#"{"timer": {"work_time": 80000000, "break_time": 4294967295}}"#,
        )
        .unwrap();

        let doc = store.load();
        assert_eq!(doc.timer.work_minutes, MAX_PHASE_MINUTES);
        assert_eq!(doc.timer.break_minutes, MAX_PHASE_MINUTES);
        assert_eq!(doc.work_seconds(), MAX_PHASE_MINUTES * 60);
    }

    #[test]
    fn seconds_saturate_instead_of_overflowing() {
        let mut doc = ConfigDocument::default();
        doc.timer.work_minutes = u32::MAX;
        assert_eq!(doc.work_seconds(), u32::MAX);
    }

    #[test]
    fn save_clamps_volume() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let mut doc = ConfigDocument::default();
        doc.sound.volume = 140;

        assert!(store.save(&doc));
        assert_eq!(store.load().sound.volume, 100);
    }

    #[test]
    fn saved_file_uses_four_space_indent_and_literal_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let mut doc = ConfigDocument::default();
        doc.extra
            .insert("memo".to_string(), Value::String("集中する".to_string()));

        assert!(store.save(&doc));
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n    \"window\": {\n        \"position\""));
        assert!(text.contains("\"memo\": \"集中する\""));
        assert_eq!(store.load().extra.get("memo"), doc.extra.get("memo"));
    }

    #[test]
    fn save_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        assert!(store.save(&ConfigDocument::default()));
        assert!(store.save(&ConfigDocument::default()));
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(CONFIG_FILE_NAME)]);
    }

    #[test]
    fn failed_save_reports_false_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on the destination makes the rename fail.
        let target = dir.path().join(CONFIG_FILE_NAME);
        fs::create_dir(&target).unwrap();
        let store = ConfigStore::new(&target);

        assert!(!store.save(&ConfigDocument::default()));
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn ensure_config_file_writes_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path().join("nested").as_path());

        assert!(store.ensure_config_file());
        assert_eq!(store.load(), ConfigDocument::default());

        let mut doc = ConfigDocument::default();
        doc.timer.work_minutes = 30;
        assert!(store.save(&doc));
        assert!(store.ensure_config_file());
        assert_eq!(store.load().timer.work_minutes, 30);
    }
}
