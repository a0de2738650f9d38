//! Append-only daily CSV log of timer lifecycle events.
//!
//! One file per calendar day, `pomodoro_log_<YYYY-MM-DD>.csv`, encoded in
//! Shift_JIS with CRLF line endings so the spreadsheet tool the log is read
//! with opens it without an import dialog. Rows are only ever appended and
//! every write is fsync'd.

use std::borrow::Cow;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use encoding_rs::SHIFT_JIS;
use tracing::{debug, error, warn};

use crate::engine::Phase;
use crate::error::LogError;

pub const LOG_DIR_NAME: &str = "log";

/// Timestamp, start time, reset time, interrupt time, state, count.
pub const LOG_HEADER: [&str; 6] = [
    "タイムスタンプ",
    "開始時刻",
    "リセット時刻",
    "中断時刻",
    "状態",
    "カウント",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIME_FORMAT: &str = "%H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
const LINE_END: &str = "\r\n";

/// One lifecycle event. Each variant fills exactly one of the start, reset
/// and interrupt columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent {
    PhaseStart {
        at: NaiveDateTime,
        phase: Phase,
        cycle: u32,
    },
    Reset {
        at: NaiveDateTime,
        completed: u32,
    },
    Interrupt {
        at: NaiveDateTime,
        phase: Phase,
        cycle: u32,
    },
}

impl LogEvent {
    pub fn at(&self) -> NaiveDateTime {
        match *self {
            LogEvent::PhaseStart { at, .. }
            | LogEvent::Reset { at, .. }
            | LogEvent::Interrupt { at, .. } => at,
        }
    }

    fn to_row(self) -> [String; 6] {
        let stamp = self.at().format(TIMESTAMP_FORMAT).to_string();
        let time = self.at().format(TIME_FORMAT).to_string();
        match self {
            LogEvent::PhaseStart { phase, cycle, .. } => [
                stamp,
                time,
                String::new(),
                String::new(),
                phase.label().to_string(),
                cycle.to_string(),
            ],
            LogEvent::Reset { completed, .. } => [
                stamp,
                String::new(),
                time,
                String::new(),
                String::new(),
                completed.to_string(),
            ],
            LogEvent::Interrupt { phase, cycle, .. } => [
                stamp,
                String::new(),
                String::new(),
                time,
                phase.label().to_string(),
                cycle.to_string(),
            ],
        }
    }
}

/// A parsed data row. Columns missing from a short row come back empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogRow {
    pub timestamp: String,
    pub start: String,
    pub reset: String,
    pub interrupt: String,
    pub phase: String,
    pub count: String,
}

impl LogRow {
    fn from_fields(fields: Vec<String>) -> Self {
        let mut fields = fields.into_iter();
        let mut next = || fields.next().unwrap_or_default();
        Self {
            timestamp: next(),
            start: next(),
            reset: next(),
            interrupt: next(),
            phase: next(),
            count: next(),
        }
    }
}

pub struct ActivityLog {
    dir: PathBuf,
}

impl ActivityLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("pomodoro_log_{}.csv", date.format(DATE_FORMAT)))
    }

    /// Creates the day's file with its header if it does not exist yet.
    /// An existing file is left exactly as it is.
    pub fn ensure_file(&self, date: NaiveDate) -> Result<PathBuf, LogError> {
        let path = self.file_for(date);
        let io_err = |source: std::io::Error| LogError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let header = encode_record(&LOG_HEADER)?;
                file.write_all(&header).map_err(io_err)?;
                file.sync_all().map_err(io_err)?;
                debug!("Created activity log {}", path.display());
                Ok(path)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(path),
            Err(e) => Err(io_err(e)),
        }
    }

    /// Appends one row, logging instead of returning on failure. The timer
    /// keeps running whether or not the write landed.
    pub fn append(&self, event: &LogEvent) {
        if let Err(e) = self.try_append(event) {
            error!("Failed to write activity log: {}", e);
        }
    }

    pub fn try_append(&self, event: &LogEvent) -> Result<(), LogError> {
        let path = self.ensure_file(event.at().date())?;
        let line = encode_record(&event.to_row())?;
        let io_err = |source: std::io::Error| LogError::Io {
            path: path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        file.write_all(&line).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        Ok(())
    }

    /// Data rows of the given day's file, header skipped.
    pub fn read_day(&self, date: NaiveDate) -> Result<Vec<LogRow>, LogError> {
        let path = self.file_for(date);
        let bytes = fs::read(&path).map_err(|source| LogError::Io {
            path: path.clone(),
            source,
        })?;
        let (text, _, had_errors) = SHIFT_JIS.decode(&bytes);
        if had_errors {
            warn!("{} contains bytes that are not Shift_JIS", path.display());
        }

        Ok(text
            .lines()
            .skip(1)
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .map(|line| LogRow::from_fields(split_record(line)))
            .collect())
    }

    /// Highest count recorded on `date`, or 0 when there is nothing usable.
    ///
    /// Rows are not guaranteed to be in count order (a reset row carries the
    /// completed count, a start row the next cycle index), so every row of
    /// the day is considered and the maximum wins.
    pub fn recover_today_count(&self, date: NaiveDate) -> u32 {
        let rows = match self.read_day(date) {
            Ok(rows) => rows,
            Err(LogError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                return 0;
            }
            Err(e) => {
                error!("Failed to read activity log: {}", e);
                return 0;
            }
        };

        let prefix = date.format(DATE_FORMAT).to_string();
        rows.iter()
            .rev()
            .filter(|row| row.timestamp.starts_with(&prefix))
            .filter_map(|row| match row.count.trim().parse::<u32>() {
                Ok(count) => Some(count),
                Err(_) => {
                    warn!("Skipping log row with invalid count '{}'", row.count);
                    None
                }
            })
            .max()
            .unwrap_or(0)
    }
}

fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains(&[',', '"', '\r', '\n'][..]) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn encode_record<S: AsRef<str>>(fields: &[S]) -> Result<Vec<u8>, LogError> {
    let mut line = fields
        .iter()
        .map(|f| csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push_str(LINE_END);

    let (bytes, _, had_errors) = SHIFT_JIS.encode(&line);
    if had_errors {
        return Err(LogError::Unencodable(line.trim_end().to_string()));
    }
    Ok(bytes.into_owned())
}

/// Splits one CSV line, honouring double-quoted fields.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, s).unwrap()
    }

    fn write_sjis(path: &Path, lines: &[&str]) {
        let text: String = lines.iter().map(|l| format!("{}\r\n", l)).collect();
        let (bytes, _, _) = SHIFT_JIS.encode(&text);
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn ensure_file_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join(LOG_DIR_NAME));

        let path = log.ensure_file(day()).unwrap();
        assert!(path.ends_with("pomodoro_log_2024-03-14.csv"));
        log.append(&LogEvent::Reset {
            at: at(9, 0, 0),
            completed: 0,
        });
        log.ensure_file(day()).unwrap();

        assert_eq!(log.read_day(day()).unwrap().len(), 1);
    }

    #[test]
    fn file_is_shift_jis_not_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path());
        let path = log.ensure_file(day()).unwrap();

        let bytes = fs::read(path).unwrap();
        assert!(std::str::from_utf8(&bytes).is_err());
        let (text, _, had_errors) = SHIFT_JIS.decode(&bytes);
        assert!(!had_errors);
        assert_eq!(text, format!("{}\r\n", LOG_HEADER.join(",")));
    }

    #[test]
    fn each_event_fills_one_time_column() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path());

        log.append(&LogEvent::PhaseStart {
            at: at(9, 0, 0),
            phase: Phase::Work,
            cycle: 1,
        });
        log.append(&LogEvent::Interrupt {
            at: at(9, 10, 5),
            phase: Phase::Work,
            cycle: 1,
        });
        log.append(&LogEvent::Reset {
            at: at(9, 11, 0),
            completed: 0,
        });

        let rows = log.read_day(day()).unwrap();
        assert_eq!(
            rows[0],
            LogRow {
                timestamp: "2024-03-14 09:00:00".into(),
                start: "09:00:00".into(),
                reset: String::new(),
                interrupt: String::new(),
                phase: "work".into(),
                count: "1".into(),
            }
        );
        assert_eq!(rows[1].interrupt, "09:10:05");
        assert!(rows[1].start.is_empty() && rows[1].reset.is_empty());
        assert_eq!(rows[2].reset, "09:11:00");
        assert!(rows[2].phase.is_empty());
        assert_eq!(rows[2].count, "0");
    }

    #[test]
    fn events_land_in_the_file_of_their_own_day() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path());
        let next_day = day().succ_opt().unwrap();

        log.append(&LogEvent::PhaseStart {
            at: next_day.and_hms_opt(0, 0, 1).unwrap(),
            phase: Phase::Break,
            cycle: 4,
        });

        assert!(!log.file_for(day()).exists());
        assert_eq!(log.read_day(next_day).unwrap()[0].phase, "break");
    }

    #[test]
    fn recovery_takes_the_maximum_not_the_last_count() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path());
        write_sjis(
            &log.file_for(day()),
            &[
                &LOG_HEADER.join(","),
                "2024-03-14 09:00:00,09:00:00,,,work,3",
                "2024-03-14 09:25:00,09:25:00,,,break,2",
            ],
        );

        assert_eq!(log.recover_today_count(day()), 3);
    }

    #[test]
    fn recovery_skips_malformed_rows_and_other_days() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path());
        write_sjis(
            &log.file_for(day()),
            &[
                &LOG_HEADER.join(","),
                "2024-03-13 23:59:00,23:59:00,,,work,9",
                "2024-03-14 09:00:00,09:00:00,,,work,two",
                "2024-03-14 09:05:00,,,09:05:00,work,",
                "2024-03-14 09:06:00",
                "",
                "2024-03-14 10:00:00,,10:00:00,,,2",
            ],
        );

        assert_eq!(log.recover_today_count(day()), 2);
    }

    #[test]
    fn recovery_without_a_file_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("missing"));

        assert_eq!(log.recover_today_count(day()), 0);
    }

    #[test]
    fn append_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // The log directory path is occupied by a regular file.
        let blocked = dir.path().join("log");
        fs::write(&blocked, b"").unwrap();
        let log = ActivityLog::new(&blocked);
        let event = LogEvent::Reset {
            at: at(12, 0, 0),
            completed: 1,
        };

        log.append(&event);
        assert!(matches!(log.try_append(&event), Err(LogError::Io { .. })));
    }

    #[test]
    fn quoted_fields_are_split_correctly() {
        assert_eq!(
            split_record(r#"a,"b,c","say ""hi""",d"#),
            vec!["a", "b,c", r#"say "hi""#, "d"]
        );
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
    }
}
