use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use pomotick_core::activity_log::DATE_FORMAT;
use pomotick_core::{ActivityLog, ConfigStore, LogError, ProjectPaths};
use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pomotickctl")]
#[command(about = "Inspect pomotick settings and activity logs", long_about = None)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the daily CSV logs
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Pomodoros completed today
    Today,
    /// Print the activity log of a day
    Log {
        /// Day to show, YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Print the settings file location
    Path,
    /// Change settings; the running timer picks them up on restart
    Set {
        /// Work phase in minutes
        #[arg(long)]
        work: Option<u32>,
        /// Break phase in minutes
        #[arg(long = "break")]
        rest: Option<u32>,
        /// Reminder cues per phase
        #[arg(long)]
        reminders: Option<u32>,
        /// Cue volume
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
        volume: Option<u32>,
        /// Use the terminal bell for cues
        #[arg(long, conflicts_with = "wav")]
        beep: bool,
        /// Use the sound files for cues
        #[arg(long)]
        wav: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    let cli = Cli::parse();
    let paths = ProjectPaths::discover()?.with_overrides(cli.config, cli.log_dir);
    let stdout = io::stdout();
    run(cli.command, &paths, &mut stdout.lock())
}

fn run(command: Commands, paths: &ProjectPaths, out: &mut impl Write) -> Result<()> {
    let store = ConfigStore::new(&paths.config_file);
    let log = ActivityLog::new(&paths.log_dir);

    match command {
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let doc = store.load();
                writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
            }
            ConfigAction::Path => {
                writeln!(out, "{}", store.path().display())?;
            }
            ConfigAction::Set {
                work,
                rest,
                reminders,
                volume,
                beep,
                wav,
            } => {
                let mut doc = store.load();
                if let Some(minutes) = work {
                    doc.timer.work_minutes = minutes;
                }
                if let Some(minutes) = rest {
                    doc.timer.break_minutes = minutes;
                }
                if let Some(count) = reminders {
                    doc.timer.reminder_count = count;
                }
                if let Some(volume) = volume {
                    doc.sound.volume = volume;
                }
                if beep {
                    doc.sound.use_beep = true;
                } else if wav {
                    doc.sound.use_beep = false;
                }
                store
                    .try_save(&doc)
                    .with_context(|| format!("Failed to update {}", store.path().display()))?;
                writeln!(out, "Saved {}", store.path().display())?;
            }
        },
        Commands::Today => {
            let count = log.recover_today_count(Local::now().date_naive());
            writeln!(out, "{}", count)?;
        }
        Commands::Log { date } => {
            let date = match date {
                Some(raw) => match NaiveDate::parse_from_str(&raw, DATE_FORMAT) {
                    Ok(date) => date,
                    Err(_) => bail!("Invalid date '{}', expected YYYY-MM-DD", raw),
                },
                None => Local::now().date_naive(),
            };
            match log.read_day(date) {
                Ok(rows) => {
                    writeln!(
                        out,
                        "{:<19}  {:<8}  {:<8}  {:<8}  {:<5}  {}",
                        "timestamp", "start", "reset", "pause", "phase", "count"
                    )?;
                    for row in rows {
                        writeln!(
                            out,
                            "{:<19}  {:<8}  {:<8}  {:<8}  {:<5}  {}",
                            row.timestamp, row.start, row.reset, row.interrupt, row.phase, row.count
                        )?;
                    }
                }
                Err(LogError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                    writeln!(out, "No activity logged on {}", date.format(DATE_FORMAT))?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomotick_core::{LogEvent, Phase};

    fn paths(dir: &tempfile::TempDir) -> ProjectPaths {
        ProjectPaths {
            config_file: dir.path().join("settings.json"),
            log_dir: dir.path().join("log"),
            data_dir: dir.path().to_path_buf(),
        }
    }

    fn output(command: Commands, paths: &ProjectPaths) -> Result<String> {
        let mut out = Vec::new();
        run(command, paths, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn set_updates_only_given_fields() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(&dir);
        let set = Commands::Config {
            action: ConfigAction::Set {
                work: Some(45),
                rest: None,
                reminders: Some(2),
                volume: None,
                beep: false,
                wav: true,
            },
        };
        output(set, &paths).unwrap();

        let doc = ConfigStore::new(&paths.config_file).load();
        assert_eq!(doc.timer.work_minutes, 45);
        assert_eq!(doc.timer.break_minutes, 5);
        assert_eq!(doc.timer.reminder_count, 2);
        assert!(!doc.sound.use_beep);
    }

    #[test]
    fn set_rejects_zero_minutes() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(&dir);
        let set = Commands::Config {
            action: ConfigAction::Set {
                work: Some(0),
                rest: None,
                reminders: None,
                volume: None,
                beep: false,
                wav: false,
            },
        };

        assert!(output(set, &paths).is_err());
        assert!(!paths.config_file.exists());
    }

    #[test]
    fn set_rejects_phases_longer_than_a_day() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(&dir);
        let set = Commands::Config {
            action: ConfigAction::Set {
                work: Some(80_000_000),
                rest: None,
                reminders: None,
                volume: None,
                beep: false,
                wav: false,
            },
        };

        let err = output(set, &paths).unwrap_err();
        assert!(format!("{:#}", err).contains("work_time"));
        assert!(!paths.config_file.exists());
    }

    #[test]
    fn today_reports_the_highest_count() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(&dir);
        let log = ActivityLog::new(&paths.log_dir);
        let at = Local::now().naive_local();
        log.append(&LogEvent::PhaseStart {
            at,
            phase: Phase::Work,
            cycle: 4,
        });
        log.append(&LogEvent::Reset { at, completed: 3 });

        let text = output(Commands::Today, &paths).unwrap();
        if Local::now().date_naive() == at.date() {
            assert_eq!(text.trim(), "4");
        }
    }

    #[test]
    fn log_for_a_quiet_day() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(&dir);
        let text = output(
            Commands::Log {
                date: Some("2024-01-02".to_string()),
            },
            &paths,
        )
        .unwrap();

        assert_eq!(text.trim(), "No activity logged on 2024-01-02");
    }

    #[test]
    fn log_rejects_bad_dates() {
        let dir = tempfile::tempdir().unwrap();
        let command = Commands::Log {
            date: Some("02/01/2024".to_string()),
        };
        assert!(output(command, &paths(&dir)).is_err());
    }
}
