use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use pomotick_core::{ActivityLog, ConfigStore, ProjectPaths, SoundNotifier, TimerEngine};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;

mod app;
mod sound;
mod theme;
mod ui;

use app::{App, AppMode, VOLUME_STEP};
use sound::TerminalSound;

const DIAGNOSTIC_LOG_FILE: &str = "pomotick.log";
const IDLE_POLL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "pomotick")]
#[command(about = "Pomodoro timer for the terminal", long_about = None)]
struct Args {
    /// Settings file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the daily CSV logs
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Color theme file
    #[arg(long)]
    theme: Option<PathBuf>,

    /// Directory with startBell.wav and bubble.wav
    #[arg(long)]
    sounds: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let paths = ProjectPaths::discover()?.with_overrides(args.config, args.log_dir);
    init_logging(&paths.data_dir)?;

    let store = ConfigStore::new(&paths.config_file);
    store.ensure_config_file();
    let config = store.load();

    let theme_path = args.theme.unwrap_or_else(|| {
        paths
            .config_file
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(theme::THEME_FILE_NAME)
    });
    let theme = theme::load_theme(&theme_path)?;
    let sounds_dir = args.sounds.unwrap_or_else(|| paths.data_dir.join("sounds"));

    let notifier = TerminalSound::new(&config.sound, sounds_dir);
    let engine = TimerEngine::new(config, ActivityLog::new(&paths.log_dir), notifier);
    let app = App::new(engine, store, theme);
    info!("Started with settings at {}", paths.config_file.display());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Diagnostics go to a file; the terminal belongs to the UI.
fn init_logging(data_dir: &Path) -> Result<()> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;
    let path = data_dir.join(DIAGNOSTIC_LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {:?}", path))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .init();
    Ok(())
}

fn run_app<B: Backend, N: SoundNotifier>(
    terminal: &mut Terminal<B>,
    mut app: App<N>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        if let Some(outcome) = app.engine.poll(Instant::now()) {
            app.handle_outcome(outcome);
        }

        let timeout = app
            .engine
            .next_tick_in(Instant::now())
            .map_or(IDLE_POLL, |due| due.min(IDLE_POLL));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match app.mode {
                        AppMode::Normal => match key.code {
                            KeyCode::Char('q') => app.should_quit = true,
                            KeyCode::Char(' ') => app.toggle_timer(),
                            KeyCode::Char('r') => app.reset_timer(),
                            KeyCode::Char('s') => app.open_settings(),
                            KeyCode::Char('b') => app.toggle_sound_mode(),
                            KeyCode::Char('+') | KeyCode::Char('=') => {
                                app.change_volume(VOLUME_STEP)
                            }
                            KeyCode::Char('-') => app.change_volume(-VOLUME_STEP),
                            KeyCode::Char('e') => app.open_count_editor(),
                            KeyCode::Char('c') => app.ask_clear_count(),
                            _ => {}
                        },
                        AppMode::EditingSettings => match key.code {
                            KeyCode::Esc => app.cancel(),
                            KeyCode::Enter => app.handle_char('\n'),
                            KeyCode::Tab | KeyCode::Down => app.next_field(),
                            KeyCode::BackTab | KeyCode::Up => app.prev_field(),
                            KeyCode::Backspace => app.handle_backspace(),
                            KeyCode::Char(c) => app.handle_char(c),
                            _ => {}
                        },
                        AppMode::EditingCount => match key.code {
                            KeyCode::Esc => app.cancel(),
                            KeyCode::Enter => app.handle_char('\n'),
                            KeyCode::Backspace => app.handle_backspace(),
                            KeyCode::Char(c) => app.handle_char(c),
                            _ => {}
                        },
                        AppMode::ConfirmClearCount => match key.code {
                            KeyCode::Char('y') => app.confirm_clear_count(true),
                            KeyCode::Char('n') | KeyCode::Esc => app.confirm_clear_count(false),
                            _ => {}
                        },
                    }
                }
            }
        }

        if app.should_quit {
            info!("Quit");
            return Ok(());
        }
    }
}
