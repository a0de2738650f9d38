//! Work/break countdown state machine.
//!
//! The engine counts whole seconds. It owns a [`OneShot`] that the host's
//! event loop polls; each due poll is one [`TimerEngine::tick`], and the
//! one-shot is re-armed only while the timer runs, so pausing is simply not
//! re-arming.
//!
//! ## State Transitions
//!
//! ```text
//! (Work, Paused) --start--> (Work, Running) --0s--> (Break, Running) --0s--> (Work, Running) ...
//!        ^                        |                        |
//!        |                      pause                    pause
//!        +------- reset ----------+------------------------+
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(config, ActivityLog::new(log_dir), notifier);
//! engine.start();
//! // In the event loop:
//! if let Some(outcome) = engine.poll(Instant::now()) { /* redraw */ }
//! ```

use std::time::Instant;

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::activity_log::{ActivityLog, LogEvent};
use crate::clock::{OneShot, TICK_INTERVAL};
use crate::config::{ConfigDocument, MAX_VOLUME};
use crate::sound::SoundNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    /// Label written to the state column of the activity log.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::Break => "break",
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer was paused; nothing changed.
    Idle,
    Counted,
    /// A reminder cue was due on this second.
    Reminder,
    /// The countdown hit zero and the engine moved into this phase.
    PhaseChanged(Phase),
}

pub struct TimerEngine<N: SoundNotifier> {
    config: ConfigDocument,
    log: ActivityLog,
    notifier: N,
    sound_enabled: bool,
    phase: Phase,
    remaining_seconds: u32,
    running: bool,
    work_cycle_index: u32,
    break_cycle_index: u32,
    completed_pomodoro_count: u32,
    ticker: OneShot,
}

impl<N: SoundNotifier> TimerEngine<N> {
    /// Builds a paused engine at the start of a work phase, with today's
    /// count recovered from the activity log.
    pub fn new(config: ConfigDocument, log: ActivityLog, mut notifier: N) -> Self {
        let today = today();
        if let Err(e) = log.ensure_file(today) {
            warn!("Could not prepare today's activity log: {}", e);
        }
        let completed = log.recover_today_count(today);
        notifier.set_volume(config.sound.volume);
        info!("Recovered {} completed pomodoros for {}", completed, today);

        Self {
            remaining_seconds: config.work_seconds(),
            config,
            log,
            notifier,
            sound_enabled: true,
            phase: Phase::Work,
            running: false,
            work_cycle_index: completed + 1,
            break_cycle_index: completed + 1,
            completed_pomodoro_count: completed,
            ticker: OneShot::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn work_cycle_index(&self) -> u32 {
        self.work_cycle_index
    }

    pub fn break_cycle_index(&self) -> u32 {
        self.break_cycle_index
    }

    pub fn completed_pomodoro_count(&self) -> u32 {
        self.completed_pomodoro_count
    }

    /// Cycle index of the phase currently shown.
    pub fn current_cycle_index(&self) -> u32 {
        match self.phase {
            Phase::Work => self.work_cycle_index,
            Phase::Break => self.break_cycle_index,
        }
    }

    pub fn phase_duration(&self) -> u32 {
        match self.phase {
            Phase::Work => self.config.work_seconds(),
            Phase::Break => self.config.break_seconds(),
        }
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        let total = self.phase_duration();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_seconds as f64 / total as f64)
    }

    pub fn config(&self) -> &ConfigDocument {
        &self.config
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// Wait until the next tick is due, `None` while paused.
    pub fn next_tick_in(&self, now: Instant) -> Option<std::time::Duration> {
        self.ticker.time_until(now)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Starts or resumes the countdown. Returns `false` if already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.boundary_cue();
        self.log.append(&LogEvent::PhaseStart {
            at: now(),
            phase: self.phase,
            cycle: self.current_cycle_index(),
        });
        self.ticker.arm(Instant::now() + TICK_INTERVAL);
        info!(
            "Started {} #{} with {}s left",
            self.phase.label(),
            self.current_cycle_index(),
            self.remaining_seconds
        );
        true
    }

    /// Pauses the countdown, keeping the remaining time. Returns `false` if
    /// it was not running.
    pub fn pause(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.ticker.cancel();
        self.log.append(&LogEvent::Interrupt {
            at: now(),
            phase: self.phase,
            cycle: self.current_cycle_index(),
        });
        info!(
            "Paused {} with {}s left",
            self.phase.label(),
            self.remaining_seconds
        );
        true
    }

    /// Start/pause on one control. Returns whether the timer now runs.
    pub fn toggle(&mut self) -> bool {
        if self.running {
            self.pause();
        } else {
            self.start();
        }
        self.running
    }

    /// Advances one second and re-arms the tick if still running.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.advance();
        if self.running {
            self.ticker.arm(Instant::now() + TICK_INTERVAL);
        }
        outcome
    }

    /// Runs one tick if the armed deadline has passed.
    ///
    /// The next deadline follows the one that fired, so the cadence does not
    /// drift with event-loop latency. If the loop fell more than a second
    /// behind (e.g. the machine slept), it is measured from `now` instead and
    /// the missed seconds are not replayed.
    pub fn poll(&mut self, now: Instant) -> Option<TickOutcome> {
        let due = self.ticker.take_due(now)?;
        let outcome = self.advance();
        if self.running {
            let next = due + TICK_INTERVAL;
            self.ticker
                .arm(if next > now { next } else { now + TICK_INTERVAL });
        }
        Some(outcome)
    }

    /// Back to a paused work phase with full time. Counters are kept.
    pub fn reset(&mut self) {
        self.running = false;
        self.ticker.cancel();
        self.phase = Phase::Work;
        self.remaining_seconds = self.config.work_seconds();
        self.log.append(&LogEvent::Reset {
            at: now(),
            completed: self.completed_pomodoro_count,
        });
        info!(
            "Reset to work with {}s, {} completed today",
            self.remaining_seconds, self.completed_pomodoro_count
        );
    }

    /// Adopts a new settings document and resets with its durations.
    pub fn apply_config(&mut self, config: ConfigDocument) {
        self.notifier.set_volume(config.sound.volume);
        self.config = config;
        self.reset();
    }

    /// Manual correction of today's count. The next cycles continue from it.
    pub fn set_completed_count(&mut self, count: u32) {
        self.completed_pomodoro_count = count;
        self.work_cycle_index = count + 1;
        self.break_cycle_index = count + 1;
        info!("Completed count set to {}", count);
    }

    pub fn clear_completed_count(&mut self) {
        self.set_completed_count(0);
    }

    /// Changes the cue volume without touching the countdown.
    pub fn set_volume(&mut self, volume: u32) {
        let volume = volume.min(MAX_VOLUME);
        self.config.sound.volume = volume;
        self.notifier.set_volume(volume);
    }

    /// Switches between beep and sound-file cues. Returns whether beep mode
    /// is now active.
    pub fn toggle_sound_mode(&mut self) -> bool {
        let use_beep = self.notifier.toggle_mode();
        self.config.sound.use_beep = use_beep;
        use_beep
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn advance(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);

        if self.remaining_seconds == 0 {
            self.finish_phase();
            return TickOutcome::PhaseChanged(self.phase);
        }
        if self.phase == Phase::Work && self.is_reminder_point() {
            self.reminder_cue();
            return TickOutcome::Reminder;
        }
        TickOutcome::Counted
    }

    /// Reminder points sit at multiples of `work / reminder_count` seconds
    /// of elapsed work time. The spacing is floor-divided, so the last gap is
    /// longer when the division is not exact.
    fn is_reminder_point(&self) -> bool {
        let total = self.config.work_seconds();
        let count = self.config.timer.reminder_count;
        if total == 0 || count == 0 {
            return false;
        }
        let elapsed = total.saturating_sub(self.remaining_seconds) % total;
        let interval = total / count;
        (1..count).any(|i| interval * i == elapsed)
    }

    fn finish_phase(&mut self) {
        self.boundary_cue();
        match self.phase {
            Phase::Work => {
                self.completed_pomodoro_count += 1;
                self.work_cycle_index += 1;
                self.phase = Phase::Break;
                self.remaining_seconds = self.config.break_seconds();
            }
            Phase::Break => {
                self.break_cycle_index += 1;
                self.phase = Phase::Work;
                self.remaining_seconds = self.config.work_seconds();
            }
        }
        self.log.append(&LogEvent::PhaseStart {
            at: now(),
            phase: self.phase,
            cycle: self.current_cycle_index(),
        });
        info!(
            "Entered {} #{} ({} completed today)",
            self.phase.label(),
            self.current_cycle_index(),
            self.completed_pomodoro_count
        );
    }

    fn boundary_cue(&mut self) {
        if self.sound_enabled {
            let result = self.notifier.play_boundary_cue();
            self.after_cue(result);
        }
    }

    fn reminder_cue(&mut self) {
        if self.sound_enabled {
            let result = self.notifier.play_reminder_cue();
            self.after_cue(result);
        }
    }

    fn after_cue(&mut self, result: Result<(), crate::error::SoundError>) {
        if let Err(e) = result {
            error!("Sound playback failed: {}", e);
            warn!("Sound disabled for the rest of this session");
            self.sound_enabled = false;
        }
    }
}

/// `MM:SS`, minutes unbounded.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
