use crate::theme::Theme;
use pomotick_core::config::MAX_VOLUME;
use pomotick_core::{ConfigStore, Phase, SettingsForm, SoundNotifier, TickOutcome, TimerEngine};
use tracing::{error, info};

pub const VOLUME_STEP: i32 = 5;

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppMode {
    #[default]
    Normal,
    EditingSettings,
    EditingCount,
    ConfirmClearCount,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SettingsField {
    Work,
    Break,
    Reminders,
    Volume,
}

impl SettingsField {
    pub const ALL: [SettingsField; 4] = [
        SettingsField::Work,
        SettingsField::Break,
        SettingsField::Reminders,
        SettingsField::Volume,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::Work => "Work (min)",
            SettingsField::Break => "Break (min)",
            SettingsField::Reminders => "Reminders",
            SettingsField::Volume => "Volume (0-100)",
        }
    }

    fn next(self) -> Self {
        match self {
            SettingsField::Work => SettingsField::Break,
            SettingsField::Break => SettingsField::Reminders,
            SettingsField::Reminders => SettingsField::Volume,
            SettingsField::Volume => SettingsField::Work,
        }
    }

    fn prev(self) -> Self {
        match self {
            SettingsField::Work => SettingsField::Volume,
            SettingsField::Break => SettingsField::Work,
            SettingsField::Reminders => SettingsField::Break,
            SettingsField::Volume => SettingsField::Reminders,
        }
    }
}

/// Terminal host state. The engine owns the countdown and the settings
/// document; the app owns persistence and everything on screen.
pub struct App<N: SoundNotifier> {
    pub engine: TimerEngine<N>,
    pub store: ConfigStore,
    pub theme: Theme,
    pub mode: AppMode,
    pub form: SettingsForm,
    pub form_field: SettingsField,
    pub input_buffer: String,
    pub status: Option<String>,
    pub desktop_notifications: bool,
    pub should_quit: bool,
}

impl<N: SoundNotifier> App<N> {
    pub fn new(engine: TimerEngine<N>, store: ConfigStore, theme: Theme) -> Self {
        Self {
            form: SettingsForm::from_config(engine.config()),
            engine,
            store,
            theme,
            mode: AppMode::Normal,
            form_field: SettingsField::Work,
            input_buffer: String::new(),
            status: None,
            desktop_notifications: true,
            should_quit: false,
        }
    }

    pub fn handle_outcome(&mut self, outcome: TickOutcome) {
        if let TickOutcome::PhaseChanged(phase) = outcome {
            let (title, body) = match phase {
                Phase::Break => (
                    "Break time",
                    format!(
                        "Pomodoro {} done. Rest for {} min.",
                        self.engine.completed_pomodoro_count(),
                        self.engine.config().timer.break_minutes
                    ),
                ),
                Phase::Work => (
                    "Back to work",
                    format!("Pomodoro {} starts now.", self.engine.work_cycle_index()),
                ),
            };
            self.status = Some(body.clone());
            self.send_notification(title, &body);
        }
    }

    pub fn toggle_timer(&mut self) {
        self.engine.toggle();
        self.status = None;
    }

    pub fn reset_timer(&mut self) {
        self.engine.reset();
        self.status = Some("Timer reset".to_string());
    }

    pub fn change_volume(&mut self, delta: i32) {
        let current = self.engine.config().sound.volume as i32;
        let volume = (current + delta).clamp(0, MAX_VOLUME as i32) as u32;
        if volume == self.engine.config().sound.volume {
            return;
        }
        self.engine.set_volume(volume);
        self.status = Some(format!("Volume {}%", volume));
        self.persist();
    }

    pub fn toggle_sound_mode(&mut self) {
        let use_beep = self.engine.toggle_sound_mode();
        self.status = Some(if use_beep { "Beep mode" } else { "Sound file mode" }.to_string());
        self.persist();
    }

    pub fn open_settings(&mut self) {
        self.form = SettingsForm::from_config(self.engine.config());
        self.form_field = SettingsField::Work;
        self.status = None;
        self.mode = AppMode::EditingSettings;
    }

    pub fn form_value(&self, field: SettingsField) -> &str {
        match field {
            SettingsField::Work => &self.form.work_minutes,
            SettingsField::Break => &self.form.break_minutes,
            SettingsField::Reminders => &self.form.reminder_count,
            SettingsField::Volume => &self.form.volume,
        }
    }

    fn form_value_mut(&mut self) -> &mut String {
        match self.form_field {
            SettingsField::Work => &mut self.form.work_minutes,
            SettingsField::Break => &mut self.form.break_minutes,
            SettingsField::Reminders => &mut self.form.reminder_count,
            SettingsField::Volume => &mut self.form.volume,
        }
    }

    pub fn next_field(&mut self) {
        self.form_field = self.form_field.next();
    }

    pub fn prev_field(&mut self) {
        self.form_field = self.form_field.prev();
    }

    pub fn handle_char(&mut self, c: char) {
        match self.mode {
            AppMode::EditingSettings => {
                if c == '\n' {
                    self.submit_settings();
                } else if !c.is_control() {
                    self.form_value_mut().push(c);
                }
            }
            AppMode::EditingCount => {
                if c == '\n' {
                    self.submit_count();
                } else if c.is_ascii_digit() {
                    self.input_buffer.push(c);
                }
            }
            AppMode::Normal | AppMode::ConfirmClearCount => {}
        }
    }

    pub fn handle_backspace(&mut self) {
        match self.mode {
            AppMode::EditingSettings => {
                self.form_value_mut().pop();
            }
            AppMode::EditingCount => {
                self.input_buffer.pop();
            }
            AppMode::Normal | AppMode::ConfirmClearCount => {}
        }
    }

    /// Validates the form, persists it, and restarts the cycle on the new
    /// durations. A rejected form keeps the overlay open with the reason.
    pub fn submit_settings(&mut self) {
        match self.form.apply(self.engine.config()) {
            Ok(doc) => {
                let saved = self.store.save(&doc);
                self.engine.apply_config(doc);
                self.mode = AppMode::Normal;
                self.status = Some(if saved {
                    "Settings saved".to_string()
                } else {
                    "Settings applied but could not be saved".to_string()
                });
            }
            Err(e) => {
                self.status = Some(e.to_string());
            }
        }
    }

    pub fn open_count_editor(&mut self) {
        self.input_buffer = self.engine.completed_pomodoro_count().to_string();
        self.status = None;
        self.mode = AppMode::EditingCount;
    }

    pub fn submit_count(&mut self) {
        match self.input_buffer.trim().parse::<u32>() {
            Ok(count) => {
                self.engine.set_completed_count(count);
                self.status = Some(format!("Count set to {}", count));
                self.cancel();
            }
            Err(_) => {
                self.status = Some("Count must be a whole number".to_string());
            }
        }
    }

    pub fn ask_clear_count(&mut self) {
        self.mode = AppMode::ConfirmClearCount;
    }

    pub fn confirm_clear_count(&mut self, yes: bool) {
        if yes {
            self.engine.clear_completed_count();
            self.status = Some("Count cleared".to_string());
        }
        self.mode = AppMode::Normal;
    }

    pub fn cancel(&mut self) {
        self.mode = AppMode::Normal;
        self.input_buffer.clear();
    }

    fn persist(&mut self) {
        if !self.store.save(self.engine.config()) {
            self.status = Some("Could not save settings".to_string());
        }
    }

    fn send_notification(&self, title: &str, body: &str) {
        if !self.desktop_notifications {
            return;
        }
        match notify_rust::Notification::new()
            .summary(title)
            .body(body)
            .appname("pomotick")
            .show()
        {
            Ok(_) => info!("Notified: {}", title),
            Err(e) => error!("Failed to send notification: {}", e),
        }
    }
}
