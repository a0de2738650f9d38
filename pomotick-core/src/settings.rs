//! Validation at the settings-editor boundary.
//!
//! Editors (the terminal overlay, `pomotickctl config set`) collect raw text
//! and turn it into a replacement document here. The engine never sees an
//! unvalidated value.

use crate::config::{ConfigDocument, MAX_PHASE_MINUTES, MAX_VOLUME};
use crate::error::ValidationError;

/// Raw field values as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsForm {
    pub work_minutes: String,
    pub break_minutes: String,
    pub reminder_count: String,
    pub volume: String,
}

impl SettingsForm {
    pub fn from_config(doc: &ConfigDocument) -> Self {
        Self {
            work_minutes: doc.timer.work_minutes.to_string(),
            break_minutes: doc.timer.break_minutes.to_string(),
            reminder_count: doc.timer.reminder_count.to_string(),
            volume: doc.sound.volume.to_string(),
        }
    }

    /// Returns a copy of `base` with the form's values, or the first field
    /// that does not validate.
    pub fn apply(&self, base: &ConfigDocument) -> Result<ConfigDocument, ValidationError> {
        let mut doc = base.clone();
        doc.timer.work_minutes = parse_minutes("work_time", &self.work_minutes)?;
        doc.timer.break_minutes = parse_minutes("break_time", &self.break_minutes)?;
        doc.timer.reminder_count = parse_positive("reminder_interval", &self.reminder_count)?;
        doc.sound.volume = parse_volume(&self.volume)?;
        Ok(doc)
    }
}

pub fn parse_positive(field: &'static str, raw: &str) -> Result<u32, ValidationError> {
    let value = parse_whole(field, raw)?;
    if value <= 0 {
        return Err(ValidationError::NotPositive { field });
    }
    u32::try_from(value).map_err(|_| ValidationError::OutOfRange {
        field,
        min: 1,
        max: u32::MAX as i64,
        value,
    })
}

/// A phase length: positive and at most [`MAX_PHASE_MINUTES`].
pub fn parse_minutes(field: &'static str, raw: &str) -> Result<u32, ValidationError> {
    let minutes = parse_positive(field, raw)?;
    if minutes > MAX_PHASE_MINUTES {
        return Err(ValidationError::OutOfRange {
            field,
            min: 1,
            max: MAX_PHASE_MINUTES as i64,
            value: minutes as i64,
        });
    }
    Ok(minutes)
}

pub fn parse_volume(raw: &str) -> Result<u32, ValidationError> {
    let value = parse_whole("volume", raw)?;
    if !(0..=MAX_VOLUME as i64).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: "volume",
            min: 0,
            max: MAX_VOLUME as i64,
            value,
        });
    }
    Ok(value as u32)
}

fn parse_whole(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::NotANumber {
            field,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(work: &str, brk: &str, reminders: &str, volume: &str) -> SettingsForm {
        SettingsForm {
            work_minutes: work.into(),
            break_minutes: brk.into(),
            reminder_count: reminders.into(),
            volume: volume.into(),
        }
    }

    #[test]
    fn valid_form_replaces_timer_fields_only() {
        let mut base = ConfigDocument::default();
        base.sound.use_beep = false;

        let doc = form(" 50 ", "10", "4", "75").apply(&base).unwrap();

        assert_eq!(doc.timer.work_minutes, 50);
        assert_eq!(doc.timer.break_minutes, 10);
        assert_eq!(doc.timer.reminder_count, 4);
        assert_eq!(doc.sound.volume, 75);
        assert!(!doc.sound.use_beep);
        assert_eq!(doc.window, base.window);
    }

    #[test]
    fn non_positive_values_are_rejected() {
        let base = ConfigDocument::default();

        assert_eq!(
            form("0", "5", "3", "50").apply(&base),
            Err(ValidationError::NotPositive { field: "work_time" })
        );
        assert_eq!(
            form("25", "-1", "3", "50").apply(&base),
            Err(ValidationError::NotPositive { field: "break_time" })
        );
    }

    #[test]
    fn text_and_out_of_range_volume_are_rejected() {
        let base = ConfigDocument::default();

        assert!(matches!(
            form("25", "5", "three", "50").apply(&base),
            Err(ValidationError::NotANumber { field: "reminder_interval", .. })
        ));
        assert!(matches!(
            form("25", "5", "3", "101").apply(&base),
            Err(ValidationError::OutOfRange { field: "volume", value: 101, .. })
        ));
    }

    #[test]
    fn phases_longer_than_a_day_are_rejected() {
        let base = ConfigDocument::default();

        assert_eq!(
            form("80000000", "5", "3", "50").apply(&base),
            Err(ValidationError::OutOfRange {
                field: "work_time",
                min: 1,
                max: 1440,
                value: 80_000_000,
            })
        );
        assert!(matches!(
            form("25", "1441", "3", "50").apply(&base),
            Err(ValidationError::OutOfRange { field: "break_time", .. })
        ));
        assert_eq!(
            form("1440", "5", "3", "50").apply(&base).unwrap().work_seconds(),
            86_400
        );
    }

    #[test]
    fn round_trips_the_current_document() {
        let base = ConfigDocument::default();
        assert_eq!(SettingsForm::from_config(&base).apply(&base).unwrap(), base);
    }
}
