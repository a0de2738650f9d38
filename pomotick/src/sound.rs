//! Terminal-side audio for the timer's cues.
//!
//! Beep mode rings the terminal bell, first setting the Linux console bell
//! pitch and length from the configured tone (other terminals ignore those
//! sequences and just ring). File mode hands a WAV asset to `paplay`, or
//! `aplay` when PulseAudio is not around.

use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use pomotick_core::config::{BeepConfig, SoundConfig, MAX_VOLUME};
use pomotick_core::{SoundError, SoundNotifier};
use tracing::debug;

pub const BOUNDARY_ASSET: &str = "startBell.wav";
pub const REMINDER_ASSET: &str = "bubble.wav";

/// `paplay --volume` takes 0..=65536 for 0..=100%.
const PA_VOLUME_NORM: u32 = 65536;

pub struct TerminalSound {
    beep: BeepConfig,
    use_beep: bool,
    volume: u32,
    assets_dir: PathBuf,
    players: Vec<Child>,
}

impl TerminalSound {
    pub fn new(config: &SoundConfig, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            beep: config.beep,
            use_beep: config.use_beep,
            volume: config.volume.min(MAX_VOLUME),
            assets_dir: assets_dir.into(),
            players: Vec::new(),
        }
    }

    fn ring_bell(&self) -> Result<(), SoundError> {
        let mut out = io::stdout();
        write!(
            out,
            "\x1b[10;{}]\x1b[11;{}]\x07",
            self.beep.frequency, self.beep.duration
        )?;
        out.flush()?;
        Ok(())
    }

    fn play_asset(&mut self, name: &str) -> Result<(), SoundError> {
        let path = self.assets_dir.join(name);
        if !path.is_file() {
            return Err(SoundError::MissingAsset(path));
        }
        // Reap players that have finished.
        self.players
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));

        let pa_volume = format!("--volume={}", self.volume * PA_VOLUME_NORM / MAX_VOLUME);
        let candidates: [(&str, Vec<&str>); 2] =
            [("paplay", vec![pa_volume.as_str()]), ("aplay", vec!["-q"])];
        for (player, args) in candidates {
            let spawned = Command::new(player)
                .args(&args)
                .arg(&path)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();
            match spawned {
                Ok(child) => {
                    debug!("Playing {} with {}", path.display(), player);
                    self.players.push(child);
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(SoundError::Io(e)),
            }
        }
        Err(SoundError::NoPlayer("paplay, aplay".to_string()))
    }

    fn play(&mut self, asset: &str) -> Result<(), SoundError> {
        if self.volume == 0 {
            return Ok(());
        }
        if self.use_beep {
            self.ring_bell()
        } else {
            self.play_asset(asset)
        }
    }
}

impl SoundNotifier for TerminalSound {
    fn play_boundary_cue(&mut self) -> Result<(), SoundError> {
        self.play(BOUNDARY_ASSET)
    }

    fn play_reminder_cue(&mut self) -> Result<(), SoundError> {
        self.play(REMINDER_ASSET)
    }

    fn set_volume(&mut self, volume: u32) {
        self.volume = volume.min(MAX_VOLUME);
    }

    fn toggle_mode(&mut self) -> bool {
        self.use_beep = !self.use_beep;
        self.use_beep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_mode(dir: &std::path::Path) -> TerminalSound {
        let mut config = pomotick_core::ConfigDocument::default().sound;
        config.use_beep = false;
        TerminalSound::new(&config, dir)
    }

    #[test]
    fn missing_asset_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut sound = wav_mode(dir.path());

        assert!(matches!(
            sound.play_boundary_cue(),
            Err(SoundError::MissingAsset(p)) if p.ends_with(BOUNDARY_ASSET)
        ));
    }

    #[test]
    fn muted_volume_plays_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut sound = wav_mode(dir.path());
        sound.set_volume(0);

        assert!(sound.play_reminder_cue().is_ok());
    }

    #[test]
    fn toggle_flips_between_beep_and_wav() {
        let dir = tempfile::tempdir().unwrap();
        let mut sound = wav_mode(dir.path());

        assert!(sound.toggle_mode());
        assert!(!sound.toggle_mode());
    }

    #[test]
    fn volume_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let mut sound = wav_mode(dir.path());
        sound.set_volume(400);
        assert_eq!(sound.volume, MAX_VOLUME);
    }
}
