//! Audio cue contract consumed by the timer engine.
//!
//! The engine only needs two cues. How they sound (a synthesized tone or a
//! named asset) and how volume reaches the speakers is up to the
//! implementation living in the host.

use crate::error::SoundError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Start of any phase, including an automatic transition.
    Boundary,
    /// Partway through a work phase.
    Reminder,
}

pub trait SoundNotifier {
    fn play_boundary_cue(&mut self) -> Result<(), SoundError>;

    fn play_reminder_cue(&mut self) -> Result<(), SoundError>;

    /// `volume` is 0..=100; implementations clamp anything above.
    fn set_volume(&mut self, volume: u32);

    /// Flips between tone and asset playback, returning whether tone
    /// ("beep") mode is now active.
    fn toggle_mode(&mut self) -> bool;
}

/// Remembers cues instead of playing them, for tests in this workspace that
/// assert on which cues an engine asked for.
#[derive(Debug, Clone)]
pub struct CueRecorder {
    cues: Vec<Cue>,
    volume: u32,
    use_beep: bool,
}

impl CueRecorder {
    pub fn new() -> Self {
        Self {
            cues: Vec::new(),
            volume: 50,
            use_beep: true,
        }
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn count(&self, cue: Cue) -> usize {
        self.cues.iter().filter(|&&c| c == cue).count()
    }

    pub fn volume(&self) -> u32 {
        self.volume
    }

    pub fn uses_beep(&self) -> bool {
        self.use_beep
    }
}

impl Default for CueRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundNotifier for CueRecorder {
    fn play_boundary_cue(&mut self) -> Result<(), SoundError> {
        self.cues.push(Cue::Boundary);
        Ok(())
    }

    fn play_reminder_cue(&mut self) -> Result<(), SoundError> {
        self.cues.push(Cue::Reminder);
        Ok(())
    }

    fn set_volume(&mut self, volume: u32) {
        self.volume = volume.min(100);
    }

    fn toggle_mode(&mut self) -> bool {
        self.use_beep = !self.use_beep;
        self.use_beep
    }
}
