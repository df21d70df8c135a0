// Metronome - Click track generator for musical timing
// Produces one click event per beat, accenting the downbeat of each bar

use super::event::{Event, EventOffset};
use super::timeline::TimeSignature;

/// Metronome click type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickType {
    /// Click on first beat of bar (accent/downbeat)
    Accent,
    /// Click on other beats
    Regular,
}

/// Metronome state for playback
#[derive(Debug, Clone)]
pub struct Metronome {
    time_signature: TimeSignature,
    enabled: bool,
    volume: f32,
}

impl Metronome {
    /// Create new metronome
    pub fn new(time_signature: TimeSignature) -> Self {
        Self {
            time_signature,
            enabled: true,
            volume: 0.5,
        }
    }

    /// Enable/disable metronome
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Check if metronome is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Set metronome volume (0.0 to 1.0)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Get metronome volume
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
    }

    /// Click type for a zero-based beat counted from the start
    pub fn click_type(&self, beat_index: u32) -> ClickType {
        if beat_index % self.time_signature.numerator as u32 == 0 {
            ClickType::Accent
        } else {
            ClickType::Regular
        }
    }

    /// Click events covering `measures` bars
    /// Empty when disabled
    pub fn events(&self, measures: u32) -> Vec<Event> {
        if !self.enabled {
            return Vec::new();
        }

        let beats = measures * self.time_signature.numerator as u32;
        (0..beats)
            .map(|index| {
                let measure = index / self.time_signature.numerator as u32 + 1;
                let beat = (index % self.time_signature.numerator as u32 + 1) as f64;
                Event::click(self.click_type(index), EventOffset::Measure { measure, beat })
                    .with_velocity(self.volume)
            })
            .collect()
    }
}

impl Default for Metronome {
    fn default() -> Self {
        Self::new(TimeSignature::four_four())
    }
}
