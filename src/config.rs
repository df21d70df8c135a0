// Playback configuration
// Defaults shared by every widget player, loadable from JSON or RON

use crate::error::{PlaybackError, Result};
use crate::sequencer::event::Subdivision;
use crate::sequencer::timeline::{Swing, Tempo, TimeSignature};
use crate::synth::envelope::AdsrParams;
use ron::{from_str as ron_from_str, to_string as ron_to_string};
use serde::{Deserialize, Serialize};

/// Process-wide playback defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Output sample rate in Hz
    pub sample_rate: f64,
    /// Initial tempo in quarter notes per minute
    pub tempo_bpm: f64,
    pub time_signature: TimeSignature,
    /// Swing amount (0.0 = straight, 1.0 = triplet feel)
    pub swing: f64,
    /// Steps per quarter note the swing acts on (2 = eighths)
    pub swing_subdivision: u16,
    /// Default grid for step offsets (4 = sixteenths)
    pub subdivision: u16,
    pub envelope: AdsrParams,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            tempo_bpm: 120.0,
            time_signature: TimeSignature::four_four(),
            swing: 0.0,
            swing_subdivision: 2,
            subdivision: 4,
            envelope: AdsrParams::default(),
        }
    }
}

impl PlaybackConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            PlaybackError::invalid(format!("Failed to parse playback config JSON: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a RON document
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron_from_str(ron).map_err(|e| {
            PlaybackError::invalid(format!("Failed to parse playback config RON: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            PlaybackError::invalid(format!("Failed to serialize playback config: {}", e))
        })
    }

    pub fn to_ron_string(&self) -> Result<String> {
        ron_to_string(self).map_err(|e| {
            PlaybackError::invalid(format!("Failed to serialize playback config: {}", e))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(PlaybackError::invalid(format!(
                "Sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        self.tempo()?;
        self.time_signature.validate()?;
        self.swing()?;
        self.subdivision()?;
        self.envelope.validate()
    }

    pub fn tempo(&self) -> Result<Tempo> {
        Tempo::new(self.tempo_bpm)
    }

    pub fn swing(&self) -> Result<Swing> {
        let grid = Subdivision::new(self.swing_subdivision)?;
        Swing::new(self.swing, grid.ticks_per_step())
    }

    pub fn subdivision(&self) -> Result<Subdivision> {
        Subdivision::new(self.subdivision)
    }
}
