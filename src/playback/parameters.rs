// Named playback parameters - what UI sliders send to a widget player

use crate::error::{PlaybackError, Result};
use crate::sequencer::timeline::Tempo;
use std::fmt;

/// A validated parameter change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parameter {
    /// Quarter notes per minute
    Tempo(f64),
    /// Swing amount (0.0 to 1.0)
    Swing(f64),
    /// Envelope attack in seconds
    Attack(f64),
    /// Envelope decay in seconds
    Decay(f64),
    /// Envelope sustain level (0.0 to 1.0)
    Sustain(f64),
    /// Envelope release in seconds
    Release(f64),
}

impl Parameter {
    /// Parse a parameter name (case-insensitive) and check its value
    pub fn parse(name: &str, value: f64) -> Result<Self> {
        let parameter = match name.trim().to_ascii_lowercase().as_str() {
            "tempo" | "bpm" => Parameter::Tempo(value),
            "swing" => Parameter::Swing(value),
            "attack" => Parameter::Attack(value),
            "decay" => Parameter::Decay(value),
            "sustain" => Parameter::Sustain(value),
            "release" => Parameter::Release(value),
            _ => {
                return Err(PlaybackError::invalid(format!(
                    "Unknown parameter '{name}'"
                )));
            }
        };
        parameter.validate()?;
        Ok(parameter)
    }

    fn validate(&self) -> Result<()> {
        let value = self.value();
        match self {
            Parameter::Tempo(bpm) => Tempo::new(*bpm).map(|_| ()),
            Parameter::Swing(_) | Parameter::Sustain(_) => {
                if value.is_finite() && (0.0..=1.0).contains(&value) {
                    Ok(())
                } else {
                    Err(PlaybackError::invalid(format!(
                        "{} must be in [0, 1], got {value}",
                        self.name()
                    )))
                }
            }
            Parameter::Attack(_) | Parameter::Decay(_) | Parameter::Release(_) => {
                if value.is_finite() && value >= 0.0 {
                    Ok(())
                } else {
                    Err(PlaybackError::invalid(format!(
                        "{} must be a non-negative time, got {value}",
                        self.name()
                    )))
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Tempo(_) => "tempo",
            Parameter::Swing(_) => "swing",
            Parameter::Attack(_) => "attack",
            Parameter::Decay(_) => "decay",
            Parameter::Sustain(_) => "sustain",
            Parameter::Release(_) => "release",
        }
    }

    pub fn value(&self) -> f64 {
        match *self {
            Parameter::Tempo(v)
            | Parameter::Swing(v)
            | Parameter::Attack(v)
            | Parameter::Decay(v)
            | Parameter::Sustain(v)
            | Parameter::Release(v) => v,
        }
    }

    /// True for attack, decay, sustain and release
    pub fn is_envelope(&self) -> bool {
        matches!(
            self,
            Parameter::Attack(_) | Parameter::Decay(_) | Parameter::Sustain(_) | Parameter::Release(_)
        )
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name(), self.value())
    }
}
