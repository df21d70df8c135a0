// Audio engine capability
// The subsystem drives sound through this trait; timbre synthesis lives behind it

use crate::sequencer::{ClickType, DrumKind};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by an audio engine implementation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Audio engine is not initialized")]
    NotInitialized,

    #[error("Output device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Unknown sound source: {0}")]
    UnknownSource(SourceId),

    #[error("Sound source rejected: {0}")]
    SourceRejected(String),
}

/// Identifier of a sound source inside the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owned handle to a sounding unit
///
/// Not `Clone`: exactly one envelope owns a source from creation until it is
/// handed back through [`AudioEngine::stop_source`].
#[derive(Debug, PartialEq, Eq)]
pub struct SourceHandle {
    id: SourceId,
}

impl SourceHandle {
    /// Engines mint handles when creating sources
    pub fn new(id: SourceId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }
}

/// What kind of sound to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Voice {
    /// Pitched tone (MIDI note number, 60 = C4)
    Tone { pitch: u8 },
    /// Percussion hit
    Drum(DrumKind),
    /// Metronome click
    Click(ClickType),
}

impl Voice {
    /// MIDI pitch if this voice is pitched
    pub fn pitch(&self) -> Option<u8> {
        match self {
            Voice::Tone { pitch } => Some(*pitch),
            _ => None,
        }
    }
}

/// Request for a new sound source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundRequest {
    pub voice: Voice,
    /// Velocity (0.0 to 1.0)
    pub velocity: f32,
}

impl SoundRequest {
    pub fn new(voice: Voice, velocity: f32) -> Self {
        Self { voice, velocity }
    }
}

/// Outbound capability to the underlying audio engine
///
/// Times are engine seconds as reported by the transport's `FireTime`.
/// Amplitude automation follows linear-ramp semantics: a ramp point at `t`
/// interpolates linearly from the previous point to its value at `t`.
pub trait AudioEngine: Send {
    /// Acquire the output device. Must succeed before any trigger can sound.
    fn initialize(&mut self) -> Result<(), EngineError>;

    /// Check if the engine can produce sound
    fn is_ready(&self) -> bool;

    /// Create a silent source that starts at `at`
    fn create_source(
        &mut self,
        request: &SoundRequest,
        at: f64,
    ) -> Result<SourceHandle, EngineError>;

    /// Jump amplitude to `value` at `at`
    fn set_amplitude_at(
        &mut self,
        source: &SourceHandle,
        value: f64,
        at: f64,
    ) -> Result<(), EngineError>;

    /// Ramp amplitude linearly so that it reaches `value` at `at`
    fn ramp_amplitude_to(
        &mut self,
        source: &SourceHandle,
        value: f64,
        at: f64,
    ) -> Result<(), EngineError>;

    /// Drop automation scheduled at or after `at`, holding the value the
    /// curve has at `at` (an in-progress ramp is truncated, not undone)
    fn cancel_and_hold_at(&mut self, source: &SourceHandle, at: f64) -> Result<(), EngineError>;

    /// Stop the source at `at` and release it. Ownership returns to the engine.
    fn stop_source(&mut self, source: SourceHandle, at: f64) -> Result<(), EngineError>;
}

/// Engine shared between the scheduler's triggers and widget players
pub type SharedEngine = Arc<Mutex<dyn AudioEngine>>;

/// Wrap an engine for sharing
pub fn share_engine<E: AudioEngine + 'static>(engine: E) -> Arc<Mutex<E>> {
    Arc::new(Mutex::new(engine))
}
