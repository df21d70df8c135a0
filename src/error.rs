// Playback error taxonomy
// Errors surfaced synchronously to widget players

use crate::audio::engine::EngineError;
use thiserror::Error;

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Errors reported by the playback subsystem
///
/// Preemption of a session is not an error and never appears here; it is
/// reported through [`crate::playback::StopReason::Preempted`].
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The audio engine failed to start, or has not been started yet
    #[error("Audio engine initialization failed: {0}")]
    Initialization(String),

    /// Malformed events, tempo, envelope or parameter values
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The audio engine rejected an operation at runtime
    #[error("Audio engine error: {0}")]
    Engine(#[from] EngineError),

    /// A session's stop callback could not release its resources
    #[error("Session stop failed: {0}")]
    StopFailed(String),
}

impl PlaybackError {
    /// Shorthand for an [`PlaybackError::InvalidConfiguration`] error
    pub fn invalid(message: impl Into<String>) -> Self {
        PlaybackError::InvalidConfiguration(message.into())
    }

    /// Check if this error was caused by bad input rather than the engine
    pub fn is_configuration(&self) -> bool {
        matches!(self, PlaybackError::InvalidConfiguration(_))
    }
}
