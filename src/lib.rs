// Lesson playback - Library exports for widgets, tests and benchmarks

pub mod audio;
pub mod config;
pub mod error;
pub mod playback;
pub mod sequencer;
pub mod synth;
pub mod widgets;

// Re-export commonly used types for convenience
pub use audio::engine::{AudioEngine, EngineError, SharedEngine, share_engine};
pub use audio::offline::OfflineEngine;
pub use config::PlaybackConfig;
pub use error::{PlaybackError, Result};
pub use playback::{
    OwnerId, PlayRequest, PlaybackCoordinator, PlaybackObserver, PlaybackServices,
    PlaybackSession, StopReason, WidgetPlayer,
};
pub use sequencer::{
    Event, EventLength, EventOffset, EventScheduler, Metronome, Subdivision, Swing, Tempo,
    TimeSignature, Transport, TransportState,
};
pub use synth::envelope::{AdsrParams, EnvelopeShaper};
pub use widgets::{ChordPlayer, RhythmSequencer, ScalePlayer, SynthExplorer};
