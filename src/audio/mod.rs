// Audio engine boundary: the capability the playback subsystem drives

pub mod engine;
pub mod offline;
pub mod timing;

pub use engine::{
    AudioEngine, EngineError, SharedEngine, SoundRequest, SourceHandle, SourceId, Voice,
    share_engine,
};
pub use offline::{AmplitudeLane, EngineCall, OfflineEngine};
pub use timing::AudioTiming;
