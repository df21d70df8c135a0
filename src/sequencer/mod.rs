// Sequencer module
// Musical time, the shared transport, and event scheduling on top of it

pub mod event;
pub mod metronome;
pub mod scheduler;
pub mod timeline;
pub mod transport;

pub use event::{
    DrumKind, Event, EventLength, EventOffset, ResolvedEvent, Subdivision, Trigger,
    resolve_sequence,
};
pub use metronome::{ClickType, Metronome};
pub use scheduler::{
    EventScheduler, FiredEvent, RunHandle, RunHooks, SequenceOptions, SequencePlan,
};
pub use timeline::{MAX_TICK, MusicalTime, Swing, TICKS_PER_QUARTER, Tempo, Tick, TimeSignature};
pub use transport::{
    ClockState, FireTime, LoopRegion, ScheduleId, Transport, TransportCallback, TransportState,
};
