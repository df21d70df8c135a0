// Widgets - Lesson controls built on WidgetPlayer
// Each widget turns its settings into events and plays them as one owner

pub mod chords;
pub mod rhythm;
pub mod scale;
pub mod synth_explorer;

pub use chords::ChordPlayer;
pub use rhythm::{DEFAULT_STEPS, DrumTrack, RhythmSequencer};
pub use scale::{ScaleDirection, ScalePlayer};
pub use synth_explorer::SynthExplorer;
