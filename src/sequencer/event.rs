// Musical events - what widgets ask the scheduler to play
// Offsets and lengths are symbolic until resolved against a subdivision and meter

use super::metronome::ClickType;
use super::timeline::{MAX_TICK, TICKS_PER_QUARTER, Tick, TimeSignature};
use crate::audio::engine::{SoundRequest, Voice};
use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};

/// Percussion sounds a rhythm widget can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DrumKind {
    Kick,
    Snare,
    ClosedHat,
    OpenHat,
    Clap,
    Tom,
    Rim,
}

/// Grid resolution: steps per quarter note
/// Example: 4 = sixteenth notes, 3 = eighth-note triplets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subdivision(u16);

impl Subdivision {
    pub const QUARTER: Subdivision = Subdivision(1);
    pub const EIGHTH: Subdivision = Subdivision(2);
    pub const EIGHTH_TRIPLET: Subdivision = Subdivision(3);
    pub const SIXTEENTH: Subdivision = Subdivision(4);

    /// Steps must divide a quarter note into whole ticks
    pub fn new(steps_per_quarter: u16) -> Result<Self> {
        if steps_per_quarter == 0 || TICKS_PER_QUARTER % steps_per_quarter as Tick != 0 {
            return Err(PlaybackError::invalid(format!(
                "Subdivision of {steps_per_quarter} steps per quarter does not divide {TICKS_PER_QUARTER} ticks"
            )));
        }
        Ok(Self(steps_per_quarter))
    }

    pub fn steps_per_quarter(&self) -> u16 {
        self.0
    }

    pub fn ticks_per_step(&self) -> Tick {
        TICKS_PER_QUARTER / self.0 as Tick
    }
}

impl Default for Subdivision {
    fn default() -> Self {
        Self::SIXTEENTH
    }
}

/// When an event starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventOffset {
    /// Absolute ticks from the start
    Ticks(Tick),
    /// Absolute quarter-note beats from the start (0.5 = an eighth in)
    Beats(f64),
    /// Whole steps of the run's subdivision
    Steps(u32),
    /// Measure-relative, both 1-based: measure 2, beat 3 is the third beat of
    /// the second measure. Beats count the time signature's beat unit and may
    /// be fractional.
    Measure { measure: u32, beat: f64 },
}

/// How long an event sounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventLength {
    Ticks(Tick),
    Beats(f64),
    Steps(u32),
    /// Sounds until the run is cancelled
    Held,
}

/// What an event triggers
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// One or more pitches sounding together (MIDI note numbers)
    Notes(Vec<u8>),
    Drum(DrumKind),
    Click(ClickType),
}

/// A musical event, positioned symbolically
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub offset: EventOffset,
    pub trigger: Trigger,
    pub length: EventLength,
    /// Velocity (0.0 to 1.0)
    pub velocity: f32,
}

impl Event {
    pub fn new(offset: EventOffset, trigger: Trigger, length: EventLength) -> Self {
        Self {
            offset,
            trigger,
            length,
            velocity: 1.0,
        }
    }

    /// Single pitch
    pub fn note(pitch: u8, offset: EventOffset, length: EventLength) -> Self {
        Self::new(offset, Trigger::Notes(vec![pitch]), length)
    }

    /// Several pitches at once
    pub fn chord(pitches: Vec<u8>, offset: EventOffset, length: EventLength) -> Self {
        Self::new(offset, Trigger::Notes(pitches), length)
    }

    /// Drum hit (one step long)
    pub fn drum(kind: DrumKind, offset: EventOffset) -> Self {
        Self::new(offset, Trigger::Drum(kind), EventLength::Steps(1))
    }

    /// Metronome click (one step long)
    pub fn click(click_type: ClickType, offset: EventOffset) -> Self {
        Self::new(offset, Trigger::Click(click_type), EventLength::Steps(1))
    }

    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = velocity;
        self
    }
}

/// An event with its position fixed in ticks
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEvent {
    /// Position in the submitted list
    pub index: usize,
    pub at: Tick,
    /// `None` for held events
    pub length: Option<Tick>,
    pub trigger: Trigger,
    pub velocity: f32,
}

impl ResolvedEvent {
    /// Tick at which the event stops sounding, if it ever does
    pub fn end(&self) -> Option<Tick> {
        self.length.map(|length| self.at.saturating_add(length))
    }

    /// One sound request per sounding voice
    pub fn requests(&self) -> Vec<SoundRequest> {
        match &self.trigger {
            Trigger::Notes(pitches) => pitches
                .iter()
                .map(|&pitch| SoundRequest::new(Voice::Tone { pitch }, self.velocity))
                .collect(),
            Trigger::Drum(kind) => vec![SoundRequest::new(Voice::Drum(*kind), self.velocity)],
            Trigger::Click(click) => vec![SoundRequest::new(Voice::Click(*click), self.velocity)],
        }
    }
}

fn beats_to_ticks(beats: f64, unit: Tick, what: &str) -> Result<Tick> {
    if !beats.is_finite() || beats < 0.0 {
        return Err(PlaybackError::invalid(format!(
            "{what} must be a finite, non-negative number of beats, got {beats}"
        )));
    }
    let ticks = (beats * unit as f64).round();
    if ticks > MAX_TICK as f64 {
        return Err(PlaybackError::invalid(format!(
            "{what} of {beats} beats is beyond the {MAX_TICK}-tick timeline"
        )));
    }
    Ok(ticks as Tick)
}

fn within_timeline(ticks: Tick, what: &str) -> Result<Tick> {
    if ticks > MAX_TICK {
        return Err(PlaybackError::invalid(format!(
            "{what} of {ticks} ticks is beyond the {MAX_TICK}-tick timeline"
        )));
    }
    Ok(ticks)
}

impl EventOffset {
    /// Resolve to ticks. Pure: depends only on the arguments.
    pub fn resolve(&self, subdivision: Subdivision, time_signature: &TimeSignature) -> Result<Tick> {
        match *self {
            EventOffset::Ticks(ticks) => Ok(ticks),
            EventOffset::Beats(beats) => beats_to_ticks(beats, TICKS_PER_QUARTER, "Offset"),
            EventOffset::Steps(steps) => Ok(steps as Tick * subdivision.ticks_per_step()),
            EventOffset::Measure { measure, beat } => {
                if measure == 0 {
                    return Err(PlaybackError::invalid("Measures are numbered from 1"));
                }
                if !beat.is_finite() || beat < 1.0 || beat >= time_signature.beats_per_bar() + 1.0
                {
                    return Err(PlaybackError::invalid(format!(
                        "Beat {beat} is outside a {time_signature} measure"
                    )));
                }
                let bar_start = (measure - 1) as Tick * time_signature.ticks_per_bar();
                let within =
                    beats_to_ticks(beat - 1.0, time_signature.ticks_per_beat(), "Beat")?;
                Ok(bar_start + within)
            }
        }
    }
}

impl EventLength {
    /// Resolve to ticks; `None` means held
    pub fn resolve(&self, subdivision: Subdivision) -> Result<Option<Tick>> {
        match *self {
            EventLength::Ticks(ticks) => Ok(Some(ticks)),
            EventLength::Beats(beats) => {
                beats_to_ticks(beats, TICKS_PER_QUARTER, "Length").map(Some)
            }
            EventLength::Steps(steps) => Ok(Some(steps as Tick * subdivision.ticks_per_step())),
            EventLength::Held => Ok(None),
        }
    }
}

/// Resolve a whole sequence, or nothing at all
///
/// The result is sorted by (tick, index), the order triggers fire in. Any
/// invalid event fails the whole sequence.
pub fn resolve_sequence(
    events: &[Event],
    subdivision: Subdivision,
    time_signature: &TimeSignature,
) -> Result<Vec<ResolvedEvent>> {
    let mut resolved = events
        .iter()
        .enumerate()
        .map(|(index, event)| {
            resolve_event(index, event, subdivision, time_signature).map_err(|err| match err {
                PlaybackError::InvalidConfiguration(msg) => {
                    PlaybackError::InvalidConfiguration(format!("event {index}: {msg}"))
                }
                other => other,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    resolved.sort_by_key(|event| (event.at, event.index));
    Ok(resolved)
}

fn resolve_event(
    index: usize,
    event: &Event,
    subdivision: Subdivision,
    time_signature: &TimeSignature,
) -> Result<ResolvedEvent> {
    if !event.velocity.is_finite() || !(0.0..=1.0).contains(&event.velocity) {
        return Err(PlaybackError::invalid(format!(
            "velocity must be in [0, 1], got {}",
            event.velocity
        )));
    }
    if let Trigger::Notes(pitches) = &event.trigger {
        if pitches.is_empty() {
            return Err(PlaybackError::invalid("a note event needs at least one pitch"));
        }
        if let Some(pitch) = pitches.iter().find(|&&p| p > 127) {
            return Err(PlaybackError::invalid(format!(
                "MIDI pitch must be 0-127, got {pitch}"
            )));
        }
    }

    Ok(ResolvedEvent {
        index,
        at: within_timeline(event.offset.resolve(subdivision, time_signature)?, "Offset")?,
        length: event
            .length
            .resolve(subdivision)?
            .map(|length| within_timeline(length, "Length"))
            .transpose()?,
        trigger: event.trigger.clone(),
        velocity: event.velocity,
    })
}
