// Timeline - Musical time representation
// Handles conversion between ticks, beats, bars, and real time

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Musical position or duration in ticks (1/480 of a quarter note)
pub type Tick = u64;

/// Ticks per quarter note (PPQN - Pulses Per Quarter Note)
/// Standard MIDI resolution
pub const TICKS_PER_QUARTER: Tick = 480;

/// Largest offset or length an event may resolve to (about 36 years at 120 BPM).
/// Keeps `offset + length + swing` far from `Tick` overflow.
pub const MAX_TICK: Tick = 1 << 40;

/// Time signature (numerator/denominator)
/// Example: 4/4 time = TimeSignature { numerator: 4, denominator: 4 }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,   // Beats per bar (typically 3, 4, 5, 6, 7)
    pub denominator: u8, // Note value (4 = quarter note, 8 = eighth note)
}

impl TimeSignature {
    /// Creates a new time signature
    pub fn new(numerator: u8, denominator: u8) -> Result<Self> {
        if numerator == 0 {
            return Err(PlaybackError::invalid(
                "Time signature numerator must be > 0",
            ));
        }
        if !denominator.is_power_of_two() || denominator > 32 {
            return Err(PlaybackError::invalid(format!(
                "Time signature denominator must be a power of 2 up to 32, got {denominator}"
            )));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Common 4/4 time signature
    pub fn four_four() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }

    /// Common 3/4 time signature (waltz)
    pub fn three_four() -> Self {
        Self {
            numerator: 3,
            denominator: 4,
        }
    }

    /// Common 6/8 time signature
    pub fn six_eight() -> Self {
        Self {
            numerator: 6,
            denominator: 8,
        }
    }

    /// Re-check a value that bypassed `new` (e.g. deserialized)
    pub fn validate(&self) -> Result<()> {
        Self::new(self.numerator, self.denominator).map(|_| ())
    }

    /// Number of beats per bar
    pub fn beats_per_bar(&self) -> f64 {
        self.numerator as f64
    }

    /// Length of one beat (the denominator's note value) in ticks
    /// Example: 4/4 = 480, 6/8 = 240
    pub fn ticks_per_beat(&self) -> Tick {
        TICKS_PER_QUARTER * 4 / self.denominator as Tick
    }

    /// Length of one bar in ticks
    pub fn ticks_per_bar(&self) -> Tick {
        self.numerator as Tick * self.ticks_per_beat()
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Tempo in BPM (quarter notes per minute)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    pub const MAX_BPM: f64 = 999.0;

    /// Creates a new tempo
    /// BPM must be positive, finite and at most 999
    pub fn new(bpm: f64) -> Result<Self> {
        if !bpm.is_finite() || bpm <= 0.0 || bpm > Self::MAX_BPM {
            return Err(PlaybackError::invalid(format!(
                "BPM must be in (0, {}], got {bpm}",
                Self::MAX_BPM
            )));
        }
        Ok(Self { bpm })
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Duration of one quarter note in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Ticks elapsed per second at this tempo
    pub fn ticks_per_second(&self) -> f64 {
        self.bpm / 60.0 * TICKS_PER_QUARTER as f64
    }

    /// Duration of a tick span in seconds
    pub fn ticks_to_seconds(&self, ticks: Tick) -> f64 {
        ticks as f64 / self.ticks_per_second()
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 120.0 }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Swing feel applied to alternate subdivisions
///
/// Positions are pushed later by `sin(pi * phase) * amount * subdivision / 3`
/// ticks, where `phase` is the position within a pair of subdivisions. The
/// off-beat of each pair moves the most (full swing gives a triplet feel) and
/// on-beats never move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swing {
    amount: f64,
    subdivision: Tick,
}

impl Swing {
    /// Create a swing of `amount` (0.0 to 1.0) over a subdivision in ticks
    pub fn new(amount: f64, subdivision: Tick) -> Result<Self> {
        if !amount.is_finite() || !(0.0..=1.0).contains(&amount) {
            return Err(PlaybackError::invalid(format!(
                "Swing amount must be in [0, 1], got {amount}"
            )));
        }
        if subdivision == 0 {
            return Err(PlaybackError::invalid("Swing subdivision must be > 0"));
        }
        Ok(Self {
            amount,
            subdivision,
        })
    }

    /// Straight timing, swung on eighth notes once an amount is set
    pub fn straight() -> Self {
        Self {
            amount: 0.0,
            subdivision: TICKS_PER_QUARTER / 2,
        }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn subdivision(&self) -> Tick {
        self.subdivision
    }

    /// Same subdivision, different amount
    pub fn with_amount(self, amount: f64) -> Result<Self> {
        Self::new(amount, self.subdivision)
    }

    /// Delay applied to a position, in ticks
    pub fn offset(&self, position: Tick) -> Tick {
        if self.amount <= 0.0 {
            return 0;
        }
        let pair = self.subdivision * 2;
        let phase = (position % pair) as f64 / pair as f64;
        let shift = (std::f64::consts::PI * phase).sin() * self.amount * self.subdivision as f64
            / 3.0;
        shift.round().max(0.0) as Tick
    }

    /// Swung position
    pub fn apply(&self, position: Tick) -> Tick {
        position.saturating_add(self.offset(position))
    }
}

impl Default for Swing {
    fn default() -> Self {
        Self::straight()
    }
}

/// Musical time representation
/// Represents a position in the timeline using bars, beats, and ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MusicalTime {
    pub bar: u32,  // Bar number (1-based)
    pub beat: u8,  // Beat within bar (1-based)
    pub tick: u16, // Tick within beat (0-based)
}

impl MusicalTime {
    /// Creates a new musical time position
    pub fn new(bar: u32, beat: u8, tick: u16) -> Self {
        Self { bar, beat, tick }
    }

    /// Zero position (bar 1, beat 1, tick 0)
    pub fn zero() -> Self {
        Self::new(1, 1, 0)
    }

    /// Create from total ticks
    pub fn from_total_ticks(total_ticks: Tick, time_signature: &TimeSignature) -> Self {
        let ticks_per_beat = time_signature.ticks_per_beat();
        let ticks_per_bar = time_signature.ticks_per_bar();

        let bar = (total_ticks / ticks_per_bar) + 1; // 1-based
        let remaining_after_bars = total_ticks % ticks_per_bar;
        let beat = (remaining_after_bars / ticks_per_beat) + 1; // 1-based
        let tick = remaining_after_bars % ticks_per_beat;

        Self::new(bar as u32, beat as u8, tick as u16)
    }
}

impl Default for MusicalTime {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for MusicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}:{:03}", self.bar, self.beat, self.tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_signature() {
        let ts = TimeSignature::four_four();
        assert_eq!(ts.numerator, 4);
        assert_eq!(ts.denominator, 4);
        assert_eq!(ts.beats_per_bar(), 4.0);
        assert_eq!(ts.ticks_per_bar(), 1920);
        assert_eq!(ts.to_string(), "4/4");

        assert!(TimeSignature::new(0, 4).is_err());
        assert!(TimeSignature::new(4, 3).is_err());
        assert!(TimeSignature::new(7, 8).is_ok());
    }

    #[test]
    fn test_tempo() {
        let tempo = Tempo::new(120.0).unwrap();
        assert_eq!(tempo.bpm(), 120.0);
        assert_eq!(tempo.beat_duration_seconds(), 0.5);

        // At 120 BPM, one beat = 0.5s = 480 ticks
        assert_eq!(tempo.ticks_per_second(), 960.0);
        assert_eq!(tempo.ticks_to_seconds(240), 0.25);
        assert_eq!(
            tempo.ticks_to_seconds(TimeSignature::four_four().ticks_per_bar()),
            2.0
        );
    }

    #[test]
    fn test_tempo_rejects_non_positive() {
        assert!(Tempo::new(0.0).is_err());
        assert!(Tempo::new(-60.0).is_err());
        assert!(Tempo::new(f64::NAN).is_err());
        assert!(Tempo::new(1000.0).is_err());
        assert!(Tempo::new(0.5).is_ok());
    }

    #[test]
    fn test_musical_time_conversion() {
        let ts = TimeSignature::four_four();

        // 0 total ticks = bar 1, beat 1, tick 0
        assert_eq!(MusicalTime::from_total_ticks(0, &ts), MusicalTime::zero());

        // One quarter note = bar 1, beat 2
        assert_eq!(MusicalTime::from_total_ticks(480, &ts), MusicalTime::new(1, 2, 0));

        // 4 beats = bar 2
        assert_eq!(MusicalTime::from_total_ticks(1920, &ts), MusicalTime::new(2, 1, 0));

        let converted = MusicalTime::from_total_ticks(1000, &ts);
        assert_eq!(converted, MusicalTime::new(1, 3, 40));
        assert_eq!(converted.to_string(), "1:03:040");
    }

    #[test]
    fn test_different_time_signatures() {
        let ts_34 = TimeSignature::three_four();
        let ts_68 = TimeSignature::six_eight();

        // Bar 2 in 3/4 time: 3 quarter notes
        assert_eq!(MusicalTime::from_total_ticks(1440, &ts_34), MusicalTime::new(2, 1, 0));

        // Bar 2 in 6/8 time: 6 eighth notes
        assert_eq!(ts_68.ticks_per_beat(), 240);
        assert_eq!(MusicalTime::from_total_ticks(1440, &ts_68), MusicalTime::new(2, 1, 0));
    }

    #[test]
    fn test_swing_offsets() {
        let straight = Swing::straight();
        assert_eq!(straight.offset(240), 0);

        let full = Swing::new(1.0, 240).unwrap();
        // On-beats stay put
        assert_eq!(full.offset(0), 0);
        assert_eq!(full.offset(480), 0);
        // Off-beat eighth lands on the triplet
        assert_eq!(full.apply(240), 320);

        let half = Swing::new(0.5, 240).unwrap();
        assert_eq!(half.apply(720), 760);
    }

    #[test]
    fn test_swing_validation() {
        assert!(Swing::new(1.5, 240).is_err());
        assert!(Swing::new(-0.1, 240).is_err());
        assert!(Swing::new(0.5, 0).is_err());
        assert_eq!(
            Swing::straight().with_amount(0.3).unwrap().subdivision(),
            240
        );
    }
}
