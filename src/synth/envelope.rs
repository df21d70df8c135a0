// ADSR Envelope implementation
//
// Classic Attack-Decay-Sustain-Release envelope
// Shapes the amplitude of an engine source through scheduled automation,
// plus a per-sample generator that follows the same curve

use crate::audio::engine::{AudioEngine, EngineError, SourceHandle, SourceId};
use crate::error::{PlaybackError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// ADSR Envelope parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsrParams {
    /// Attack time in seconds
    pub attack: f64,
    /// Decay time in seconds
    pub decay: f64,
    /// Sustain level (0.0 to 1.0)
    pub sustain: f64,
    /// Release time in seconds
    pub release: f64,
}

impl AdsrParams {
    /// Create ADSR parameters with validation
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Result<Self> {
        let params = Self {
            attack,
            decay,
            sustain,
            release,
        };
        params.validate()?;
        Ok(params)
    }

    /// Instant on, full level, instant off
    pub fn gate() -> Self {
        Self {
            attack: 0.0,
            decay: 0.0,
            sustain: 1.0,
            release: 0.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, seconds) in [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
        ] {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(PlaybackError::invalid(format!(
                    "Envelope {name} must be a finite, non-negative time, got {seconds}"
                )));
            }
        }
        if !self.sustain.is_finite() || !(0.0..=1.0).contains(&self.sustain) {
            return Err(PlaybackError::invalid(format!(
                "Envelope sustain must be in [0, 1], got {}",
                self.sustain
            )));
        }
        Ok(())
    }

    pub fn with_attack(self, attack: f64) -> Result<Self> {
        Self::new(attack, self.decay, self.sustain, self.release)
    }

    pub fn with_decay(self, decay: f64) -> Result<Self> {
        Self::new(self.attack, decay, self.sustain, self.release)
    }

    pub fn with_sustain(self, sustain: f64) -> Result<Self> {
        Self::new(self.attack, self.decay, sustain, self.release)
    }

    pub fn with_release(self, release: f64) -> Result<Self> {
        Self::new(self.attack, self.decay, self.sustain, release)
    }

    /// Level while the note is held, `elapsed` seconds after note-on
    pub fn held_level(&self, elapsed: f64) -> f64 {
        if elapsed < 0.0 {
            return 0.0;
        }
        if elapsed < self.attack {
            return elapsed / self.attack;
        }
        let into_decay = elapsed - self.attack;
        if into_decay < self.decay {
            return 1.0 - (1.0 - self.sustain) * into_decay / self.decay;
        }
        self.sustain
    }

    /// Level `elapsed` seconds into a release that started at `from`
    pub fn release_level(&self, from: f64, elapsed: f64) -> f64 {
        if self.release <= 0.0 || elapsed >= self.release {
            0.0
        } else {
            from * (1.0 - elapsed.max(0.0) / self.release)
        }
    }
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self {
            attack: 0.01, // 10ms attack
            decay: 0.1,   // 100ms decay
            sustain: 0.7, // 70% sustain level
            release: 0.2, // 200ms release
        }
    }
}

/// Phase of an envelope at a given moment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopePhase {
    /// No note is playing
    Idle,
    /// Attack phase (rising to 1.0)
    Attack,
    /// Decay phase (falling to sustain level)
    Decay,
    /// Sustain phase (holding at sustain level)
    Sustain,
    /// Release phase (falling to 0.0)
    Release,
}

/// Envelope parameters that can be edited while notes play
///
/// Each note-on snapshots the current values; edits reach the next note-on.
#[derive(Debug, Clone, Default)]
pub struct LiveEnvelope(Arc<Mutex<AdsrParams>>);

impl LiveEnvelope {
    pub fn new(params: AdsrParams) -> Self {
        Self(Arc::new(Mutex::new(params)))
    }

    pub fn snapshot(&self) -> AdsrParams {
        *self.0.lock()
    }

    pub fn set(&self, params: AdsrParams) -> Result<()> {
        params.validate()?;
        *self.0.lock() = params;
        Ok(())
    }

    /// Apply a fallible edit; the stored value is untouched on error
    pub fn update<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(AdsrParams) -> Result<AdsrParams>,
    {
        let mut params = self.0.lock();
        *params = edit(*params)?;
        Ok(())
    }
}

/// Amplitude shaper for one sounding source
///
/// Owns the source handle from note-on until note-off hands it back to the
/// engine. The engine curve is piecewise linear and stays continuous when a
/// note-off cuts into the attack or decay.
#[derive(Debug)]
pub struct EnvelopeShaper {
    params: AdsrParams,
    on_time: f64,
    off: Option<(f64, f64)>,
    source: Option<SourceHandle>,
    source_id: SourceId,
}

impl EnvelopeShaper {
    /// Schedule attack and decay on `source`, starting at `at`
    ///
    /// On failure the source is stopped before the error is returned.
    pub fn note_on(
        engine: &mut dyn AudioEngine,
        source: SourceHandle,
        params: AdsrParams,
        at: f64,
    ) -> std::result::Result<Self, EngineError> {
        if let Err(err) = Self::shape_attack(engine, &source, &params, at) {
            if let Err(stop_err) = engine.stop_source(source, at) {
                log::warn!("Could not stop source after failed attack: {stop_err}");
            }
            return Err(err);
        }

        Ok(Self {
            params,
            on_time: at,
            off: None,
            source_id: source.id(),
            source: Some(source),
        })
    }

    fn shape_attack(
        engine: &mut dyn AudioEngine,
        source: &SourceHandle,
        params: &AdsrParams,
        at: f64,
    ) -> std::result::Result<(), EngineError> {
        let peak_time = at + params.attack;

        if params.attack > 0.0 {
            engine.set_amplitude_at(source, 0.0, at)?;
            engine.ramp_amplitude_to(source, 1.0, peak_time)?;
        } else if params.decay > 0.0 {
            engine.set_amplitude_at(source, 1.0, at)?;
        }

        if params.decay > 0.0 {
            engine.ramp_amplitude_to(source, params.sustain, peak_time + params.decay)?;
        } else {
            engine.set_amplitude_at(source, params.sustain, peak_time)?;
        }
        Ok(())
    }

    /// Start the release at `at` from whatever level the curve has reached
    ///
    /// The source is stopped when the release ends, even if shaping the
    /// release fails. A second note-off does nothing.
    pub fn note_off(
        &mut self,
        engine: &mut dyn AudioEngine,
        at: f64,
    ) -> std::result::Result<(), EngineError> {
        let Some(source) = self.source.take() else {
            return Ok(());
        };

        let at = at.max(self.on_time);
        let level = self.value_at(at);
        self.off = Some((at, level));
        let end = at + self.params.release;

        let shaped = Self::shape_release(engine, &source, &self.params, level, at);
        let stopped = engine.stop_source(source, end);
        shaped.and(stopped)
    }

    fn shape_release(
        engine: &mut dyn AudioEngine,
        source: &SourceHandle,
        params: &AdsrParams,
        level: f64,
        at: f64,
    ) -> std::result::Result<(), EngineError> {
        engine.cancel_and_hold_at(source, at)?;
        if params.release > 0.0 {
            engine.set_amplitude_at(source, level, at)?;
            engine.ramp_amplitude_to(source, 0.0, at + params.release)
        } else {
            engine.set_amplitude_at(source, 0.0, at)
        }
    }

    /// Envelope value at engine time `time`
    pub fn value_at(&self, time: f64) -> f64 {
        match self.off {
            Some((off_time, level)) if time >= off_time => {
                self.params.release_level(level, time - off_time)
            }
            _ => self.params.held_level(time - self.on_time),
        }
    }

    pub fn phase_at(&self, time: f64) -> EnvelopePhase {
        if time < self.on_time {
            return EnvelopePhase::Idle;
        }
        if let Some((off_time, _)) = self.off {
            if time >= off_time + self.params.release {
                return EnvelopePhase::Idle;
            }
            if time >= off_time {
                return EnvelopePhase::Release;
            }
        }

        let elapsed = time - self.on_time;
        if elapsed < self.params.attack {
            EnvelopePhase::Attack
        } else if elapsed < self.params.attack + self.params.decay {
            EnvelopePhase::Decay
        } else {
            EnvelopePhase::Sustain
        }
    }

    pub fn params(&self) -> AdsrParams {
        self.params
    }

    pub fn on_time(&self) -> f64 {
        self.on_time
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    pub fn is_released(&self) -> bool {
        self.off.is_some()
    }

    /// When the release reaches silence, once note-off happened
    pub fn release_end(&self) -> Option<f64> {
        self.off.map(|(off_time, _)| off_time + self.params.release)
    }
}

/// ADSR Envelope Generator
///
/// Per-sample rendition of the same curve [`EnvelopeShaper`] schedules.
/// Used to preview envelopes and to render offline.
pub struct AdsrEnvelope {
    params: AdsrParams,
    sample_rate: f64,
    phase: EnvelopePhase,
    current_value: f64,

    // Samples since note-on, or since note-off while releasing
    elapsed_samples: u64,
    release_from: f64,
}

impl AdsrEnvelope {
    /// Create a new ADSR envelope
    pub fn new(params: AdsrParams, sample_rate: f64) -> Self {
        Self {
            params,
            sample_rate,
            phase: EnvelopePhase::Idle,
            current_value: 0.0,
            elapsed_samples: 0,
            release_from: 0.0,
        }
    }

    /// Set new ADSR parameters
    pub fn set_params(&mut self, params: AdsrParams) {
        self.params = params;
    }

    /// Get current parameters
    pub fn params(&self) -> AdsrParams {
        self.params
    }

    /// Trigger note on (start attack phase)
    pub fn note_on(&mut self) {
        self.phase = EnvelopePhase::Attack;
        self.elapsed_samples = 0;
    }

    /// Trigger note off (start release phase from the current value)
    pub fn note_off(&mut self) {
        if !matches!(self.phase, EnvelopePhase::Idle | EnvelopePhase::Release) {
            self.release_from = self.params.held_level(self.elapsed_seconds());
            self.phase = EnvelopePhase::Release;
            self.elapsed_samples = 0;
        }
    }

    fn elapsed_seconds(&self) -> f64 {
        self.elapsed_samples as f64 / self.sample_rate
    }

    /// Process one sample and return the envelope value
    ///
    /// Returns a value between 0.0 and 1.0 that should be multiplied with the audio signal
    pub fn process(&mut self) -> f32 {
        let elapsed = self.elapsed_seconds();

        self.current_value = match self.phase {
            EnvelopePhase::Idle => 0.0,
            EnvelopePhase::Release => {
                if elapsed >= self.params.release {
                    self.phase = EnvelopePhase::Idle;
                }
                self.params.release_level(self.release_from, elapsed)
            }
            _ => {
                self.phase = if elapsed < self.params.attack {
                    EnvelopePhase::Attack
                } else if elapsed < self.params.attack + self.params.decay {
                    EnvelopePhase::Decay
                } else {
                    EnvelopePhase::Sustain
                };
                self.params.held_level(elapsed)
            }
        };

        if self.phase != EnvelopePhase::Idle {
            self.elapsed_samples += 1;
        }
        self.current_value as f32
    }

    /// Fill a buffer with envelope values
    pub fn process_buffer(&mut self, output: &mut [f32]) {
        for sample in output.iter_mut() {
            *sample = self.process();
        }
    }

    pub fn phase(&self) -> EnvelopePhase {
        self.phase
    }

    /// Check if the envelope is currently active (not idle)
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, EnvelopePhase::Idle)
    }

    /// Get the current envelope value without processing
    pub fn current_value(&self) -> f32 {
        self.current_value as f32
    }

    /// Reset the envelope to idle state
    pub fn reset(&mut self) {
        self.phase = EnvelopePhase::Idle;
        self.current_value = 0.0;
        self.elapsed_samples = 0;
    }
}
