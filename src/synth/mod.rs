// Synth module - Amplitude shaping

pub mod envelope;

pub use envelope::{AdsrEnvelope, AdsrParams, EnvelopePhase, EnvelopeShaper, LiveEnvelope};
