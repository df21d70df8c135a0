// Synth explorer - hold a note and shape it with the ADSR controls

use crate::error::{PlaybackError, Result};
use crate::playback::{OwnerId, PlayRequest, PlaybackServices, PlaybackSession, WidgetPlayer};
use crate::sequencer::event::{Event, EventLength, EventOffset};
use crate::synth::envelope::{AdsrEnvelope, AdsrParams};
use std::sync::Arc;

pub struct SynthExplorer {
    player: WidgetPlayer,
    pitch: u8,
}

impl SynthExplorer {
    pub fn new(owner: impl Into<OwnerId>, services: &PlaybackServices) -> Self {
        Self {
            player: services.player(owner),
            pitch: 60,
        }
    }

    pub fn player(&self) -> &WidgetPlayer {
        &self.player
    }

    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    /// Takes effect on the next press
    pub fn set_pitch(&mut self, pitch: u8) -> Result<()> {
        if pitch > 127 {
            return Err(PlaybackError::invalid(format!("MIDI pitch {pitch} out of range")));
        }
        self.pitch = pitch;
        Ok(())
    }

    /// Start a note that sounds until [`release`](Self::release)
    pub fn press(&self) -> Result<Arc<PlaybackSession>> {
        let note = Event::note(self.pitch, EventOffset::Ticks(0), EventLength::Held);
        self.player.play(PlayRequest::new(vec![note]))
    }

    /// Let go of the held note; it fades over the current release time
    pub fn release(&self) {
        self.player.stop();
    }

    pub fn is_sounding(&self) -> bool {
        self.player.is_playing()
    }

    pub fn envelope(&self) -> AdsrParams {
        self.player.envelope().snapshot()
    }

    pub fn set_envelope(&self, params: AdsrParams) -> Result<()> {
        self.player.set_envelope(params)
    }

    pub fn set_parameter(&self, name: &str, value: f64) -> Result<()> {
        self.player.set_parameter(name, value).map(|_| ())
    }

    /// Envelope curve for a note held `hold_seconds`, including the release tail
    pub fn preview(&self, hold_seconds: f64, sample_rate: f64) -> Vec<f32> {
        let params = self.envelope();
        let mut envelope = AdsrEnvelope::new(params, sample_rate);

        let held = (hold_seconds.max(0.0) * sample_rate).round() as usize;
        let tail = (params.release * sample_rate).ceil() as usize + 1;
        let mut curve = vec![0.0; held + tail];

        envelope.note_on();
        envelope.process_buffer(&mut curve[..held]);
        envelope.note_off();
        envelope.process_buffer(&mut curve[held..]);
        curve
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::engine::{SharedEngine, share_engine};
    use crate::audio::offline::OfflineEngine;
    use crate::config::PlaybackConfig;
    use approx::assert_abs_diff_eq;
    use parking_lot::Mutex;

    fn explorer() -> (SynthExplorer, PlaybackServices, Arc<Mutex<OfflineEngine>>) {
        let engine = share_engine(OfflineEngine::new());
        let shared: SharedEngine = engine.clone();
        let services = PlaybackServices::new(shared, PlaybackConfig::default()).unwrap();
        services.initialize_audio().unwrap();
        (SynthExplorer::new("synth", &services), services, engine)
    }

    fn run_for(services: &PlaybackServices, seconds: f64) {
        for _ in 0..(seconds * 48000.0 / 480.0).round() as usize {
            services.process(480);
        }
    }

    #[test]
    fn test_held_note_sounds_until_release() {
        let (synth, services, engine) = explorer();
        synth
            .set_envelope(AdsrParams::new(0.1, 0.1, 0.5, 0.4).unwrap())
            .unwrap();

        let session = synth.press().unwrap();
        run_for(&services, 3.0);
        assert!(synth.is_sounding());
        assert!(!session.is_complete());

        let id = engine.lock().created()[0].0;
        assert_abs_diff_eq!(engine.lock().amplitude_at(id, 2.5).unwrap(), 0.5, epsilon = 1e-9);

        synth.release();
        assert!(!synth.is_sounding());
        let stop = engine.lock().stop_time(id).unwrap();
        assert_abs_diff_eq!(stop, 3.4, epsilon = 1e-9);
        assert_abs_diff_eq!(engine.lock().amplitude_at(id, 3.2).unwrap(), 0.25, epsilon = 1e-9);
    }

    #[test]
    fn test_release_change_reaches_next_press() {
        let (synth, services, engine) = explorer();
        synth.press().unwrap();
        run_for(&services, 1.0);

        // The sounding note keeps the 0.2 s release it started with
        synth.set_parameter("release", 1.0).unwrap();
        synth.release();
        let first = engine.lock().created()[0].0;
        assert_abs_diff_eq!(engine.lock().stop_time(first).unwrap(), 1.2, epsilon = 1e-9);

        synth.press().unwrap();
        run_for(&services, 1.0);
        synth.release();
        let second = engine.lock().created()[1].0;
        assert_abs_diff_eq!(engine.lock().stop_time(second).unwrap(), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pitch_bounds() {
        let (mut synth, _services, _engine) = explorer();
        synth.set_pitch(72).unwrap();
        assert_eq!(synth.pitch(), 72);
        assert!(synth.set_pitch(128).is_err());
    }

    #[test]
    fn test_preview_curve() {
        let (synth, _services, _engine) = explorer();
        synth
            .set_envelope(AdsrParams::new(0.01, 0.01, 0.5, 0.02).unwrap())
            .unwrap();

        let curve = synth.preview(0.1, 1000.0);
        assert_eq!(curve.len(), 100 + 21);
        assert_abs_diff_eq!(curve[5], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(curve[50], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(curve[110], 0.25, epsilon = 1e-6);
        assert_eq!(*curve.last().unwrap(), 0.0);
    }
}
