// Rhythm sequencer - drum step grid over the shared transport

use crate::error::{PlaybackError, Result};
use crate::playback::{OwnerId, PlayRequest, PlaybackServices, PlaybackSession, WidgetPlayer};
use crate::sequencer::event::{DrumKind, Event, EventLength, EventOffset, Subdivision};
use crate::sequencer::metronome::Metronome;
use std::sync::Arc;

pub const DEFAULT_STEPS: usize = 16;

/// One drum lane of the grid
#[derive(Debug, Clone, PartialEq)]
pub struct DrumTrack {
    pub kind: DrumKind,
    pub steps: Vec<bool>,
    pub velocity: f32,
}

impl DrumTrack {
    pub fn new(kind: DrumKind, steps: usize) -> Self {
        Self {
            kind,
            steps: vec![false; steps],
            velocity: 0.8,
        }
    }

    pub fn active_steps(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps
            .iter()
            .enumerate()
            .filter_map(|(i, on)| on.then_some(i))
    }
}

pub struct RhythmSequencer {
    player: WidgetPlayer,
    tracks: Vec<DrumTrack>,
    steps: usize,
    metronome: Metronome,
}

impl RhythmSequencer {
    /// Empty kick, snare and closed hat lanes of 16 sixteenths
    pub fn new(owner: impl Into<OwnerId>, services: &PlaybackServices) -> Self {
        let player = services.player(owner);
        let mut metronome = Metronome::new(player.time_signature());
        metronome.set_enabled(false);

        let tracks = [DrumKind::Kick, DrumKind::Snare, DrumKind::ClosedHat]
            .into_iter()
            .map(|kind| DrumTrack::new(kind, DEFAULT_STEPS))
            .collect();

        Self {
            player,
            tracks,
            steps: DEFAULT_STEPS,
            metronome,
        }
    }

    pub fn player(&self) -> &WidgetPlayer {
        &self.player
    }

    pub fn tracks(&self) -> &[DrumTrack] {
        &self.tracks
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Adds a lane, or returns the existing one for `kind`
    pub fn add_track(&mut self, kind: DrumKind) -> &mut DrumTrack {
        let index = match self.tracks.iter().position(|t| t.kind == kind) {
            Some(index) => index,
            None => {
                self.tracks.push(DrumTrack::new(kind, self.steps));
                self.tracks.len() - 1
            }
        };
        &mut self.tracks[index]
    }

    fn track_mut(&mut self, kind: DrumKind, step: usize) -> Result<&mut DrumTrack> {
        if step >= self.steps {
            return Err(PlaybackError::invalid(format!(
                "Step {step} is outside the {}-step grid",
                self.steps
            )));
        }
        self.tracks
            .iter_mut()
            .find(|t| t.kind == kind)
            .ok_or_else(|| PlaybackError::invalid(format!("No {kind:?} track")))
    }

    /// Flip a cell; returns its new state
    pub fn toggle_step(&mut self, kind: DrumKind, step: usize) -> Result<bool> {
        let track = self.track_mut(kind, step)?;
        track.steps[step] = !track.steps[step];
        Ok(track.steps[step])
    }

    pub fn set_step(&mut self, kind: DrumKind, step: usize, on: bool) -> Result<()> {
        self.track_mut(kind, step)?.steps[step] = on;
        Ok(())
    }

    pub fn set_track_velocity(&mut self, kind: DrumKind, velocity: f32) {
        if let Some(track) = self.tracks.iter_mut().find(|t| t.kind == kind) {
            track.velocity = velocity.clamp(0.0, 1.0);
        }
    }

    /// Resize every lane; must cover whole quarter notes
    pub fn set_steps(&mut self, steps: usize) -> Result<()> {
        let per_quarter = Subdivision::SIXTEENTH.steps_per_quarter() as usize;
        if steps == 0 || steps % per_quarter != 0 {
            return Err(PlaybackError::invalid(format!(
                "A grid of {steps} sixteenths does not fill whole beats"
            )));
        }
        self.steps = steps;
        for track in &mut self.tracks {
            track.steps.resize(steps, false);
        }
        Ok(())
    }

    pub fn set_metronome(&mut self, enabled: bool) {
        self.metronome.set_enabled(enabled);
    }

    pub fn metronome(&self) -> &Metronome {
        &self.metronome
    }

    /// Hits in step order; within a step, tracks in lane order
    pub fn events(&self) -> Vec<Event> {
        let mut events = Vec::new();
        for step in 0..self.steps {
            for track in &self.tracks {
                if track.steps[step] {
                    events.push(
                        Event::drum(track.kind, EventOffset::Steps(step as u32))
                            .with_velocity(track.velocity),
                    );
                }
            }
        }

        let time_signature = self.player.time_signature();
        let mut metronome = self.metronome.clone();
        metronome.set_time_signature(time_signature);

        // Clicks past a short grid would fall outside the loop
        let grid_ticks = self.steps as u64 * Subdivision::SIXTEENTH.ticks_per_step();
        let measures = grid_ticks.div_ceil(time_signature.ticks_per_bar()) as u32;
        events.extend(metronome.events(measures).into_iter().filter(|click| {
            click
                .offset
                .resolve(Subdivision::SIXTEENTH, &time_signature)
                .is_ok_and(|tick| tick < grid_ticks)
        }));
        events
    }

    /// Loop the grid until stopped
    pub fn play(&self) -> Result<Arc<PlaybackSession>> {
        let request = PlayRequest::new(self.events())
            .with_subdivision(Subdivision::SIXTEENTH)
            .looping(true)
            .with_loop_length(EventLength::Steps(self.steps as u32));
        self.player.play(request)
    }

    pub fn stop(&self) {
        self.player.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }

    /// Swing is baked into a run's schedule; a playing grid restarts with it
    pub fn set_swing(&self, amount: f64) -> Result<()> {
        self.player.set_parameter("swing", amount)?;
        if self.is_playing() {
            self.play()?;
        }
        Ok(())
    }

    pub fn set_parameter(&self, name: &str, value: f64) -> Result<()> {
        self.player.set_parameter(name, value).map(|_| ())
    }
}
