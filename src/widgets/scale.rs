// Scale player - plays a scale one note per step

use crate::error::{PlaybackError, Result};
use crate::playback::{OwnerId, PlayRequest, PlaybackServices, PlaybackSession, WidgetPlayer};
use crate::sequencer::event::{Event, EventLength, EventOffset};
use std::sync::Arc;

/// Order in which scale degrees are played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleDirection {
    #[default]
    Ascending,
    Descending,
    /// Up to the top, then back down without repeating it
    UpAndDown,
}

pub struct ScalePlayer {
    player: WidgetPlayer,
    pitches: Vec<u8>,
    direction: ScaleDirection,
    steps_per_note: u32,
    looping: bool,
}

impl ScalePlayer {
    /// `pitches` are MIDI note numbers, lowest first
    pub fn new(owner: impl Into<OwnerId>, services: &PlaybackServices, pitches: Vec<u8>) -> Self {
        Self {
            player: services.player(owner),
            pitches,
            direction: ScaleDirection::default(),
            steps_per_note: 2,
            looping: false,
        }
    }

    pub fn player(&self) -> &WidgetPlayer {
        &self.player
    }

    pub fn set_pitches(&mut self, pitches: Vec<u8>) {
        self.pitches = pitches;
    }

    pub fn set_direction(&mut self, direction: ScaleDirection) {
        self.direction = direction;
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Note spacing in grid steps (2 sixteenths = eighth notes)
    pub fn set_steps_per_note(&mut self, steps: u32) -> Result<()> {
        if steps == 0 {
            return Err(PlaybackError::invalid("A scale note needs at least one step"));
        }
        self.steps_per_note = steps;
        Ok(())
    }

    fn ordered_pitches(&self) -> Vec<u8> {
        match self.direction {
            ScaleDirection::Ascending => self.pitches.clone(),
            ScaleDirection::Descending => self.pitches.iter().rev().copied().collect(),
            ScaleDirection::UpAndDown => {
                let descent = self.pitches.iter().rev().skip(1);
                self.pitches.iter().chain(descent).copied().collect()
            }
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.ordered_pitches()
            .into_iter()
            .enumerate()
            .map(|(i, pitch)| {
                Event::note(
                    pitch,
                    EventOffset::Steps(i as u32 * self.steps_per_note),
                    EventLength::Steps(self.steps_per_note),
                )
            })
            .collect()
    }

    pub fn play(&self) -> Result<Arc<PlaybackSession>> {
        self.player
            .play(PlayRequest::new(self.events()).looping(self.looping))
    }

    pub fn stop(&self) {
        self.player.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }

    pub fn set_parameter(&self, name: &str, value: f64) -> Result<()> {
        self.player.set_parameter(name, value).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::engine::share_engine;
    use crate::audio::offline::OfflineEngine;
    use crate::config::PlaybackConfig;
    use crate::sequencer::event::Trigger;

    fn scale() -> ScalePlayer {
        let services =
            PlaybackServices::new(share_engine(OfflineEngine::new()), PlaybackConfig::default())
                .unwrap();
        ScalePlayer::new("scale", &services, vec![60, 62, 64, 65])
    }

    fn pitches(events: &[Event]) -> Vec<u8> {
        events
            .iter()
            .map(|event| match &event.trigger {
                Trigger::Notes(notes) => notes[0],
                other => panic!("unexpected trigger {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_directions() {
        let mut player = scale();
        assert_eq!(pitches(&player.events()), vec![60, 62, 64, 65]);

        player.set_direction(ScaleDirection::Descending);
        assert_eq!(pitches(&player.events()), vec![65, 64, 62, 60]);

        player.set_direction(ScaleDirection::UpAndDown);
        assert_eq!(pitches(&player.events()), vec![60, 62, 64, 65, 64, 62, 60]);
    }

    #[test]
    fn test_note_spacing() {
        let mut player = scale();
        player.set_steps_per_note(4).unwrap();
        let events = player.events();

        assert_eq!(events[2].offset, EventOffset::Steps(8));
        assert_eq!(events[2].length, EventLength::Steps(4));
        assert!(player.set_steps_per_note(0).is_err());
    }

    #[test]
    fn test_play_needs_engine() {
        let player = scale();
        assert!(player.play().is_err());
        assert!(!player.is_playing());
    }
}
