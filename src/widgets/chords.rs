// Chord progression player
// Each chord is split into a bass note and the upper voices, bass first

use crate::error::{PlaybackError, Result};
use crate::playback::{OwnerId, PlayRequest, PlaybackServices, PlaybackSession, WidgetPlayer};
use crate::sequencer::event::{Event, EventLength, EventOffset};
use crate::sequencer::timeline::Tick;
use std::sync::Arc;

pub struct ChordPlayer {
    player: WidgetPlayer,
    progression: Vec<Vec<u8>>,
    chords_per_measure: u32,
    arpeggiate: bool,
    looping: bool,
}

impl ChordPlayer {
    pub fn new(owner: impl Into<OwnerId>, services: &PlaybackServices) -> Self {
        Self {
            player: services.player(owner),
            progression: Vec::new(),
            chords_per_measure: 1,
            arpeggiate: false,
            looping: false,
        }
    }

    pub fn player(&self) -> &WidgetPlayer {
        &self.player
    }

    /// Chords as MIDI pitches, in any order; the lowest is the bass
    pub fn set_progression(&mut self, progression: Vec<Vec<u8>>) -> Result<()> {
        if let Some(index) = progression.iter().position(|chord| chord.is_empty()) {
            return Err(PlaybackError::invalid(format!("Chord {index} has no notes")));
        }
        self.progression = progression;
        Ok(())
    }

    pub fn set_chords_per_measure(&mut self, chords: u32) -> Result<()> {
        let beats = self.player.time_signature().numerator as u32;
        if chords == 0 || beats % chords != 0 {
            return Err(PlaybackError::invalid(format!(
                "{chords} chords do not split a {}-beat measure evenly",
                beats
            )));
        }
        self.chords_per_measure = chords;
        Ok(())
    }

    pub fn set_arpeggiate(&mut self, arpeggiate: bool) {
        self.arpeggiate = arpeggiate;
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn events(&self) -> Vec<Event> {
        let time_signature = self.player.time_signature();
        let beats_per_chord = time_signature.numerator as u32 / self.chords_per_measure;
        let chord_ticks: Tick = beats_per_chord as Tick * time_signature.ticks_per_beat();

        let mut events = Vec::new();
        for (i, chord) in self.progression.iter().enumerate() {
            let i = i as u32;
            let mut pitches = chord.clone();
            pitches.sort_unstable();

            let offset = EventOffset::Measure {
                measure: i / self.chords_per_measure + 1,
                beat: (1 + (i % self.chords_per_measure) * beats_per_chord) as f64,
            };

            if self.arpeggiate {
                let start = i as Tick * chord_ticks;
                let spacing = chord_ticks / pitches.len() as Tick;
                for (k, pitch) in pitches.into_iter().enumerate() {
                    let delay = k as Tick * spacing;
                    events.push(Event::note(
                        pitch,
                        EventOffset::Ticks(start + delay),
                        EventLength::Ticks(chord_ticks - delay),
                    ));
                }
                continue;
            }

            let length = EventLength::Ticks(chord_ticks);
            let upper = pitches.split_off(1);
            events.push(Event::note(pitches[0], offset, length));
            if !upper.is_empty() {
                events.push(Event::chord(upper, offset, length));
            }
        }
        events
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
