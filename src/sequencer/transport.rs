// Transport - Shared musical clock and trigger scheduling
// Controls play/stop state, playhead position and callbacks due at musical positions

use super::timeline::{MusicalTime, Swing, Tempo, Tick, TimeSignature};
use crate::audio::timing::AudioTiming;
use crate::error::{PlaybackError, Result};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::Arc;

/// Transport state (play/stop/pause)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl TransportState {
    /// Check if transport is advancing
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }

    /// Check if transport is stopped or paused
    pub fn is_stopped(&self) -> bool {
        matches!(self, TransportState::Stopped | TransportState::Paused)
    }
}

/// Identifier of a scheduled callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduleId(u64);

/// When a scheduled callback fired
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireTime {
    /// Engine time in seconds of the callback's tick, interpolated inside the
    /// audio buffer (not the buffer start)
    pub time: f64,
    /// Transport position the callback was due at (loop-folded)
    pub position: Tick,
    /// Number of completed loop cycles when it fired
    pub cycle: u64,
}

pub type TransportCallback = Box<dyn FnMut(FireTime) + Send>;

/// Loop region [start, end) in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopRegion {
    pub start: Tick,
    pub end: Tick,
}

impl LoopRegion {
    pub fn new(start: Tick, end: Tick) -> Result<Self> {
        if end <= start {
            return Err(PlaybackError::invalid(format!(
                "Loop end ({end}) must be after loop start ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn length(&self) -> Tick {
        self.end - self.start
    }

    /// Map a position at or past the loop end back into the region.
    /// The loop point itself folds onto the start, so it fires once per cycle.
    pub fn fold(&self, tick: Tick) -> Tick {
        if tick < self.end {
            tick
        } else {
            self.start + (tick - self.start) % self.length()
        }
    }
}

/// Snapshot of the clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockState {
    pub tempo: Tempo,
    pub time_signature: TimeSignature,
    pub swing: Swing,
    pub state: TransportState,
    pub position: Tick,
    pub loop_region: Option<LoopRegion>,
    pub cycle: u64,
}

impl ClockState {
    pub fn is_running(&self) -> bool {
        self.state.is_playing()
    }

    /// Position as bars:beats:ticks
    pub fn musical_position(&self) -> MusicalTime {
        MusicalTime::from_total_ticks(self.position, &self.time_signature)
    }
}

struct Entry {
    due: Tick,
    once: bool,
    // Loop cycle the entry may first fire in
    from_cycle: u64,
    // Taken out while the callback runs
    callback: Option<TransportCallback>,
}

struct TransportCore {
    state: TransportState,
    tempo: Tempo,
    time_signature: TimeSignature,
    swing: Swing,
    position: f64,
    loop_region: Option<LoopRegion>,
    cycle: u64,
    // Bumped on every stop; a sweep started under an older generation aborts
    generation: u64,
    next_id: u64,
    entries: BTreeMap<ScheduleId, Entry>,
    // (folded due tick, id): firing order
    queue: BTreeSet<(Tick, ScheduleId)>,
}

impl TransportCore {
    fn key(&self, due: Tick) -> Tick {
        match self.loop_region {
            Some(region) => region.fold(due),
            None => due,
        }
    }

    /// A one-shot past the loop end waits out one cycle per whole loop length
    /// it overshoots, so a note-off folded onto its own note-on tick fires on
    /// the next pass rather than in the same sweep.
    fn first_cycle(&self, due: Tick, once: bool) -> u64 {
        match self.loop_region {
            Some(region) if once && due >= region.end => {
                self.cycle + (due - region.start) / region.length()
            }
            _ => self.cycle,
        }
    }

    fn insert(&mut self, due: Tick, once: bool, callback: TransportCallback) -> ScheduleId {
        self.next_id += 1;
        let id = ScheduleId(self.next_id);
        let key = self.key(due);
        let from_cycle = self.first_cycle(due, once);
        self.entries.insert(
            id,
            Entry {
                due,
                once,
                from_cycle,
                callback: Some(callback),
            },
        );
        self.queue.insert((key, id));
        id
    }

    fn remove(&mut self, id: ScheduleId) -> Option<Entry> {
        let entry = self.entries.remove(&id)?;
        let key = self.key(entry.due);
        self.queue.remove(&(key, id));
        Some(entry)
    }

    fn reindex(&mut self) {
        let cycles: Vec<(ScheduleId, u64)> = self
            .entries
            .iter()
            .map(|(id, entry)| (*id, self.first_cycle(entry.due, entry.once)))
            .collect();
        for (id, from_cycle) in cycles {
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.from_cycle = from_cycle;
            }
        }
        let queue = self
            .entries
            .iter()
            .map(|(id, entry)| (self.key(entry.due), *id))
            .collect();
        self.queue = queue;
    }

    fn clear_pending(&mut self) {
        self.entries.clear();
        self.queue.clear();
        self.generation += 1;
    }
}

/// Transport controller
///
/// A cloneable handle to the one clock shared by every widget. The host's
/// audio callback drives it with [`Transport::advance`]; callbacks never run
/// while the transport's lock is held, so they may schedule, clear or stop.
#[derive(Clone)]
pub struct Transport {
    core: Arc<Mutex<TransportCore>>,
    timing: AudioTiming,
}

impl Transport {
    /// Create new transport
    pub fn new(sample_rate: f64) -> Self {
        Self::with_timing(AudioTiming::new(sample_rate))
    }

    /// Create on top of an existing engine clock
    pub fn with_timing(timing: AudioTiming) -> Self {
        Self {
            core: Arc::new(Mutex::new(TransportCore {
                state: TransportState::Stopped,
                tempo: Tempo::default(),
                time_signature: TimeSignature::default(),
                swing: Swing::default(),
                position: 0.0,
                loop_region: None,
                cycle: 0,
                generation: 0,
                next_id: 0,
                entries: BTreeMap::new(),
                queue: BTreeSet::new(),
            })),
            timing,
        }
    }

    /// Engine clock (for passing to the audio callback)
    pub fn timing(&self) -> &AudioTiming {
        &self.timing
    }

    /// Get sample rate
    pub fn sample_rate(&self) -> f64 {
        self.timing.sample_rate()
    }

    /// Current engine time in seconds
    pub fn now(&self) -> f64 {
        self.timing.current_seconds()
    }

    /// Get current state
    pub fn state(&self) -> TransportState {
        self.core.lock().state
    }

    pub fn is_playing(&self) -> bool {
        self.state().is_playing()
    }

    /// Current position in whole ticks
    pub fn position(&self) -> Tick {
        self.core.lock().position.floor() as Tick
    }

    /// Snapshot of tempo, meter, swing, state and position
    pub fn clock_state(&self) -> ClockState {
        let core = self.core.lock();
        ClockState {
            tempo: core.tempo,
            time_signature: core.time_signature,
            swing: core.swing,
            state: core.state,
            position: core.position.floor() as Tick,
            loop_region: core.loop_region,
            cycle: core.cycle,
        }
    }

    /// Start advancing from `from`. No-op if already playing.
    pub fn start(&self, from: Tick) {
        let mut core = self.core.lock();
        if core.state.is_playing() {
            log::debug!("Transport already playing, start ignored");
            return;
        }
        core.position = from as f64;
        let elapsed = std::mem::take(&mut core.cycle);
        for entry in core.entries.values_mut() {
            entry.from_cycle = entry.from_cycle.saturating_sub(elapsed);
        }
        core.state = TransportState::Playing;
        log::debug!("Transport started at tick {from}");
    }

    /// Halt, cancel every pending callback, reset position to 0
    pub fn stop(&self) {
        self.halt(false);
    }

    /// Halt and cancel every pending callback, keeping the position
    pub fn stop_holding_position(&self) {
        self.halt(true);
    }

    fn halt(&self, hold_position: bool) {
        let mut core = self.core.lock();
        let cancelled = core.entries.len();
        core.state = TransportState::Stopped;
        core.clear_pending();
        if !hold_position {
            core.position = 0.0;
            core.cycle = 0;
        }
        log::debug!("Transport stopped, {cancelled} pending callbacks cancelled");
    }

    /// Pause (keep position and pending callbacks)
    pub fn pause(&self) {
        let mut core = self.core.lock();
        if core.state.is_playing() {
            core.state = TransportState::Paused;
        }
    }

    /// Resume after pause
    pub fn resume(&self) {
        let mut core = self.core.lock();
        if core.state == TransportState::Paused {
            core.state = TransportState::Playing;
        }
    }

    /// Fire `callback` every time the position reaches `at`
    pub fn schedule<F>(&self, at: Tick, callback: F) -> ScheduleId
    where
        F: FnMut(FireTime) + Send + 'static,
    {
        self.core.lock().insert(at, false, Box::new(callback))
    }

    /// Fire `callback` the first time the position reaches `at`, then forget it
    pub fn schedule_once<F>(&self, at: Tick, callback: F) -> ScheduleId
    where
        F: FnOnce(FireTime) + Send + 'static,
    {
        let mut callback = Some(callback);
        self.core.lock().insert(
            at,
            true,
            Box::new(move |fire| {
                if let Some(callback) = callback.take() {
                    callback(fire);
                }
            }),
        )
    }

    /// Cancel a scheduled callback. Returns false if it already fired or was cleared.
    pub fn clear(&self, id: ScheduleId) -> bool {
        self.core.lock().remove(id).is_some()
    }

    /// Number of callbacks still registered
    pub fn pending_count(&self) -> usize {
        self.core.lock().entries.len()
    }

    /// Apply the current swing to a position
    ///
    /// Swing is resolved when a position is scheduled; later swing changes
    /// never move callbacks that are already registered.
    pub fn swung(&self, at: Tick) -> Tick {
        self.core.lock().swing.apply(at)
    }

    /// Get tempo
    pub fn tempo(&self) -> Tempo {
        self.core.lock().tempo
    }

    /// Set tempo; applies from the current position onward
    pub fn set_tempo(&self, tempo: Tempo) {
        self.core.lock().tempo = tempo;
    }

    /// Get time signature
    pub fn time_signature(&self) -> TimeSignature {
        self.core.lock().time_signature
    }

    /// Set time signature
    pub fn set_time_signature(&self, time_signature: TimeSignature) {
        self.core.lock().time_signature = time_signature;
    }

    /// Get swing
    pub fn swing(&self) -> Swing {
        self.core.lock().swing
    }

    /// Set swing for positions scheduled from now on
    pub fn set_swing(&self, swing: Swing) {
        self.core.lock().swing = swing;
    }

    /// Set loop region; callbacks at or past `end` fold into it
    pub fn set_loop(&self, start: Tick, end: Tick) -> Result<()> {
        let region = LoopRegion::new(start, end)?;
        let mut core = self.core.lock();
        core.loop_region = Some(region);
        if core.position >= end as f64 {
            core.position = region.fold(core.position.floor() as Tick) as f64;
        }
        core.reindex();
        Ok(())
    }

    /// Disable looping
    pub fn clear_loop(&self) {
        let mut core = self.core.lock();
        if core.loop_region.take().is_some() {
            core.reindex();
        }
    }

    pub fn loop_region(&self) -> Option<LoopRegion> {
        self.core.lock().loop_region
    }

    /// Advance the clock by one audio buffer and fire every callback due in it
    ///
    /// Callbacks fire in (tick, registration) order. Each one is looked up again
    /// right before it runs, so a callback cleared earlier in the same buffer
    /// never fires. Callbacks registered during the sweep at or after the
    /// current tick still fire in this buffer.
    pub fn advance(&self, frames: usize) {
        let buffer_start = self.timing.advance(frames);
        let sample_rate = self.timing.sample_rate();

        let (generation, ticks_per_sample, mut position, region) = {
            let core = self.core.lock();
            if !core.state.is_playing() || frames == 0 {
                return;
            }
            (
                core.generation,
                core.tempo.ticks_per_second() / sample_rate,
                core.position,
                core.loop_region,
            )
        };

        let mut remaining = frames as f64 * ticks_per_sample;
        // Engine sample at which the playhead is at `position`
        let mut segment_sample = buffer_start as f64;

        loop {
            let (end, wraps) = match region {
                Some(region)
                    if position < region.end as f64
                        && position + remaining >= region.end as f64 =>
                {
                    (region.end as f64, true)
                }
                _ => (position + remaining, false),
            };

            if !self.fire_segment(generation, position, end, segment_sample, ticks_per_sample) {
                return;
            }

            if !wraps {
                position = end;
                break;
            }

            let consumed = end - position;
            remaining -= consumed;
            segment_sample += consumed / ticks_per_sample;

            let mut core = self.core.lock();
            if core.generation != generation || !core.state.is_playing() {
                return;
            }
            // Loop wrap: `region` is Some whenever `wraps` is true
            let Some(region) = region else { break };
            position = region.start as f64;
            core.cycle += 1;
            log::trace!("Transport wrapped to tick {}, cycle {}", region.start, core.cycle);

            if remaining <= 0.0 {
                break;
            }
        }

        let mut core = self.core.lock();
        if core.generation == generation && core.state.is_playing() {
            core.position = position;
        }
    }

    /// Fire callbacks due in [start, end). Returns false if the transport was
    /// stopped by one of them.
    fn fire_segment(
        &self,
        generation: u64,
        start: f64,
        end: f64,
        segment_sample: f64,
        ticks_per_sample: f64,
    ) -> bool {
        let sample_rate = self.timing.sample_rate();
        let mut last: Option<(Tick, ScheduleId)> = None;

        loop {
            let due = {
                let mut core = self.core.lock();
                if core.generation != generation || !core.state.is_playing() {
                    return false;
                }

                let lower = match last {
                    Some(key) => Bound::Excluded(key),
                    None => Bound::Included((start.ceil() as Tick, ScheduleId(0))),
                };
                let next = core
                    .queue
                    .range((lower, Bound::Unbounded))
                    .next()
                    .copied()
                    .filter(|(tick, _)| (*tick as f64) < end);

                let Some((tick, id)) = next else {
                    return true;
                };
                last = Some((tick, id));

                let cycle = core.cycle;
                let Some(entry) = core.entries.get(&id) else {
                    continue;
                };
                if entry.from_cycle > cycle {
                    // Stays queued for a later pass
                    continue;
                }
                let once = entry.once;
                let callback = if once {
                    core.remove(id).and_then(|entry| entry.callback)
                } else {
                    core.entries
                        .get_mut(&id)
                        .and_then(|entry| entry.callback.take())
                };
                callback.map(|callback| (tick, id, cycle, once, callback))
            };

            // Callback already running further up the stack
            let Some((tick, id, cycle, once, mut callback)) = due else {
                continue;
            };

            let sample = segment_sample + (tick as f64 - start) / ticks_per_sample;
            callback(FireTime {
                time: sample / sample_rate,
                position: tick,
                cycle,
            });

            if !once {
                let mut core = self.core.lock();
                if let Some(entry) = core.entries.get_mut(&id) {
                    entry.callback = Some(callback);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn recorder() -> (Arc<Mutex<Vec<FireTime>>>, impl Fn() -> TransportCallback) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let shared = Arc::clone(&fired);
        let make = move || -> TransportCallback {
            let sink = Arc::clone(&shared);
            Box::new(move |fire| sink.lock().push(fire))
        };
        (fired, make)
    }

    #[test]
    fn test_transport_state() {
        let state = TransportState::Playing;
        assert!(state.is_playing());
        assert!(!state.is_stopped());

        let state2 = TransportState::Paused;
        assert!(!state2.is_playing());
        assert!(state2.is_stopped());
    }

    #[test]
    fn test_transport_control() {
        let transport = Transport::new(48000.0);
        assert_eq!(transport.state(), TransportState::Stopped);

        transport.start(0);
        assert_eq!(transport.state(), TransportState::Playing);

        transport.pause();
        assert_eq!(transport.state(), TransportState::Paused);

        transport.resume();
        assert_eq!(transport.state(), TransportState::Playing);

        transport.advance(24000);
        assert_eq!(transport.position(), 480);

        transport.stop();
        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(transport.position(), 0);
    }

    #[test]
    fn test_start_is_noop_while_playing() {
        let transport = Transport::new(48000.0);
        transport.start(0);
        transport.advance(24000);
        transport.start(1920);
        assert_eq!(transport.position(), 480);
    }

    #[test]
    fn test_stop_holding_position() {
        let transport = Transport::new(48000.0);
        transport.schedule(10_000, |_| {});
        transport.start(0);
        transport.advance(12000);

        transport.stop_holding_position();
        assert_eq!(transport.position(), 240);
        assert_eq!(transport.pending_count(), 0);
    }

    #[test]
    fn test_fire_time_is_sample_accurate() {
        let transport = Transport::new(48000.0);
        let (fired, make) = recorder();
        transport.schedule(240, make());

        transport.start(0);
        // 512-frame buffers: tick 240 is at sample 12000, inside the 24th buffer
        for _ in 0..30 {
            transport.advance(512);
        }

        let fired = fired.lock();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].position, 240);
        assert_abs_diff_eq!(fired[0].time, 0.25, epsilon = 1e-9);
    }

    #[test]
    fn test_ties_fire_in_registration_order() {
        let transport = Transport::new(48000.0);
        let order = Arc::new(Mutex::new(Vec::new()));
        for label in ["bass", "upper", "top"] {
            let order = Arc::clone(&order);
            transport.schedule(480, move |_| order.lock().push(label));
        }
        let early = Arc::clone(&order);
        transport.schedule(0, move |_| early.lock().push("first"));

        transport.start(0);
        transport.advance(48000);

        assert_eq!(*order.lock(), vec!["first", "bass", "upper", "top"]);
    }

    #[test]
    fn test_clear_prevents_firing() {
        let transport = Transport::new(48000.0);
        let (fired, make) = recorder();
        let id = transport.schedule(100, make());
        assert!(transport.clear(id));
        assert!(!transport.clear(id));

        transport.start(0);
        transport.advance(48000);
        assert!(fired.lock().is_empty());
    }

    #[test]
    fn test_callback_cancelling_later_callback_in_same_buffer() {
        let transport = Transport::new(48000.0);
        let (fired, make) = recorder();
        let victim = transport.schedule(200, make());

        let canceller = transport.clone();
        transport.schedule(100, move |_| {
            canceller.clear(victim);
        });

        transport.start(0);
        transport.advance(48000);
        assert!(fired.lock().is_empty());
    }

    #[test]
    fn test_stop_inside_callback_aborts_sweep() {
        let transport = Transport::new(48000.0);
        let (fired, make) = recorder();

        let stopper = transport.clone();
        transport.schedule(100, move |_| stopper.stop());
        transport.schedule(100, make());
        transport.schedule(300, make());

        transport.start(0);
        transport.advance(48000);

        assert!(fired.lock().is_empty());
        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(transport.position(), 0);
    }

    #[test]
    fn test_schedule_once_inside_sweep_fires_same_buffer() {
        let transport = Transport::new(48000.0);
        let (fired, make) = recorder();

        let inner = transport.clone();
        transport.schedule_once(100, move |fire| {
            let mut callback = make();
            inner.schedule_once(fire.position, move |f| callback(f));
        });

        transport.start(0);
        transport.advance(4800);

        assert_eq!(fired.lock().len(), 1);
        assert_eq!(fired.lock()[0].position, 100);
        assert_eq!(transport.pending_count(), 0);
    }

    #[test]
    fn test_loop_wraps_without_gap() {
        let transport = Transport::new(48000.0);
        let (fired, make) = recorder();
        transport.schedule(0, make());
        transport.schedule(480, make());
        // 960 ticks = 1 second at 120 BPM
        transport.set_loop(0, 960).unwrap();

        transport.start(0);
        // Just under 3 seconds in odd-sized buffers
        for _ in 0..143 {
            transport.advance(1000);
        }
        transport.advance(999);

        let fired = fired.lock();
        let positions: Vec<Tick> = fired.iter().map(|f| f.position).collect();
        assert_eq!(positions, vec![0, 480, 0, 480, 0, 480]);
        for (i, fire) in fired.iter().enumerate() {
            assert_abs_diff_eq!(fire.time, i as f64 * 0.5, epsilon = 1e-6);
        }
        assert_eq!(fired[4].cycle, 2);
    }

    #[test]
    fn test_loop_point_fires_once_per_cycle() {
        let transport = Transport::new(48000.0);
        let (fired, make) = recorder();
        // Exactly on the loop end: folds onto the loop start
        transport.schedule(960, make());
        transport.set_loop(0, 960).unwrap();

        transport.start(0);
        transport.advance(48000 * 4 - 1);

        let cycles: Vec<u64> = fired.lock().iter().map(|f| f.cycle).collect();
        assert_eq!(cycles, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_one_shot_past_loop_end_waits_a_cycle() {
        let transport = Transport::new(48000.0);
        let (fired, make) = recorder();
        transport.set_loop(0, 960).unwrap();

        // A full-period note-off scheduled from a trigger at 480
        let inner = transport.clone();
        transport.schedule_once(480, move |fire| {
            let mut callback = make();
            inner.schedule_once(fire.position + 960, move |f| callback(f));
            inner.schedule_once(fire.position + 1920, move |_| {});
        });

        transport.start(0);
        // Just past tick 480
        transport.advance(24001);
        assert!(fired.lock().is_empty());
        assert_eq!(transport.pending_count(), 2);

        transport.advance(48000);
        let fired = fired.lock();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].position, 480);
        assert_eq!(fired[0].cycle, 1);
        assert_abs_diff_eq!(fired[0].time, 1.5, epsilon = 1e-6);
        // Two periods out: still waiting for cycle 2
        assert_eq!(transport.pending_count(), 1);
    }

    #[test]
    fn test_loop_wraps_more_than_once_per_buffer() {
        let transport = Transport::new(48000.0);
        let (fired, make) = recorder();
        transport.schedule(0, make());
        transport.set_loop(0, 240).unwrap();

        transport.start(0);
        // Just under 4 loop lengths in a single buffer
        transport.advance(48000 - 1);
        assert_eq!(fired.lock().len(), 4);
    }

    #[test]
    fn test_tempo_change_applies_forward_only() {
        let transport = Transport::new(48000.0);
        let (fired, make) = recorder();
        transport.schedule(480, make());
        transport.schedule(960, make());

        transport.start(0);
        transport.advance(24000); // up to tick 480 (0.5s)
        transport.set_tempo(Tempo::new(60.0).unwrap());
        transport.advance(48001); // next 480 ticks take one second now

        let fired = fired.lock();
        assert_eq!(fired.len(), 2);
        assert_abs_diff_eq!(fired[0].time, 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(fired[1].time, 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_swung_positions() {
        let transport = Transport::new(48000.0);
        assert_eq!(transport.swung(240), 240);
        transport.set_swing(Swing::new(1.0, 240).unwrap());
        assert_eq!(transport.swung(240), 320);
        assert_eq!(transport.swung(480), 480);
    }

    #[test]
    fn test_clock_state_snapshot() {
        let transport = Transport::new(48000.0);
        transport.set_time_signature(TimeSignature::three_four());
        transport.start(1440);

        let state = transport.clock_state();
        assert!(state.is_running());
        assert_eq!(state.musical_position(), MusicalTime::new(2, 1, 0));
    }

    #[test]
    fn test_invalid_loop_region() {
        let transport = Transport::new(48000.0);
        assert!(transport.set_loop(960, 960).is_err());
        assert!(transport.loop_region().is_none());
    }

    #[test]
    fn test_stopped_transport_keeps_engine_time() {
        let transport = Transport::new(48000.0);
        transport.advance(48000);
        assert_eq!(transport.now(), 1.0);
        assert_eq!(transport.position(), 0);
    }
}
