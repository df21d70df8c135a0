// Event scheduler - turns a sequence of musical events into transport callbacks
// Each trigger starts engine sources shaped by an envelope and schedules their release

use super::event::{Event, EventLength, ResolvedEvent, Subdivision, resolve_sequence};
use super::timeline::{MAX_TICK, Swing, Tick, TimeSignature};
use super::transport::{FireTime, ScheduleId, Transport};
use crate::audio::engine::SharedEngine;
use crate::error::{PlaybackError, Result};
use crate::synth::envelope::{EnvelopeShaper, LiveEnvelope};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

type StepHook = Box<dyn FnMut(usize) + Send>;
type CompleteHook = Box<dyn FnOnce() + Send>;

/// Observer callbacks for one run
#[derive(Default)]
pub struct RunHooks {
    on_step: Option<StepHook>,
    on_complete: Option<CompleteHook>,
}

impl RunHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the event's index each time an event triggers
    pub fn on_step<F>(mut self, hook: F) -> Self
    where
        F: FnMut(usize) + Send + 'static,
    {
        self.on_step = Some(Box::new(hook));
        self
    }

    /// Called once when a non-looping run finishes on its own
    pub fn on_complete<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_complete = Some(Box::new(hook));
        self
    }
}

/// How a sequence is scheduled
pub struct SequenceOptions {
    pub subdivision: Subdivision,
    pub looping: bool,
    /// Loop period; defaults to the whole measures covering the sequence
    pub loop_length: Option<EventLength>,
    pub envelope: LiveEnvelope,
    pub hooks: RunHooks,
}

impl SequenceOptions {
    pub fn new() -> Self {
        Self {
            subdivision: Subdivision::default(),
            looping: false,
            loop_length: None,
            envelope: LiveEnvelope::default(),
            hooks: RunHooks::default(),
        }
    }

    pub fn with_subdivision(mut self, subdivision: Subdivision) -> Self {
        self.subdivision = subdivision;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_loop_length(mut self, length: EventLength) -> Self {
        self.loop_length = Some(length);
        self
    }

    pub fn with_envelope(mut self, envelope: LiveEnvelope) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn with_hooks(mut self, hooks: RunHooks) -> Self {
        self.hooks = hooks;
        self
    }
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// One trigger as it actually fired
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiredEvent {
    pub index: usize,
    pub position: Tick,
    pub time: f64,
    pub cycle: u64,
}

struct RunState {
    entries: Vec<ScheduleId>,
    voices: BTreeMap<u64, EnvelopeShaper>,
    next_voice: u64,
    fired: Vec<FiredEvent>,
    on_step: Option<StepHook>,
    on_complete: Option<CompleteHook>,
}

struct RunInner {
    transport: Transport,
    engine: SharedEngine,
    envelope: LiveEnvelope,
    loop_length: Option<Tick>,
    end: Option<Tick>,
    cancelled: AtomicBool,
    completed: AtomicBool,
    state: Mutex<RunState>,
}

impl RunInner {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    // Keep an entry id so cancel can clear it; clears it right away if the
    // run was cancelled meanwhile
    fn track(&self, id: ScheduleId) {
        let mut state = self.state.lock();
        if self.is_cancelled() {
            drop(state);
            self.transport.clear(id);
        } else {
            state.entries.push(id);
        }
    }

    fn step(&self, index: usize) {
        let hook = self.state.lock().on_step.take();
        if let Some(mut hook) = hook {
            hook(index);
            let mut state = self.state.lock();
            if state.on_step.is_none() {
                state.on_step = Some(hook);
            }
        }
    }

    fn trigger(self: &Arc<Self>, event: &ResolvedEvent, fire: FireTime) {
        if self.is_cancelled() {
            return;
        }
        self.step(event.index);
        if self.is_cancelled() {
            return;
        }
        self.state.lock().fired.push(FiredEvent {
            index: event.index,
            position: fire.position,
            time: fire.time,
            cycle: fire.cycle,
        });

        let params = self.envelope.snapshot();
        let mut started = Vec::new();
        {
            let mut engine = self.engine.lock();
            for request in event.requests() {
                let shaper = engine
                    .create_source(&request, fire.time)
                    .and_then(|source| {
                        EnvelopeShaper::note_on(&mut *engine, source, params, fire.time)
                    });
                match shaper {
                    Ok(shaper) => started.push(shaper),
                    Err(err) => log::warn!(
                        "Event {} could not start {:?}: {err}",
                        event.index,
                        request.voice
                    ),
                }
            }

            if event.length == Some(0) {
                for shaper in &mut started {
                    if let Err(err) = shaper.note_off(&mut *engine, fire.time) {
                        log::warn!("Event {} release failed: {err}", event.index);
                    }
                }
                return;
            }
        }

        if started.is_empty() {
            return;
        }
        let keys = self.keep_voices(started, fire.time);

        if let Some(length) = event.length {
            let run = Arc::clone(self);
            let id = self
                .transport
                .schedule_once(fire.position.saturating_add(length), move |fire| {
                    run.release(&keys, fire.time)
                });
            self.track(id);
        }
    }

    fn keep_voices(&self, shapers: Vec<EnvelopeShaper>, at: f64) -> Vec<u64> {
        let mut state = self.state.lock();
        if self.is_cancelled() {
            // Cancelled while the sources were starting
            drop(state);
            self.release_all(shapers, at);
            return Vec::new();
        }

        shapers
            .into_iter()
            .map(|shaper| {
                let key = state.next_voice;
                state.next_voice += 1;
                state.voices.insert(key, shaper);
                key
            })
            .collect()
    }

    fn release(&self, keys: &[u64], at: f64) {
        let shapers: Vec<EnvelopeShaper> = {
            let mut state = self.state.lock();
            keys.iter()
                .filter_map(|key| state.voices.remove(key))
                .collect()
        };
        self.release_all(shapers, at);
    }

    fn release_all(&self, shapers: Vec<EnvelopeShaper>, at: f64) {
        if shapers.is_empty() {
            return;
        }
        let mut engine = self.engine.lock();
        for mut shaper in shapers {
            if let Err(err) = shaper.note_off(&mut *engine, at) {
                log::warn!("Release of source {} failed: {err}", shaper.source_id());
            }
        }
    }

    fn drain_voices(&self) -> Vec<EnvelopeShaper> {
        std::mem::take(&mut self.state.lock().voices)
            .into_values()
            .collect()
    }

    fn complete(&self, at: f64) {
        if self.is_cancelled() || self.completed.swap(true, Ordering::SeqCst) {
            return;
        }
        let remaining = self.drain_voices();
        self.release_all(remaining, at);

        let hook = self.state.lock().on_complete.take();
        log::debug!("Sequence complete");
        if let Some(hook) = hook {
            hook();
        }
    }
}

/// Handle to a scheduled run
///
/// Cancelling is idempotent: pending triggers are cleared, sounding voices
/// release from their current level, and the completion hook never runs.
#[derive(Clone)]
pub struct RunHandle {
    inner: Arc<RunInner>,
}

impl RunHandle {
    pub fn cancel(&self) {
        let inner = &self.inner;
        if inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }

        let (entries, voices) = {
            let mut state = inner.state.lock();
            state.on_complete = None;
            (
                std::mem::take(&mut state.entries),
                std::mem::take(&mut state.voices),
            )
        };
        for id in entries {
            inner.transport.clear(id);
        }

        let released = voices.len();
        inner.release_all(voices.into_values().collect(), inner.transport.now());
        log::debug!("Sequence cancelled, {released} voices released");
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// True once a non-looping run has played out
    pub fn is_complete(&self) -> bool {
        self.inner.completed.load(Ordering::SeqCst)
    }

    /// Voices started and not yet released
    pub fn active_voices(&self) -> usize {
        self.inner.state.lock().voices.len()
    }

    /// Triggers in the order they fired
    pub fn fired(&self) -> Vec<FiredEvent> {
        self.inner.state.lock().fired.clone()
    }

    /// Loop period for looping runs
    pub fn loop_length(&self) -> Option<Tick> {
        self.inner.loop_length
    }

    /// Tick at which a non-looping run completes; `None` if it holds
    pub fn end(&self) -> Option<Tick> {
        self.inner.end
    }
}

/// Where a sequence lands on the timeline, computed without side effects
///
/// Positions carry the swing they were planned with. Looping plans have a
/// period; non-looping plans without held events have an end tick.
#[derive(Debug, Clone)]
pub struct SequencePlan {
    events: Vec<(ResolvedEvent, Tick)>,
    looping: bool,
    loop_length: Option<Tick>,
    end: Option<Tick>,
}

impl SequencePlan {
    pub fn new(
        events: &[Event],
        options: &SequenceOptions,
        time_signature: &TimeSignature,
        swing: &Swing,
    ) -> Result<Self> {
        let events: Vec<(ResolvedEvent, Tick)> =
            resolve_sequence(events, options.subdivision, time_signature)?
                .into_iter()
                .map(|event| {
                    let due = swing.apply(event.at);
                    (event, due)
                })
                .collect();

        let overflow = || PlaybackError::invalid("Sequence runs past the end of the timeline");
        let last_end = events
            .iter()
            .map(|(event, due)| due.checked_add(event.length.unwrap_or(0)).ok_or_else(overflow))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .max()
            .unwrap_or(0);
        let holds = events.iter().any(|(event, _)| event.length.is_none());

        let loop_length = if options.looping {
            let period = match options.loop_length {
                Some(length) => length
                    .resolve(options.subdivision)?
                    .ok_or_else(|| PlaybackError::invalid("Loop length cannot be held"))?,
                None => {
                    // Whole bars past every end and every start
                    let bar = time_signature.ticks_per_bar();
                    let last_start = events
                        .iter()
                        .map(|(_, due)| due.checked_add(1).ok_or_else(overflow))
                        .collect::<Result<Vec<_>>>()?
                        .into_iter()
                        .max()
                        .unwrap_or(0);
                    last_end
                        .max(last_start)
                        .div_ceil(bar)
                        .max(1)
                        .checked_mul(bar)
                        .ok_or_else(overflow)?
                }
            };
            if period == 0 {
                return Err(PlaybackError::invalid("Loop length must be > 0"));
            }
            if period > MAX_TICK {
                return Err(PlaybackError::invalid(format!(
                    "Loop length of {period} ticks is beyond the {MAX_TICK}-tick timeline"
                )));
            }
            if let Some((late, due)) = events.iter().find(|(_, due)| *due >= period) {
                return Err(PlaybackError::invalid(format!(
                    "event {} starts at tick {due}, beyond the {period}-tick loop",
                    late.index
                )));
            }
            Some(period)
        } else {
            None
        };

        let end = (!options.looping && !holds).then_some(last_end);

        Ok(Self {
            events,
            looping: options.looping,
            loop_length,
            end,
        })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// (event index, due tick) in firing order
    pub fn positions(&self) -> Vec<(usize, Tick)> {
        self.events
            .iter()
            .map(|(event, due)| (event.index, *due))
            .collect()
    }

    pub fn loop_length(&self) -> Option<Tick> {
        self.loop_length
    }

    pub fn end(&self) -> Option<Tick> {
        self.end
    }
}

/// Schedules event sequences on a transport
#[derive(Clone)]
pub struct EventScheduler {
    transport: Transport,
    engine: SharedEngine,
}

impl EventScheduler {
    pub fn new(transport: Transport, engine: SharedEngine) -> Self {
        Self { transport, engine }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Plan against the transport's current meter and swing
    pub fn plan(&self, events: &[Event], options: &SequenceOptions) -> Result<SequencePlan> {
        SequencePlan::new(
            events,
            options,
            &self.transport.time_signature(),
            &self.transport.swing(),
        )
    }

    /// Register every event of `events` on the transport
    ///
    /// The whole sequence is validated first; an invalid event schedules
    /// nothing. Event positions take the transport's current swing. The
    /// transport is not started.
    pub fn schedule_sequence(
        &self,
        events: &[Event],
        options: SequenceOptions,
    ) -> Result<RunHandle> {
        let plan = self.plan(events, &options)?;

        let inner = Arc::new(RunInner {
            transport: self.transport.clone(),
            engine: Arc::clone(&self.engine),
            envelope: options.envelope,
            loop_length: plan.loop_length,
            end: plan.end,
            cancelled: AtomicBool::new(false),
            completed: AtomicBool::new(false),
            state: Mutex::new(RunState {
                entries: Vec::with_capacity(plan.len() + 1),
                voices: BTreeMap::new(),
                next_voice: 0,
                fired: Vec::new(),
                on_step: options.hooks.on_step,
                on_complete: options.hooks.on_complete,
            }),
        });
        let handle = RunHandle {
            inner: Arc::clone(&inner),
        };

        if plan.is_empty() {
            log::debug!("Empty sequence, completing immediately");
            inner.complete(self.transport.now());
            return Ok(handle);
        }

        match plan.loop_length {
            Some(period) => self.transport.set_loop(0, period)?,
            None => self.transport.clear_loop(),
        }

        let mut entries = Vec::with_capacity(plan.len() + 1);
        for (event, due) in plan.events {
            let run = Arc::clone(&inner);
            let id = if plan.looping {
                self.transport
                    .schedule(due, move |fire| run.trigger(&event, fire))
            } else {
                self.transport
                    .schedule_once(due, move |fire| run.trigger(&event, fire))
            };
            entries.push(id);
        }

        if let Some(end) = plan.end {
            let run = Arc::clone(&inner);
            entries.push(
                self.transport
                    .schedule_once(end, move |fire| run.complete(fire.time)),
            );
        }

        log::debug!(
            "Scheduled {} transport entries{}",
            entries.len(),
            match plan.loop_length {
                Some(period) => format!(", looping every {period} ticks"),
                None => String::new(),
            }
        );
        inner.state.lock().entries.extend(entries);
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::engine::{AudioEngine, Voice, share_engine};
    use crate::audio::offline::OfflineEngine;
    use crate::sequencer::event::{DrumKind, EventOffset};
    use crate::sequencer::timeline::Swing;
    use crate::synth::envelope::AdsrParams;
    use approx::assert_abs_diff_eq;

    const SAMPLE_RATE: f64 = 48000.0;
    const BUFFER: usize = 512;

    fn setup() -> (Transport, Arc<Mutex<OfflineEngine>>, EventScheduler) {
        let transport = Transport::new(SAMPLE_RATE);
        let engine = share_engine(OfflineEngine::new());
        engine.lock().initialize().unwrap();
        let shared: SharedEngine = engine.clone();
        (transport.clone(), engine, EventScheduler::new(transport, shared))
    }

    fn run_for(transport: &Transport, seconds: f64) {
        let buffers = (seconds * SAMPLE_RATE / BUFFER as f64).ceil() as usize;
        for _ in 0..buffers {
            transport.advance(BUFFER);
        }
    }

    fn note(pitch: u8, step: u32, steps: u32) -> Event {
        Event::note(pitch, EventOffset::Steps(step), EventLength::Steps(steps))
    }

    #[test]
    fn test_notes_fire_at_their_ticks() {
        let (transport, engine, scheduler) = setup();
        let events = vec![note(60, 0, 1), note(62, 1, 1), note(64, 2, 1)];

        scheduler
            .schedule_sequence(&events, SequenceOptions::new())
            .unwrap();
        transport.start(0);
        run_for(&transport, 1.0);

        let created = engine.lock().created();
        assert_eq!(created.len(), 3);
        // Sixteenths at 120 BPM: 0.125s apart
        for (i, (_, request, start)) in created.iter().enumerate() {
            assert_eq!(request.voice, Voice::Tone { pitch: 60 + 2 * i as u8 });
            assert_abs_diff_eq!(*start, i as f64 * 0.125, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_invalid_sequence_schedules_nothing() {
        let (transport, engine, scheduler) = setup();
        let events = vec![note(60, 0, 1), note(255, 1, 1)];

        let result = scheduler.schedule_sequence(&events, SequenceOptions::new());
        assert!(result.is_err());
        assert_eq!(transport.pending_count(), 0);

        transport.start(0);
        run_for(&transport, 0.5);
        assert_eq!(engine.lock().source_count(), 0);
    }

    #[test]
    fn test_empty_sequence_completes_immediately() {
        let (transport, _engine, scheduler) = setup();
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);

        let handle = scheduler
            .schedule_sequence(
                &[],
                SequenceOptions::new().with_hooks(
                    RunHooks::new().on_complete(move || flag.store(true, Ordering::SeqCst)),
                ),
            )
            .unwrap();

        assert!(done.load(Ordering::SeqCst));
        assert!(handle.is_complete());
        assert_eq!(transport.pending_count(), 0);
        assert!(!transport.is_playing());
    }

    #[test]
    fn test_completion_after_last_release() {
        let (transport, engine, scheduler) = setup();
        let completions = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&completions);
        let events = vec![note(60, 0, 4), note(67, 4, 4)];

        let handle = scheduler
            .schedule_sequence(
                &events,
                SequenceOptions::new()
                    .with_hooks(RunHooks::new().on_complete(move || *counter.lock() += 1)),
            )
            .unwrap();
        assert_eq!(handle.end(), Some(960));
        transport.start(0);

        run_for(&transport, 0.9);
        assert!(!handle.is_complete());
        assert_eq!(handle.active_voices(), 1);

        run_for(&transport, 0.5);
        assert!(handle.is_complete());
        assert_eq!(*completions.lock(), 1);
        assert_eq!(handle.active_voices(), 0);
        assert_eq!(transport.pending_count(), 0);

        let engine = engine.lock();
        for (id, _, _) in engine.created() {
            assert!(engine.stop_time(id).is_some());
        }
    }

    #[test]
    fn test_cancel_releases_and_prevents_future_triggers() {
        let (transport, engine, scheduler) = setup();
        let completions = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&completions);
        let events = vec![
            Event::note(60, EventOffset::Beats(0.0), EventLength::Beats(4.0)),
            Event::note(64, EventOffset::Beats(2.0), EventLength::Beats(1.0)),
        ];
        let envelope = LiveEnvelope::new(AdsrParams::new(0.0, 0.0, 1.0, 0.25).unwrap());

        let handle = scheduler
            .schedule_sequence(
                &events,
                SequenceOptions::new()
                    .with_envelope(envelope)
                    .with_hooks(RunHooks::new().on_complete(move || *counter.lock() += 1)),
            )
            .unwrap();
        transport.start(0);
        run_for(&transport, 0.5);

        handle.cancel();
        handle.cancel();
        let now = transport.now();
        run_for(&transport, 3.0);

        let engine = engine.lock();
        let created = engine.created();
        assert_eq!(created.len(), 1);
        let stop = engine.stop_time(created[0].0).unwrap();
        assert_abs_diff_eq!(stop, now + 0.25, epsilon = 1e-9);
        assert_eq!(*completions.lock(), 0);
        assert!(handle.is_cancelled());
        assert_eq!(transport.pending_count(), 0);
    }

    #[test]
    fn test_cancel_from_step_hook() {
        let (transport, engine, scheduler) = setup();
        let slot: Arc<Mutex<Option<RunHandle>>> = Arc::new(Mutex::new(None));
        let hook_slot = Arc::clone(&slot);
        let events = vec![note(60, 0, 1), note(62, 1, 1), note(64, 2, 1)];

        let handle = scheduler
            .schedule_sequence(
                &events,
                SequenceOptions::new().with_hooks(RunHooks::new().on_step(move |index| {
                    if index == 1 {
                        if let Some(handle) = hook_slot.lock().as_ref() {
                            handle.cancel();
                        }
                    }
                })),
            )
            .unwrap();
        *slot.lock() = Some(handle.clone());

        transport.start(0);
        run_for(&transport, 1.0);

        assert_eq!(engine.lock().source_count(), 1);
        assert_eq!(handle.fired().len(), 1);
    }

    #[test]
    fn test_rejected_voice_does_not_abort_chord() {
        let (transport, engine, scheduler) = setup();
        engine.lock().reject_pitch(64);
        let events = vec![Event::chord(
            vec![60, 64, 67],
            EventOffset::Ticks(0),
            EventLength::Beats(1.0),
        )];

        let handle = scheduler
            .schedule_sequence(&events, SequenceOptions::new())
            .unwrap();
        transport.start(0);
        transport.advance(BUFFER);

        assert_eq!(engine.lock().source_count(), 2);
        assert_eq!(handle.active_voices(), 2);
    }

    #[test]
    fn test_zero_length_event_releases_at_once() {
        let (transport, engine, scheduler) = setup();
        let events = vec![Event::new(
            EventOffset::Beats(0.5),
            crate::sequencer::event::Trigger::Drum(DrumKind::Kick),
            EventLength::Ticks(0),
        )];

        let handle = scheduler
            .schedule_sequence(
                &events,
                SequenceOptions::new().with_envelope(LiveEnvelope::new(AdsrParams::gate())),
            )
            .unwrap();
        transport.start(0);
        run_for(&transport, 0.5);

        let engine = engine.lock();
        let (id, _, start) = engine.created()[0];
        assert_abs_diff_eq!(start, 0.25, epsilon = 1e-9);
        assert_eq!(engine.stop_time(id), Some(start));
        assert_eq!(handle.active_voices(), 0);
    }

    #[test]
    fn test_looping_repeats_each_measure() {
        let (transport, engine, scheduler) = setup();
        let events = vec![
            Event::drum(DrumKind::Kick, EventOffset::Steps(0)),
            Event::drum(DrumKind::Snare, EventOffset::Steps(4)),
        ];

        let handle = scheduler
            .schedule_sequence(&events, SequenceOptions::new().looping(true))
            .unwrap();
        assert_eq!(handle.loop_length(), Some(1920));
        assert_eq!(handle.end(), None);

        transport.start(0);
        // Three full bars and the first hit of the fourth
        run_for(&transport, 6.1);

        let fired = handle.fired();
        assert_eq!(fired.len(), 7);
        let cycles: Vec<u64> = fired.iter().map(|f| f.cycle).collect();
        assert_eq!(cycles, vec![0, 0, 1, 1, 2, 2, 3]);
        for pair in fired.windows(2) {
            assert!(pair[1].time > pair[0].time);
        }
        assert_eq!(engine.lock().source_count(), 7);
        assert!(!handle.is_complete());
    }

    #[test]
    fn test_explicit_loop_length() {
        let (_transport, _engine, scheduler) = setup();
        let events = vec![note(60, 0, 1), note(62, 8, 1)];

        let handle = scheduler
            .schedule_sequence(
                &events,
                SequenceOptions::new()
                    .looping(true)
                    .with_loop_length(EventLength::Beats(3.0)),
            )
            .unwrap();
        assert_eq!(handle.loop_length(), Some(1440));

        let too_short = scheduler.schedule_sequence(
            &events,
            SequenceOptions::new()
                .looping(true)
                .with_loop_length(EventLength::Beats(1.0)),
        );
        assert!(too_short.is_err());
    }

    #[test]
    fn test_swing_delays_off_beats() {
        let (transport, engine, scheduler) = setup();
        transport.set_swing(Swing::new(1.0, 240).unwrap());
        let events = vec![
            Event::note(60, EventOffset::Ticks(0), EventLength::Ticks(120)),
            Event::note(62, EventOffset::Ticks(240), EventLength::Ticks(120)),
        ];

        scheduler
            .schedule_sequence(&events, SequenceOptions::new())
            .unwrap();
        transport.start(0);
        run_for(&transport, 1.0);

        let created = engine.lock().created();
        assert_abs_diff_eq!(created[0].2, 0.0, epsilon = 1e-9);
        // 240 + 80 ticks at 960 ticks per second
        assert_abs_diff_eq!(created[1].2, 320.0 / 960.0, epsilon = 1e-9);
    }

    #[test]
    fn test_envelope_edits_reach_next_note() {
        let (transport, engine, scheduler) = setup();
        let envelope = LiveEnvelope::new(AdsrParams::gate());
        let events = vec![note(60, 0, 2), note(62, 4, 2)];

        scheduler
            .schedule_sequence(
                &events,
                SequenceOptions::new().with_envelope(envelope.clone()),
            )
            .unwrap();
        transport.start(0);
        run_for(&transport, 0.1);
        envelope.update(|p| p.with_release(0.5)).unwrap();
        run_for(&transport, 1.5);

        let engine = engine.lock();
        let created = engine.created();
        // First note: gate release at 0.25s; second: 0.5 + 0.25 + 0.5
        assert_abs_diff_eq!(engine.stop_time(created[0].0).unwrap(), 0.25, epsilon = 1e-9);
        assert_abs_diff_eq!(engine.stop_time(created[1].0).unwrap(), 1.25, epsilon = 1e-9);
    }
}
