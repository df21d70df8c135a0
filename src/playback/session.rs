// Playback sessions - one widget's exclusive claim on the output
// WidgetPlayer composes coordinator, scheduler, envelope and transport

use super::parameters::Parameter;
use super::services::PlaybackServices;
use super::{OwnerId, PlaybackObserver, SessionId, StopReason};
use crate::error::{PlaybackError, Result};
use crate::sequencer::event::{Event, EventLength, Subdivision};
use crate::sequencer::scheduler::{RunHandle, RunHooks, SequenceOptions, SequencePlan};
use crate::sequencer::timeline::{Swing, Tempo, TimeSignature};
use crate::sequencer::transport::Transport;
use crate::synth::envelope::{AdsrParams, LiveEnvelope};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Everything a widget hands over when its play button is pressed
///
/// Unset timing fields fall back to the player's current settings.
#[derive(Debug, Clone, Default)]
pub struct PlayRequest {
    pub events: Vec<Event>,
    pub tempo: Option<f64>,
    pub time_signature: Option<TimeSignature>,
    pub swing: Option<f64>,
    pub subdivision: Option<Subdivision>,
    pub looping: bool,
    pub loop_length: Option<EventLength>,
}

impl PlayRequest {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub fn with_tempo(mut self, bpm: f64) -> Self {
        self.tempo = Some(bpm);
        self
    }

    pub fn with_time_signature(mut self, time_signature: TimeSignature) -> Self {
        self.time_signature = Some(time_signature);
        self
    }

    pub fn with_swing(mut self, amount: f64) -> Self {
        self.swing = Some(amount);
        self
    }

    pub fn with_subdivision(mut self, subdivision: Subdivision) -> Self {
        self.subdivision = Some(subdivision);
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
}

/// One play action of one widget
pub struct PlaybackSession {
    id: SessionId,
    owner: OwnerId,
    looping: bool,
    run: RunHandle,
    halted: AtomicBool,
    transport: Transport,
}

impl PlaybackSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn run(&self) -> &RunHandle {
        &self.run
    }

    pub fn is_complete(&self) -> bool {
        self.run.is_complete()
    }

    /// Neither stopped nor played out
    pub fn is_running(&self) -> bool {
        !self.halted.load(Ordering::SeqCst) && !self.run.is_complete()
    }

    // Cancel the run, then stop the shared clock. Only called while this
    // session owns the transport.
    fn halt(&self) {
        if self.halted.swap(true, Ordering::SeqCst) {
            return;
        }
        self.run.cancel();
        self.transport.stop();
        log::debug!("Session {} of {} halted", self.id, self.owner);
    }
}

struct PlayerSettings {
    tempo: Tempo,
    time_signature: TimeSignature,
    swing: Swing,
    subdivision: Subdivision,
}

type SessionSlot = Arc<Mutex<Option<Arc<PlaybackSession>>>>;

/// Play/stop/set-parameter for one widget
///
/// Every sound goes through the coordinator: playing preempts whichever
/// widget was audible. Dropping the player stops its session.
pub struct WidgetPlayer {
    owner: OwnerId,
    services: PlaybackServices,
    envelope: LiveEnvelope,
    settings: Mutex<PlayerSettings>,
    observer: Option<Arc<dyn PlaybackObserver>>,
    current: SessionSlot,
}

impl WidgetPlayer {
    pub fn new(owner: impl Into<OwnerId>, services: PlaybackServices) -> Self {
        let config = services.config();
        let settings = PlayerSettings {
            tempo: config.tempo().unwrap_or_default(),
            time_signature: config.time_signature,
            swing: config.swing().unwrap_or_default(),
            subdivision: config.subdivision().unwrap_or_default(),
        };
        let envelope = LiveEnvelope::new(config.envelope);

        Self {
            owner: owner.into(),
            services,
            envelope,
            settings: Mutex::new(settings),
            observer: None,
            current: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PlaybackObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn services(&self) -> &PlaybackServices {
        &self.services
    }

    /// Live envelope; edits reach the next triggered note
    pub fn envelope(&self) -> &LiveEnvelope {
        &self.envelope
    }

    pub fn set_envelope(&self, params: AdsrParams) -> Result<()> {
        self.envelope.set(params)
    }

    pub fn tempo(&self) -> Tempo {
        self.settings.lock().tempo
    }

    pub fn swing(&self) -> Swing {
        self.settings.lock().swing
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.settings.lock().time_signature
    }

    pub fn subdivision(&self) -> Subdivision {
        self.settings.lock().subdivision
    }

    pub fn current_session(&self) -> Option<Arc<PlaybackSession>> {
        self.current.lock().clone()
    }

    pub fn is_playing(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|session| session.is_running())
    }

    /// Start a new session, preempting whatever else is playing
    ///
    /// Configuration errors and a missing audio engine are reported before
    /// anything else is touched; the previously audible widget keeps playing.
    pub fn play(&self, request: PlayRequest) -> Result<Arc<PlaybackSession>> {
        let (tempo, time_signature, swing, subdivision) = self.settle(&request)?;

        let options = SequenceOptions {
            subdivision,
            looping: request.looping,
            loop_length: request.loop_length,
            envelope: self.envelope.clone(),
            hooks: RunHooks::default(),
        };
        SequencePlan::new(&request.events, &options, &time_signature, &swing)?;

        if !self.services.is_audio_ready() {
            return Err(PlaybackError::Initialization(
                "audio engine is not initialized".to_string(),
            ));
        }

        self.halt_current();

        let id = SessionId::new();
        let coordinator = self.services.coordinator();
        coordinator.register_session(self.owner.clone(), self.stop_callback(id));

        let transport = self.services.transport();
        transport.stop();
        transport.set_tempo(tempo);
        transport.set_time_signature(time_signature);
        transport.set_swing(swing);

        let options = options.with_hooks(self.hooks());
        let run = match self
            .services
            .scheduler()
            .schedule_sequence(&request.events, options)
        {
            Ok(run) => run,
            Err(err) => {
                coordinator.unregister_session(&self.owner);
                return Err(err);
            }
        };

        let session = Arc::new(PlaybackSession {
            id,
            owner: self.owner.clone(),
            looping: request.looping,
            run,
            halted: AtomicBool::new(false),
            transport: transport.clone(),
        });

        if session.is_complete() {
            // Empty sequence: already completed and released
            return Ok(session);
        }

        *self.current.lock() = Some(Arc::clone(&session));
        transport.start(0);
        log::debug!(
            "{} playing session {} ({} events{})",
            self.owner,
            id,
            request.events.len(),
            if request.looping { ", looping" } else { "" }
        );
        Ok(session)
    }

    fn settle(
        &self,
        request: &PlayRequest,
    ) -> Result<(Tempo, TimeSignature, Swing, Subdivision)> {
        let settings = self.settings.lock();

        let tempo = match request.tempo {
            Some(bpm) => Tempo::new(bpm)?,
            None => settings.tempo,
        };
        let time_signature = match request.time_signature {
            Some(time_signature) => {
                time_signature.validate()?;
                time_signature
            }
            None => settings.time_signature,
        };
        let swing = match request.swing {
            Some(amount) => settings.swing.with_amount(amount)?,
            None => settings.swing,
        };
        let subdivision = request.subdivision.unwrap_or(settings.subdivision);

        Ok((tempo, time_signature, swing, subdivision))
    }

    fn stop_callback(
        &self,
        id: SessionId,
    ) -> impl FnOnce(StopReason) -> Result<()> + Send + 'static {
        let slot = Arc::downgrade(&self.current);
        let observer = self.observer.clone();

        move |reason| {
            let Some(slot) = slot.upgrade() else {
                return Ok(());
            };
            let session = slot.lock().take_if(|session| session.id == id);
            if let Some(session) = session {
                let completed = session.is_complete();
                session.halt();
                if !completed {
                    if let Some(observer) = observer {
                        observer.on_stopped(reason);
                    }
                }
            }
            Ok(())
        }
    }

    fn hooks(&self) -> RunHooks {
        let mut hooks = RunHooks::new();
        if let Some(observer) = self.observer.clone() {
            hooks = hooks.on_step(move |index| observer.on_step(index));
        }

        let observer = self.observer.clone();
        let coordinator = Arc::clone(self.services.coordinator());
        let owner = self.owner.clone();
        hooks.on_complete(move || {
            if let Some(observer) = observer {
                observer.on_complete();
            }
            coordinator.unregister_session(&owner);
        })
    }

    fn halt_current(&self) {
        let session = self.current.lock().take();
        if let Some(session) = session {
            session.halt();
        }
    }

    fn owns_transport(&self) -> bool {
        self.current.lock().is_some() && self.services.coordinator().is_active(&self.owner)
    }

    /// Stop this widget's session. Safe to call repeatedly.
    pub fn stop(&self) {
        self.services.coordinator().unregister_session(&self.owner);
        self.halt_current();
    }

    /// Hold the shared clock, keeping pending triggers
    pub fn pause(&self) {
        if self.owns_transport() {
            self.services.transport().pause();
        }
    }

    pub fn resume(&self) {
        if self.owns_transport() {
            self.services.transport().resume();
        }
    }

    /// Apply a named parameter from a UI control
    pub fn set_parameter(&self, name: &str, value: f64) -> Result<Parameter> {
        let parameter = Parameter::parse(name, value)?;
        self.apply(parameter)?;
        Ok(parameter)
    }

    /// Tempo applies to the running clock at once; swing to positions
    /// scheduled from now on; envelope values to the next note-on.
    pub fn apply(&self, parameter: Parameter) -> Result<()> {
        match parameter {
            Parameter::Tempo(bpm) => {
                let tempo = Tempo::new(bpm)?;
                self.settings.lock().tempo = tempo;
                if self.owns_transport() {
                    self.services.transport().set_tempo(tempo);
                }
            }
            Parameter::Swing(amount) => {
                let swing = {
                    let mut settings = self.settings.lock();
                    settings.swing = settings.swing.with_amount(amount)?;
                    settings.swing
                };
                if self.owns_transport() {
                    self.services.transport().set_swing(swing);
                }
            }
            Parameter::Attack(seconds) => self.envelope.update(|p| p.with_attack(seconds))?,
            Parameter::Decay(seconds) => self.envelope.update(|p| p.with_decay(seconds))?,
            Parameter::Sustain(level) => self.envelope.update(|p| p.with_sustain(level))?,
            Parameter::Release(seconds) => self.envelope.update(|p| p.with_release(seconds))?,
        }
        log::trace!("{}: {parameter}", self.owner);
        Ok(())
    }
}

impl Drop for WidgetPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
