// Playback services - Shared handles behind every widget player
// One coordinator, one transport and one engine per output device

use super::coordinator::PlaybackCoordinator;
use super::session::WidgetPlayer;
use super::OwnerId;
use crate::audio::engine::SharedEngine;
use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};
use crate::sequencer::scheduler::EventScheduler;
use crate::sequencer::transport::Transport;
use std::sync::Arc;

/// The process-wide playback context, passed explicitly to widgets
#[derive(Clone)]
pub struct PlaybackServices {
    coordinator: Arc<PlaybackCoordinator>,
    transport: Transport,
    engine: SharedEngine,
    config: Arc<PlaybackConfig>,
}

impl PlaybackServices {
    /// Build the shared transport from a validated config
    pub fn new(engine: SharedEngine, config: PlaybackConfig) -> Result<Self> {
        config.validate()?;

        let transport = Transport::new(config.sample_rate);
        transport.set_tempo(config.tempo()?);
        transport.set_time_signature(config.time_signature);
        transport.set_swing(config.swing()?);

        Ok(Self {
            coordinator: Arc::new(PlaybackCoordinator::new()),
            transport,
            engine,
            config: Arc::new(config),
        })
    }

    /// Acquire the output device. Must succeed before any widget can play;
    /// may be retried after a failure.
    pub fn initialize_audio(&self) -> Result<()> {
        let result = self.engine.lock().initialize();
        match result {
            Ok(()) => {
                log::debug!("Audio engine initialized");
                Ok(())
            }
            Err(err) => {
                log::warn!("Audio engine initialization failed: {err}");
                Err(PlaybackError::Initialization(err.to_string()))
            }
        }
    }

    pub fn is_audio_ready(&self) -> bool {
        self.engine.lock().is_ready()
    }

    /// Host audio callback entry point: advance the shared clock by one buffer
    pub fn process(&self, frames: usize) {
        self.transport.advance(frames);
    }

    pub fn coordinator(&self) -> &Arc<PlaybackCoordinator> {
        &self.coordinator
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn scheduler(&self) -> EventScheduler {
        EventScheduler::new(self.transport.clone(), Arc::clone(&self.engine))
    }

    /// New player competing for the output under `owner`
    pub fn player(&self, owner: impl Into<OwnerId>) -> WidgetPlayer {
        WidgetPlayer::new(owner, self.clone())
    }

    /// Page-level interruption: stop whichever widget is playing
    pub fn stop_all(&self) -> bool {
        self.coordinator.stop_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::engine::share_engine;
    use crate::audio::offline::OfflineEngine;

    #[test]
    fn test_initialization_failure_is_retryable() {
        let engine = share_engine(OfflineEngine::failing("autoplay blocked"));
        let shared: SharedEngine = engine.clone();
        let services = PlaybackServices::new(shared, PlaybackConfig::default()).unwrap();

        let err = services.initialize_audio().unwrap_err();
        assert!(matches!(err, PlaybackError::Initialization(_)));
        assert!(err.to_string().contains("autoplay blocked"));
        assert!(!services.is_audio_ready());

        engine.lock().set_init_failure(None);
        services.initialize_audio().unwrap();
        assert!(services.is_audio_ready());
    }

    #[test]
    fn test_transport_follows_config() {
        let config = PlaybackConfig {
            tempo_bpm: 90.0,
            swing: 0.5,
            ..PlaybackConfig::default()
        };
        let services =
            PlaybackServices::new(share_engine(OfflineEngine::new()), config).unwrap();

        let clock = services.transport().clock_state();
        assert_eq!(clock.tempo.bpm(), 90.0);
        assert_eq!(clock.swing.amount(), 0.5);
        assert_eq!(services.transport().sample_rate(), 48000.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PlaybackConfig {
            sample_rate: 0.0,
            ..PlaybackConfig::default()
        };
        assert!(PlaybackServices::new(share_engine(OfflineEngine::new()), config).is_err());
    }
}
