// Playback coordinator - Single-owner arbiter for the shared output
// At most one owner is registered; registering another owner stops it first

use super::{OwnerId, StopReason};
use crate::error::Result;
use parking_lot::Mutex;

/// Stops a registered session and releases what it holds
pub type StopCallback = Box<dyn FnOnce(StopReason) -> Result<()> + Send>;

struct ActiveSession {
    owner: OwnerId,
    stop: StopCallback,
}

/// Registry of the one session allowed to produce sound
///
/// Constructed explicitly and shared by handle (`Arc`), so tests can build
/// their own. Stop callbacks always run with the registry unlocked and may
/// call back into the coordinator.
#[derive(Default)]
pub struct PlaybackCoordinator {
    active: Mutex<Option<ActiveSession>>,
}

impl PlaybackCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `owner` the active session
    ///
    /// A different active owner is stopped with [`StopReason::Preempted`]
    /// before `owner` is stored, so its callback sees no active session.
    /// Registering the active owner again only replaces its callback.
    pub fn register_session<F>(&self, owner: impl Into<OwnerId>, stop: F)
    where
        F: FnOnce(StopReason) -> Result<()> + Send + 'static,
    {
        let owner = owner.into();
        let stop: StopCallback = Box::new(stop);
        loop {
            let previous = {
                let mut active = self.active.lock();
                match active.take() {
                    Some(mut current) if current.owner == owner => {
                        current.stop = stop;
                        *active = Some(current);
                        log::debug!("Session {owner} re-registered");
                        return;
                    }
                    Some(current) => current,
                    None => {
                        *active = Some(ActiveSession { owner, stop });
                        return;
                    }
                }
            };

            // Another owner may register while this one stops; preempt it too
            log::debug!("Session {} preempted by {owner}", previous.owner);
            Self::invoke(previous, StopReason::Preempted);
        }
    }

    /// Stop and clear the active session if it belongs to `owner`
    pub fn unregister_session(&self, owner: &OwnerId) {
        let released = self
            .active
            .lock()
            .take_if(|current| current.owner == *owner);

        match released {
            Some(session) => {
                log::debug!("Session {owner} released");
                Self::invoke(session, StopReason::Released);
            }
            None => log::trace!("Session {owner} not active, unregister ignored"),
        }
    }

    /// Stop whatever is active. Returns false if nothing was.
    pub fn stop_active(&self) -> bool {
        let interrupted = self.active.lock().take();
        match interrupted {
            Some(session) => {
                log::debug!("Session {} interrupted", session.owner);
                Self::invoke(session, StopReason::Interrupted);
                true
            }
            None => false,
        }
    }

    pub fn active_owner(&self) -> Option<OwnerId> {
        self.active.lock().as_ref().map(|session| session.owner.clone())
    }

    pub fn is_active(&self, owner: &OwnerId) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|session| session.owner == *owner)
    }

    fn invoke(session: ActiveSession, reason: StopReason) {
        if let Err(err) = (session.stop)(reason) {
            log::warn!("Stop callback for {} failed: {err}", session.owner);
        }
    }
}
