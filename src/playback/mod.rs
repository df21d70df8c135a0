// Playback module - Single-owner sessions over the shared transport
// Widgets play through a WidgetPlayer; the coordinator keeps one of them audible

pub mod coordinator;
pub mod parameters;
pub mod services;
pub mod session;

pub use coordinator::{PlaybackCoordinator, StopCallback};
pub use parameters::Parameter;
pub use services::PlaybackServices;
pub use session::{PlayRequest, PlaybackSession, WidgetPlayer};

use std::fmt;
use uuid::Uuid;

/// Why a session's stop callback ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Another owner registered; expected, not a failure
    Preempted,
    /// The owner unregistered (explicit stop or natural completion)
    Released,
    /// Page-level interruption through `stop_active`
    Interrupted,
}

/// Identity of a widget competing for the output
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OwnerId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for OwnerId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique id of one play action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Progress notifications for widget UI state
///
/// Purely observational. Called from inside the transport's `advance`, so
/// implementations should return quickly.
pub trait PlaybackObserver: Send + Sync {
    /// An event started sounding
    fn on_step(&self, _index: usize) {}

    /// A non-looping session played to its end
    fn on_complete(&self) {}

    /// The session was stopped before completing
    fn on_stopped(&self, _reason: StopReason) {}
}
