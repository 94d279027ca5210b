//! Reading source abstraction

use std::fmt;

use super::error::FeedResult;
use super::FeedEvent;

/// Where readings currently come from, as surfaced to operators
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// No source installed yet
    Idle,
    /// Live feed delivering events
    Connected,
    /// Synthetic demo feed active
    Simulation,
    /// Feed lost; reason retained for display
    Disconnected { reason: String },
}

impl ConnectionState {
    /// True while events can still arrive
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionState::Connected | ConnectionState::Simulation)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "idle"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Simulation => write!(f, "simulation"),
            ConnectionState::Disconnected { reason } => write!(f, "disconnected: {reason}"),
        }
    }
}

/// Polled producer of feed events
///
/// Implementations never block: `poll` reports `Ok(None)` when nothing is
/// pending. A fatal error means the source is finished; the caller tears it
/// down and keeps the reason for display.
pub trait ReadingSource {
    /// Next pending event, if any
    fn poll(&mut self) -> FeedResult<Option<FeedEvent>>;

    /// Short label for logs and status displays
    fn describe(&self) -> &str;

    /// Connection state this source contributes while installed
    fn connection_state(&self) -> ConnectionState;

    /// Releases the source. Idempotent; polls after closing fail fatally.
    fn close(&mut self);
}
