//! Read-only view of the supervised session.

use minewright_bridge_protocol::Position;

/// Where the session is in its lifecycle.
///
/// `TerminallyFailed` is absorbing: the reconnect budget is spent and only a
/// process restart gets a new session. The process itself stays up so the
/// status endpoint keeps answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Disconnected,
    Connecting,
    Operating,
    TerminallyFailed,
}

/// What the rest of the process may know about the session.
///
/// Published by the supervisor through a watch channel; the HTTP responder
/// and the routines read it and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub lifecycle: Lifecycle,
    pub position: Option<Position>,
    pub health: Option<f64>,
    pub food: Option<f64>,
}

impl StatusSnapshot {
    pub fn offline() -> Self {
        Self {
            lifecycle: Lifecycle::Disconnected,
            position: None,
            health: None,
            food: None,
        }
    }

    /// A session is live and has spawned.
    pub fn is_online(&self) -> bool {
        self.lifecycle == Lifecycle::Operating
    }
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::offline()
    }
}
