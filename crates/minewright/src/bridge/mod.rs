//! Session transport to the game-client bridge.
//!
//! A [`Connector`] performs exactly one connection attempt and hands back a
//! [`SessionLink`]: an event stream plus a command sink for that one session.
//! Whether and when to connect again is the supervisor's decision alone; the
//! transport never retries on its own.

mod subprocess;

pub use subprocess::SubprocessConnector;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use ulid::Ulid;

use minewright_bridge_protocol::{BridgeCommand, BridgeEvent};

use crate::config::Config;

/// Channels for one live session.
///
/// When the session dies the event stream ends; a closed stream with no prior
/// terminal event means the bridge process went away and is treated as `end`.
pub struct SessionLink {
    pub events: mpsc::Receiver<BridgeEvent>,
    pub commands: mpsc::Sender<BridgeCommand>,
}

/// Creates sessions. Implemented by the subprocess transport in production
/// and by scripted fakes in tests.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Perform a single connection attempt.
    async fn connect(&self, config: &Config) -> Result<SessionLink, BridgeError>;
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to launch bridge process: {0}")]
    Launch(#[from] std::io::Error),

    #[error("bridge stdio was not piped")]
    MissingStdio,
}

/// Fresh request id for an action command.
pub fn new_request_id() -> String {
    Ulid::new().to_string()
}
