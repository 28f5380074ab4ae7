//! Handle for talking to the supervisor task.
//!
//! `SupervisorHandle` is a thin wrapper around the supervisor's command
//! sender plus a subscription to its status watch. It is cheap to clone; all
//! session access goes through it.

use thiserror::Error;
use tokio::sync::{mpsc, watch};

use minewright_bridge_protocol::BridgeCommand;

use super::actor::SupervisorCommand;
use super::snapshot::StatusSnapshot;

#[derive(Clone)]
pub struct SupervisorHandle {
    commands: mpsc::Sender<SupervisorCommand>,
    status: watch::Receiver<StatusSnapshot>,
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The supervisor task has stopped.
    #[error("supervisor is gone")]
    Closed,
}

impl SupervisorHandle {
    pub(super) fn new(
        commands: mpsc::Sender<SupervisorCommand>,
        status: watch::Receiver<StatusSnapshot>,
    ) -> Self {
        Self { commands, status }
    }

    /// The current snapshot.
    pub fn status(&self) -> StatusSnapshot {
        self.status.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    pub fn status_stream(&self) -> watch::Receiver<StatusSnapshot> {
        self.status.clone()
    }

    /// Send a bridge command to the live session.
    ///
    /// The supervisor drops the command (with a log line) when no session is
    /// operating; that makes every periodic caller a no-op while offline.
    pub async fn dispatch(&self, command: BridgeCommand) -> Result<(), SupervisorError> {
        self.commands
            .send(SupervisorCommand::Dispatch { command })
            .await
            .map_err(|_| SupervisorError::Closed)
    }
}
