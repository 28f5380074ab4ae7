//! Bridge subprocess transport.
//!
//! Spawns the bridge child with piped stdio and pumps JSON lines between the
//! child and the session channels. One child per session; when the child
//! exits, the session's event stream closes and the supervisor takes it from
//! there.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use minewright_bridge_protocol::{BridgeCommand, BridgeEvent};

use crate::config::Config;

use super::{BridgeError, Connector, SessionLink};

const CHANNEL_CAPACITY: usize = 64;

/// Launches the bridge configured in `[bridge]` for each session.
pub struct SubprocessConnector;

#[async_trait]
impl Connector for SubprocessConnector {
    async fn connect(&self, config: &Config) -> Result<SessionLink, BridgeError> {
        let mut child = spawn_child(config)?;
        let stdin = child.stdin.take().ok_or(BridgeError::MissingStdio)?;
        let stdout = child.stdout.take().ok_or(BridgeError::MissingStdio)?;

        let (evt_tx, evt_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(pump(child, stdin, stdout, evt_tx, cmd_rx));

        Ok(SessionLink {
            events: evt_rx,
            commands: cmd_tx,
        })
    }
}

/// Spawn the bridge child with piped stdio.
fn spawn_child(config: &Config) -> std::io::Result<Child> {
    let mut cmd = Command::new(&config.bridge.command);
    cmd.args(launch_args(config))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    // On Linux, make sure the child dies with us.
    #[cfg(target_os = "linux")]
    unsafe {
        cmd.pre_exec(|| {
            if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM) == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }

    cmd.spawn()
}

/// Arguments for the bridge child: configured extras first, then the
/// connection flags.
fn launch_args(config: &Config) -> Vec<String> {
    let mut args = config.bridge.args.clone();
    args.extend([
        "--host".to_string(),
        config.server.host.clone(),
        "--port".to_string(),
        config.server.port.to_string(),
        "--username".to_string(),
        config.server.username.clone(),
        "--game-version".to_string(),
        config.server.version.clone(),
    ]);
    args
}

/// Bridge stdio to the session channels until the child or the supervisor
/// goes away.
async fn pump(
    mut child: Child,
    mut stdin: ChildStdin,
    stdout: ChildStdout,
    evt_tx: mpsc::Sender<BridgeEvent>,
    mut cmd_rx: mpsc::Receiver<BridgeCommand>,
) {
    let mut lines = BufReader::new(stdout).lines();

    loop {
        tokio::select! {
            // Events from the bridge's stdout
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => match serde_json::from_str::<BridgeEvent>(&line) {
                        Ok(event) => {
                            if evt_tx.send(event).await.is_err() {
                                debug!("session event channel closed");
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(line = %line, error = %e, "unparseable bridge event");
                        }
                    },
                    Ok(None) => {
                        debug!("bridge stdout closed");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "error reading bridge stdout");
                        break;
                    }
                }
            }

            // Commands for the bridge's stdin
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(command) => {
                        if let Err(e) = write_command(&mut stdin, &command).await {
                            warn!(error = %e, "failed to write bridge command");
                            break;
                        }
                    }
                    None => {
                        // Supervisor dropped the link; the session is over.
                        debug!("session command channel closed");
                        break;
                    }
                }
            }

            status = child.wait() => {
                match status {
                    Ok(status) => info!(status = %status, "bridge process exited"),
                    Err(e) => warn!(error = %e, "error waiting for bridge process"),
                }
                return;
            }
        }
    }

    // The loop broke before the child exited; reap it.
    let _ = child.kill().await;
    let _ = child.wait().await;
}

async fn write_command(
    stdin: &mut ChildStdin,
    command: &BridgeCommand,
) -> std::io::Result<()> {
    let json = serde_json::to_string(command).map_err(std::io::Error::other)?;
    stdin.write_all(json.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await
}
