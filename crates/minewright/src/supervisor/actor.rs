//! The supervisor task.
//!
//! Owns the only live session and the reconnect state. All mutations happen
//! inside this task; the rest of the process sees a [`StatusSnapshot`]
//! through the watch channel and reaches the session only by sending
//! commands through a [`SupervisorHandle`].

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use minewright_bridge_protocol::{BridgeCommand, BridgeEvent, ItemStack, Position};

use crate::bridge::{Connector, SessionLink, new_request_id};
use crate::chat::{self, ChatCommand};
use crate::config::Config;

use super::handle::SupervisorHandle;
use super::reconnect::ReconnectState;
use super::snapshot::{Lifecycle, StatusSnapshot};

const CHANNEL_CAPACITY: usize = 64;

/// Inventory groups surveyed by the periodic inventory report, and the
/// blocks the mining/wood-cutting chat commands go after.
const LOG_SUFFIX: &str = "_log";
const WATCHED_ORES: [&str; 4] = ["coal_ore", "iron_ore", "gold_ore", "diamond_ore"];

pub(super) enum SupervisorCommand {
    /// Forward a command to the live session (dropped when none).
    Dispatch { command: BridgeCommand },
}

// ============================================================================
// Supervisor
// ============================================================================

pub struct Supervisor {
    config: Arc<Config>,
    connector: Arc<dyn Connector>,

    // Session state, owned exclusively by this task
    lifecycle: Lifecycle,
    session: Option<SessionLink>,
    username: String,
    position: Option<Position>,
    health: Option<f64>,
    food: Option<f64>,

    // Reconnect decision state
    reconnect: ReconnectState,
    reconnect_at: Option<Instant>,

    // Communication
    status_tx: watch::Sender<StatusSnapshot>,
    command_rx: mpsc::Receiver<SupervisorCommand>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Supervisor {
    /// Spawn the supervisor task.
    ///
    /// Connects immediately and keeps the session alive (within the
    /// reconnect budget) until shutdown. Returns the handle everyone else
    /// uses and the task's join handle.
    pub fn spawn(
        config: Arc<Config>,
        connector: Arc<dyn Connector>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> (SupervisorHandle, JoinHandle<()>) {
        let (status_tx, status_rx) = watch::channel(StatusSnapshot::offline());
        let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let username = config.server.username.clone();
        let reconnect = ReconnectState::new(&config.reconnect);
        let actor = Self {
            config,
            connector,
            lifecycle: Lifecycle::Disconnected,
            session: None,
            username,
            position: None,
            health: None,
            food: None,
            reconnect,
            reconnect_at: None,
            status_tx,
            command_rx,
            shutdown_rx,
        };

        let handle = SupervisorHandle::new(command_tx, status_rx);
        (handle, tokio::spawn(actor.run()))
    }

    async fn run(mut self) {
        self.connect().await;

        loop {
            let reconnect_at = self.reconnect_at;
            tokio::select! {
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        self.shutdown().await;
                        break;
                    }
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SupervisorCommand::Dispatch { command }) => {
                            self.forward(command).await;
                        }
                        None => {
                            // All handles dropped; nothing can reach us anymore.
                            self.shutdown().await;
                            break;
                        }
                    }
                }

                event = next_event(&mut self.session) => {
                    self.handle_session_event(event).await;
                }

                _ = sleep_until_or_never(reconnect_at) => {
                    self.reconnect_at = None;
                    self.connect().await;
                }
            }
        }

        debug!("supervisor stopped");
    }

    // ------------------------------------------------------------------------
    // Lifecycle transitions
    // ------------------------------------------------------------------------

    async fn connect(&mut self) {
        self.set_lifecycle(Lifecycle::Connecting);
        info!(
            host = %self.config.server.host,
            port = self.config.server.port,
            username = %self.config.server.username,
            "connecting to game server"
        );

        match self.connector.connect(&self.config).await {
            Ok(link) => self.session = Some(link),
            Err(e) => {
                warn!(error = %e, "bridge launch failed");
                self.schedule_reconnect();
            }
        }
    }

    async fn on_spawn(&mut self, username: String, position: Position) {
        info!(username = %username, "spawned into the world");
        self.reconnect.reset();
        self.username = username;
        self.position = Some(position);
        self.set_lifecycle(Lifecycle::Operating);

        self.send_to_session(BridgeCommand::Configure {
            modules: self.config.modules.clone(),
            settings: self.config.settings.clone(),
        })
        .await;
        if self.config.modules.armor_manager {
            self.send_to_session(BridgeCommand::EquipArmor {
                request_id: new_request_id(),
            })
            .await;
        }
    }

    /// Handle the first terminal signal of the current session.
    ///
    /// Dropping the link here discards any trailing signals from the same
    /// dying session (a kick is usually followed by a close), so one death
    /// cannot schedule two reconnects.
    fn on_terminal(&mut self, cause: &str) {
        self.session = None;
        self.position = None;
        self.health = None;
        self.food = None;
        warn!(cause, "session terminated");
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        match self.reconnect.next_delay() {
            Some(delay) => {
                self.set_lifecycle(Lifecycle::Disconnected);
                info!(
                    attempt = self.reconnect.attempts(),
                    delay_ms = delay.as_millis() as u64,
                    "reconnect scheduled"
                );
                self.reconnect_at = Some(Instant::now() + delay);
            }
            None => {
                // Budget spent. The process stays up for the status
                // endpoint, but no session will ever be created again.
                error!(
                    attempts = self.reconnect.attempts(),
                    "reconnect attempts exhausted, giving up"
                );
                self.set_lifecycle(Lifecycle::TerminallyFailed);
            }
        }
    }

    async fn shutdown(&mut self) {
        self.reconnect_at = None;
        if let Some(session) = self.session.take() {
            info!("closing session");
            if session.commands.send(BridgeCommand::Quit).await.is_err() {
                debug!("bridge already gone");
            }
        }
        self.position = None;
        self.health = None;
        self.food = None;
        self.set_lifecycle(Lifecycle::Disconnected);
    }

    // ------------------------------------------------------------------------
    // Session events
    // ------------------------------------------------------------------------

    async fn handle_session_event(&mut self, event: Option<BridgeEvent>) {
        let Some(event) = event else {
            // Stream closed without a terminal event: the bridge died.
            self.on_terminal("bridge exited");
            return;
        };

        match event {
            BridgeEvent::Spawn { username, position } => self.on_spawn(username, position).await,
            BridgeEvent::Chat { username, message } => self.on_chat(username, &message).await,
            BridgeEvent::Health { health, food } => {
                self.health = Some(health);
                self.food = Some(food);
                self.publish();
            }
            BridgeEvent::Position { position } => {
                self.position = Some(position);
                self.publish();
            }
            BridgeEvent::Death => self.on_terminal("death"),
            BridgeEvent::Kicked { reason } => {
                warn!(reason = %reason, "kicked by server");
                self.on_terminal("kicked");
            }
            BridgeEvent::Error { message } => {
                warn!(error = %message, "session error");
                self.on_terminal("error");
            }
            BridgeEvent::End => self.on_terminal("connection closed"),
            BridgeEvent::ActionOk { request_id } => {
                debug!(request_id = %request_id, "action completed");
            }
            BridgeEvent::ActionFailed {
                request_id,
                message,
            } => {
                // Rejected actions are logged and swallowed; they never feed
                // the reconnect decision.
                warn!(request_id = %request_id, error = %message, "action failed");
            }
            BridgeEvent::Inventory { items, .. } => report_inventory(&items),
        }
    }

    async fn on_chat(&mut self, username: String, message: &str) {
        if username == self.username {
            return;
        }
        let Some(command) = chat::parse(message) else {
            if message.trim_start().starts_with('!') {
                debug!(username = %username, message = %message, "unknown chat command");
            }
            return;
        };
        info!(username = %username, command = ?command, "chat command");
        self.run_chat_command(username, command).await;
    }

    async fn run_chat_command(&mut self, sender: String, command: ChatCommand) {
        match command {
            ChatCommand::Come => {
                self.say(format!("Indo até você, {sender}!")).await;
                self.send_to_session(BridgeCommand::GotoPlayer {
                    request_id: new_request_id(),
                    username: sender,
                })
                .await;
            }
            ChatCommand::Mine => {
                self.say("Iniciando mineração!".to_string()).await;
                self.send_to_session(BridgeCommand::Collect {
                    request_id: new_request_id(),
                    blocks: WATCHED_ORES.iter().map(|s| s.to_string()).collect(),
                    max_distance: self.config.settings.collect_distance,
                })
                .await;
            }
            ChatCommand::Wood => {
                self.say("Coletando madeira!".to_string()).await;
                self.send_to_session(BridgeCommand::Collect {
                    request_id: new_request_id(),
                    blocks: vec![format!("*{LOG_SUFFIX}")],
                    max_distance: self.config.settings.collect_distance,
                })
                .await;
            }
            ChatCommand::Craft(request) => {
                self.say(format!("Craftando {}x {}!", request.count, request.item))
                    .await;
                self.send_to_session(BridgeCommand::Craft {
                    request_id: new_request_id(),
                    item: request.item,
                    count: request.count,
                })
                .await;
            }
            ChatCommand::CraftUsage => {
                self.say("Uso: !craft <item> <quantidade>".to_string()).await;
            }
            ChatCommand::Build => {
                self.say("Construção ainda não implementada!".to_string())
                    .await;
            }
            ChatCommand::Defend => {
                self.say("Modo de defesa ativado!".to_string()).await;
                self.send_to_session(BridgeCommand::Attack {
                    request_id: new_request_id(),
                    range: self.config.settings.attack_range,
                })
                .await;
            }
            ChatCommand::Status => {
                let reply = status_reply(&self.status_tx.borrow().clone());
                self.say(reply).await;
            }
            ChatCommand::Jump => {
                self.send_to_session(BridgeCommand::Jump {
                    request_id: new_request_id(),
                })
                .await;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------------

    /// Gate for commands arriving through the handle.
    async fn forward(&mut self, command: BridgeCommand) {
        if self.lifecycle != Lifecycle::Operating {
            debug!("no operating session, dropping command");
            return;
        }
        self.send_to_session(command).await;
    }

    async fn say(&mut self, text: String) {
        self.send_to_session(BridgeCommand::Chat { text }).await;
    }

    async fn send_to_session(&mut self, command: BridgeCommand) {
        let Some(session) = &self.session else {
            debug!("no session for command");
            return;
        };
        if session.commands.send(command).await.is_err() {
            // The pump is gone; the event stream will surface the loss.
            debug!("session command channel closed");
        }
    }

    fn set_lifecycle(&mut self, lifecycle: Lifecycle) {
        self.lifecycle = lifecycle;
        self.publish();
    }

    fn publish(&self) {
        let _ = self.status_tx.send(StatusSnapshot {
            lifecycle: self.lifecycle,
            position: self.position,
            health: self.health,
            food: self.food,
        });
    }
}

/// Recover the next event of the live session, or park forever when there is
/// none (the select loop's other arms still run).
async fn next_event(session: &mut Option<SessionLink>) -> Option<BridgeEvent> {
    match session {
        Some(link) => link.events.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until_or_never(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn report_inventory(items: &[ItemStack]) {
    let logs: u32 = items
        .iter()
        .filter(|item| item.name.ends_with(LOG_SUFFIX))
        .map(|item| item.count)
        .sum();
    let ores: u32 = items
        .iter()
        .filter(|item| WATCHED_ORES.contains(&item.name.as_str()))
        .map(|item| item.count)
        .sum();
    info!(logs, ores, slots = items.len(), "inventory survey");
}

/// Chat answer for `!status`.
fn status_reply(snapshot: &StatusSnapshot) -> String {
    let health = snapshot
        .health
        .map_or_else(|| "?".to_string(), |h| h.to_string());
    let food = snapshot
        .food
        .map_or_else(|| "?".to_string(), |f| f.to_string());
    match snapshot.position {
        Some(p) => format!(
            "Vida: {health} | Fome: {food} | Posição: ({:.0}, {:.0}, {:.0})",
            p.x, p.y, p.z
        ),
        None => format!("Vida: {health} | Fome: {food}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::bridge::BridgeError;

    // ------------------------------------------------------------------
    // Scripted connector
    // ------------------------------------------------------------------

    struct SessionScript {
        events: Vec<BridgeEvent>,
        keep_open: bool,
    }

    impl SessionScript {
        /// A session that closes immediately without spawning.
        fn dead() -> Self {
            Self {
                events: Vec::new(),
                keep_open: false,
            }
        }

        fn open(events: Vec<BridgeEvent>) -> Self {
            Self {
                events,
                keep_open: true,
            }
        }
    }

    /// Connector that plays back scripted sessions and records every
    /// connection attempt. Sessions past the end of the script are dead.
    struct FakeConnector {
        scripts: Mutex<VecDeque<SessionScript>>,
        connects: Mutex<Vec<Instant>>,
        command_taps: Mutex<Vec<mpsc::Receiver<BridgeCommand>>>,
        event_feeds: Mutex<Vec<mpsc::Sender<BridgeEvent>>>,
    }

    impl FakeConnector {
        fn new(scripts: Vec<SessionScript>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into()),
                connects: Mutex::new(Vec::new()),
                command_taps: Mutex::new(Vec::new()),
                event_feeds: Mutex::new(Vec::new()),
            }
        }

        fn connect_count(&self) -> usize {
            self.connects.lock().unwrap().len()
        }

        /// Milliseconds between consecutive connection attempts.
        fn deltas_ms(&self) -> Vec<u64> {
            let times = self.connects.lock().unwrap();
            times
                .windows(2)
                .map(|w| (w[1] - w[0]).as_millis() as u64)
                .collect()
        }

        fn take_command_tap(&self, index: usize) -> mpsc::Receiver<BridgeCommand> {
            self.command_taps.lock().unwrap().remove(index)
        }

        /// Drop every held event sender, ending all open sessions.
        fn close_feeds(&self) {
            self.event_feeds.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl Connector for FakeConnector {
        async fn connect(&self, _config: &Config) -> Result<SessionLink, BridgeError> {
            self.connects.lock().unwrap().push(Instant::now());

            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(SessionScript::dead);

            let (evt_tx, evt_rx) = mpsc::channel(16);
            let (cmd_tx, cmd_rx) = mpsc::channel(16);
            for event in script.events {
                evt_tx.try_send(event).unwrap();
            }
            if script.keep_open {
                self.event_feeds.lock().unwrap().push(evt_tx);
            }
            self.command_taps.lock().unwrap().push(cmd_rx);

            Ok(SessionLink {
                events: evt_rx,
                commands: cmd_tx,
            })
        }
    }

    /// Connector whose launches always fail.
    struct FailingConnector {
        connects: Mutex<Vec<Instant>>,
    }

    #[async_trait]
    impl Connector for FailingConnector {
        async fn connect(&self, _config: &Config) -> Result<SessionLink, BridgeError> {
            self.connects.lock().unwrap().push(Instant::now());
            Err(BridgeError::MissingStdio)
        }
    }

    fn spawn_event() -> BridgeEvent {
        BridgeEvent::Spawn {
            username: "BotMaster".to_string(),
            position: Position {
                x: 10.0,
                y: 64.0,
                z: -3.0,
            },
        }
    }

    fn chat_event(username: &str, message: &str) -> BridgeEvent {
        BridgeEvent::Chat {
            username: username.to_string(),
            message: message.to_string(),
        }
    }

    fn start(
        connector: Arc<dyn Connector>,
    ) -> (
        SupervisorHandle,
        JoinHandle<()>,
        watch::Sender<bool>,
    ) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (handle, task) = Supervisor::spawn(Arc::new(Config::default()), connector, shutdown_rx);
        (handle, task, shutdown_tx)
    }

    // ------------------------------------------------------------------
    // Reconnect behavior
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn five_consecutive_failures_schedule_linear_delays_then_stop() {
        let connector = Arc::new(FakeConnector::new(Vec::new()));
        let (handle, task, shutdown_tx) = start(connector.clone());

        let mut status = handle.status_stream();
        status
            .wait_for(|s| s.lifecycle == Lifecycle::TerminallyFailed)
            .await
            .unwrap();

        // Initial attempt plus five scheduled retries, then nothing.
        assert_eq!(connector.connect_count(), 6);
        assert_eq!(connector.deltas_ms(), [0, 2000, 4000, 6000, 8000]);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(connector.connect_count(), 6);

        // Terminally failed is absorbing but the task still serves handles.
        assert!(handle.dispatch(BridgeCommand::Stop).await.is_ok());
        let snapshot = handle.status();
        assert!(!snapshot.is_online());
        assert_eq!(snapshot.position, None);
        assert_eq!(snapshot.health, None);
        assert_eq!(snapshot.food, None);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn spawn_resets_the_attempt_budget() {
        let connector = Arc::new(FakeConnector::new(vec![
            SessionScript::dead(),
            SessionScript::dead(),
            SessionScript::open(vec![spawn_event()]),
        ]));
        let (handle, task, shutdown_tx) = start(connector.clone());

        let mut status = handle.status_stream();
        status.wait_for(StatusSnapshot::is_online).await.unwrap();
        connector.close_feeds();

        // With the budget restored on spawn, the remaining dead sessions
        // walk the whole ladder again before giving up.
        status
            .wait_for(|s| s.lifecycle == Lifecycle::TerminallyFailed)
            .await
            .unwrap();
        assert_eq!(connector.connect_count(), 8);
        assert_eq!(
            connector.deltas_ms(),
            [0, 2000, 0, 2000, 4000, 6000, 8000]
        );

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn launch_failures_walk_the_same_ladder() {
        let connector = Arc::new(FailingConnector {
            connects: Mutex::new(Vec::new()),
        });
        let (handle, task, shutdown_tx) = start(connector.clone());

        let mut status = handle.status_stream();
        status
            .wait_for(|s| s.lifecycle == Lifecycle::TerminallyFailed)
            .await
            .unwrap();

        let times = connector.connects.lock().unwrap().clone();
        assert_eq!(times.len(), 6);
        let deltas: Vec<u64> = times
            .windows(2)
            .map(|w| (w[1] - w[0]).as_millis() as u64)
            .collect();
        assert_eq!(deltas, [0, 2000, 4000, 6000, 8000]);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    // ------------------------------------------------------------------
    // Snapshot publication
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn snapshot_carries_position_health_and_food_while_online() {
        let connector = Arc::new(FakeConnector::new(vec![SessionScript::open(vec![
            spawn_event(),
            BridgeEvent::Health {
                health: 20.0,
                food: 18.0,
            },
        ])]));
        let (handle, task, shutdown_tx) = start(connector.clone());

        let mut status = handle.status_stream();
        status
            .wait_for(|s| s.is_online() && s.health.is_some())
            .await
            .unwrap();

        let snapshot = handle.status();
        assert_eq!(snapshot.lifecycle, Lifecycle::Operating);
        assert_eq!(
            snapshot.position,
            Some(Position {
                x: 10.0,
                y: 64.0,
                z: -3.0
            })
        );
        assert_eq!(snapshot.health, Some(20.0));
        assert_eq!(snapshot.food, Some(18.0));

        // A terminal event wipes the readings with the session.
        connector.close_feeds();
        status.wait_for(|s| !s.is_online()).await.unwrap();
        let snapshot = handle.status();
        assert_eq!(snapshot.position, None);
        assert_eq!(snapshot.health, None);
        assert_eq!(snapshot.food, None);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    // ------------------------------------------------------------------
    // Shutdown
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn shutdown_quits_the_session_exactly_once() {
        let connector = Arc::new(FakeConnector::new(vec![SessionScript::open(vec![
            spawn_event(),
        ])]));
        let (handle, task, shutdown_tx) = start(connector.clone());

        let mut status = handle.status_stream();
        status.wait_for(StatusSnapshot::is_online).await.unwrap();

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();

        let mut commands = Vec::new();
        let mut tap = connector.take_command_tap(0);
        while let Ok(command) = tap.try_recv() {
            commands.push(command);
        }

        let quits = commands
            .iter()
            .filter(|c| matches!(c, BridgeCommand::Quit))
            .count();
        assert_eq!(quits, 1);
        assert!(matches!(commands[0], BridgeCommand::Configure { .. }));

        // No reconnect was attempted for the closed session.
        assert_eq!(connector.connect_count(), 1);
        assert!(!handle.status().is_online());
    }

    // ------------------------------------------------------------------
    // Chat dispatch
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn chat_command_walks_to_the_sender() {
        let connector = Arc::new(FakeConnector::new(vec![SessionScript::open(vec![
            spawn_event(),
            chat_event("Dono", "!vem"),
        ])]));
        let (handle, task, shutdown_tx) = start(connector.clone());

        let mut status = handle.status_stream();
        status.wait_for(StatusSnapshot::is_online).await.unwrap();

        let mut tap = connector.take_command_tap(0);
        assert!(matches!(
            tap.recv().await.unwrap(),
            BridgeCommand::Configure { .. }
        ));
        assert!(matches!(
            tap.recv().await.unwrap(),
            BridgeCommand::EquipArmor { .. }
        ));
        match tap.recv().await.unwrap() {
            BridgeCommand::Chat { text } => assert_eq!(text, "Indo até você, Dono!"),
            other => panic!("expected chat reply, got {other:?}"),
        }
        match tap.recv().await.unwrap() {
            BridgeCommand::GotoPlayer { username, .. } => assert_eq!(username, "Dono"),
            other => panic!("expected goto_player, got {other:?}"),
        }

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn own_and_unknown_chat_lines_are_ignored() {
        let connector = Arc::new(FakeConnector::new(vec![SessionScript::open(vec![
            spawn_event(),
            chat_event("BotMaster", "!pula"),
            chat_event("Dono", "!dance"),
            chat_event("Dono", "pula"),
            chat_event("Dono", "!pula"),
        ])]));
        let (handle, task, shutdown_tx) = start(connector.clone());

        let mut status = handle.status_stream();
        status.wait_for(StatusSnapshot::is_online).await.unwrap();

        let mut tap = connector.take_command_tap(0);
        assert!(matches!(
            tap.recv().await.unwrap(),
            BridgeCommand::Configure { .. }
        ));
        assert!(matches!(
            tap.recv().await.unwrap(),
            BridgeCommand::EquipArmor { .. }
        ));

        // Of the four chat lines only the last is a valid command from
        // someone else.
        assert!(matches!(
            tap.recv().await.unwrap(),
            BridgeCommand::Jump { .. }
        ));
        assert!(tap.try_recv().is_err());

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    #[test]
    fn status_reply_formats_whole_readings_without_fractions() {
        let snapshot = StatusSnapshot {
            lifecycle: Lifecycle::Operating,
            position: Some(Position {
                x: 10.0,
                y: 64.0,
                z: -3.0,
            }),
            health: Some(20.0),
            food: Some(18.0),
        };
        assert_eq!(
            status_reply(&snapshot),
            "Vida: 20 | Fome: 18 | Posição: (10, 64, -3)"
        );
    }

    #[test]
    fn status_reply_marks_unknown_readings() {
        let snapshot = StatusSnapshot {
            lifecycle: Lifecycle::Operating,
            position: None,
            health: None,
            food: None,
        };
        assert_eq!(status_reply(&snapshot), "Vida: ? | Fome: ?");
    }

    #[test]
    fn inventory_groups_sum_logs_and_ores() {
        let items = [
            ItemStack {
                name: "oak_log".to_string(),
                count: 12,
            },
            ItemStack {
                name: "birch_log".to_string(),
                count: 3,
            },
            ItemStack {
                name: "iron_ore".to_string(),
                count: 7,
            },
            ItemStack {
                name: "cobblestone".to_string(),
                count: 64,
            },
        ];
        let logs: u32 = items
            .iter()
            .filter(|i| i.name.ends_with(LOG_SUFFIX))
            .map(|i| i.count)
            .sum();
        let ores: u32 = items
            .iter()
            .filter(|i| WATCHED_ORES.contains(&i.name.as_str()))
            .map(|i| i.count)
            .sum();
        assert_eq!(logs, 15);
        assert_eq!(ores, 7);
    }
}
