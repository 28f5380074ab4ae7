//! Periodic background routines.
//!
//! Each routine is an interval loop with an explicit cancellation handle,
//! owned by a [`RoutineSet`] and torn down on shutdown. A tick reads the
//! supervisor's status snapshot, decides on a list of bridge commands, and
//! dispatches them through the handle. While the agent is offline every
//! routine is a no-op.

use std::time::Duration;

use rand::Rng;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, warn};

use minewright_bridge_protocol::{BridgeCommand, Position};

use crate::bridge::new_request_id;
use crate::config::Config;
use crate::supervisor::{StatusSnapshot, SupervisorHandle};

const EXPLORE_PERIOD: Duration = Duration::from_secs(600);
const INVENTORY_PERIOD: Duration = Duration::from_secs(300);
const MAINTENANCE_PERIOD: Duration = Duration::from_secs(120);
const MONITOR_PERIOD: Duration = Duration::from_secs(5);

/// How far exploration targets may stray from the current position.
const EXPLORE_RANGE: f64 = 100.0;
/// Below this health the maintenance pass cancels the current goal.
const RETREAT_HEALTH: f64 = 8.0;
/// Below this food level the maintenance pass triggers a meal.
const HUNGRY_FOOD: f64 = 15.0;
/// Below this health the monitor runs the emergency protocol.
const EMERGENCY_HEALTH: f64 = 6.0;

struct Routine {
    name: &'static str,
    cancel: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

pub struct RoutineSet {
    routines: Vec<Routine>,
}

impl RoutineSet {
    /// Spawn the four periodic routines against a running supervisor.
    pub fn start(config: &Config, supervisor: &SupervisorHandle) -> Self {
        let emergency_food_level = f64::from(config.settings.emergency_food_level);

        let mut set = Self {
            routines: Vec::new(),
        };
        set.add("explore", supervisor, EXPLORE_PERIOD, explore_commands);
        set.add("inventory", supervisor, INVENTORY_PERIOD, inventory_commands);
        set.add(
            "maintenance",
            supervisor,
            MAINTENANCE_PERIOD,
            maintenance_commands,
        );
        set.add("monitor", supervisor, MONITOR_PERIOD, move |snapshot| {
            monitor_commands(snapshot, emergency_food_level)
        });
        set
    }

    fn add<F>(
        &mut self,
        name: &'static str,
        supervisor: &SupervisorHandle,
        period: Duration,
        tick: F,
    ) where
        F: Fn(&StatusSnapshot) -> Vec<BridgeCommand> + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(run_loop(supervisor.clone(), period, cancel_rx, tick));
        debug!(routine = name, period_secs = period.as_secs(), "routine started");
        self.routines.push(Routine {
            name,
            cancel: cancel_tx,
            task,
        });
    }

    /// Cancel every routine and wait for the loops to finish.
    pub async fn shutdown(self) {
        for routine in self.routines {
            let _ = routine.cancel.send(());
            if let Err(e) = routine.task.await {
                warn!(routine = routine.name, error = %e, "routine task failed");
            }
        }
        debug!("routines stopped");
    }
}

/// Interval loop shared by all routines. The first tick fires a full period
/// after startup. Ends on cancellation or when the supervisor is gone.
async fn run_loop<F>(
    supervisor: SupervisorHandle,
    period: Duration,
    mut cancel: oneshot::Receiver<()>,
    tick: F,
) where
    F: Fn(&StatusSnapshot) -> Vec<BridgeCommand>,
{
    let mut ticks = interval_at(Instant::now() + period, period);
    loop {
        tokio::select! {
            _ = ticks.tick() => {
                for command in tick(&supervisor.status()) {
                    if supervisor.dispatch(command).await.is_err() {
                        return;
                    }
                }
            }
            _ = &mut cancel => return,
        }
    }
}

// ============================================================================
// Tick decisions
// ============================================================================

/// Wander: submit a pathfinding goal to a random spot near the current
/// position. The bridge owns the actual path search.
fn explore_commands(snapshot: &StatusSnapshot) -> Vec<BridgeCommand> {
    if !snapshot.is_online() {
        return Vec::new();
    }
    let Some(position) = snapshot.position else {
        return Vec::new();
    };
    vec![explore_goal(position)]
}

fn explore_goal(position: Position) -> BridgeCommand {
    let mut rng = rand::thread_rng();
    let x = position.x + rng.gen_range(-EXPLORE_RANGE..=EXPLORE_RANGE);
    let z = position.z + rng.gen_range(-EXPLORE_RANGE..=EXPLORE_RANGE);
    info!(x, z, "exploring nearby area");
    BridgeCommand::Goto {
        request_id: new_request_id(),
        x,
        y: None,
        z,
    }
}

fn inventory_commands(snapshot: &StatusSnapshot) -> Vec<BridgeCommand> {
    if !snapshot.is_online() {
        return Vec::new();
    }
    vec![BridgeCommand::QueryInventory {
        request_id: new_request_id(),
    }]
}

/// Slow upkeep pass: retreat when badly hurt, eat when hungry, and keep the
/// armor slots filled.
fn maintenance_commands(snapshot: &StatusSnapshot) -> Vec<BridgeCommand> {
    if !snapshot.is_online() {
        return Vec::new();
    }
    let mut commands = Vec::new();
    if snapshot.health.is_some_and(|h| h < RETREAT_HEALTH) {
        commands.push(BridgeCommand::Stop);
    }
    if snapshot.food.is_some_and(|f| f < HUNGRY_FOOD) {
        commands.push(BridgeCommand::Eat {
            request_id: new_request_id(),
        });
    }
    commands.push(BridgeCommand::EquipArmor {
        request_id: new_request_id(),
    });
    commands
}

/// Fast health watch. Critically low health triggers the emergency protocol;
/// otherwise a low food reading just triggers a meal.
fn monitor_commands(snapshot: &StatusSnapshot, emergency_food_level: f64) -> Vec<BridgeCommand> {
    if !snapshot.is_online() {
        return Vec::new();
    }
    if snapshot.health.is_some_and(|h| h < EMERGENCY_HEALTH) {
        warn!(health = snapshot.health, "critically low health");
        return vec![
            BridgeCommand::Chat {
                text: "Ativando protocolo de emergência!".to_string(),
            },
            BridgeCommand::Stop,
            BridgeCommand::Eat {
                request_id: new_request_id(),
            },
            BridgeCommand::EquipArmor {
                request_id: new_request_id(),
            },
        ];
    }
    if snapshot.food.is_some_and(|f| f < emergency_food_level) {
        return vec![BridgeCommand::Eat {
            request_id: new_request_id(),
        }];
    }
    Vec::new()
}
