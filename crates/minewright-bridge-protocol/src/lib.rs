//! Wire protocol between minewright and its game-client bridge.
//!
//! The bridge is the external program that actually joins the game world and
//! carries the heavy machinery (pathfinding, combat, eating, armor, block
//! collection). Minewright drives it and never reimplements any of that.
//!
//! # Protocol Overview
//!
//! The protocol is bidirectional with JSON Lines (newline-delimited JSON) over
//! stdio:
//!
//! - **Commands** (minewright → bridge): instructions for the in-world player
//! - **Events** (bridge → minewright): what happened in the game world
//!
//! # Example: Minimal Bridge
//!
//! ```ignore
//! use minewright_bridge_protocol::{BridgeCommand, BridgeEvent, Position};
//!
//! // Read commands from stdin
//! let line = read_line_from_stdin();
//! let command: BridgeCommand = serde_json::from_str(&line)?;
//!
//! // Send events to stdout
//! let event = BridgeEvent::Spawn {
//!     username: "BotMaster".to_string(),
//!     position: Position { x: 0.5, y: 64.0, z: 0.5 },
//! };
//! println!("{}", serde_json::to_string(&event)?);
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// Commands (minewright → bridge)
// ============================================================================

/// Commands sent from minewright to the bridge.
///
/// Action commands carry a `request_id` the bridge echoes back in
/// `ActionOk`/`ActionFailed`; control commands (chat, stop, quit) are
/// fire-and-forget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeCommand {
    /// Apply module toggles and behavior settings to the live session.
    ///
    /// Sent once per spawn, before any other action command.
    Configure {
        modules: ModuleToggles,
        settings: BehaviorSettings,
    },

    /// Say something in game chat.
    Chat { text: String },

    /// Submit a pathfinding goal. With `y` absent the bridge treats the goal
    /// as reach-this-column (surface height is its problem, not ours).
    Goto {
        request_id: String,
        x: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<f64>,
        z: f64,
    },

    /// Pathfind to a named player.
    GotoPlayer { request_id: String, username: String },

    /// Cancel the current pathfinding goal.
    Stop,

    /// Attack the nearest hostile within `range`.
    Attack { request_id: String, range: f64 },

    /// Eat the best available food now.
    Eat { request_id: String },

    /// Equip the best armor in the inventory.
    EquipArmor { request_id: String },

    /// Collect nearby blocks. Entries are block names; a leading `*` matches
    /// by suffix (`*_log` covers every wood type).
    Collect {
        request_id: String,
        blocks: Vec<String>,
        max_distance: u32,
    },

    /// Craft an item. The bridge resolves the recipe and walks to a crafting
    /// table when the recipe needs one.
    Craft {
        request_id: String,
        item: String,
        count: u32,
    },

    /// Jump once.
    Jump { request_id: String },

    /// Ask for a full inventory snapshot.
    QueryInventory { request_id: String },

    /// Leave the server and exit.
    Quit,
}

// ============================================================================
// Events (bridge → minewright)
// ============================================================================

/// Events sent from the bridge to minewright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// The player spawned into the world. Marks the session usable.
    Spawn { username: String, position: Position },

    /// A chat message was seen (including the bot's own).
    Chat { username: String, message: String },

    /// Health or food changed.
    Health { health: f64, food: f64 },

    /// The player moved.
    Position { position: Position },

    /// The player died.
    Death,

    /// The server kicked the player.
    Kicked { reason: String },

    /// The connection errored out.
    Error { message: String },

    /// The connection closed.
    End,

    /// An action command completed.
    ActionOk { request_id: String },

    /// An action command was rejected or failed mid-flight.
    ActionFailed { request_id: String, message: String },

    /// Inventory snapshot, in reply to `QueryInventory`.
    Inventory {
        request_id: String,
        items: Vec<ItemStack>,
    },
}

impl BridgeEvent {
    /// Whether this event ends the session's usable lifetime.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BridgeEvent::Death
                | BridgeEvent::Kicked { .. }
                | BridgeEvent::Error { .. }
                | BridgeEvent::End
        )
    }
}

// ============================================================================
// Shared Types
// ============================================================================

/// A position in the game world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One inventory slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub name: String,
    pub count: u32,
}

/// Which behavior modules the bridge should load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleToggles {
    #[serde(default = "default_true")]
    pub pvp: bool,
    #[serde(default = "default_true")]
    pub auto_eat: bool,
    #[serde(default = "default_true")]
    pub armor_manager: bool,
    #[serde(default = "default_true")]
    pub collect_resources: bool,
    #[serde(default = "default_true")]
    pub crafting: bool,
    #[serde(default = "default_true")]
    pub farming: bool,
}

impl Default for ModuleToggles {
    fn default() -> Self {
        Self {
            pvp: true,
            auto_eat: true,
            armor_manager: true,
            collect_resources: true,
            crafting: true,
            farming: true,
        }
    }
}

/// Tuning knobs forwarded to the bridge's behavior modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSettings {
    /// Melee attack reach, in blocks.
    #[serde(default = "default_attack_range")]
    pub attack_range: f64,
    /// How long combat chases a fleeing target before giving up.
    #[serde(default = "default_follow_timeout")]
    pub follow_timeout_secs: u64,
    /// Search radius for block collection, in blocks.
    #[serde(default = "default_collect_distance")]
    pub collect_distance: u32,
    /// Food level below which the health monitor forces eating.
    #[serde(default = "default_emergency_food_level")]
    pub emergency_food_level: u32,
    /// Food level at which the bridge's auto-eat starts on its own.
    #[serde(default = "default_eat_start_at")]
    pub eat_start_at: u32,
    /// Foods auto-eat must never pick.
    #[serde(default = "default_banned_food")]
    pub banned_food: Vec<String>,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            attack_range: default_attack_range(),
            follow_timeout_secs: default_follow_timeout(),
            collect_distance: default_collect_distance(),
            emergency_food_level: default_emergency_food_level(),
            eat_start_at: default_eat_start_at(),
            banned_food: default_banned_food(),
        }
    }
}

// ============================================================================
// Private Helpers (Serde Defaults)
// ============================================================================

/// Serde default for bool fields that should be `true` (serde's default is `false`).
fn default_true() -> bool {
    true
}

fn default_attack_range() -> f64 {
    3.5
}

fn default_follow_timeout() -> u64 {
    15
}

fn default_collect_distance() -> u32 {
    16
}

fn default_emergency_food_level() -> u32 {
    12
}

fn default_eat_start_at() -> u32 {
    18
}

fn default_banned_food() -> Vec<String> {
    vec!["rotten_flesh".to_string(), "poisonous_potato".to_string()]
}
