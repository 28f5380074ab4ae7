//! The status document.

use axum::Json;
use axum::extract::State;
use serde::{Serialize, Serializer};

use minewright_bridge_protocol::Position;

use crate::server::AppState;
use crate::supervisor::StatusSnapshot;

/// Serve the agent's current status. Offline (including terminally failed)
/// reports null readings.
pub async fn status(State(state): State<AppState>) -> Json<StatusBody> {
    let snapshot = state.status.borrow().clone();
    Json(StatusBody::from_snapshot(&snapshot))
}

#[derive(Debug, Serialize)]
pub struct StatusBody {
    status: &'static str,
    position: Option<PositionBody>,
    #[serde(serialize_with = "compact_opt_number")]
    health: Option<f64>,
    #[serde(serialize_with = "compact_opt_number")]
    food: Option<f64>,
}

#[derive(Debug, Serialize)]
struct PositionBody {
    #[serde(serialize_with = "compact_number")]
    x: f64,
    #[serde(serialize_with = "compact_number")]
    y: f64,
    #[serde(serialize_with = "compact_number")]
    z: f64,
}

impl StatusBody {
    fn from_snapshot(snapshot: &StatusSnapshot) -> Self {
        if snapshot.is_online() {
            Self {
                status: "online",
                position: snapshot.position.map(PositionBody::from),
                health: snapshot.health,
                food: snapshot.food,
            }
        } else {
            Self {
                status: "offline",
                position: None,
                health: None,
                food: None,
            }
        }
    }
}

impl From<Position> for PositionBody {
    fn from(p: Position) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

/// Game readings are floats but usually carry whole values; render those
/// without a trailing `.0` so `20.0` appears as `20`.
fn compact_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i64::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

fn compact_opt_number<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => compact_number(v, serializer),
        None => serializer.serialize_none(),
    }
}
