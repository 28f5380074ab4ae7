//! Connection lifecycle supervision.
//!
//! One supervisor task owns the bridge session and decides when to
//! reconnect. Everything else talks to it through a cloneable handle:
//!
//! ```text
//!  HTTP server ──┐
//!  routines ─────┼── SupervisorHandle ──> Supervisor ──> SessionLink
//!  CLI ──────────┘        (mpsc/watch)      (task)         (bridge)
//! ```
//!
//! The session is recreated after terminal events with a linearly growing
//! delay, up to a fixed attempt budget. Spending the budget is final: the
//! supervisor keeps running and publishing an offline snapshot, but never
//! connects again.

mod actor;
mod handle;
mod reconnect;
mod snapshot;

pub use actor::Supervisor;
pub use handle::{SupervisorError, SupervisorHandle};
pub use snapshot::{Lifecycle, StatusSnapshot};
