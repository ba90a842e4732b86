//! # Wire & Domain Model
//!
//! This module groups the data structures exchanged with the orchestrator's
//! agent and handed to the hosting process: lifecycle states, heartbeat
//! payloads, maintenance schedules and connection information.
//!
//! ## Contained Modules:
//!
//! - **`heartbeat`**: `GameState`, `GameOperation`, and the heartbeat
//!   request/response payloads.
//! - **`maintenance`**: the structured maintenance schedule and the lenient
//!   timestamp parser shared by both maintenance forms.
//! - **`connection_info`**: public address and port mappings for clients.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

use serde::{Deserialize, Deserializer};

/// Heartbeat payloads and lifecycle enums.
pub mod heartbeat;
/// Maintenance schedule types.
pub mod maintenance;
/// Client-facing connection information.
pub mod connection_info;

pub use connection_info::{GamePort, GameServerConnectionInfo};
pub use heartbeat::{
    ConnectedPlayer, GameHealth, GameOperation, GameState, HeartbeatRequest, HeartbeatResponse,
    SessionConfig,
};
pub use maintenance::{parse_utc_timestamp, MaintenanceEvent, MaintenanceSchedule};

/// Treats an explicit JSON `null` the same as a missing field.
///
/// The agent serialises absent members as `null`, which `#[serde(default)]`
/// alone does not cover.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
