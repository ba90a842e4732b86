//! # Heartbeat Payloads
//!
//! The request the engine sends on every tick and the response the agent
//! returns. Field names follow the agent's camelCase JSON contract; legacy
//! PascalCase spellings are accepted on input where older agents used them.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::maintenance::MaintenanceSchedule;
use super::null_as_default;

/// Lifecycle state of this game server instance, as reported to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameState {
    /// Before `start`. Sent as the legacy name `Invalid`.
    #[default]
    #[serde(rename = "Invalid")]
    Uninitialized,
    /// Configuration loaded, heartbeats running, not yet ready for players.
    Initializing,
    /// Waiting for an allocation.
    StandingBy,
    /// Allocated; players are about to connect.
    Active,
    /// The agent asked this instance to shut down.
    Terminating,
    /// The engine has been closed.
    Terminated,
}

impl GameState {
    /// The name used on the wire and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Uninitialized => "Invalid",
            GameState::Initializing => "Initializing",
            GameState::StandingBy => "StandingBy",
            GameState::Active => "Active",
            GameState::Terminating => "Terminating",
            GameState::Terminated => "Terminated",
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instruction returned by the agent in a heartbeat response.
///
/// Values the SDK does not act on are preserved in `Other` so they can be
/// logged verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum GameOperation {
    /// Keep going; nothing to do.
    Continue,
    /// The instance has been allocated.
    Active,
    /// The instance must shut down.
    Terminate,
    /// Anything else (`Invalid`, `GetManifest`, `Quarantine`, unknown values).
    Other(String),
}

impl From<String> for GameOperation {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Continue" => GameOperation::Continue,
            "Active" => GameOperation::Active,
            "Terminate" => GameOperation::Terminate,
            _ => GameOperation::Other(value),
        }
    }
}

impl From<&str> for GameOperation {
    fn from(value: &str) -> Self {
        GameOperation::from(value.to_string())
    }
}

impl fmt::Display for GameOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOperation::Continue => f.write_str("Continue"),
            GameOperation::Active => f.write_str("Active"),
            GameOperation::Terminate => f.write_str("Terminate"),
            GameOperation::Other(raw) => f.write_str(raw),
        }
    }
}

/// Health string derived from the host's health callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameHealth {
    /// The host reports healthy, or registered no health callback.
    Healthy,
    /// The host reports unhealthy, or its callback failed.
    Unhealthy,
}

impl From<bool> for GameHealth {
    fn from(healthy: bool) -> Self {
        if healthy {
            GameHealth::Healthy
        } else {
            GameHealth::Unhealthy
        }
    }
}

/// A player currently connected to this game server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPlayer {
    /// Opaque player identifier.
    #[serde(alias = "PlayerId")]
    pub player_id: String,
}

impl ConnectedPlayer {
    /// Creates a player entry from any string-like id.
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
        }
    }
}

/// Body of a `PATCH /v1/sessionHosts/{instanceId}` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    /// Current lifecycle state.
    pub current_game_state: GameState,
    /// Result of the health callback.
    pub current_game_health: GameHealth,
    /// Players currently connected, in host order.
    pub current_players: Vec<ConnectedPlayer>,
}

/// Session information issued by the orchestrator on allocation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Session identifier (usually a GUID).
    #[serde(default)]
    pub session_id: Option<String>,
    /// Opaque cookie passed through from the allocation request.
    #[serde(default)]
    pub session_cookie: Option<String>,
    /// Players the matchmaker expects to connect.
    #[serde(default, deserialize_with = "null_as_default")]
    pub initial_players: Vec<String>,
    /// Free-form session metadata. Only string values are surfaced.
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: HashMap<String, Value>,
}

impl SessionConfig {
    /// Iterates over metadata entries whose values are non-empty strings.
    pub fn string_metadata(&self) -> impl Iterator<Item = (&str, &str)> {
        self.metadata.iter().filter_map(|(key, value)| match value {
            Value::String(s) if !s.is_empty() => Some((key.as_str(), s.as_str())),
            _ => None,
        })
    }
}

/// Body returned by the agent for each heartbeat.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    /// Next instruction. A missing value is treated like `Continue`.
    #[serde(default)]
    pub operation: Option<GameOperation>,
    /// Present once the instance has been allocated.
    #[serde(default)]
    pub session_config: Option<SessionConfig>,
    /// Legacy single-timestamp maintenance notice.
    #[serde(default)]
    pub next_scheduled_maintenance_utc: Option<String>,
    /// Structured maintenance notice.
    #[serde(default)]
    pub maintenance_schedule: Option<MaintenanceSchedule>,
    /// Interval the agent wants until the next heartbeat.
    #[serde(default)]
    pub next_heartbeat_interval_ms: Option<u64>,
}
