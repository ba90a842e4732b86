//! # lib_gsdk
//!
//! Game server agent SDK. A hosted game server uses it to report its
//! lifecycle state, health and connected players to the local agent, to learn
//! when it has been allocated or must shut down, and to read the static and
//! session configuration the agent provides.
//!
//! The HTTP transport lives behind the `retrieve` feature and the file logger
//! behind `loggers`; both are on by default.

// Declare the modules to re-export
pub mod configs;
pub mod core;
pub mod errors;
pub mod gsdk;
pub mod model;

#[cfg(feature = "loggers")]
pub mod loggers;
#[cfg(feature = "retrieve")]
pub mod retrieve;

// Re-export everything a host needs
pub use crate::configs::{
    ConfigMap, ConfigSource, DefaultConfiguration, EnvironmentConfiguration, GsdkConfiguration,
    JsonFileConfiguration, StaticConfiguration,
};
pub use crate::core::{AgentEndpoints, GsdkInfo, GsdkOptions, Transport, TransportFactory};
pub use crate::errors::{InitializationError, TransportError};
pub use crate::gsdk::GameServerSdk;
pub use crate::model::{
    ConnectedPlayer, GameHealth, GameOperation, GamePort, GameServerConnectionInfo, GameState,
    HeartbeatRequest, HeartbeatResponse, MaintenanceEvent, MaintenanceSchedule, SessionConfig,
};

#[cfg(feature = "retrieve")]
pub use crate::retrieve::{HttpTransport, HttpTransportFactory};
