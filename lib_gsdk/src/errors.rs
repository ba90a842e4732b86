//! # Error Types
//!
//! Two layers of failure exist. Initialization errors are fatal and reach the
//! caller of the first `start`; transport errors are recoverable and only
//! ever logged by the heartbeat loop.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures while bringing the SDK up.
#[derive(Debug, Error)]
pub enum InitializationError {
    /// A required configuration value is absent or empty.
    #[error("Missing required configuration value: {0}")]
    MissingField(&'static str),

    /// The configuration file named by the environment does not exist.
    #[error("GSDK configuration file {0} not found")]
    ConfigFileNotFound(PathBuf),

    /// The configuration file exists but could not be read.
    #[error("Cannot read configuration file {path}: {source}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the expected schema.
    #[error("Failed to parse configuration file {path}: {source}")]
    ConfigFileParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The transport factory could not open a transport.
    #[error("Failed to open heartbeat transport: {0}")]
    Transport(#[from] TransportError),

    /// The heartbeat thread could not be spawned.
    #[error("Failed to spawn heartbeat thread: {0}")]
    Spawn(std::io::Error),
}

/// Recoverable failures of a single heartbeat exchange.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, timeout or other I/O failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The agent answered with a non-success status.
    #[error("Received non-success code from agent. Status Code: {status} Response Body: {}", .body.as_deref().unwrap_or(""))]
    Status { status: u16, body: Option<String> },

    /// The agent answered with a body that is not a heartbeat response.
    #[error("Malformed response body: {0}")]
    Decode(String),

    /// The transport could not be constructed (bad URL, client builder failure).
    #[error("Transport setup error: {0}")]
    Setup(String),
}
