//! # Core Engine Module
//!
//! This module forms the heart of the SDK. It aggregates the lifecycle state
//! machine, the background heartbeat loop and the seams it talks through.
//!
//! ## Core Components:
//!
//! - **`engine`**: The state machine and heartbeat thread. It sends the current
//!   state, health and players to the agent and merges each answer into the
//!   shared configuration, maintenance and session state.
//!
//! - **`transport`**: The `Transport` and `TransportFactory` traits the engine
//!   is written against, plus the agent endpoint URLs.
//!
//! - **`callbacks`**: The host's shutdown, health and maintenance handlers,
//!   invoked with panics contained.
//!
//! - **`options`**: Engine tuning (intervals, logging, HTTP timeouts).

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

/// Host-registered handlers.
pub mod callbacks;
/// The lifecycle state machine and heartbeat thread.
pub mod engine;
/// Engine tuning knobs.
pub mod options;
/// Transport seam between the engine and the network.
pub mod transport;

// --- Public API Re-exports ---
pub use callbacks::{HealthCallback, MaintenanceCallback, MaintenanceV2Callback, ShutdownCallback};
pub use engine::HeartbeatEngine;
pub use options::GsdkOptions;
pub use transport::{AgentEndpoints, GsdkInfo, Transport, TransportFactory};
