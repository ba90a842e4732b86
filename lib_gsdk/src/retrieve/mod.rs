//! # Data Retrieval Module
//!
//! HTTP plumbing between the SDK and the local agent.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: A generic HTTP `ApiClient` built on `reqwest` and
//!   `reqwest-middleware`, featuring automatic retries with exponential
//!   backoff.
//! - **`heartbeat_client`**: The default heartbeat transport, which drives
//!   `ApiClient` from the blocking heartbeat thread.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

/// Retrying JSON client.
pub mod ky_http;
/// Heartbeat and SDK info requests to the agent.
pub mod heartbeat_client;

pub use heartbeat_client::{HttpTransport, HttpTransportFactory};
pub use ky_http::{ApiClient, ApiClientOptions, ApiResponse};
