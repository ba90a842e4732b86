//! # Heartbeat Transport
//!
//! The seam between the heartbeat engine and the network. The engine only
//! ever talks to a [`Transport`]; production code plugs in the HTTP client
//! from `retrieve::heartbeat_client`, tests plug in scripted doubles.

use serde::Serialize;

use crate::errors::TransportError;
use crate::model::{HeartbeatRequest, HeartbeatResponse};

/// SDK flavor and version posted once when the loop starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GsdkInfo {
    pub flavor: String,
    pub version: String,
}

impl Default for GsdkInfo {
    fn default() -> Self {
        Self {
            flavor: "Rust".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// One request/response exchange with the agent.
///
/// Implementations are owned by the heartbeat thread, so `Send` is enough.
pub trait Transport: Send {
    /// Sends one heartbeat and returns the decoded response.
    fn send_heartbeat(&self, request: &HeartbeatRequest) -> Result<HeartbeatResponse, TransportError>;

    /// Reports SDK flavor and version. Optional for transports that have no
    /// metrics endpoint.
    fn send_info(&self, _info: &GsdkInfo) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Absolute URLs of the agent endpoints for one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEndpoints {
    pub heartbeat_url: String,
    pub info_url: String,
}

impl AgentEndpoints {
    /// Builds the URLs from the configured endpoint and instance id.
    ///
    /// A bare `host:port` is given an `http://` scheme; an endpoint that
    /// already carries one is used as-is.
    pub fn new(heartbeat_endpoint: &str, instance_id: &str) -> Self {
        let endpoint = heartbeat_endpoint.trim().trim_end_matches('/');
        let base = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("http://{}", endpoint)
        };

        Self {
            heartbeat_url: format!("{}/v1/sessionHosts/{}", base, instance_id),
            info_url: format!("{}/v1/metrics/{}/gsdkinfo", base, instance_id),
        }
    }
}

/// Opens a transport once configuration has been validated.
pub trait TransportFactory: Send + Sync {
    fn open(&self, endpoints: &AgentEndpoints) -> Result<Box<dyn Transport>, TransportError>;
}

impl<F> TransportFactory for F
where
    F: Fn(&AgentEndpoints) -> Result<Box<dyn Transport>, TransportError> + Send + Sync,
{
    fn open(&self, endpoints: &AgentEndpoints) -> Result<Box<dyn Transport>, TransportError> {
        self(endpoints)
    }
}
