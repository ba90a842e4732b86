use std::time::Duration;

/// Engine tuning knobs.
///
/// The defaults match what the agent expects from a production server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsdkOptions {
    /// Base heartbeat interval. Agent-requested intervals are never shorter.
    pub heartbeat_interval: Duration,
    /// Log at `Debug` instead of `Info`.
    pub debug_logs: bool,
    /// Install the file logger in the configured log folder on start.
    pub file_logging: bool,
    /// Per-request timeout of the HTTP transport.
    pub http_timeout: Duration,
    /// Transient-failure retries of the HTTP transport, per heartbeat.
    pub http_max_retries: u32,
}

impl Default for GsdkOptions {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(1),
            debug_logs: false,
            file_logging: true,
            http_timeout: Duration::from_secs(5),
            http_max_retries: 2,
        }
    }
}

impl GsdkOptions {
    /// The interval to wait before the next heartbeat, given what the agent
    /// asked for in the last response.
    pub fn effective_interval(&self, requested_ms: Option<u64>) -> Duration {
        match requested_ms {
            Some(ms) => Duration::from_millis(ms).max(self.heartbeat_interval),
            None => self.heartbeat_interval,
        }
    }
}
