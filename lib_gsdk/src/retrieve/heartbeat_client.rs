//! # Agent HTTP Transport
//!
//! The default [`Transport`]: JSON over HTTP to the local agent, driven by the
//! async [`ApiClient`] on a private current-thread runtime so the blocking
//! heartbeat thread can call it directly.

use reqwest::Method;
use serde::de::IgnoredAny;
use tokio::runtime::{Builder, Runtime};

use crate::core::options::GsdkOptions;
use crate::core::transport::{AgentEndpoints, GsdkInfo, Transport, TransportFactory};
use crate::errors::TransportError;
use crate::model::{HeartbeatRequest, HeartbeatResponse};
use crate::retrieve::ky_http::{ApiClient, ApiClientOptions, ApiResponse};

pub struct HttpTransport {
    runtime: Runtime,
    client: ApiClient,
    endpoints: AgentEndpoints,
}

impl HttpTransport {
    pub fn new(endpoints: &AgentEndpoints, options: &ApiClientOptions) -> Result<Self, TransportError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TransportError::Setup(format!("cannot build runtime: {}", e)))?;
        let client = ApiClient::new(&endpoints.heartbeat_url, options)?;

        Ok(Self {
            runtime,
            client,
            endpoints: endpoints.clone(),
        })
    }
}

fn check_status<T>(response: &ApiResponse<T>) -> Result<(), TransportError> {
    if response.success {
        Ok(())
    } else {
        Err(TransportError::Status {
            status: response.status,
            body: response.error_body.clone(),
        })
    }
}

impl Transport for HttpTransport {
    fn send_heartbeat(&self, request: &HeartbeatRequest) -> Result<HeartbeatResponse, TransportError> {
        let response: ApiResponse<HeartbeatResponse> = self.runtime.block_on(self.client.request(
            Method::PATCH,
            &self.endpoints.heartbeat_url,
            None,
            Some(request),
        ))?;
        check_status(&response)?;

        // An empty 2xx body means "nothing to do".
        Ok(response.data.unwrap_or_default())
    }

    fn send_info(&self, info: &GsdkInfo) -> Result<(), TransportError> {
        let result = self.runtime.block_on(self.client.request::<IgnoredAny, _>(
            Method::POST,
            &self.endpoints.info_url,
            None,
            Some(info),
        ));
        match result {
            Ok(response) => check_status(&response),
            // The agent may answer with a non-JSON acknowledgement.
            Err(TransportError::Decode(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Opens an [`HttpTransport`] per engine.
#[derive(Debug, Clone, Default)]
pub struct HttpTransportFactory {
    options: ApiClientOptions,
}

impl HttpTransportFactory {
    pub fn new(options: ApiClientOptions) -> Self {
        Self { options }
    }
}

impl From<&GsdkOptions> for HttpTransportFactory {
    fn from(options: &GsdkOptions) -> Self {
        Self::new(ApiClientOptions {
            timeout: options.http_timeout,
            max_retries: options.http_max_retries,
            ..Default::default()
        })
    }
}

impl TransportFactory for HttpTransportFactory {
    fn open(&self, endpoints: &AgentEndpoints) -> Result<Box<dyn Transport>, TransportError> {
        Ok(Box::new(HttpTransport::new(endpoints, &self.options)?))
    }
}
