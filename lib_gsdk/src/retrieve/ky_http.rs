//! # HTTP Retrieval Utilities
//!
//! This module provides an asynchronous API client wrapper around `reqwest`.
//! It includes middleware support for exponential backoff retries and
//! standardized JSON response handling.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::TransportError;

/// A standardized container for API responses.
///
/// This struct wraps the deserialized data along with metadata about the
/// HTTP transaction, such as the status code.
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// The successfully deserialized response body, if any.
    pub data: Option<T>,
    /// The raw error body returned by the server if the request failed.
    pub error_body: Option<String>,
    /// The numeric HTTP status code.
    pub status: u16,
    /// Indicates if the status code was in the 2xx range.
    pub success: bool,
}

/// Client construction settings.
#[derive(Debug, Clone)]
pub struct ApiClientOptions {
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Retries on transient failures (connection errors, 5xx, 429).
    pub max_retries: u32,
    pub user_agent: String,
}

impl Default for ApiClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_retries: 2,
            user_agent: format!("lib_gsdk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// A flexible asynchronous HTTP client.
///
/// Built on top of `reqwest_middleware`, it handles base URLs and automatic
/// retries.
pub struct ApiClient {
    /// The underlying middleware-enabled client.
    inner: ClientWithMiddleware,
    /// The base URL to which relative paths are joined.
    base_url: Url,
}

impl ApiClient {
    /// Creates a new `ApiClient` instance with a retry policy.
    ///
    /// # Arguments
    /// * `base_url` - The absolute base URL (e.g., "http://127.0.0.1:56001/").
    /// * `options` - Timeout, retry count and user agent.
    ///
    /// # Errors
    /// Returns `TransportError::Setup` if `base_url` is not an absolute URL or
    /// the underlying client cannot be built.
    pub fn new(base_url: &str, options: &ApiClientOptions) -> Result<Self, TransportError> {
        // Parse the base URL to ensure it is valid and absolute
        let url = Url::parse(base_url)
            .map_err(|e| TransportError::Setup(format!("invalid base URL {}: {}", base_url, e)))?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let user_agent = HeaderValue::from_str(&options.user_agent)
            .map_err(|e| TransportError::Setup(format!("invalid user agent: {}", e)))?;
        default_headers.insert(USER_AGENT, user_agent);

        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;

        // Configure an exponential backoff policy
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(options.max_retries);

        // Construct the client with the retry middleware
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            inner: client,
            base_url: url,
        })
    }

    /// Performs a generic HTTP request and handles the response.
    ///
    /// An empty body on a successful response yields `data: None`.
    ///
    /// # Arguments
    /// * `method` - The HTTP verb (PATCH, POST, etc.).
    /// * `path` - The path joined onto the base URL; an absolute URL replaces it.
    /// * `headers` - Optional additional headers for this specific request.
    /// * `body` - Optional serializable object to send as the JSON body.
    ///
    /// # Errors
    /// `Network` for URL joining or transport failures, `Decode` when a
    /// successful response is not the expected JSON.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        headers: Option<HeaderMap>,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        // 1. Construct the full absolute URL
        let full_url = self
            .base_url
            .join(path)
            .map_err(|e| TransportError::Network(format!("cannot join {}: {}", path, e)))?;
        let mut req = self.inner.request(method, full_url);

        // 2. Add Custom Headers if provided
        if let Some(h) = headers {
            req = req.headers(h);
        }

        // 3. Serialize and attach the JSON body if present
        if let Some(b) = body {
            let json_body =
                serde_json::to_string(b).map_err(|e| TransportError::Decode(e.to_string()))?;
            req = req.header(CONTENT_TYPE, "application/json").body(json_body);
        }

        // 4. Execute the request and capture response metadata
        let response: reqwest::Response = req
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        let success = status.is_success();

        // 5. Read the body once; the success path decodes it
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if success {
            let data = if text.trim().is_empty() {
                None
            } else {
                Some(serde_json::from_str::<T>(&text).map_err(|e| TransportError::Decode(e.to_string()))?)
            };
            Ok(ApiResponse {
                data,
                error_body: None,
                status: status.as_u16(),
                success: true,
            })
        } else {
            Ok(ApiResponse {
                data: None,
                error_body: Some(text).filter(|t| !t.is_empty()),
                status: status.as_u16(),
                success: false,
            })
        }
    }
}
