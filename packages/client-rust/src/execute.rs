//! The execution primitive: realizes pending requests and runs them.
//!
//! [`Executor`] is the seam between the dispatcher and the wire. Besides
//! executing, it exposes [`Executor::realize`] so the dispatcher can obtain
//! the exact method, URL, and header set that will be sent, which is what
//! the fingerprint is computed over.

use bytes::Bytes;
use relaycall_core::{Headers, PendingRequest, RealizeError, RealizedRequest};
use tracing::trace;

use crate::config::ClientConfig;
use crate::error::TransportError;

/// Status, reason phrase, headers, and body of a completed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Headers,
    pub body: Bytes,
}

impl RawResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking execution primitive.
///
/// Implementations enforce their own deadlines; an expired deadline is a
/// [`TransportError`].
pub trait Executor: Send + Sync {
    /// Binds `request` to a concrete URL and final header set.
    ///
    /// # Errors
    ///
    /// Returns [`RealizeError`] when the request cannot be described.
    fn realize(&self, request: &PendingRequest) -> Result<RealizedRequest, RealizeError>;

    /// Executes a realized request, blocking until it completes or fails.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if no status was obtained.
    fn execute(&self, request: &RealizedRequest) -> Result<RawResponse, TransportError>;
}

// ---------------------------------------------------------------------------
// HttpExecutor
// ---------------------------------------------------------------------------

/// [`Executor`] over a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: reqwest::blocking::Client,
    base_url: String,
    default_headers: Headers,
}

impl HttpExecutor {
    /// Builds an executor from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Other`] if the HTTP client cannot be built
    /// (e.g., the TLS backend fails to initialize).
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Other(e.into()))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            default_headers: config.header_defaults(),
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.into())
    }
}

impl Executor for HttpExecutor {
    fn realize(&self, request: &PendingRequest) -> Result<RealizedRequest, RealizeError> {
        request.realize(&self.base_url, &self.default_headers)
    }

    fn execute(&self, request: &RealizedRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_vec());
        }

        trace!(request = %request, "sending request");
        let response = builder.send().map_err(map_reqwest_error)?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().map_err(map_reqwest_error)?;

        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}
