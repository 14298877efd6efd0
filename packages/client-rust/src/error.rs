//! The uniform error returned by every dispatch.

use std::fmt;

use relaycall_core::{RealizeError, ResolveError};
use serde::{Deserialize, Serialize};

/// Structured error body returned by the remote API.
///
/// Servers spell the machine-readable kind differently (`code`, `type`, or an
/// `exception` that is either a class name or a nested object), so each is
/// kept as its own field and [`ErrorPayload::kind`] picks the first present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(rename = "entity-type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    /// HTTP status echoed in the body, when the server includes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Exception class name, or a nested exception object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<serde_json::Value>,
    /// Human-readable description.
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<String>,
}

impl ErrorPayload {
    /// Machine-readable error kind: `code`, then `type`, then the exception
    /// class (a string, or a nested object's `class`/`type`/`name`).
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.code
            .as_deref()
            .or(self.error_type.as_deref())
            .or_else(|| match self.exception.as_ref()? {
                serde_json::Value::String(class) => Some(class.as_str()),
                serde_json::Value::Object(fields) => ["class", "type", "name"]
                    .iter()
                    .find_map(|key| fields.get(*key).and_then(serde_json::Value::as_str)),
                _ => None,
            })
    }

    /// The top-level message, falling back to a nested exception's message.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        if !self.message.is_empty() {
            return Some(&self.message);
        }
        self.exception
            .as_ref()
            .and_then(|exception| exception.get("message"))
            .and_then(serde_json::Value::as_str)
            .filter(|message| !message.is_empty())
    }
}

/// A completed call that came back with a non-success status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    /// Decoded error body, absent when the body was empty or undecodable.
    pub payload: Option<ErrorPayload>,
}

impl ApiError {
    /// Error built from the status line alone.
    #[must_use]
    pub fn from_status(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            message: reason.into(),
            payload: None,
        }
    }

    /// The machine-readable kind from the payload, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.payload.as_ref().and_then(ErrorPayload::kind)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => write!(f, "{} {} ({code})", self.status, self.message),
            None => write!(f, "{} {}", self.status, self.message),
        }
    }
}

/// Execution failed before a status was obtained.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Other(#[source] anyhow::Error),
}

/// The normalized error every failure path converges to.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No matching operation, arity mismatch, or the builder failed.
    #[error("resolution failed: {0}")]
    Resolution(#[from] ResolveError),
    /// The realized form of the request could not be produced.
    #[error("cannot describe request: {0}")]
    Fingerprint(#[from] RealizeError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("api error: {0}")]
    Api(ApiError),
    /// The business object has no client context attached.
    #[error("{entity_type} is not attached to a client context")]
    Detached { entity_type: String },
    /// A successful body could not be decoded into the requested type.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl DispatchError {
    /// Status code for API errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(api) => Some(api.status),
            _ => None,
        }
    }

    /// Short label used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resolution(_) => "resolution",
            Self::Fingerprint(_) => "fingerprint",
            Self::Transport(_) => "transport",
            Self::Api(_) => "api",
            Self::Detached { .. } => "detached",
            Self::Decode(_) => "decode",
        }
    }
}

impl From<ApiError> for DispatchError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}
