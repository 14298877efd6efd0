//! `relaycall` client: dispatch of capability operations over HTTP, with
//! result caching and in-flight tracking.
//!
//! A [`ClientContext`] owns the shared state; [`RemoteObject`]s attached to
//! it invoke operations declared on a [`CapabilitySurface`].

pub mod cache;
pub mod config;
pub mod context;
pub mod decode;
pub mod dispatcher;
pub mod error;
pub mod execute;
pub mod inflight;
pub mod object;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::{BoundedCache, CachedResponse, MemoryCache, ResultCache};
pub use config::ClientConfig;
pub use context::{ClientContext, ClientContextBuilder};
pub use decode::{ErrorDecoder, JsonErrorDecoder};
pub use dispatcher::{Call, Response};
pub use error::{ApiError, DispatchError, ErrorPayload, TransportError};
pub use execute::{Executor, HttpExecutor, RawResponse};
pub use inflight::{CallId, InFlightCall, InFlightGuard, InFlightRegistry};
pub use object::RemoteObject;
pub use telemetry::{TelemetryConfig, TelemetryError};

pub use relaycall_core::{
    Args, CapabilitySurface, Fingerprint, FingerprintEngine, Headers, Method, PendingRequest,
    RealizedRequest, Value,
};
