//! The dispatch pipeline: resolve, fingerprint, consult the cache, execute.
//!
//! Per call:
//!
//! 1. **Resolve** the operation on the capability surface, appending the
//!    repository qualifier (`relaycall_core::resolve`)
//! 2. **Realize** the pending request through the executor
//! 3. **Key**: empty when caching is off, otherwise the request
//!    fingerprint; a pending refresh first invalidates the whole cache
//! 4. **Cache hit** returns immediately, with no registration or execution;
//!    a refreshing call skips the lookup but still writes its result
//! 5. **Execute** while registered in the in-flight registry
//! 6. **Finalize**: decode failures into [`DispatchError`], cache successes
//!
//! Failures before step 5 touch neither the registry nor the cache. From
//! step 5 on, the registry entry is removed on every exit path, and only a
//! confirmed success writes to the cache.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use relaycall_core::{resolve, CapabilitySurface, Fingerprint, Headers, Value};
use serde::de::DeserializeOwned;
use tracing::{debug, info_span, warn};

use crate::cache::CachedResponse;
use crate::context::ClientContext;
use crate::error::DispatchError;
use crate::execute::RawResponse;

// ---------------------------------------------------------------------------
// Call / Response
// ---------------------------------------------------------------------------

/// One invocation to dispatch.
#[derive(Debug)]
pub struct Call<'a> {
    pub surface: &'a CapabilitySurface,
    /// Name of the capability being exercised.
    pub operation: &'a str,
    pub args: Vec<Value>,
    /// Implicit trailing qualifier. `None` or empty means none.
    pub repository: Option<&'a str>,
    /// Forced-refresh flag; consumed (reset) only when caching is enabled.
    pub refresh: Option<&'a AtomicBool>,
}

impl<'a> Call<'a> {
    #[must_use]
    pub fn new(surface: &'a CapabilitySurface, operation: &'a str, args: Vec<Value>) -> Self {
        Self {
            surface,
            operation,
            args,
            repository: None,
            refresh: None,
        }
    }

    #[must_use]
    pub fn repository(mut self, repository: Option<&'a str>) -> Self {
        self.repository = repository;
        self
    }

    #[must_use]
    pub fn refresh(mut self, flag: &'a AtomicBool) -> Self {
        self.refresh = Some(flag);
        self
    }
}

/// A successful response, fresh or served from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
    pub from_cache: bool,
}

impl Response {
    /// Decodes the body as JSON into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Decode`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DispatchError> {
        serde_json::from_slice(&self.body).map_err(DispatchError::Decode)
    }

    /// The body as UTF-8 text, with invalid sequences replaced.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn cached(entry: CachedResponse) -> Self {
        Self {
            status: entry.status,
            headers: entry.headers,
            body: entry.body,
            from_cache: true,
        }
    }

    fn fresh(raw: RawResponse) -> Self {
        Self {
            status: raw.status,
            headers: raw.headers,
            body: raw.body,
            from_cache: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

impl ClientContext {
    /// Dispatches `call` and returns the response body or a normalized error.
    ///
    /// Blocks the calling thread for the whole round trip.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Resolution`] when the operation cannot be resolved
    /// - [`DispatchError::Fingerprint`] when the request cannot be realized
    /// - [`DispatchError::Transport`] when execution fails without a status
    /// - [`DispatchError::Api`] when the server answers with a non-2xx status
    pub fn dispatch(&self, call: Call<'_>) -> Result<Response, DispatchError> {
        let span = info_span!(
            "invoke",
            surface = call.surface.name(),
            operation = call.operation,
            fingerprint = tracing::field::Empty,
            outcome = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        );
        let _entered = span.enter();
        let start = Instant::now();

        let result = self.dispatch_inner(call, &span);

        let outcome = match &result {
            Ok(response) if response.from_cache => "cached",
            Ok(_) => "ok",
            Err(err) => err.kind(),
        };
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        span.record("outcome", outcome);
        span.record("duration_ms", duration_ms);
        match &result {
            Ok(_) => debug!(outcome, duration_ms, "invoke complete"),
            Err(err) => warn!(outcome, duration_ms, error = %err, "invoke failed"),
        }
        result
    }

    fn dispatch_inner(&self, call: Call<'_>, span: &tracing::Span) -> Result<Response, DispatchError> {
        let repository = call.repository.filter(|r| !r.is_empty());
        let bound = resolve(call.surface, call.operation, call.args, repository)?;
        let realized = self.executor.realize(&bound.request)?;
        debug!(request = %realized, "Request");

        let caching = self.cache_enabled();
        let refreshing = caching
            && call
                .refresh
                .is_some_and(|flag| flag.swap(false, Ordering::AcqRel));
        if refreshing {
            debug!(dropped = self.cache.len(), "forced refresh; invalidating result cache");
            self.cache.invalidate_all();
        }
        let key = if caching {
            self.fingerprints.fingerprint(&realized)
        } else {
            Fingerprint::empty()
        };
        span.record("fingerprint", key.as_str());

        if !key.is_empty() && !refreshing {
            if let Some(hit) = self.cache.get(&key) {
                debug!("result cache hit");
                return Ok(Response::cached(hit));
            }
            debug!("result cache miss");
        }

        let realized = Arc::new(realized);
        let guard = self
            .in_flight
            .track(bound.surface, bound.operation, Arc::clone(&realized));
        let outcome = self.executor.execute(&realized);

        let raw = match outcome {
            Ok(raw) => raw,
            Err(err) => {
                drop(guard);
                return Err(err.into());
            }
        };
        if !raw.is_success() {
            drop(guard);
            return Err(self.decoder.decode(raw.status, &raw.reason, &raw.body).into());
        }

        if self.cache_enabled() && !key.is_empty() {
            self.cache.put(&key, CachedResponse::from(&raw));
        }
        drop(guard);
        Ok(Response::fresh(raw))
    }
}
