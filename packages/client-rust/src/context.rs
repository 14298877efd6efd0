//! Long-lived client context shared by every business object.
//!
//! Bundles the configuration with the collaborators a dispatch needs: the
//! executor, the error decoder, the fingerprint engine, the result cache,
//! and the in-flight registry. The cache and the registry are the only
//! mutable shared state; both are safe for concurrent use.

use std::fmt;
use std::sync::Arc;

use relaycall_core::FingerprintEngine;

use crate::cache::{BoundedCache, MemoryCache, ResultCache};
use crate::config::ClientConfig;
use crate::decode::{ErrorDecoder, JsonErrorDecoder};
use crate::error::TransportError;
use crate::execute::{Executor, HttpExecutor};
use crate::inflight::InFlightRegistry;

/// Shared state and collaborators for one client session.
pub struct ClientContext {
    pub(crate) config: ClientConfig,
    pub(crate) executor: Arc<dyn Executor>,
    pub(crate) decoder: Arc<dyn ErrorDecoder>,
    pub(crate) fingerprints: FingerprintEngine,
    pub(crate) cache: Arc<dyn ResultCache>,
    pub(crate) in_flight: Arc<InFlightRegistry>,
}

impl ClientContext {
    /// Starts building a context from `config`.
    #[must_use]
    pub fn builder(config: ClientConfig) -> ClientContextBuilder {
        ClientContextBuilder {
            config,
            executor: None,
            decoder: None,
            fingerprints: None,
            cache: None,
            in_flight: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Default repository qualifier for objects that carry none.
    #[must_use]
    pub fn repository(&self) -> Option<&str> {
        self.config.repository()
    }

    #[must_use]
    pub fn cache_enabled(&self) -> bool {
        self.config.cache_enabled
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<dyn ResultCache> {
        &self.cache
    }

    #[must_use]
    pub fn in_flight(&self) -> &Arc<InFlightRegistry> {
        &self.in_flight
    }

    #[must_use]
    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("config", &self.config)
            .field("cached", &self.cache.len())
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ClientContext`]. Any collaborator left unset gets the
/// production default.
pub struct ClientContextBuilder {
    config: ClientConfig,
    executor: Option<Arc<dyn Executor>>,
    decoder: Option<Arc<dyn ErrorDecoder>>,
    fingerprints: Option<FingerprintEngine>,
    cache: Option<Arc<dyn ResultCache>>,
    in_flight: Option<Arc<InFlightRegistry>>,
}

impl ClientContextBuilder {
    #[must_use]
    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    #[must_use]
    pub fn decoder(mut self, decoder: Arc<dyn ErrorDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    #[must_use]
    pub fn fingerprints(mut self, engine: FingerprintEngine) -> Self {
        self.fingerprints = Some(engine);
        self
    }

    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn in_flight(mut self, registry: Arc<InFlightRegistry>) -> Self {
        self.in_flight = Some(registry);
        self
    }

    /// Finishes the context.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if no executor was supplied and the default
    /// [`HttpExecutor`] cannot be built.
    pub fn build(self) -> Result<Arc<ClientContext>, TransportError> {
        let executor: Arc<dyn Executor> = match self.executor {
            Some(executor) => executor,
            None => Arc::new(HttpExecutor::new(&self.config)?),
        };
        let cache: Arc<dyn ResultCache> = match (self.cache, self.config.cache_capacity) {
            (Some(cache), _) => cache,
            (None, Some(capacity)) => Arc::new(BoundedCache::new(capacity)),
            (None, None) => Arc::new(MemoryCache::new()),
        };
        let decoder: Arc<dyn ErrorDecoder> = match self.decoder {
            Some(decoder) => decoder,
            None => Arc::new(JsonErrorDecoder),
        };
        Ok(Arc::new(ClientContext {
            executor,
            decoder,
            fingerprints: self.fingerprints.unwrap_or_default(),
            cache,
            in_flight: self.in_flight.unwrap_or_default(),
            config: self.config,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeExecutor;

    #[test]
    fn defaults_to_unbounded_cache_and_empty_registry() {
        let ctx = ClientContext::builder(ClientConfig::default())
            .executor(Arc::new(FakeExecutor::new()))
            .build()
            .unwrap();
        assert!(ctx.cache_enabled());
        assert!(ctx.cache().is_empty());
        assert!(ctx.in_flight().is_empty());
        assert!(ctx.repository().is_none());
    }

    #[test]
    fn builds_default_http_executor() {
        let ctx = ClientContext::builder(ClientConfig::new("http://example.test/api/v1"))
            .build()
            .unwrap();
        let realized = ctx
            .executor()
            .realize(&relaycall_core::PendingRequest::get("ping"))
            .unwrap();
        assert_eq!(realized.url.as_str(), "http://example.test/api/v1/ping");
    }

    #[test]
    fn injected_registry_is_shared() {
        let registry = Arc::new(InFlightRegistry::new());
        let ctx = ClientContext::builder(ClientConfig::default())
            .executor(Arc::new(FakeExecutor::new()))
            .in_flight(Arc::clone(&registry))
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(ctx.in_flight(), &registry));
    }

    #[test]
    fn repository_comes_from_config() {
        let config = ClientConfig {
            repository: Some("default".to_string()),
            ..ClientConfig::default()
        };
        let ctx = ClientContext::builder(config)
            .executor(Arc::new(FakeExecutor::new()))
            .build()
            .unwrap();
        assert_eq!(ctx.repository(), Some("default"));
    }

    #[test]
    fn debug_output_reports_shared_state_sizes() {
        let ctx = ClientContext::builder(ClientConfig::default())
            .executor(Arc::new(FakeExecutor::new()))
            .build()
            .unwrap();
        let rendered = format!("{ctx:?}");
        assert!(rendered.contains("cached: 0"), "{rendered}");
        assert!(rendered.contains("in_flight: 0"), "{rendered}");
    }
}
