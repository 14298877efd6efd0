//! Registry of calls currently executing.
//!
//! Tracks each dispatched call from just before execution until it
//! completes or fails. It never blocks or deduplicates: two identical calls
//! in flight are two entries. The registry is for introspection by outside
//! tooling, not a concurrency gate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use relaycall_core::RealizedRequest;

/// Identifier assigned to a call when it is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(pub u64);

/// One registered call.
#[derive(Debug, Clone)]
pub struct InFlightCall {
    pub id: CallId,
    pub surface: &'static str,
    pub operation: &'static str,
    pub request: Arc<RealizedRequest>,
    pub started_at: Instant,
}

/// Thread-safe set of in-flight calls.
#[derive(Debug)]
pub struct InFlightRegistry {
    calls: DashMap<CallId, InFlightCall>,
    next_id: AtomicU64,
}

impl InFlightRegistry {
    /// Creates an empty registry. Call IDs start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a call and returns its ID.
    pub fn add(
        &self,
        surface: &'static str,
        operation: &'static str,
        request: Arc<RealizedRequest>,
    ) -> CallId {
        let id = CallId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.calls.insert(
            id,
            InFlightCall {
                id,
                surface,
                operation,
                request,
                started_at: Instant::now(),
            },
        );
        id
    }

    /// Removes a call. Removing an unknown or already-removed ID is a no-op.
    pub fn remove(&self, id: CallId) -> Option<InFlightCall> {
        self.calls.remove(&id).map(|(_, call)| call)
    }

    /// Registers a call and returns a guard that removes it when dropped.
    pub fn track(
        self: &Arc<Self>,
        surface: &'static str,
        operation: &'static str,
        request: Arc<RealizedRequest>,
    ) -> InFlightGuard {
        let id = self.add(surface, operation, request);
        InFlightGuard {
            registry: Arc::clone(self),
            id,
        }
    }

    #[must_use]
    pub fn contains(&self, id: CallId) -> bool {
        self.calls.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Copies of every registered call, oldest ID first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<InFlightCall> {
        let mut calls: Vec<InFlightCall> = self
            .calls
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        calls.sort_by_key(|call| call.id);
        calls
    }
}

impl Default for InFlightRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes its call from the registry on drop, whichever way execution
/// ends (success, error, or unwinding panic).
#[derive(Debug)]
pub struct InFlightGuard {
    registry: Arc<InFlightRegistry>,
    id: CallId,
}

impl InFlightGuard {
    #[must_use]
    pub fn id(&self) -> CallId {
        self.id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

#[cfg(test)]
mod tests {
    use std::panic;
    use std::thread;

    use relaycall_core::{Headers, PendingRequest};

    use super::*;

    fn request(path: &str) -> Arc<RealizedRequest> {
        Arc::new(
            PendingRequest::get(path)
                .realize("http://localhost/api", &Headers::new())
                .unwrap(),
        )
    }

    #[test]
    fn add_and_remove() {
        let registry = InFlightRegistry::new();
        let id = registry.add("Docs", "fetch", request("a"));
        assert_eq!(id, CallId(1));
        assert!(registry.contains(id));
        assert_eq!(registry.len(), 1);

        let removed = registry.remove(id).unwrap();
        assert_eq!(removed.operation, "fetch");
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_absent_is_noop() {
        let registry = InFlightRegistry::new();
        let id = registry.add("Docs", "fetch", request("a"));
        assert!(registry.remove(id).is_some());
        assert!(registry.remove(id).is_none());
        assert!(registry.remove(CallId(999)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn identical_calls_are_not_deduplicated() {
        let registry = InFlightRegistry::new();
        let a = registry.add("Docs", "fetch", request("same"));
        let b = registry.add("Docs", "fetch", request("same"));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn snapshot_is_ordered_by_id() {
        let registry = InFlightRegistry::new();
        registry.add("Docs", "fetch", request("a"));
        registry.add("Docs", "children", request("b"));
        registry.add("Workspaces", "list", request("c"));
        let ops: Vec<_> = registry.snapshot().iter().map(|c| c.operation).collect();
        assert_eq!(ops, vec!["fetch", "children", "list"]);
    }

    #[test]
    fn guard_removes_on_drop() {
        let registry = Arc::new(InFlightRegistry::new());
        let guard = registry.track("Docs", "fetch", request("a"));
        let id = guard.id();
        assert!(registry.contains(id));
        drop(guard);
        assert!(!registry.contains(id));
    }

    #[test]
    fn guard_removes_on_panic() {
        let registry = Arc::new(InFlightRegistry::new());
        let inner = Arc::clone(&registry);
        let result = panic::catch_unwind(panic::AssertUnwindSafe(move || {
            let _guard = inner.track("Docs", "fetch", request("a"));
            panic!("executor blew up");
        }));
        assert!(result.is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_adds_get_unique_ids() {
        let registry = Arc::new(InFlightRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    (0..50)
                        .map(|_| registry.add("Docs", "fetch", request("x")))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut ids: Vec<CallId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 400);
        assert_eq!(registry.len(), 400);
    }
}
