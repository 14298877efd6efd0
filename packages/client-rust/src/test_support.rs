//! Scripted executor for unit tests.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use relaycall_core::{Headers, PendingRequest, RealizeError, RealizedRequest};

use crate::error::TransportError;
use crate::execute::{Executor, RawResponse};
use crate::inflight::InFlightRegistry;

pub(crate) const BASE_URL: &str = "http://fake.test/api/v1";

/// Executor that replays scripted outcomes and records every call.
///
/// With nothing scripted it answers `200 OK` with a body echoing the URL,
/// so distinct requests get distinct bodies.
#[derive(Default)]
pub(crate) struct FakeExecutor {
    script: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    executed: Mutex<Vec<RealizedRequest>>,
    in_flight_seen: Mutex<Vec<usize>>,
    watch: Mutex<Option<Arc<InFlightRegistry>>>,
    refuse_realize: bool,
}

impl FakeExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// An executor whose `realize` always fails.
    pub(crate) fn opaque() -> Self {
        Self {
            refuse_realize: true,
            ..Self::default()
        }
    }

    pub(crate) fn respond(&self, status: u16, reason: &str, body: &str) {
        self.script.lock().push_back(Ok(RawResponse {
            status,
            reason: reason.to_string(),
            headers: [("Content-Type", "application/json")].into_iter().collect(),
            body: Bytes::from(body.to_string()),
        }));
    }

    pub(crate) fn fail(&self, err: TransportError) {
        self.script.lock().push_back(Err(err));
    }

    /// Records the registry's size at the moment each call executes.
    pub(crate) fn watch(&self, registry: Arc<InFlightRegistry>) {
        *self.watch.lock() = Some(registry);
    }

    pub(crate) fn calls(&self) -> usize {
        self.executed.lock().len()
    }

    pub(crate) fn executed(&self) -> Vec<RealizedRequest> {
        self.executed.lock().clone()
    }

    pub(crate) fn in_flight_seen(&self) -> Vec<usize> {
        self.in_flight_seen.lock().clone()
    }
}

impl Executor for FakeExecutor {
    fn realize(&self, request: &PendingRequest) -> Result<RealizedRequest, RealizeError> {
        if self.refuse_realize {
            return Err(RealizeError::Unsupported("opaque test executor".to_string()));
        }
        request.realize(BASE_URL, &Headers::new())
    }

    fn execute(&self, request: &RealizedRequest) -> Result<RawResponse, TransportError> {
        if let Some(registry) = self.watch.lock().as_ref() {
            self.in_flight_seen.lock().push(registry.len());
        }
        self.executed.lock().push(request.clone());
        self.script.lock().pop_front().unwrap_or_else(|| {
            Ok(RawResponse {
                status: 200,
                reason: "OK".to_string(),
                headers: Headers::new(),
                body: Bytes::from(format!(r#"{{"url":"{}"}}"#, request.url)),
            })
        })
    }
}
